/*
 * Responsibility
 * - v1 の URL 構造を定義
 * - /health, /signup, /login, guest upload (POST /files) は公開
 * - /user 以下は access gate (route_layer) の内側に置く
 * - upload だけ body 上限を max_upload_bytes まで広げる
 */
use axum::{
    Router,
    extract::DefaultBodyLimit,
    handler::Handler,
    routing::{get, post},
};

use crate::{
    api::v1::handlers::{
        files::{delete_file, get_file, list_files, upload_guest_file, upload_user_file},
        health::health,
        users::{login, me, signup},
    },
    middleware::auth::access,
    state::AppState,
};

pub fn routes(state: &AppState) -> Router<AppState> {
    let upload_limit = state.max_upload_bytes;

    let public = Router::new()
        .route("/health", get(health))
        .route("/signup", post(signup))
        .route("/login", post(login))
        .route(
            "/files",
            post(upload_guest_file.layer(DefaultBodyLimit::max(upload_limit))),
        );

    let protected = Router::new()
        .route("/user/me", get(me))
        .route(
            "/user/files",
            get(list_files).post(upload_user_file.layer(DefaultBodyLimit::max(upload_limit))),
        )
        .route("/user/files/{file_id}", get(get_file).delete(delete_file));

    public.merge(access::apply(protected, state.tokens.clone()))
}
