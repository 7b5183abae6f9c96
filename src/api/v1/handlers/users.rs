/*
 * Responsibility
 * - POST /signup, POST /login: アカウント作成/認証 → access token 発行
 * - GET /user/me: access gate が付けた AuthCtx をそのまま返す
 * - パスワードハッシュは CPU bound なので spawn_blocking で回す
 */
use axum::{Json, extract::State, http::StatusCode};

use crate::{
    api::v1::{
        dto::users::{AuthResponse, LoginRequest, MeResponse, SignupRequest, normalize_email},
        extractors::AuthCtxExtractor,
    },
    error::AppError,
    repos::{
        error::RepoError,
        user_repo::{self, UserRow},
    },
    services::password,
    state::AppState,
};

pub async fn signup(
    State(state): State<AppState>,
    Json(req): Json<SignupRequest>,
) -> Result<(StatusCode, Json<AuthResponse>), AppError> {
    req.validate()
        .map_err(|msg| AppError::bad_request("INVALID_REQUEST", msg))?;

    let email = normalize_email(&req.email);
    let hashed = run_blocking(move || password::hash_password(&req.password)).await??;

    let user = user_repo::create(&state.db, req.full_name.trim(), &email, &hashed)
        .await
        .map_err(|e| match e {
            RepoError::Conflict => {
                AppError::conflict("EMAIL_TAKEN", "email is already registered")
            }
            other => other.into(),
        })?;

    tracing::info!(user_id = %user.id, "user signed up");

    Ok((StatusCode::CREATED, Json(issue(&state, user)?)))
}

pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<AuthResponse>, AppError> {
    req.validate()
        .map_err(|msg| AppError::bad_request("INVALID_REQUEST", msg))?;

    let email = normalize_email(&req.email);

    // Unknown email and wrong password look the same to the client,
    // both in the body and in the time it takes to answer.
    let Some(user) = user_repo::get_by_email(&state.db, &email).await? else {
        let err = run_blocking(move || password::reject_unknown_user(&req.password)).await?;
        return Err(err.into());
    };

    let hash = user.hashed_password.clone();
    run_blocking(move || password::verify_password(&req.password, &hash)).await??;

    tracing::info!(user_id = %user.id, "user logged in");

    Ok(Json(issue(&state, user)?))
}

pub async fn me(AuthCtxExtractor(auth): AuthCtxExtractor) -> Json<MeResponse> {
    Json(MeResponse {
        user_id: auth.user_id,
        token_id: auth.token_id,
        expires_at: auth.expires_at,
    })
}

fn issue(state: &AppState, user: UserRow) -> Result<AuthResponse, AppError> {
    let access_token = state
        .tokens
        .create_token(user.id, state.access_token_duration)?;

    Ok(AuthResponse {
        full_name: user.full_name,
        email: user.email,
        access_token,
        token_type: "Bearer",
        expires_in: state.access_token_duration.num_seconds(),
        created_at: user.created_at,
    })
}

async fn run_blocking<T, F>(f: F) -> Result<T, AppError>
where
    F: FnOnce() -> T + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f).await.map_err(|e| {
        tracing::error!(error = %e, "blocking task failed");
        AppError::Internal
    })
}
