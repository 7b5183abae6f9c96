//! CORS for the dropbyte web client.
//!
//! The client sends the access token in `Authorization` and uploads with
//! multipart `POST`, so those are what preflight has to allow. No cookies are
//! involved and credentials mode stays off in every environment.
//!
//! `APP_ENV=production` only answers origins listed in `CORS_ALLOWED_ORIGINS`
//! (exact match, empty list = none); anything else answers `*`.

use axum::Router;
use axum::http::{HeaderName, HeaderValue, Method, header};
use tower_http::cors::{AllowOrigin, Any, CorsLayer};

use crate::config::AppEnv;
use crate::middleware::http::REQUEST_ID_HEADER;

const PREFLIGHT_MAX_AGE: std::time::Duration = std::time::Duration::from_secs(60 * 10);

pub fn apply(router: Router, app_env: AppEnv, allowed_origins: &[String]) -> Router {
    let allow_origin = if app_env.is_production() {
        let allowed: Vec<HeaderValue> = allowed_origins
            .iter()
            .filter_map(|s| HeaderValue::from_str(s).ok())
            .collect();
        AllowOrigin::predicate(move |origin: &HeaderValue, _req| allowed.contains(origin))
    } else {
        AllowOrigin::from(Any)
    };

    let request_id = HeaderName::from_static(REQUEST_ID_HEADER);

    let cors = CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods([Method::GET, Method::HEAD, Method::POST, Method::DELETE])
        .allow_headers([
            header::AUTHORIZATION,
            header::CONTENT_TYPE,
            header::ACCEPT,
            request_id.clone(),
        ])
        // lets the client quote the request id when reporting a failure
        .expose_headers([request_id])
        .max_age(PREFLIGHT_MAX_AGE);

    router.layer(cors)
}
