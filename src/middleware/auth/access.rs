//! access token 検証 → AuthCtx を extensions に入れる
//!
//! - `Authorization: Bearer <token>` を取り出す (scheme は大文字小文字を区別しない)
//! - TokenMaker で復号 + 期限チェック (期限チェックは verify_token の中で一度だけ)
//! - 成功時に AuthCtx を request extensions に格納し、handler は AuthCtxExtractor で受け取る
//!
//! Rejections never reach the handler. Every rejection is 401; the error code
//! in the body tells the header problems apart from token problems.

use axum::{
    Router,
    body::Body,
    extract::State,
    http::{HeaderMap, Request, header},
    middleware::{self, Next},
    response::Response,
};
use thiserror::Error;

use crate::api::v1::extractors::AuthCtx;
use crate::error::AppError;
use crate::services::token::{SharedTokenMaker, TokenError, TokenMaker};

const BEARER: &str = "bearer";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum AuthError {
    #[error("authorization header is not provided")]
    MissingHeader,
    #[error("invalid authorization header format")]
    MalformedHeader,
    #[error("unsupported authorization type {0}")]
    UnsupportedScheme(String),
    #[error("invalid token")]
    InvalidToken,
    #[error("token has expired")]
    ExpiredToken,
}

impl From<AuthError> for AppError {
    fn from(e: AuthError) -> Self {
        let code = match &e {
            AuthError::MissingHeader => "MISSING_AUTHORIZATION",
            AuthError::MalformedHeader => "MALFORMED_AUTHORIZATION",
            AuthError::UnsupportedScheme(_) => "UNSUPPORTED_AUTHORIZATION_TYPE",
            AuthError::InvalidToken => "INVALID_TOKEN",
            AuthError::ExpiredToken => "TOKEN_EXPIRED",
        };
        AppError::unauthorized(code, e.to_string())
    }
}

/// 認証が必要なルートに access gate を適用する。
///
/// `route_layer` なので、存在しないパスは 401 ではなく 404 のまま。
///
/// 例：
/// ```ignore
/// let protected = Router::new().route("/user/files", get(list_files));
/// let protected = middleware::auth::access::apply(protected, state.tokens.clone());
/// ```
pub fn apply<S>(router: Router<S>, tokens: SharedTokenMaker) -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    router.route_layer(middleware::from_fn_with_state(tokens, access_middleware))
}

async fn access_middleware(
    State(tokens): State<SharedTokenMaker>,
    mut req: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    let auth_ctx = match authenticate(tokens.as_ref(), req.headers()) {
        Ok(ctx) => ctx,
        Err(err) => {
            tracing::warn!(
                error = %err,
                path = %req.uri().path(),
                "access token rejected"
            );
            return Err(err.into());
        }
    };

    tracing::debug!(
        user_id = %auth_ctx.user_id,
        token_id = %auth_ctx.token_id,
        "access token accepted"
    );

    // middleware → extractor への受け渡し
    req.extensions_mut().insert(auth_ctx);

    Ok(next.run(req).await)
}

/// Header → verified identity. Pure function of (headers, key, now).
pub fn authenticate(tokens: &dyn TokenMaker, headers: &HeaderMap) -> Result<AuthCtx, AuthError> {
    let token = bearer_token(headers)?;

    let payload = tokens.verify_token(token).map_err(|e| match e {
        TokenError::Expired => AuthError::ExpiredToken,
        _ => AuthError::InvalidToken,
    })?;

    Ok(AuthCtx::from(&payload))
}

/// Extract `<token>` from `Authorization: Bearer <token>`.
///
/// Fields past the second are ignored.
pub fn bearer_token(headers: &HeaderMap) -> Result<&str, AuthError> {
    let value = match headers.get(header::AUTHORIZATION) {
        Some(v) if !v.is_empty() => v,
        _ => return Err(AuthError::MissingHeader),
    };

    let value = value.to_str().map_err(|_| AuthError::MalformedHeader)?;

    let mut fields = value.split_whitespace();
    let (Some(scheme), Some(token)) = (fields.next(), fields.next()) else {
        return Err(AuthError::MalformedHeader);
    };

    if !scheme.eq_ignore_ascii_case(BEARER) {
        return Err(AuthError::UnsupportedScheme(scheme.to_ascii_lowercase()));
    }

    Ok(token)
}
