/*
 * Responsibility
 * - Handler から見える「認証済みコンテキスト」の型
 * - middleware が検証して request extensions に格納し、handler はこの型だけを受け取る
 *
 * Notes
 * - トークンの復号/期限チェックは middleware/services 側の責務
 */

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::services::token::Payload;

/// 認証済みのリクエストに付与されるコンテキスト
///
/// - `user_id` は owner-scoped なクエリの主体
/// - `token_id` はログ相関用 (revocation は実装しない)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthCtx {
    pub user_id: Uuid,
    pub token_id: Uuid,
    pub expires_at: DateTime<Utc>,
}

impl From<&Payload> for AuthCtx {
    fn from(payload: &Payload) -> Self {
        Self {
            user_id: payload.user_id(),
            token_id: payload.token_id(),
            expires_at: payload.expired_at(),
        }
    }
}
