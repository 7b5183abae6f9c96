/*
 * Responsibility
 * - Router に紐づける共有コンテキスト (AppState)
 *   - db: PgPool, tokens: SharedTokenMaker, store: SharedObjectStore
 *   - access token の有効期間, upload の上限サイズ
 * - Clone 前提で持つ (内部は Arc/Clone cheap)
 */
use chrono::Duration;

use crate::services::{storage::SharedObjectStore, token::SharedTokenMaker};

#[derive(Clone, Debug)]
pub struct AppState {
    pub db: sqlx::PgPool,
    pub tokens: SharedTokenMaker,
    pub store: SharedObjectStore,
    pub access_token_duration: Duration,
    pub max_upload_bytes: usize,
}

impl AppState {
    pub fn new(
        db: sqlx::PgPool,
        tokens: SharedTokenMaker,
        store: SharedObjectStore,
        access_token_duration: Duration,
        max_upload_bytes: usize,
    ) -> Self {
        Self {
            db,
            tokens,
            store,
            access_token_duration,
            max_upload_bytes,
        }
    }
}
