//! Object storage for uploaded file contents.
//!
//! Only metadata lives in Postgres; the bytes go to an [`ObjectStore`].
//! Handlers talk to the trait, so the backend can be swapped without
//! touching the HTTP layer.
use std::{fmt, sync::Arc};

use async_trait::async_trait;
use axum::body::Bytes;
use thiserror::Error;

pub mod local;

pub use local::LocalObjectStore;

pub type StorageResult<T> = Result<T, StorageError>;

pub type SharedObjectStore = Arc<dyn ObjectStore>;

/// Storage-layer errors.
///
/// Kept apart from `AppError`; the HTTP layer decides what the client sees.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("storage io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid object id: {0}")]
    InvalidId(String),
}

/// Where an uploaded object ended up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredObject {
    pub file_id: String,
    pub bucket_id: String,
    pub size: i64,
}

#[async_trait]
pub trait ObjectStore: Send + Sync + fmt::Debug + 'static {
    // Backend name (for logging).
    fn backend_name(&self) -> &'static str;

    // Store `content` under a fresh id.
    async fn put(
        &self,
        name: &str,
        content_type: &str,
        content: Bytes,
    ) -> StorageResult<StoredObject>;

    // Remove an object. Deleting an object that is already gone is not an error.
    async fn delete(&self, file_id: &str, name: &str) -> StorageResult<()>;
}
