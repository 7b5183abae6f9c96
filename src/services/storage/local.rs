//! Filesystem-backed object store.
//!
//! Layout:
//! ```text
//! {root}/{bucket_id}/
//! ├── 3f/
//! │   └── 3f2c1d9e-....
//! └── a0/
//!     └── a0b4...
//! ```
//! Object ids are UUIDs; the first two characters pick the shard directory.
//! The original file name is metadata only and never becomes part of a path.
use std::io;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use axum::body::Bytes;
use tokio::fs;
use uuid::Uuid;

use super::{ObjectStore, StorageError, StorageResult, StoredObject};

#[derive(Debug, Clone)]
pub struct LocalObjectStore {
    bucket_dir: PathBuf,
    bucket_id: String,
}

impl LocalObjectStore {
    /// Open (and create if needed) `{root}/{bucket_id}`.
    pub async fn open(root: impl AsRef<Path>, bucket_id: impl Into<String>) -> StorageResult<Self> {
        let bucket_id = bucket_id.into();
        let bucket_dir = root.as_ref().join(&bucket_id);
        fs::create_dir_all(&bucket_dir).await?;

        Ok(Self {
            bucket_dir,
            bucket_id,
        })
    }

    fn object_path(&self, file_id: &str) -> StorageResult<PathBuf> {
        // Ids come back from the database; still never let one escape the bucket.
        let id = Uuid::parse_str(file_id).map_err(|_| StorageError::InvalidId(file_id.into()))?;
        let id = id.to_string();
        Ok(self.bucket_dir.join(&id[..2]).join(id))
    }
}

#[async_trait]
impl ObjectStore for LocalObjectStore {
    fn backend_name(&self) -> &'static str {
        "local"
    }

    async fn put(
        &self,
        name: &str,
        content_type: &str,
        content: Bytes,
    ) -> StorageResult<StoredObject> {
        let file_id = Uuid::new_v4().to_string();
        let path = self.object_path(&file_id)?;

        if let Some(shard) = path.parent() {
            fs::create_dir_all(shard).await?;
        }
        fs::write(&path, &content).await?;

        tracing::debug!(
            file_id = %file_id,
            name,
            content_type,
            size = content.len(),
            "object stored"
        );

        Ok(StoredObject {
            file_id,
            bucket_id: self.bucket_id.clone(),
            size: content.len() as i64,
        })
    }

    async fn delete(&self, file_id: &str, name: &str) -> StorageResult<()> {
        let path = self.object_path(file_id)?;

        match fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                tracing::debug!(file_id, name, "object already gone");
                Ok(())
            }
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;

    async fn store() -> (TempDir, LocalObjectStore) {
        let dir = TempDir::new().unwrap();
        let store = LocalObjectStore::open(dir.path(), "bucket-a").await.unwrap();
        (dir, store)
    }

    #[tokio::test]
    async fn put_writes_into_a_sharded_bucket_path() {
        let (dir, store) = store().await;

        let stored = store
            .put("notes.txt", "text/plain", Bytes::from_static(b"hello"))
            .await
            .unwrap();

        assert_eq!(stored.bucket_id, "bucket-a");
        assert_eq!(stored.size, 5);

        let path = dir
            .path()
            .join("bucket-a")
            .join(&stored.file_id[..2])
            .join(&stored.file_id);
        assert_eq!(std::fs::read(path).unwrap(), b"hello");
    }

    #[tokio::test]
    async fn each_put_gets_its_own_id() {
        let (_dir, store) = store().await;

        let a = store.put("a", "text/plain", Bytes::new()).await.unwrap();
        let b = store.put("a", "text/plain", Bytes::new()).await.unwrap();

        assert_ne!(a.file_id, b.file_id);
    }

    #[tokio::test]
    async fn delete_removes_and_tolerates_missing_objects() {
        let (_dir, store) = store().await;
        let stored = store
            .put("a.bin", "application/octet-stream", Bytes::from_static(b"x"))
            .await
            .unwrap();
        let path = store.object_path(&stored.file_id).unwrap();

        store.delete(&stored.file_id, "a.bin").await.unwrap();
        assert!(!path.exists());

        store.delete(&stored.file_id, "a.bin").await.unwrap();
    }

    #[tokio::test]
    async fn ids_that_are_not_uuids_are_refused() {
        let (_dir, store) = store().await;

        for bad in ["../../etc/passwd", "", "abc"] {
            assert!(matches!(
                store.delete(bad, "x").await,
                Err(StorageError::InvalidId(_))
            ));
        }
    }
}
