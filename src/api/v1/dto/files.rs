/*
 * Responsibility
 * - files の request/response DTO
 * - multipart から取り出した upload の形式チェック
 * - owner はレスポンスに含めない (常に呼び出し元本人 or guest)
 */
use axum::body::Bytes;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::repos::file_repo::FileRow;

pub const MAX_PAGE_LIMIT: i64 = 50;
pub const MAX_FILE_NAME_LEN: usize = 255;
pub const DEFAULT_FILE_TYPE: &str = "application/octet-stream";
const MAX_FILE_TYPE_LEN: usize = 255;

#[derive(Debug, Default, Deserialize)]
pub struct ListFilesQuery {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

impl ListFilesQuery {
    /// (limit, offset) clamped to 1..=50 and >= 0.
    pub fn page(&self) -> (i64, i64) {
        let limit = self.limit.unwrap_or(MAX_PAGE_LIMIT).clamp(1, MAX_PAGE_LIMIT);
        let offset = self.offset.unwrap_or(0).max(0);
        (limit, offset)
    }
}

/// The `file` part of a multipart upload.
#[derive(Debug)]
pub struct UploadedFile {
    pub name: String,
    pub file_type: String,
    pub content: Bytes,
}

impl UploadedFile {
    pub fn validate(&self) -> Result<(), &'static str> {
        validate_file_name(&self.name)?;
        if self.file_type.is_empty() || self.file_type.len() > MAX_FILE_TYPE_LEN {
            return Err("file type is invalid");
        }
        if self.content.is_empty() {
            return Err("file is empty");
        }
        Ok(())
    }
}

// Names are shown back to the owner, never used as paths.
fn validate_file_name(name: &str) -> Result<(), &'static str> {
    if name.trim().is_empty() {
        return Err("file name is required");
    }
    if name.chars().count() > MAX_FILE_NAME_LEN {
        return Err("file name must be <= 255 chars");
    }
    if name.chars().any(|c| c.is_control() || c == '/' || c == '\\') {
        return Err("file name is invalid");
    }
    Ok(())
}

#[derive(Debug, Serialize)]
pub struct FileResponse {
    pub file_id: String,
    pub bucket_id: String,
    pub name: String,
    pub size: i64,
    pub file_type: String,
    pub created_at: DateTime<Utc>,
}

impl From<FileRow> for FileResponse {
    fn from(row: FileRow) -> Self {
        Self {
            file_id: row.file_id,
            bucket_id: row.bucket_id,
            name: row.name,
            size: row.size,
            file_type: row.file_type,
            created_at: row.created_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_defaults_and_clamps() {
        assert_eq!(ListFilesQuery::default().page(), (50, 0));

        let q = ListFilesQuery {
            limit: Some(500),
            offset: Some(-3),
        };
        assert_eq!(q.page(), (50, 0));

        let q = ListFilesQuery {
            limit: Some(0),
            offset: Some(20),
        };
        assert_eq!(q.page(), (1, 20));
    }

    fn upload(name: &str, file_type: &str, content: &'static [u8]) -> UploadedFile {
        UploadedFile {
            name: name.into(),
            file_type: file_type.into(),
            content: Bytes::from_static(content),
        }
    }

    #[test]
    fn upload_validation() {
        assert!(upload("report.pdf", "application/pdf", b"%PDF").validate().is_ok());

        assert_eq!(
            upload("report.pdf", "application/pdf", b"").validate(),
            Err("file is empty")
        );
        assert_eq!(
            upload("  ", "text/plain", b"x").validate(),
            Err("file name is required")
        );
        assert_eq!(
            upload("a.txt", "", b"x").validate(),
            Err("file type is invalid")
        );
        for bad in ["../a.txt", "dir\\a.txt", "a\nb.txt"] {
            assert_eq!(
                upload(bad, "text/plain", b"x").validate(),
                Err("file name is invalid"),
                "{bad:?}"
            );
        }
        let long = "x".repeat(MAX_FILE_NAME_LEN + 1);
        assert_eq!(
            upload(&long, "text/plain", b"x").validate(),
            Err("file name must be <= 255 chars")
        );
    }
}
