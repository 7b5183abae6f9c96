/*
 * Responsibility
 * - files テーブル (object storage 上のファイルのメタデータ) 向け SQLx 操作
 * - 読み取り/削除は owner 付きのクエリのみ公開する (他人のファイルは見えない)
 * - guest upload は owner = NULL で登録する
 */
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::repos::error::{RepoError, RepoResult};

#[derive(Debug, Clone, FromRow)]
pub struct FileRow {
    pub file_id: String,
    pub bucket_id: String,
    pub size: i64,
    pub name: String,
    pub file_type: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug)]
pub struct NewFile<'a> {
    pub file_id: &'a str,
    pub bucket_id: &'a str,
    // None for guest uploads
    pub owner: Option<Uuid>,
    pub size: i64,
    pub name: &'a str,
    pub file_type: &'a str,
}

pub async fn create(db: &PgPool, file: NewFile<'_>) -> RepoResult<FileRow> {
    let row = sqlx::query_as::<_, FileRow>(
        r#"
        INSERT INTO files (file_id, bucket_id, owner, size, name, file_type)
        VALUES ($1, $2, $3, $4, $5, $6)
        RETURNING file_id, bucket_id, size, name, file_type, created_at
        "#,
    )
    .bind(file.file_id)
    .bind(file.bucket_id)
    .bind(file.owner)
    .bind(file.size)
    .bind(file.name)
    .bind(file.file_type)
    .fetch_one(db)
    .await
    .map_err(RepoError::from_sqlx)?;

    Ok(row)
}

pub async fn list_by_owner(
    db: &PgPool,
    owner: Uuid,
    limit: i64,
    offset: i64,
) -> RepoResult<Vec<FileRow>> {
    let rows = sqlx::query_as::<_, FileRow>(
        r#"
        SELECT file_id, bucket_id, size, name, file_type, created_at
        FROM files
        WHERE owner = $1
        ORDER BY created_at DESC
        LIMIT $2 OFFSET $3
        "#,
    )
    .bind(owner)
    .bind(limit)
    .bind(offset)
    .fetch_all(db)
    .await?;

    Ok(rows)
}

pub async fn get_owned(db: &PgPool, owner: Uuid, file_id: &str) -> RepoResult<Option<FileRow>> {
    let row = sqlx::query_as::<_, FileRow>(
        r#"
        SELECT file_id, bucket_id, size, name, file_type, created_at
        FROM files
        WHERE file_id = $1 AND owner = $2
        "#,
    )
    .bind(file_id)
    .bind(owner)
    .fetch_optional(db)
    .await?;

    Ok(row)
}

/// Delete the row only if `owner` owns it; `None` when there was nothing to delete.
pub async fn delete_owned(
    db: &PgPool,
    owner: Uuid,
    file_id: &str,
) -> RepoResult<Option<FileRow>> {
    let row = sqlx::query_as::<_, FileRow>(
        r#"
        DELETE FROM files
        WHERE file_id = $1 AND owner = $2
        RETURNING file_id, bucket_id, size, name, file_type, created_at
        "#,
    )
    .bind(file_id)
    .bind(owner)
    .fetch_optional(db)
    .await?;

    Ok(row)
}
