/*
 * Responsibility
 * - users テーブル向け SQLx 操作
 * - PgPool を受け取り signup / login に必要な操作を提供
 * - email の重複は RepoError::Conflict として返す
 */
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::repos::error::{RepoError, RepoResult};

#[derive(Debug, FromRow)]
pub struct UserRow {
    pub id: Uuid,
    pub full_name: String,
    pub email: String,
    pub hashed_password: String,
    pub created_at: DateTime<Utc>,
}

pub async fn create(
    db: &PgPool,
    full_name: &str,
    email: &str,
    hashed_password: &str,
) -> RepoResult<UserRow> {
    let row = sqlx::query_as::<_, UserRow>(
        r#"
        INSERT INTO users (full_name, email, hashed_password)
        VALUES ($1, $2, $3)
        RETURNING id, full_name, email, hashed_password, created_at
        "#,
    )
    .bind(full_name)
    .bind(email)
    .bind(hashed_password)
    .fetch_one(db)
    .await
    .map_err(RepoError::from_sqlx)?;

    Ok(row)
}

pub async fn get_by_email(db: &PgPool, email: &str) -> RepoResult<Option<UserRow>> {
    let row = sqlx::query_as::<_, UserRow>(
        r#"
        SELECT id, full_name, email, hashed_password, created_at
        FROM users
        WHERE email = $1
        "#,
    )
    .bind(email)
    .fetch_optional(db)
    .await?;

    Ok(row)
}
