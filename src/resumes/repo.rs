use serde::Serialize;
use sqlx::{FromRow, PgPool};
use time::OffsetDateTime;
use uuid::Uuid;

use super::dto::{ResumeCreate, ResumeUpdate};

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Resume {
    pub id: Uuid,
    pub author_id: Uuid,
    pub header: String,
    pub resume_text: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

const RESUME_COLUMNS: &str = "id, author_id, header, resume_text, created_at, updated_at";

pub async fn find_by_id(db: &PgPool, id: Uuid) -> Result<Option<Resume>, sqlx::Error> {
    sqlx::query_as::<_, Resume>(&format!(
        "SELECT {RESUME_COLUMNS} FROM resumes WHERE id = $1"
    ))
    .bind(id)
    .fetch_optional(db)
    .await
}

pub async fn create(
    db: &PgPool,
    author_id: Uuid,
    data: &ResumeCreate,
) -> Result<Resume, sqlx::Error> {
    sqlx::query_as::<_, Resume>(&format!(
        r#"
        INSERT INTO resumes (author_id, header, resume_text)
        VALUES ($1, $2, $3)
        RETURNING {RESUME_COLUMNS}
        "#
    ))
    .bind(author_id)
    .bind(&data.header)
    .bind(&data.resume_text)
    .fetch_one(db)
    .await
}

pub async fn update(
    db: &PgPool,
    id: Uuid,
    data: &ResumeUpdate,
) -> Result<Option<Resume>, sqlx::Error> {
    sqlx::query_as::<_, Resume>(&format!(
        r#"
        UPDATE resumes SET
            header = COALESCE($2, header),
            resume_text = COALESCE($3, resume_text),
            updated_at = now()
        WHERE id = $1
        RETURNING {RESUME_COLUMNS}
        "#
    ))
    .bind(id)
    .bind(&data.header)
    .bind(&data.resume_text)
    .fetch_optional(db)
    .await
}

pub async fn delete(db: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM resumes WHERE id = $1")
        .bind(id)
        .execute(db)
        .await?;
    Ok(result.rows_affected() > 0)
}

pub async fn list(db: &PgPool, limit: i64, offset: i64) -> Result<Vec<Resume>, sqlx::Error> {
    sqlx::query_as::<_, Resume>(&format!(
        "SELECT {RESUME_COLUMNS} FROM resumes ORDER BY created_at DESC LIMIT $1 OFFSET $2"
    ))
    .bind(limit)
    .bind(offset)
    .fetch_all(db)
    .await
}

pub async fn count(db: &PgPool) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM resumes")
        .fetch_one(db)
        .await
}

pub async fn list_by_author(db: &PgPool, author_id: Uuid) -> Result<Vec<Resume>, sqlx::Error> {
    sqlx::query_as::<_, Resume>(&format!(
        "SELECT {RESUME_COLUMNS} FROM resumes WHERE author_id = $1 ORDER BY created_at DESC"
    ))
    .bind(author_id)
    .fetch_all(db)
    .await
}
