use serde::Serialize;
use sqlx::{FromRow, PgPool};
use time::OffsetDateTime;
use uuid::Uuid;

use super::dto::{CriteriaCreate, CriteriaUpdate};

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct GradingCriteria {
    pub id: Uuid,
    pub project_type_id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub max_score: i32,
    pub weight: i32,
    pub order_index: i32,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

const COLUMNS: &str =
    "id, project_type_id, name, description, max_score, weight, order_index, created_at, updated_at";

pub async fn create(db: &PgPool, data: &CriteriaCreate) -> Result<GradingCriteria, sqlx::Error> {
    sqlx::query_as::<_, GradingCriteria>(&format!(
        r#"
        INSERT INTO grading_criteria (project_type_id, name, description, max_score, weight, order_index)
        VALUES ($1, $2, $3, $4, $5, $6)
        RETURNING {COLUMNS}
        "#
    ))
    .bind(data.project_type_id)
    .bind(&data.name)
    .bind(&data.description)
    .bind(data.max_score)
    .bind(data.weight)
    .bind(data.order_index)
    .fetch_one(db)
    .await
}

pub async fn find_by_id(db: &PgPool, id: Uuid) -> Result<Option<GradingCriteria>, sqlx::Error> {
    sqlx::query_as::<_, GradingCriteria>(&format!(
        "SELECT {COLUMNS} FROM grading_criteria WHERE id = $1"
    ))
    .bind(id)
    .fetch_optional(db)
    .await
}

pub async fn find_by_type_and_name(
    db: &PgPool,
    project_type_id: Uuid,
    name: &str,
) -> Result<Option<GradingCriteria>, sqlx::Error> {
    sqlx::query_as::<_, GradingCriteria>(&format!(
        "SELECT {COLUMNS} FROM grading_criteria WHERE project_type_id = $1 AND name = $2"
    ))
    .bind(project_type_id)
    .bind(name)
    .fetch_optional(db)
    .await
}

pub async fn list_by_project_type(
    db: &PgPool,
    project_type_id: Uuid,
) -> Result<Vec<GradingCriteria>, sqlx::Error> {
    sqlx::query_as::<_, GradingCriteria>(&format!(
        "SELECT {COLUMNS} FROM grading_criteria WHERE project_type_id = $1 ORDER BY order_index, name"
    ))
    .bind(project_type_id)
    .fetch_all(db)
    .await
}

pub async fn update(
    db: &PgPool,
    id: Uuid,
    data: &CriteriaUpdate,
) -> Result<Option<GradingCriteria>, sqlx::Error> {
    sqlx::query_as::<_, GradingCriteria>(&format!(
        r#"
        UPDATE grading_criteria SET
            name = COALESCE($2, name),
            description = COALESCE($3, description),
            max_score = COALESCE($4, max_score),
            weight = COALESCE($5, weight),
            order_index = COALESCE($6, order_index),
            updated_at = now()
        WHERE id = $1
        RETURNING {COLUMNS}
        "#
    ))
    .bind(id)
    .bind(&data.name)
    .bind(&data.description)
    .bind(data.max_score)
    .bind(data.weight)
    .bind(data.order_index)
    .fetch_optional(db)
    .await
}

pub async fn delete(db: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM grading_criteria WHERE id = $1")
        .bind(id)
        .execute(db)
        .await?;
    Ok(result.rows_affected() > 0)
}
