use serde::Serialize;
use sqlx::{FromRow, PgPool};
use time::OffsetDateTime;
use uuid::Uuid;

use super::dto::{ProjectCreate, ProjectUpdate};

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Project {
    pub id: Uuid,
    pub name: String,
    pub author_id: Uuid,
    pub description: Option<String>,
    pub max_participants: Option<i32>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct ProjectParticipation {
    pub id: Uuid,
    pub project_id: Uuid,
    pub participant_id: Uuid,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct ProjectResponse {
    pub id: Uuid,
    pub respondent_id: Uuid,
    pub project_id: Uuid,
    pub note: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

const PROJECT_COLUMNS: &str =
    "id, name, author_id, description, max_participants, created_at, updated_at";

pub async fn find_by_id(db: &PgPool, id: Uuid) -> Result<Option<Project>, sqlx::Error> {
    sqlx::query_as::<_, Project>(&format!(
        "SELECT {PROJECT_COLUMNS} FROM projects WHERE id = $1"
    ))
    .bind(id)
    .fetch_optional(db)
    .await
}

pub async fn create(
    db: &PgPool,
    author_id: Uuid,
    data: &ProjectCreate,
) -> Result<Project, sqlx::Error> {
    sqlx::query_as::<_, Project>(&format!(
        r#"
        INSERT INTO projects (name, author_id, description, max_participants)
        VALUES ($1, $2, $3, $4)
        RETURNING {PROJECT_COLUMNS}
        "#
    ))
    .bind(&data.name)
    .bind(author_id)
    .bind(&data.description)
    .bind(data.max_participants)
    .fetch_one(db)
    .await
}

pub async fn update(
    db: &PgPool,
    id: Uuid,
    data: &ProjectUpdate,
) -> Result<Option<Project>, sqlx::Error> {
    sqlx::query_as::<_, Project>(&format!(
        r#"
        UPDATE projects SET
            name = COALESCE($2, name),
            description = COALESCE($3, description),
            max_participants = COALESCE($4, max_participants),
            updated_at = now()
        WHERE id = $1
        RETURNING {PROJECT_COLUMNS}
        "#
    ))
    .bind(id)
    .bind(&data.name)
    .bind(&data.description)
    .bind(data.max_participants)
    .fetch_optional(db)
    .await
}

pub async fn delete(db: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM projects WHERE id = $1")
        .bind(id)
        .execute(db)
        .await?;
    Ok(result.rows_affected() > 0)
}

pub async fn list(db: &PgPool, limit: i64, offset: i64) -> Result<Vec<Project>, sqlx::Error> {
    sqlx::query_as::<_, Project>(&format!(
        "SELECT {PROJECT_COLUMNS} FROM projects ORDER BY created_at DESC LIMIT $1 OFFSET $2"
    ))
    .bind(limit)
    .bind(offset)
    .fetch_all(db)
    .await
}

pub async fn count(db: &PgPool) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM projects")
        .fetch_one(db)
        .await
}

pub async fn list_by_author(db: &PgPool, author_id: Uuid) -> Result<Vec<Project>, sqlx::Error> {
    sqlx::query_as::<_, Project>(&format!(
        "SELECT {PROJECT_COLUMNS} FROM projects WHERE author_id = $1 ORDER BY created_at DESC"
    ))
    .bind(author_id)
    .fetch_all(db)
    .await
}

// --- participations ---

pub async fn add_participant(
    db: &PgPool,
    project_id: Uuid,
    participant_id: Uuid,
) -> Result<ProjectParticipation, sqlx::Error> {
    sqlx::query_as::<_, ProjectParticipation>(
        r#"
        INSERT INTO project_participations (project_id, participant_id)
        VALUES ($1, $2)
        RETURNING id, project_id, participant_id, created_at
        "#,
    )
    .bind(project_id)
    .bind(participant_id)
    .fetch_one(db)
    .await
}

pub async fn find_participation(
    db: &PgPool,
    project_id: Uuid,
    participant_id: Uuid,
) -> Result<Option<ProjectParticipation>, sqlx::Error> {
    sqlx::query_as::<_, ProjectParticipation>(
        r#"
        SELECT id, project_id, participant_id, created_at
        FROM project_participations
        WHERE project_id = $1 AND participant_id = $2
        "#,
    )
    .bind(project_id)
    .bind(participant_id)
    .fetch_optional(db)
    .await
}

pub async fn remove_participant(
    db: &PgPool,
    project_id: Uuid,
    participant_id: Uuid,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        "DELETE FROM project_participations WHERE project_id = $1 AND participant_id = $2",
    )
    .bind(project_id)
    .bind(participant_id)
    .execute(db)
    .await?;
    Ok(result.rows_affected() > 0)
}

pub async fn list_participants(
    db: &PgPool,
    project_id: Uuid,
) -> Result<Vec<ProjectParticipation>, sqlx::Error> {
    sqlx::query_as::<_, ProjectParticipation>(
        r#"
        SELECT id, project_id, participant_id, created_at
        FROM project_participations
        WHERE project_id = $1
        ORDER BY created_at
        "#,
    )
    .bind(project_id)
    .fetch_all(db)
    .await
}

pub async fn participant_ids(db: &PgPool, project_id: Uuid) -> Result<Vec<Uuid>, sqlx::Error> {
    sqlx::query_scalar::<_, Uuid>(
        "SELECT participant_id FROM project_participations WHERE project_id = $1",
    )
    .bind(project_id)
    .fetch_all(db)
    .await
}

pub async fn count_participants(db: &PgPool, project_id: Uuid) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar::<_, i64>(
        "SELECT COUNT(*) FROM project_participations WHERE project_id = $1",
    )
    .bind(project_id)
    .fetch_one(db)
    .await
}

// --- responses ---

pub async fn create_response(
    db: &PgPool,
    project_id: Uuid,
    respondent_id: Uuid,
    note: Option<&str>,
) -> Result<ProjectResponse, sqlx::Error> {
    sqlx::query_as::<_, ProjectResponse>(
        r#"
        INSERT INTO responses (respondent_id, project_id, note)
        VALUES ($1, $2, $3)
        RETURNING id, respondent_id, project_id, note, created_at
        "#,
    )
    .bind(respondent_id)
    .bind(project_id)
    .bind(note)
    .fetch_one(db)
    .await
}

pub async fn list_responses(
    db: &PgPool,
    project_id: Uuid,
) -> Result<Vec<ProjectResponse>, sqlx::Error> {
    sqlx::query_as::<_, ProjectResponse>(
        r#"
        SELECT id, respondent_id, project_id, note, created_at
        FROM responses
        WHERE project_id = $1
        ORDER BY created_at DESC
        "#,
    )
    .bind(project_id)
    .fetch_all(db)
    .await
}
