use serde::Serialize;
use sqlx::{FromRow, PgPool, Postgres, Transaction};
use time::{Date, OffsetDateTime, Time};
use uuid::Uuid;

use super::dto::{DefenseDayCreate, ProjectTypeCreate};

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct DefenseProjectType {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct DefenseDay {
    pub id: Uuid,
    pub date: Date,
    pub max_slots: i32,
    pub first_slot_time: Time,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct DefenseSlot {
    pub id: Uuid,
    pub defense_day_id: Uuid,
    pub slot_index: i32,
    pub project_type_id: Uuid,
    pub title: String,
    #[serde(with = "time::serde::rfc3339")]
    pub start_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub end_at: OffsetDateTime,
    pub location: Option<String>,
    pub capacity: i32,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct DefenseRegistration {
    pub id: Uuid,
    pub slot_id: Uuid,
    pub user_id: Uuid,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

const SLOT_COLUMNS: &str = "id, defense_day_id, slot_index, project_type_id, title, start_at, \
                            end_at, location, capacity, created_at, updated_at";

// --- project types ---

pub async fn create_project_type(
    db: &PgPool,
    data: &ProjectTypeCreate,
) -> Result<DefenseProjectType, sqlx::Error> {
    sqlx::query_as::<_, DefenseProjectType>(
        r#"
        INSERT INTO defense_project_types (name, description)
        VALUES ($1, $2)
        RETURNING id, name, description, created_at
        "#,
    )
    .bind(&data.name)
    .bind(&data.description)
    .fetch_one(db)
    .await
}

pub async fn find_project_type(
    db: &PgPool,
    id: Uuid,
) -> Result<Option<DefenseProjectType>, sqlx::Error> {
    sqlx::query_as::<_, DefenseProjectType>(
        "SELECT id, name, description, created_at FROM defense_project_types WHERE id = $1",
    )
    .bind(id)
    .fetch_optional(db)
    .await
}

pub async fn find_project_type_by_name(
    db: &PgPool,
    name: &str,
) -> Result<Option<DefenseProjectType>, sqlx::Error> {
    sqlx::query_as::<_, DefenseProjectType>(
        "SELECT id, name, description, created_at FROM defense_project_types WHERE name = $1",
    )
    .bind(name)
    .fetch_optional(db)
    .await
}

pub async fn list_project_types(db: &PgPool) -> Result<Vec<DefenseProjectType>, sqlx::Error> {
    sqlx::query_as::<_, DefenseProjectType>(
        "SELECT id, name, description, created_at FROM defense_project_types ORDER BY name",
    )
    .fetch_all(db)
    .await
}

// --- days ---

pub async fn create_day(db: &PgPool, data: &DefenseDayCreate) -> Result<DefenseDay, sqlx::Error> {
    sqlx::query_as::<_, DefenseDay>(
        r#"
        INSERT INTO defense_days (date, max_slots, first_slot_time)
        VALUES ($1, $2, $3)
        RETURNING id, date, max_slots, first_slot_time, created_at, updated_at
        "#,
    )
    .bind(data.date)
    .bind(data.max_slots)
    .bind(data.first_slot_time)
    .fetch_one(db)
    .await
}

pub async fn find_day(db: &PgPool, id: Uuid) -> Result<Option<DefenseDay>, sqlx::Error> {
    sqlx::query_as::<_, DefenseDay>(
        r#"
        SELECT id, date, max_slots, first_slot_time, created_at, updated_at
        FROM defense_days WHERE id = $1
        "#,
    )
    .bind(id)
    .fetch_optional(db)
    .await
}

pub async fn list_days(db: &PgPool, limit: i64, offset: i64) -> Result<Vec<DefenseDay>, sqlx::Error> {
    sqlx::query_as::<_, DefenseDay>(
        r#"
        SELECT id, date, max_slots, first_slot_time, created_at, updated_at
        FROM defense_days ORDER BY date LIMIT $1 OFFSET $2
        "#,
    )
    .bind(limit)
    .bind(offset)
    .fetch_all(db)
    .await
}

pub async fn count_days(db: &PgPool) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM defense_days")
        .fetch_one(db)
        .await
}

// --- slots ---

#[allow(clippy::too_many_arguments)]
pub async fn create_slot(
    db: &PgPool,
    defense_day_id: Uuid,
    slot_index: i32,
    project_type_id: Uuid,
    title: &str,
    start_at: OffsetDateTime,
    end_at: OffsetDateTime,
    location: Option<&str>,
    capacity: i32,
) -> Result<DefenseSlot, sqlx::Error> {
    sqlx::query_as::<_, DefenseSlot>(&format!(
        r#"
        INSERT INTO defense_slots (defense_day_id, slot_index, project_type_id, title,
                                   start_at, end_at, location, capacity)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
        RETURNING {SLOT_COLUMNS}
        "#
    ))
    .bind(defense_day_id)
    .bind(slot_index)
    .bind(project_type_id)
    .bind(title)
    .bind(start_at)
    .bind(end_at)
    .bind(location)
    .bind(capacity)
    .fetch_one(db)
    .await
}

pub async fn find_slot(db: &PgPool, id: Uuid) -> Result<Option<DefenseSlot>, sqlx::Error> {
    sqlx::query_as::<_, DefenseSlot>(&format!(
        "SELECT {SLOT_COLUMNS} FROM defense_slots WHERE id = $1"
    ))
    .bind(id)
    .fetch_optional(db)
    .await
}

pub async fn find_slot_by_day_and_index(
    db: &PgPool,
    defense_day_id: Uuid,
    slot_index: i32,
) -> Result<Option<DefenseSlot>, sqlx::Error> {
    sqlx::query_as::<_, DefenseSlot>(&format!(
        "SELECT {SLOT_COLUMNS} FROM defense_slots WHERE defense_day_id = $1 AND slot_index = $2"
    ))
    .bind(defense_day_id)
    .bind(slot_index)
    .fetch_optional(db)
    .await
}

pub async fn list_slots_filtered(
    db: &PgPool,
    date: Option<Date>,
    project_type_id: Option<Uuid>,
    limit: i64,
    offset: i64,
) -> Result<Vec<DefenseSlot>, sqlx::Error> {
    sqlx::query_as::<_, DefenseSlot>(
        r#"
        SELECT s.id, s.defense_day_id, s.slot_index, s.project_type_id, s.title, s.start_at,
               s.end_at, s.location, s.capacity, s.created_at, s.updated_at
        FROM defense_slots s
        JOIN defense_days d ON d.id = s.defense_day_id
        WHERE ($1::date IS NULL OR d.date = $1)
          AND ($2::uuid IS NULL OR s.project_type_id = $2)
        ORDER BY s.start_at
        LIMIT $3 OFFSET $4
        "#,
    )
    .bind(date)
    .bind(project_type_id)
    .bind(limit)
    .bind(offset)
    .fetch_all(db)
    .await
}

pub async fn count_slots_filtered(
    db: &PgPool,
    date: Option<Date>,
    project_type_id: Option<Uuid>,
) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar::<_, i64>(
        r#"
        SELECT COUNT(*)
        FROM defense_slots s
        JOIN defense_days d ON d.id = s.defense_day_id
        WHERE ($1::date IS NULL OR d.date = $1)
          AND ($2::uuid IS NULL OR s.project_type_id = $2)
        "#,
    )
    .bind(date)
    .bind(project_type_id)
    .fetch_one(db)
    .await
}

// --- registrations ---

/// Lock the slot row for the duration of a registration transaction so the
/// capacity check and the insert are serialized.
pub async fn lock_slot(
    tx: &mut Transaction<'_, Postgres>,
    slot_id: Uuid,
) -> Result<Option<DefenseSlot>, sqlx::Error> {
    sqlx::query_as::<_, DefenseSlot>(&format!(
        "SELECT {SLOT_COLUMNS} FROM defense_slots WHERE id = $1 FOR UPDATE"
    ))
    .bind(slot_id)
    .fetch_optional(&mut **tx)
    .await
}

pub async fn registration_exists(
    tx: &mut Transaction<'_, Postgres>,
    slot_id: Uuid,
    user_id: Uuid,
) -> Result<bool, sqlx::Error> {
    sqlx::query_scalar::<_, bool>(
        "SELECT EXISTS(SELECT 1 FROM defense_registrations WHERE slot_id = $1 AND user_id = $2)",
    )
    .bind(slot_id)
    .bind(user_id)
    .fetch_one(&mut **tx)
    .await
}

pub async fn count_registrations(
    tx: &mut Transaction<'_, Postgres>,
    slot_id: Uuid,
) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM defense_registrations WHERE slot_id = $1")
        .bind(slot_id)
        .fetch_one(&mut **tx)
        .await
}

pub async fn insert_registration(
    tx: &mut Transaction<'_, Postgres>,
    slot_id: Uuid,
    user_id: Uuid,
) -> Result<DefenseRegistration, sqlx::Error> {
    sqlx::query_as::<_, DefenseRegistration>(
        r#"
        INSERT INTO defense_registrations (slot_id, user_id)
        VALUES ($1, $2)
        RETURNING id, slot_id, user_id, created_at
        "#,
    )
    .bind(slot_id)
    .bind(user_id)
    .fetch_one(&mut **tx)
    .await
}

pub async fn list_registrations_by_user(
    db: &PgPool,
    user_id: Uuid,
) -> Result<Vec<DefenseRegistration>, sqlx::Error> {
    sqlx::query_as::<_, DefenseRegistration>(
        r#"
        SELECT id, slot_id, user_id, created_at
        FROM defense_registrations
        WHERE user_id = $1
        ORDER BY created_at DESC
        "#,
    )
    .bind(user_id)
    .fetch_all(db)
    .await
}
