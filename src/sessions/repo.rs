use serde::Serialize;
use sqlx::{FromRow, PgPool};
use time::OffsetDateTime;
use uuid::Uuid;

use super::dto::SessionUpdate;

/// Login session record, one row per device login.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Session {
    pub id: Uuid,
    pub user_id: Uuid,
    pub device_name: Option<String>,
    pub browser_name: Option<String>,
    pub browser_version: Option<String>,
    pub operating_system: Option<String>,
    pub device_type: Option<String>,
    pub ip_address: Option<String>,
    pub country: Option<String>,
    pub city: Option<String>,
    pub user_agent: Option<String>,
    pub fingerprint: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub last_activity: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339::option")]
    pub expires_at: Option<OffsetDateTime>,
    pub is_active: bool,
    pub is_current: bool,
}

#[derive(Debug, Clone, Default)]
pub struct NewSession {
    pub user_id: Uuid,
    pub device_name: Option<String>,
    pub browser_name: Option<String>,
    pub browser_version: Option<String>,
    pub operating_system: Option<String>,
    pub device_type: Option<String>,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
    pub expires_at: Option<OffsetDateTime>,
}

const SESSION_COLUMNS: &str = "id, user_id, device_name, browser_name, browser_version, \
                               operating_system, device_type, ip_address, country, city, \
                               user_agent, fingerprint, created_at, last_activity, expires_at, \
                               is_active, is_current";

pub async fn insert(db: &PgPool, data: &NewSession) -> Result<Session, sqlx::Error> {
    sqlx::query_as::<_, Session>(&format!(
        r#"
        INSERT INTO sessions (user_id, device_name, browser_name, browser_version,
                              operating_system, device_type, ip_address, user_agent, expires_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
        RETURNING {SESSION_COLUMNS}
        "#
    ))
    .bind(data.user_id)
    .bind(&data.device_name)
    .bind(&data.browser_name)
    .bind(&data.browser_version)
    .bind(&data.operating_system)
    .bind(&data.device_type)
    .bind(&data.ip_address)
    .bind(&data.user_agent)
    .bind(data.expires_at)
    .fetch_one(db)
    .await
}

pub async fn find_by_id(db: &PgPool, id: Uuid) -> Result<Option<Session>, sqlx::Error> {
    sqlx::query_as::<_, Session>(&format!(
        "SELECT {SESSION_COLUMNS} FROM sessions WHERE id = $1"
    ))
    .bind(id)
    .fetch_optional(db)
    .await
}

pub async fn list_active_by_user(db: &PgPool, user_id: Uuid) -> Result<Vec<Session>, sqlx::Error> {
    sqlx::query_as::<_, Session>(&format!(
        r#"
        SELECT {SESSION_COLUMNS} FROM sessions
        WHERE user_id = $1 AND is_active
        ORDER BY last_activity DESC
        "#
    ))
    .bind(user_id)
    .fetch_all(db)
    .await
}

pub async fn current_for_user(db: &PgPool, user_id: Uuid) -> Result<Option<Session>, sqlx::Error> {
    sqlx::query_as::<_, Session>(&format!(
        "SELECT {SESSION_COLUMNS} FROM sessions WHERE user_id = $1 AND is_current AND is_active"
    ))
    .bind(user_id)
    .fetch_optional(db)
    .await
}

/// Flag one session current, clearing the flag on every other session of the
/// user in the same transaction so the one-current invariant holds.
pub async fn set_current(db: &PgPool, user_id: Uuid, session_id: Uuid) -> Result<bool, sqlx::Error> {
    let mut tx = db.begin().await?;
    sqlx::query("UPDATE sessions SET is_current = false WHERE user_id = $1 AND id <> $2")
        .bind(user_id)
        .bind(session_id)
        .execute(&mut *tx)
        .await?;
    let result = sqlx::query(
        "UPDATE sessions SET is_current = true WHERE id = $1 AND user_id = $2 AND is_active",
    )
    .bind(session_id)
    .bind(user_id)
    .execute(&mut *tx)
    .await?;
    tx.commit().await?;
    Ok(result.rows_affected() > 0)
}

pub async fn update(
    db: &PgPool,
    id: Uuid,
    data: &SessionUpdate,
) -> Result<Option<Session>, sqlx::Error> {
    sqlx::query_as::<_, Session>(&format!(
        r#"
        UPDATE sessions SET
            device_name = COALESCE($2, device_name),
            browser_name = COALESCE($3, browser_name),
            browser_version = COALESCE($4, browser_version),
            operating_system = COALESCE($5, operating_system),
            device_type = COALESCE($6, device_type),
            is_active = COALESCE($7, is_active)
        WHERE id = $1
        RETURNING {SESSION_COLUMNS}
        "#
    ))
    .bind(id)
    .bind(&data.device_name)
    .bind(&data.browser_name)
    .bind(&data.browser_version)
    .bind(&data.operating_system)
    .bind(&data.device_type)
    .bind(data.is_active)
    .fetch_optional(db)
    .await
}

pub async fn touch_last_activity(db: &PgPool, id: Uuid) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE sessions SET last_activity = now() WHERE id = $1")
        .bind(id)
        .execute(db)
        .await?;
    Ok(())
}

pub async fn terminate(db: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
    let result =
        sqlx::query("UPDATE sessions SET is_active = false, is_current = false WHERE id = $1")
            .bind(id)
            .execute(db)
            .await?;
    Ok(result.rows_affected() > 0)
}

/// Terminate the given sessions, restricted to one user; returns the ids that
/// were actually terminated.
pub async fn terminate_many(
    db: &PgPool,
    user_id: Uuid,
    session_ids: &[Uuid],
) -> Result<Vec<Uuid>, sqlx::Error> {
    sqlx::query_scalar::<_, Uuid>(
        r#"
        UPDATE sessions SET is_active = false, is_current = false
        WHERE user_id = $1 AND id = ANY($2) AND is_active
        RETURNING id
        "#,
    )
    .bind(user_id)
    .bind(session_ids)
    .fetch_all(db)
    .await
}

pub async fn terminate_all_except(
    db: &PgPool,
    user_id: Uuid,
    keep: Uuid,
) -> Result<Vec<Uuid>, sqlx::Error> {
    sqlx::query_scalar::<_, Uuid>(
        r#"
        UPDATE sessions SET is_active = false, is_current = false
        WHERE user_id = $1 AND id <> $2 AND is_active
        RETURNING id
        "#,
    )
    .bind(user_id)
    .bind(keep)
    .fetch_all(db)
    .await
}

pub async fn terminate_all_for_user(db: &PgPool, user_id: Uuid) -> Result<u64, sqlx::Error> {
    let result = sqlx::query(
        "UPDATE sessions SET is_active = false, is_current = false WHERE user_id = $1 AND is_active",
    )
    .bind(user_id)
    .execute(db)
    .await?;
    Ok(result.rows_affected())
}

/// Sweep every session past its expiry; returns how many were deactivated.
pub async fn cleanup_expired(db: &PgPool) -> Result<u64, sqlx::Error> {
    let result = sqlx::query(
        r#"
        UPDATE sessions SET is_active = false, is_current = false
        WHERE is_active AND expires_at IS NOT NULL AND expires_at < now()
        "#,
    )
    .execute(db)
    .await?;
    Ok(result.rows_affected())
}

pub async fn count_for_user(db: &PgPool, user_id: Uuid) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM sessions WHERE user_id = $1")
        .bind(user_id)
        .fetch_one(db)
        .await
}

pub async fn count_active_for_user(db: &PgPool, user_id: Uuid) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar::<_, i64>(
        "SELECT COUNT(*) FROM sessions WHERE user_id = $1 AND is_active",
    )
    .bind(user_id)
    .fetch_one(db)
    .await
}
