use serde::Serialize;
use sqlx::{FromRow, PgPool};
use time::OffsetDateTime;
use uuid::Uuid;

use super::dto::NotificationSettingsUpdate;

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Notification {
    pub id: Uuid,
    pub recipient_id: Uuid,
    pub sender_id: Option<Uuid>,
    pub project_id: Option<Uuid>,
    pub kind: String,
    pub status: String,
    pub title: String,
    pub body: String,
    pub channels: Vec<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339::option")]
    pub sent_at: Option<OffsetDateTime>,
    #[serde(with = "time::serde::rfc3339::option")]
    pub read_at: Option<OffsetDateTime>,
}

#[derive(Debug, Clone)]
pub struct NewNotification {
    pub recipient_id: Uuid,
    pub sender_id: Option<Uuid>,
    pub project_id: Option<Uuid>,
    pub kind: String,
    pub title: String,
    pub body: String,
    pub channels: Vec<String>,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct NotificationSettings {
    pub user_id: Uuid,
    pub email_enabled: bool,
    pub telegram_enabled: bool,
    pub in_app_enabled: bool,
    pub project_invitation_enabled: bool,
    pub join_request_enabled: bool,
    pub join_response_enabled: bool,
    pub project_announcement_enabled: bool,
    pub system_alert_enabled: bool,
}

const NOTIFICATION_COLUMNS: &str = "id, recipient_id, sender_id, project_id, kind, status, \
                                    title, body, channels, created_at, sent_at, read_at";

const SETTINGS_COLUMNS: &str = "user_id, email_enabled, telegram_enabled, in_app_enabled, \
                                project_invitation_enabled, join_request_enabled, \
                                join_response_enabled, project_announcement_enabled, \
                                system_alert_enabled";

pub async fn insert_one(db: &PgPool, data: &NewNotification) -> Result<Notification, sqlx::Error> {
    sqlx::query_as::<_, Notification>(&format!(
        r#"
        INSERT INTO notifications (recipient_id, sender_id, project_id, kind, status,
                                   title, body, channels)
        VALUES ($1, $2, $3, $4, 'pending', $5, $6, $7)
        RETURNING {NOTIFICATION_COLUMNS}
        "#
    ))
    .bind(data.recipient_id)
    .bind(data.sender_id)
    .bind(data.project_id)
    .bind(&data.kind)
    .bind(&data.title)
    .bind(&data.body)
    .bind(&data.channels)
    .fetch_one(db)
    .await
}

/// Bulk insert for project broadcasts; one transaction for the whole fan-out.
pub async fn insert_many(
    db: &PgPool,
    batch: &[NewNotification],
) -> Result<Vec<Notification>, sqlx::Error> {
    let mut tx = db.begin().await?;
    let mut created = Vec::with_capacity(batch.len());
    for data in batch {
        let notification = sqlx::query_as::<_, Notification>(&format!(
            r#"
            INSERT INTO notifications (recipient_id, sender_id, project_id, kind, status,
                                       title, body, channels)
            VALUES ($1, $2, $3, $4, 'pending', $5, $6, $7)
            RETURNING {NOTIFICATION_COLUMNS}
            "#
        ))
        .bind(data.recipient_id)
        .bind(data.sender_id)
        .bind(data.project_id)
        .bind(&data.kind)
        .bind(&data.title)
        .bind(&data.body)
        .bind(&data.channels)
        .fetch_one(&mut *tx)
        .await?;
        created.push(notification);
    }
    tx.commit().await?;
    Ok(created)
}

pub async fn list_by_recipient(
    db: &PgPool,
    recipient_id: Uuid,
    limit: i64,
    offset: i64,
) -> Result<Vec<Notification>, sqlx::Error> {
    sqlx::query_as::<_, Notification>(&format!(
        r#"
        SELECT {NOTIFICATION_COLUMNS} FROM notifications
        WHERE recipient_id = $1
        ORDER BY created_at DESC
        LIMIT $2 OFFSET $3
        "#
    ))
    .bind(recipient_id)
    .bind(limit)
    .bind(offset)
    .fetch_all(db)
    .await
}

pub async fn count_by_recipient(db: &PgPool, recipient_id: Uuid) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM notifications WHERE recipient_id = $1")
        .bind(recipient_id)
        .fetch_one(db)
        .await
}

pub async fn mark_read(
    db: &PgPool,
    recipient_id: Uuid,
    id: Uuid,
) -> Result<Option<Notification>, sqlx::Error> {
    sqlx::query_as::<_, Notification>(&format!(
        r#"
        UPDATE notifications SET read_at = COALESCE(read_at, now())
        WHERE id = $1 AND recipient_id = $2
        RETURNING {NOTIFICATION_COLUMNS}
        "#
    ))
    .bind(id)
    .bind(recipient_id)
    .fetch_optional(db)
    .await
}

pub async fn mark_all_read(db: &PgPool, recipient_id: Uuid) -> Result<u64, sqlx::Error> {
    let result = sqlx::query(
        "UPDATE notifications SET read_at = now() WHERE recipient_id = $1 AND read_at IS NULL",
    )
    .bind(recipient_id)
    .execute(db)
    .await?;
    Ok(result.rows_affected())
}

// --- settings ---

/// Seed a default settings row; a no-op when the user already has one.
pub async fn ensure_settings(db: &PgPool, user_id: Uuid) -> Result<(), sqlx::Error> {
    sqlx::query("INSERT INTO notification_settings (user_id) VALUES ($1) ON CONFLICT DO NOTHING")
        .bind(user_id)
        .execute(db)
        .await?;
    Ok(())
}

pub async fn get_settings(
    db: &PgPool,
    user_id: Uuid,
) -> Result<Option<NotificationSettings>, sqlx::Error> {
    sqlx::query_as::<_, NotificationSettings>(&format!(
        "SELECT {SETTINGS_COLUMNS} FROM notification_settings WHERE user_id = $1"
    ))
    .bind(user_id)
    .fetch_optional(db)
    .await
}

pub async fn update_settings(
    db: &PgPool,
    user_id: Uuid,
    data: &NotificationSettingsUpdate,
) -> Result<NotificationSettings, sqlx::Error> {
    ensure_settings(db, user_id).await?;
    sqlx::query_as::<_, NotificationSettings>(&format!(
        r#"
        UPDATE notification_settings SET
            email_enabled = COALESCE($2, email_enabled),
            telegram_enabled = COALESCE($3, telegram_enabled),
            in_app_enabled = COALESCE($4, in_app_enabled),
            project_invitation_enabled = COALESCE($5, project_invitation_enabled),
            join_request_enabled = COALESCE($6, join_request_enabled),
            join_response_enabled = COALESCE($7, join_response_enabled),
            project_announcement_enabled = COALESCE($8, project_announcement_enabled),
            system_alert_enabled = COALESCE($9, system_alert_enabled)
        WHERE user_id = $1
        RETURNING {SETTINGS_COLUMNS}
        "#
    ))
    .bind(user_id)
    .bind(data.email_enabled)
    .bind(data.telegram_enabled)
    .bind(data.in_app_enabled)
    .bind(data.project_invitation_enabled)
    .bind(data.join_request_enabled)
    .bind(data.join_response_enabled)
    .bind(data.project_announcement_enabled)
    .bind(data.system_alert_enabled)
    .fetch_one(db)
    .await
}
