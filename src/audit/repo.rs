use serde::Serialize;
use sqlx::{FromRow, PgPool};
use time::OffsetDateTime;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct AuditLog {
    pub id: Uuid,
    pub entity_type: String,
    pub entity_id: Uuid,
    pub action: String,
    pub old_values: Option<serde_json::Value>,
    pub new_values: Option<serde_json::Value>,
    pub performed_by: Option<Uuid>,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub performed_at: OffsetDateTime,
}

#[allow(clippy::too_many_arguments)]
pub async fn insert(
    db: &PgPool,
    entity_type: &str,
    entity_id: Uuid,
    action: &str,
    old_values: Option<&serde_json::Value>,
    new_values: Option<&serde_json::Value>,
    performed_by: Option<Uuid>,
    ip_address: Option<&str>,
    user_agent: Option<&str>,
) -> Result<AuditLog, sqlx::Error> {
    sqlx::query_as::<_, AuditLog>(
        r#"
        INSERT INTO audit_logs
            (entity_type, entity_id, action, old_values, new_values,
             performed_by, ip_address, user_agent)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
        RETURNING id, entity_type, entity_id, action, old_values, new_values,
                  performed_by, ip_address, user_agent, performed_at
        "#,
    )
    .bind(entity_type)
    .bind(entity_id)
    .bind(action)
    .bind(old_values)
    .bind(new_values)
    .bind(performed_by)
    .bind(ip_address)
    .bind(user_agent)
    .fetch_one(db)
    .await
}

pub async fn list_by_performer(
    db: &PgPool,
    user_id: Uuid,
) -> Result<Vec<AuditLog>, sqlx::Error> {
    sqlx::query_as::<_, AuditLog>(
        r#"
        SELECT id, entity_type, entity_id, action, old_values, new_values,
               performed_by, ip_address, user_agent, performed_at
        FROM audit_logs
        WHERE performed_by = $1
        ORDER BY performed_at DESC
        "#,
    )
    .bind(user_id)
    .fetch_all(db)
    .await
}
