use axum::Router;
use serde::Serialize;
use sqlx::PgPool;
use tracing::warn;
use uuid::Uuid;

use crate::state::AppState;

pub mod context;
pub mod handlers;
pub mod repo;

pub use context::AuditContext;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuditAction {
    Insert,
    Update,
    Delete,
}

impl AuditAction {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Insert => "insert",
            Self::Update => "update",
            Self::Delete => "delete",
        }
    }
}

/// Append an audit record after a successful repository write.
///
/// Failures are logged and swallowed: the audit trail must never block the
/// primary operation. Timestamps inside the snapshots serialize as RFC 3339.
pub async fn record<T: Serialize>(
    db: &PgPool,
    ctx: &AuditContext,
    entity_type: &str,
    entity_id: Uuid,
    action: AuditAction,
    old: Option<&T>,
    new: Option<&T>,
) {
    let snapshot = |v: Option<&T>| v.and_then(|v| serde_json::to_value(v).ok());
    let old_values = snapshot(old);
    let new_values = snapshot(new);

    if let Err(e) = repo::insert(
        db,
        entity_type,
        entity_id,
        action.as_str(),
        old_values.as_ref(),
        new_values.as_ref(),
        ctx.actor_id,
        ctx.ip_address.as_deref(),
        ctx.user_agent.as_deref(),
    )
    .await
    {
        warn!(
            error = %e,
            entity_type,
            entity_id = %entity_id,
            action = action.as_str(),
            "audit write failed"
        );
    }
}

pub fn router() -> Router<AppState> {
    handlers::audit_routes()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn actions_serialize_to_lowercase_verbs() {
        assert_eq!(AuditAction::Insert.as_str(), "insert");
        assert_eq!(AuditAction::Update.as_str(), "update");
        assert_eq!(AuditAction::Delete.as_str(), "delete");
    }
}
