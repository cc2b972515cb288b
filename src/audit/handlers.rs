use axum::{
    extract::{Path, State},
    routing::get,
    Json, Router,
};
use tracing::instrument;
use uuid::Uuid;

use crate::{auth::extractors::CurrentUser, error::ApiError, state::AppState};

use super::repo::{self, AuditLog};

pub fn audit_routes() -> Router<AppState> {
    Router::new().route("/audit/:user_id", get(get_user_audit_logs))
}

#[instrument(skip(state, _user))]
async fn get_user_audit_logs(
    State(state): State<AppState>,
    CurrentUser(_user): CurrentUser,
    Path(user_id): Path<Uuid>,
) -> Result<Json<Vec<AuditLog>>, ApiError> {
    let logs = repo::list_by_performer(&state.db, user_id).await?;
    Ok(Json(logs))
}
