use axum::{
    extract::{Path, State},
    routing::{get, post, put},
    Json, Router,
};
use tracing::{info, instrument};
use uuid::Uuid;

use crate::{auth::extractors::CurrentUser, error::ApiError, state::AppState};

use super::{
    dto::{
        SessionCleanupResponse, SessionDigest, SessionListResponse, SessionStats,
        SessionSummary, SessionTerminateRequest, SessionTerminateResponse, SessionUpdate,
        SessionValidateResponse,
    },
    repo::{self, Session},
    service,
};

pub fn session_routes() -> Router<AppState> {
    Router::new()
        .route("/sessions", get(list_sessions))
        .route("/sessions/stats", get(session_stats))
        .route("/sessions/summary", get(session_summary))
        .route("/sessions/terminate", post(terminate_sessions))
        .route("/sessions/cleanup", post(cleanup_sessions))
        .route("/sessions/set-current/:id", post(set_current_session))
        .route("/sessions/validate/:id", post(validate_session))
        .route("/sessions/:id", get(get_session))
        .route("/sessions/:id", put(update_session))
}

/// Loads a session, hiding other users' sessions behind a 404.
async fn owned_session(
    state: &AppState,
    id: Uuid,
    current_user_id: Uuid,
) -> Result<Session, ApiError> {
    let session = repo::find_by_id(&state.db, id)
        .await?
        .filter(|s| s.user_id == current_user_id)
        .ok_or_else(|| ApiError::not_found("session not found"))?;
    Ok(session)
}

#[instrument(skip(state, user))]
async fn list_sessions(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<SessionListResponse>, ApiError> {
    let sessions = repo::list_active_by_user(&state.db, user.id).await?;
    let current = repo::current_for_user(&state.db, user.id).await?;
    Ok(Json(SessionListResponse {
        total: sessions.len(),
        current_session_id: current.map(|s| s.id),
        sessions,
    }))
}

#[instrument(skip(state, user))]
async fn session_stats(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<SessionStats>, ApiError> {
    let total_sessions = repo::count_for_user(&state.db, user.id).await?;
    let active_sessions = repo::count_active_for_user(&state.db, user.id).await?;
    let current_session = repo::current_for_user(&state.db, user.id).await?;
    Ok(Json(SessionStats {
        total_sessions,
        active_sessions,
        current_session,
    }))
}

#[instrument(skip(state, user))]
async fn session_summary(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<SessionSummary>, ApiError> {
    let sessions = repo::list_active_by_user(&state.db, user.id).await?;
    let current = repo::current_for_user(&state.db, user.id).await?;
    Ok(Json(SessionSummary {
        total_active: sessions.len(),
        current_session_id: current.map(|s| s.id),
        sessions: sessions.iter().map(SessionDigest::from).collect(),
    }))
}

#[instrument(skip(state, user))]
async fn get_session(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<Json<Session>, ApiError> {
    Ok(Json(owned_session(&state, id, user.id).await?))
}

#[instrument(skip(state, user, payload))]
async fn update_session(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<SessionUpdate>,
) -> Result<Json<Session>, ApiError> {
    owned_session(&state, id, user.id).await?;
    let updated = repo::update(&state.db, id, &payload)
        .await?
        .ok_or_else(|| ApiError::not_found("session not found"))?;
    Ok(Json(updated))
}

#[instrument(skip(state, user, payload))]
async fn terminate_sessions(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(payload): Json<SessionTerminateRequest>,
) -> Result<Json<SessionTerminateResponse>, ApiError> {
    let terminated = if payload.terminate_all_except_current {
        let current = repo::current_for_user(&state.db, user.id)
            .await?
            .ok_or_else(|| ApiError::BusinessRule("no current session to keep".into()))?;
        repo::terminate_all_except(&state.db, user.id, current.id).await?
    } else {
        if payload.session_ids.is_empty() {
            return Err(ApiError::Validation("session_ids must not be empty".into()));
        }
        repo::terminate_many(&state.db, user.id, &payload.session_ids).await?
    };

    info!(user_id = %user.id, count = terminated.len(), "sessions terminated");
    let message = format!("terminated {} sessions", terminated.len());
    Ok(Json(SessionTerminateResponse {
        terminated_sessions: terminated,
        message,
    }))
}

#[instrument(skip(state, user))]
async fn set_current_session(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, ApiError> {
    owned_session(&state, id, user.id).await?;

    if !repo::set_current(&state.db, user.id, id).await? {
        return Err(ApiError::BusinessRule("failed to set current session".into()));
    }
    Ok(Json(serde_json::json!({
        "message": "current session updated"
    })))
}

#[instrument(skip(state, user))]
async fn validate_session(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<Json<SessionValidateResponse>, ApiError> {
    let is_valid = service::validate_session(&state.db, id, user.id).await?;
    Ok(Json(SessionValidateResponse { is_valid }))
}

#[instrument(skip(state, _user))]
async fn cleanup_sessions(
    State(state): State<AppState>,
    CurrentUser(_user): CurrentUser,
) -> Result<Json<SessionCleanupResponse>, ApiError> {
    let cleaned_sessions = repo::cleanup_expired(&state.db).await?;
    info!(cleaned_sessions, "expired sessions cleaned up");
    Ok(Json(SessionCleanupResponse { cleaned_sessions }))
}
