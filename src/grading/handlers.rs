use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use tracing::instrument;
use uuid::Uuid;

use crate::{
    audit::{self, context::AuditContext, AuditAction},
    auth::extractors::CurrentUser,
    defense,
    error::ApiError,
    state::AppState,
};

use super::{
    dto::{CriteriaCreate, CriteriaListResponse, CriteriaUpdate},
    repo::{self, GradingCriteria},
};

pub fn grading_routes() -> Router<AppState> {
    Router::new()
        .route("/grading/criteria", post(create_criteria))
        .route(
            "/grading/criteria/:id",
            get(get_criteria).put(update_criteria).delete(delete_criteria),
        )
        .route(
            "/grading/criteria/by-project-type/:project_type_id",
            get(list_criteria),
        )
}

#[instrument(skip(state, user, payload))]
async fn create_criteria(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    ctx: AuditContext,
    Json(payload): Json<CriteriaCreate>,
) -> Result<(StatusCode, Json<GradingCriteria>), ApiError> {
    if payload.name.trim().is_empty() {
        return Err(ApiError::Validation("name must not be empty".into()));
    }
    if payload.max_score < 1 {
        return Err(ApiError::Validation("max_score must be at least 1".into()));
    }

    defense::repo::find_project_type(&state.db, payload.project_type_id)
        .await?
        .ok_or_else(|| ApiError::not_found("project type not found"))?;

    if repo::find_by_type_and_name(&state.db, payload.project_type_id, &payload.name)
        .await?
        .is_some()
    {
        return Err(ApiError::conflict(
            "criteria name already exists for this project type",
        ));
    }

    let created = repo::create(&state.db, &payload).await?;
    audit::record(
        &state.db,
        &ctx.with_actor(user.id),
        "grading_criteria",
        created.id,
        AuditAction::Insert,
        None::<&GradingCriteria>,
        Some(&created),
    )
    .await;
    Ok((StatusCode::CREATED, Json(created)))
}

#[instrument(skip(state))]
async fn get_criteria(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<GradingCriteria>, ApiError> {
    let found = repo::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::not_found("grading criteria not found"))?;
    Ok(Json(found))
}

#[instrument(skip(state))]
async fn list_criteria(
    State(state): State<AppState>,
    Path(project_type_id): Path<Uuid>,
) -> Result<Json<CriteriaListResponse>, ApiError> {
    defense::repo::find_project_type(&state.db, project_type_id)
        .await?
        .ok_or_else(|| ApiError::not_found("project type not found"))?;

    let items = repo::list_by_project_type(&state.db, project_type_id).await?;
    let total_max_score = items.iter().map(|c| i64::from(c.max_score)).sum();
    Ok(Json(CriteriaListResponse {
        items,
        total_max_score,
    }))
}

#[instrument(skip(state, user, payload))]
async fn update_criteria(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    ctx: AuditContext,
    Path(id): Path<Uuid>,
    Json(payload): Json<CriteriaUpdate>,
) -> Result<Json<GradingCriteria>, ApiError> {
    let before = repo::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::not_found("grading criteria not found"))?;

    if let Some(name) = &payload.name {
        if name.trim().is_empty() {
            return Err(ApiError::Validation("name must not be empty".into()));
        }
        if name != &before.name
            && repo::find_by_type_and_name(&state.db, before.project_type_id, name)
                .await?
                .is_some()
        {
            return Err(ApiError::conflict(
                "criteria name already exists for this project type",
            ));
        }
    }
    if matches!(payload.max_score, Some(score) if score < 1) {
        return Err(ApiError::Validation("max_score must be at least 1".into()));
    }

    let updated = repo::update(&state.db, id, &payload)
        .await?
        .ok_or_else(|| ApiError::not_found("grading criteria not found"))?;
    audit::record(
        &state.db,
        &ctx.with_actor(user.id),
        "grading_criteria",
        id,
        AuditAction::Update,
        Some(&before),
        Some(&updated),
    )
    .await;
    Ok(Json(updated))
}

#[instrument(skip(state, user))]
async fn delete_criteria(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    ctx: AuditContext,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    let before = repo::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::not_found("grading criteria not found"))?;

    repo::delete(&state.db, id).await?;
    audit::record(
        &state.db,
        &ctx.with_actor(user.id),
        "grading_criteria",
        id,
        AuditAction::Delete,
        Some(&before),
        None::<&GradingCriteria>,
    )
    .await;
    Ok(StatusCode::NO_CONTENT)
}
