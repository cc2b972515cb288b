use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use tracing::instrument;
use uuid::Uuid;

use crate::{
    audit::{self, context::AuditContext, AuditAction},
    auth::extractors::CurrentUser,
    error::ApiError,
    pagination::{PageQuery, PageResponse},
    state::AppState,
};

use super::{
    dto::{DefenseDayCreate, ProjectTypeCreate, RegistrationCreate, SlotCreate, SlotFilter},
    repo::{self, DefenseDay, DefenseProjectType, DefenseRegistration, DefenseSlot},
    service,
};

pub fn defense_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/defense/project-types",
            post(create_project_type).get(list_project_types),
        )
        .route("/defense/project-types/:id", get(get_project_type))
        .route("/defense/days", post(create_day).get(list_days))
        .route("/defense/days/:id", get(get_day))
        .route("/defense/slots", post(create_slot).get(list_slots))
        .route("/defense/slots/:id", get(get_slot))
        .route(
            "/defense/registrations",
            post(create_registration).get(list_my_registrations),
        )
}

#[instrument(skip(state, user, payload))]
async fn create_project_type(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    ctx: AuditContext,
    Json(payload): Json<ProjectTypeCreate>,
) -> Result<(StatusCode, Json<DefenseProjectType>), ApiError> {
    if payload.name.trim().is_empty() {
        return Err(ApiError::Validation("name must not be empty".into()));
    }
    if repo::find_project_type_by_name(&state.db, &payload.name)
        .await?
        .is_some()
    {
        return Err(ApiError::conflict("project type name already exists"));
    }

    let created = repo::create_project_type(&state.db, &payload).await?;
    audit::record(
        &state.db,
        &ctx.with_actor(user.id),
        "defense_project_type",
        created.id,
        AuditAction::Insert,
        None::<&DefenseProjectType>,
        Some(&created),
    )
    .await;
    Ok((StatusCode::CREATED, Json(created)))
}

#[instrument(skip(state))]
async fn get_project_type(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<DefenseProjectType>, ApiError> {
    let found = repo::find_project_type(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::not_found("project type not found"))?;
    Ok(Json(found))
}

#[instrument(skip(state))]
async fn list_project_types(
    State(state): State<AppState>,
) -> Result<Json<Vec<DefenseProjectType>>, ApiError> {
    Ok(Json(repo::list_project_types(&state.db).await?))
}

#[instrument(skip(state, user, payload))]
async fn create_day(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    ctx: AuditContext,
    Json(payload): Json<DefenseDayCreate>,
) -> Result<(StatusCode, Json<DefenseDay>), ApiError> {
    if payload.max_slots < 1 {
        return Err(ApiError::Validation("max_slots must be at least 1".into()));
    }

    let created = repo::create_day(&state.db, &payload).await?;
    audit::record(
        &state.db,
        &ctx.with_actor(user.id),
        "defense_day",
        created.id,
        AuditAction::Insert,
        None::<&DefenseDay>,
        Some(&created),
    )
    .await;
    Ok((StatusCode::CREATED, Json(created)))
}

#[instrument(skip(state))]
async fn get_day(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<DefenseDay>, ApiError> {
    let found = repo::find_day(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::not_found("defense day not found"))?;
    Ok(Json(found))
}

#[instrument(skip(state))]
async fn list_days(
    State(state): State<AppState>,
    Query(page): Query<PageQuery>,
) -> Result<Json<PageResponse<DefenseDay>>, ApiError> {
    let page = page.normalized();
    let items = repo::list_days(&state.db, page.limit, page.offset()).await?;
    let total = repo::count_days(&state.db).await?;
    Ok(Json(PageResponse::new(items, total, &page)))
}

#[instrument(skip(state, user, payload))]
async fn create_slot(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    ctx: AuditContext,
    Json(payload): Json<SlotCreate>,
) -> Result<(StatusCode, Json<DefenseSlot>), ApiError> {
    let created = service::create_slot(&state.db, &payload).await?;
    audit::record(
        &state.db,
        &ctx.with_actor(user.id),
        "defense_slot",
        created.id,
        AuditAction::Insert,
        None::<&DefenseSlot>,
        Some(&created),
    )
    .await;
    Ok((StatusCode::CREATED, Json(created)))
}

#[instrument(skip(state))]
async fn get_slot(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<DefenseSlot>, ApiError> {
    let found = repo::find_slot(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::not_found("defense slot not found"))?;
    Ok(Json(found))
}

#[instrument(skip(state))]
async fn list_slots(
    State(state): State<AppState>,
    Query(filter): Query<SlotFilter>,
    Query(page): Query<PageQuery>,
) -> Result<Json<PageResponse<DefenseSlot>>, ApiError> {
    let page = page.normalized();
    let items = repo::list_slots_filtered(
        &state.db,
        filter.date,
        filter.project_type_id,
        page.limit,
        page.offset(),
    )
    .await?;
    let total = repo::count_slots_filtered(&state.db, filter.date, filter.project_type_id).await?;
    Ok(Json(PageResponse::new(items, total, &page)))
}

#[instrument(skip(state, user, payload))]
async fn create_registration(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    ctx: AuditContext,
    Json(payload): Json<RegistrationCreate>,
) -> Result<(StatusCode, Json<DefenseRegistration>), ApiError> {
    let registration = service::register(&state.db, user.id, payload.slot_id).await?;
    audit::record(
        &state.db,
        &ctx.with_actor(user.id),
        "defense_registration",
        registration.id,
        AuditAction::Insert,
        None::<&DefenseRegistration>,
        Some(&registration),
    )
    .await;
    Ok((StatusCode::CREATED, Json(registration)))
}

#[instrument(skip(state, user))]
async fn list_my_registrations(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<Vec<DefenseRegistration>>, ApiError> {
    Ok(Json(
        repo::list_registrations_by_user(&state.db, user.id).await?,
    ))
}
