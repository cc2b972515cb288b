use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post, put},
    Json, Router,
};
use tracing::instrument;
use uuid::Uuid;

use crate::{
    auth::extractors::CurrentUser,
    error::ApiError,
    pagination::{PageQuery, PageResponse},
    state::AppState,
};

use super::{
    dto::{
        MarkAllReadResponse, NotificationSettingsUpdate, SendToProjectRequest, SendToUserRequest,
        TemplateInfo,
    },
    repo::{self, Notification, NotificationSettings},
    service, templates,
};

pub fn notification_routes() -> Router<AppState> {
    Router::new()
        .route("/notifications", get(list_notifications))
        .route("/notifications/send", post(send_to_user))
        .route("/notifications/send-to-project", post(send_to_project))
        .route("/notifications/templates", get(list_templates))
        .route("/notifications/read-all", post(mark_all_read))
        .route(
            "/notifications/settings",
            get(get_settings).put(update_settings),
        )
        .route("/notifications/:id/read", post(mark_read))
}

#[instrument(skip(state, user))]
async fn list_notifications(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Query(page): Query<PageQuery>,
) -> Result<Json<PageResponse<Notification>>, ApiError> {
    let page = page.normalized();
    let items = repo::list_by_recipient(&state.db, user.id, page.limit, page.offset()).await?;
    let total = repo::count_by_recipient(&state.db, user.id).await?;
    Ok(Json(PageResponse::new(items, total, &page)))
}

#[instrument(skip(state, user, payload))]
async fn send_to_user(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(payload): Json<SendToUserRequest>,
) -> Result<(StatusCode, Json<Notification>), ApiError> {
    let notification = service::send_to_user(
        &state.db,
        payload.user_id,
        Some(user.id),
        &payload.template_key,
        payload.payload,
        payload.project_id,
    )
    .await?;
    Ok((StatusCode::CREATED, Json(notification)))
}

#[instrument(skip(state, user, payload))]
async fn send_to_project(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(payload): Json<SendToProjectRequest>,
) -> Result<(StatusCode, Json<Vec<Notification>>), ApiError> {
    let notifications = service::send_to_project(
        &state.db,
        payload.project_id,
        Some(user.id),
        &payload.template_key,
        payload.payload,
        payload.include_author,
    )
    .await?;
    Ok((StatusCode::CREATED, Json(notifications)))
}

#[instrument]
async fn list_templates() -> Json<Vec<TemplateInfo>> {
    Json(
        templates::TEMPLATES
            .iter()
            .map(|t| TemplateInfo {
                key: t.key,
                required: t.required,
            })
            .collect(),
    )
}

#[instrument(skip(state, user))]
async fn mark_read(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<Json<Notification>, ApiError> {
    let notification = repo::mark_read(&state.db, user.id, id)
        .await?
        .ok_or_else(|| ApiError::not_found("notification not found"))?;
    Ok(Json(notification))
}

#[instrument(skip(state, user))]
async fn mark_all_read(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<MarkAllReadResponse>, ApiError> {
    let marked_read = repo::mark_all_read(&state.db, user.id).await?;
    Ok(Json(MarkAllReadResponse { marked_read }))
}

#[instrument(skip(state, user))]
async fn get_settings(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<NotificationSettings>, ApiError> {
    repo::ensure_settings(&state.db, user.id).await?;
    let settings = repo::get_settings(&state.db, user.id)
        .await?
        .ok_or_else(|| ApiError::not_found("notification settings not found"))?;
    Ok(Json(settings))
}

#[instrument(skip(state, user, payload))]
async fn update_settings(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(payload): Json<NotificationSettingsUpdate>,
) -> Result<Json<NotificationSettings>, ApiError> {
    let settings = repo::update_settings(&state.db, user.id, &payload).await?;
    Ok(Json(settings))
}
