use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{delete, get, post, put},
    Json, Router,
};
use tracing::{info, instrument};
use uuid::Uuid;

use crate::{
    audit::{self, AuditAction, AuditContext},
    auth::extractors::CurrentUser,
    error::ApiError,
    pagination::{PageQuery, PageResponse},
    state::AppState,
};

use super::{
    dto::{ProjectCreate, ProjectUpdate, ResponseCreate},
    repo::{self, Project, ProjectParticipation, ProjectResponse},
};

pub fn project_routes() -> Router<AppState> {
    Router::new()
        .route("/projects", post(create_project))
        .route("/projects", get(list_projects))
        .route("/projects/by-author/:author_id", get(list_by_author))
        .route("/projects/:id", get(get_project))
        .route("/projects/:id", put(update_project))
        .route("/projects/:id", delete(delete_project))
        .route(
            "/projects/:id/participants",
            get(list_participants),
        )
        .route(
            "/projects/:id/participants/:user_id",
            post(add_participant).delete(remove_participant),
        )
        .route(
            "/projects/:id/responses",
            post(create_response).get(list_responses),
        )
}

#[instrument(skip(state, user, ctx, payload))]
async fn create_project(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    ctx: AuditContext,
    Json(payload): Json<ProjectCreate>,
) -> Result<(StatusCode, Json<Project>), ApiError> {
    if payload.name.trim().is_empty() {
        return Err(ApiError::Validation("project name must not be empty".into()));
    }

    let project = repo::create(&state.db, user.id, &payload).await?;

    audit::record(
        &state.db,
        &ctx.with_actor(user.id),
        "project",
        project.id,
        AuditAction::Insert,
        None,
        Some(&project),
    )
    .await;

    info!(project_id = %project.id, author_id = %user.id, "project created");
    Ok((StatusCode::CREATED, Json(project)))
}

#[instrument(skip(state, _user))]
async fn list_projects(
    State(state): State<AppState>,
    CurrentUser(_user): CurrentUser,
    Query(page): Query<PageQuery>,
) -> Result<Json<PageResponse<Project>>, ApiError> {
    let page = page.normalized();
    let items = repo::list(&state.db, page.limit, page.offset()).await?;
    let total = repo::count(&state.db).await?;
    Ok(Json(PageResponse::new(items, total, &page)))
}

#[instrument(skip(state, _user))]
async fn list_by_author(
    State(state): State<AppState>,
    CurrentUser(_user): CurrentUser,
    Path(author_id): Path<Uuid>,
) -> Result<Json<Vec<Project>>, ApiError> {
    Ok(Json(repo::list_by_author(&state.db, author_id).await?))
}

#[instrument(skip(state, _user))]
async fn get_project(
    State(state): State<AppState>,
    CurrentUser(_user): CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<Json<Project>, ApiError> {
    let project = repo::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::not_found("project not found"))?;
    Ok(Json(project))
}

/// A project without a participant limit accepts everyone.
fn check_capacity(max_participants: Option<i32>, current: i64) -> Result<(), ApiError> {
    if let Some(max) = max_participants {
        if current >= i64::from(max) {
            return Err(ApiError::BusinessRule("project is full".into()));
        }
    }
    Ok(())
}

fn ensure_author(author_id: Uuid, caller: Uuid) -> Result<(), ApiError> {
    if author_id != caller {
        return Err(ApiError::Forbidden(
            "only the project author may modify it".into(),
        ));
    }
    Ok(())
}

/// Loads a project and rejects callers other than its author.
async fn owned_project(
    state: &AppState,
    id: Uuid,
    current_user_id: Uuid,
) -> Result<Project, ApiError> {
    let project = repo::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::not_found("project not found"))?;
    ensure_author(project.author_id, current_user_id)?;
    Ok(project)
}

#[instrument(skip(state, user, ctx, payload))]
async fn update_project(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    ctx: AuditContext,
    Path(id): Path<Uuid>,
    Json(payload): Json<ProjectUpdate>,
) -> Result<Json<Project>, ApiError> {
    let before = owned_project(&state, id, user.id).await?;

    let updated = repo::update(&state.db, id, &payload)
        .await?
        .ok_or_else(|| ApiError::not_found("project not found"))?;

    audit::record(
        &state.db,
        &ctx.with_actor(user.id),
        "project",
        id,
        AuditAction::Update,
        Some(&before),
        Some(&updated),
    )
    .await;

    Ok(Json(updated))
}

#[instrument(skip(state, user, ctx))]
async fn delete_project(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    ctx: AuditContext,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    let before = owned_project(&state, id, user.id).await?;

    repo::delete(&state.db, id).await?;

    audit::record(
        &state.db,
        &ctx.with_actor(user.id),
        "project",
        id,
        AuditAction::Delete,
        Some(&before),
        None,
    )
    .await;

    info!(project_id = %id, "project deleted");
    Ok(StatusCode::NO_CONTENT)
}

#[instrument(skip(state, user))]
async fn add_participant(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path((id, user_id)): Path<(Uuid, Uuid)>,
) -> Result<(StatusCode, Json<ProjectParticipation>), ApiError> {
    let project = owned_project(&state, id, user.id).await?;

    if repo::find_participation(&state.db, id, user_id).await?.is_some() {
        return Err(ApiError::conflict("user already participates in this project"));
    }
    let current = repo::count_participants(&state.db, id).await?;
    check_capacity(project.max_participants, current)?;

    let participation = repo::add_participant(&state.db, id, user_id).await?;
    Ok((StatusCode::CREATED, Json(participation)))
}

#[instrument(skip(state, user))]
async fn remove_participant(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path((id, user_id)): Path<(Uuid, Uuid)>,
) -> Result<StatusCode, ApiError> {
    owned_project(&state, id, user.id).await?;

    if !repo::remove_participant(&state.db, id, user_id).await? {
        return Err(ApiError::not_found("participation not found"));
    }
    Ok(StatusCode::NO_CONTENT)
}

#[instrument(skip(state, _user))]
async fn list_participants(
    State(state): State<AppState>,
    CurrentUser(_user): CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<ProjectParticipation>>, ApiError> {
    repo::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::not_found("project not found"))?;
    Ok(Json(repo::list_participants(&state.db, id).await?))
}

#[instrument(skip(state, user, payload))]
async fn create_response(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<ResponseCreate>,
) -> Result<(StatusCode, Json<ProjectResponse>), ApiError> {
    repo::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::not_found("project not found"))?;

    let response =
        repo::create_response(&state.db, id, user.id, payload.note.as_deref()).await?;
    Ok((StatusCode::CREATED, Json(response)))
}

#[instrument(skip(state, _user))]
async fn list_responses(
    State(state): State<AppState>,
    CurrentUser(_user): CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<ProjectResponse>>, ApiError> {
    repo::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::not_found("project not found"))?;
    Ok(Json(repo::list_responses(&state.db, id).await?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_the_author_passes_the_ownership_gate() {
        let author = Uuid::new_v4();
        let other = Uuid::new_v4();
        assert!(ensure_author(author, author).is_ok());
        let err = ensure_author(author, other).expect_err("not the author");
        assert!(matches!(err, ApiError::Forbidden(_)));
    }

    #[test]
    fn capacity_limit_rejects_a_full_project() {
        assert!(check_capacity(None, 1_000).is_ok());
        assert!(check_capacity(Some(3), 2).is_ok());
        let err = check_capacity(Some(3), 3).expect_err("full project");
        assert!(matches!(err, ApiError::BusinessRule(_)));
    }
}
