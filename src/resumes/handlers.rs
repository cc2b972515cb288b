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
    dto::{ResumeCreate, ResumeUpdate},
    repo::{self, Resume},
};

pub fn resume_routes() -> Router<AppState> {
    Router::new()
        .route("/resumes", post(create_resume))
        .route("/resumes", get(list_resumes))
        .route("/resumes/by-author/:author_id", get(list_by_author))
        .route("/resumes/:id", get(get_resume))
        .route("/resumes/:id", put(update_resume))
        .route("/resumes/:id", delete(delete_resume))
}

#[instrument(skip(state, user, ctx, payload))]
async fn create_resume(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    ctx: AuditContext,
    Json(payload): Json<ResumeCreate>,
) -> Result<(StatusCode, Json<Resume>), ApiError> {
    if payload.header.trim().is_empty() {
        return Err(ApiError::Validation("resume header must not be empty".into()));
    }

    let resume = repo::create(&state.db, user.id, &payload).await?;

    audit::record(
        &state.db,
        &ctx.with_actor(user.id),
        "resume",
        resume.id,
        AuditAction::Insert,
        None,
        Some(&resume),
    )
    .await;

    info!(resume_id = %resume.id, author_id = %user.id, "resume created");
    Ok((StatusCode::CREATED, Json(resume)))
}

#[instrument(skip(state, _user))]
async fn list_resumes(
    State(state): State<AppState>,
    CurrentUser(_user): CurrentUser,
    Query(page): Query<PageQuery>,
) -> Result<Json<PageResponse<Resume>>, ApiError> {
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
) -> Result<Json<Vec<Resume>>, ApiError> {
    Ok(Json(repo::list_by_author(&state.db, author_id).await?))
}

#[instrument(skip(state, _user))]
async fn get_resume(
    State(state): State<AppState>,
    CurrentUser(_user): CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<Json<Resume>, ApiError> {
    let resume = repo::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::not_found("resume not found"))?;
    Ok(Json(resume))
}

fn ensure_author(author_id: Uuid, caller: Uuid) -> Result<(), ApiError> {
    if author_id != caller {
        return Err(ApiError::Forbidden(
            "only the resume author may modify it".into(),
        ));
    }
    Ok(())
}

async fn owned_resume(
    state: &AppState,
    id: Uuid,
    current_user_id: Uuid,
) -> Result<Resume, ApiError> {
    let resume = repo::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::not_found("resume not found"))?;
    ensure_author(resume.author_id, current_user_id)?;
    Ok(resume)
}

#[instrument(skip(state, user, ctx, payload))]
async fn update_resume(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    ctx: AuditContext,
    Path(id): Path<Uuid>,
    Json(payload): Json<ResumeUpdate>,
) -> Result<Json<Resume>, ApiError> {
    let before = owned_resume(&state, id, user.id).await?;

    let updated = repo::update(&state.db, id, &payload)
        .await?
        .ok_or_else(|| ApiError::not_found("resume not found"))?;

    audit::record(
        &state.db,
        &ctx.with_actor(user.id),
        "resume",
        id,
        AuditAction::Update,
        Some(&before),
        Some(&updated),
    )
    .await;

    Ok(Json(updated))
}

#[instrument(skip(state, user, ctx))]
async fn delete_resume(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    ctx: AuditContext,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    let before = owned_resume(&state, id, user.id).await?;

    repo::delete(&state.db, id).await?;

    audit::record(
        &state.db,
        &ctx.with_actor(user.id),
        "resume",
        id,
        AuditAction::Delete,
        Some(&before),
        None,
    )
    .await;

    info!(resume_id = %id, "resume deleted");
    Ok(StatusCode::NO_CONTENT)
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
}
