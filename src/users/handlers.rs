use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{delete, get, post, put},
    Json, Router,
};
use lazy_static::lazy_static;
use regex::Regex;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::{
    audit::{self, AuditAction, AuditContext},
    auth::{
        extractors::CurrentUser,
        password::{check_strength, hash_password},
    },
    error::ApiError,
    notifications,
    pagination::{PageQuery, PageResponse},
    state::AppState,
};

use super::{
    dto::{UserCreate, UserFull, UserUpdate},
    repo,
};

pub fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/users", post(create_user))
        .route("/users", get(list_users))
        .route("/users/:id", get(get_user))
        .route("/users/:id", put(update_user))
        .route("/users/:id", delete(delete_user))
}

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

fn ensure_account_owner(target: Uuid, caller: Uuid, verb: &str) -> Result<(), ApiError> {
    if target != caller {
        return Err(ApiError::Forbidden(format!(
            "only the account owner may {verb} it"
        )));
    }
    Ok(())
}

/// Emails are stored trimmed and lowercased; login and token lookups rely on
/// the canonical form.
fn normalize_email(raw: &str) -> Result<String, ApiError> {
    let email = raw.trim().to_lowercase();
    if !is_valid_email(&email) {
        warn!(email = %email, "invalid email");
        return Err(ApiError::Validation("invalid email".into()));
    }
    Ok(email)
}

#[instrument(skip(state, ctx, payload))]
async fn create_user(
    State(state): State<AppState>,
    ctx: AuditContext,
    Json(mut payload): Json<UserCreate>,
) -> Result<(StatusCode, Json<UserFull>), ApiError> {
    payload.email = normalize_email(&payload.email)?;
    check_strength(&payload.password)?;

    if repo::find_by_email(&state.db, &payload.email).await?.is_some() {
        warn!(email = %payload.email, "email already registered");
        return Err(ApiError::conflict("email already registered"));
    }

    let hash = hash_password(&payload.password)?;
    let user = repo::create(&state.db, &payload, &hash).await?;

    notifications::repo::ensure_settings(&state.db, user.id).await?;

    audit::record(
        &state.db,
        &ctx.with_actor(user.id),
        "user",
        user.id,
        AuditAction::Insert,
        None,
        Some(&user),
    )
    .await;

    info!(user_id = %user.id, "user created");
    Ok((StatusCode::CREATED, Json(user.into())))
}

#[instrument(skip(state, _user))]
async fn list_users(
    State(state): State<AppState>,
    CurrentUser(_user): CurrentUser,
    Query(page): Query<PageQuery>,
) -> Result<Json<PageResponse<UserFull>>, ApiError> {
    let page = page.normalized();
    let users = repo::list(&state.db, page.limit, page.offset()).await?;
    let total = repo::count(&state.db).await?;
    let items = users.into_iter().map(UserFull::from).collect();
    Ok(Json(PageResponse::new(items, total, &page)))
}

#[instrument(skip(state, _user))]
async fn get_user(
    State(state): State<AppState>,
    CurrentUser(_user): CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<Json<UserFull>, ApiError> {
    let user = repo::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::not_found("user not found"))?;
    Ok(Json(user.into()))
}

#[instrument(skip(state, current, ctx, payload))]
async fn update_user(
    State(state): State<AppState>,
    CurrentUser(current): CurrentUser,
    ctx: AuditContext,
    Path(id): Path<Uuid>,
    Json(mut payload): Json<UserUpdate>,
) -> Result<Json<UserFull>, ApiError> {
    ensure_account_owner(id, current.id, "update")?;

    if let Some(raw) = payload.email.take() {
        let email = normalize_email(&raw)?;
        if email != current.email
            && repo::find_by_email(&state.db, &email).await?.is_some()
        {
            warn!(email = %email, "email already registered");
            return Err(ApiError::conflict("email already registered"));
        }
        payload.email = Some(email);
    }

    let before = repo::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::not_found("user not found"))?;

    let updated = repo::update(&state.db, id, &payload)
        .await?
        .ok_or_else(|| ApiError::not_found("user not found"))?;

    audit::record(
        &state.db,
        &ctx.with_actor(current.id),
        "user",
        id,
        AuditAction::Update,
        Some(&before),
        Some(&updated),
    )
    .await;

    Ok(Json(updated.into()))
}

#[instrument(skip(state, current, ctx))]
async fn delete_user(
    State(state): State<AppState>,
    CurrentUser(current): CurrentUser,
    ctx: AuditContext,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    ensure_account_owner(id, current.id, "delete")?;

    let before = repo::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::not_found("user not found"))?;

    repo::delete(&state.db, id).await?;

    audit::record(
        &state.db,
        &ctx.with_actor(current.id),
        "user",
        id,
        AuditAction::Delete,
        Some(&before),
        None,
    )
    .await;

    info!(user_id = %id, "user deleted");
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn email_validation_accepts_plain_addresses() {
        assert!(is_valid_email("student@example.edu"));
        assert!(is_valid_email("a.b+c@dept.uni.ru"));
    }

    #[test]
    fn email_validation_rejects_garbage() {
        assert!(!is_valid_email("not-an-email"));
        assert!(!is_valid_email("a b@example.com"));
        assert!(!is_valid_email("missing@tld"));
        assert!(!is_valid_email("@example.com"));
    }

    #[test]
    fn emails_are_stored_trimmed_and_lowercased() {
        assert_eq!(
            normalize_email("  Someone@Example.COM ").expect("valid email"),
            "someone@example.com"
        );
        assert!(normalize_email("not-an-email").is_err());
        assert!(normalize_email("   ").is_err());
    }

    #[test]
    fn only_the_owner_passes_the_account_gate() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        assert!(ensure_account_owner(a, a, "update").is_ok());
        let err = ensure_account_owner(a, b, "delete").expect_err("other caller");
        assert!(matches!(err, ApiError::Forbidden(_)));
    }
}
