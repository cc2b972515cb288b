use axum::{
    extract::{FromRef, State},
    routing::{get, post},
    Json, Router,
};
use rand::{distributions::Alphanumeric, Rng};
use serde_json::json;
use time::Duration;
use time::OffsetDateTime;
use tracing::{info, instrument, warn};

use crate::{
    audit::context::AuditContext,
    auth::{
        dto::{
            LoginRequest, MessageResponse, PasswordResetConfirm, PasswordResetIssued,
            PasswordResetRequest, TokenResponse,
        },
        extractors::CurrentUser,
        jwt::JwtKeys,
        password::{check_strength, hash_password, verify_password},
        repo,
    },
    error::ApiError,
    notifications, sessions,
    state::AppState,
    users,
};

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/token", post(login))
        .route("/auth/logout", post(logout))
        .route("/auth/me", get(me))
        .route("/auth/password-reset/request", post(request_password_reset))
        .route("/auth/password-reset/confirm", post(confirm_password_reset))
}

#[instrument(skip(state, payload, ctx))]
async fn login(
    State(state): State<AppState>,
    ctx: AuditContext,
    Json(mut payload): Json<LoginRequest>,
) -> Result<Json<TokenResponse>, ApiError> {
    payload.email = payload.email.trim().to_lowercase();

    let user = users::repo::find_by_email(&state.db, &payload.email)
        .await?
        .ok_or_else(|| {
            warn!(email = %payload.email, "login unknown email");
            ApiError::Unauthorized("incorrect email or password".into())
        })?;

    if !verify_password(&payload.password, &user.password_hash)? {
        warn!(user_id = %user.id, "login invalid password");
        return Err(ApiError::Unauthorized("incorrect email or password".into()));
    }

    let keys = JwtKeys::from_ref(&state);
    let access_token = keys.sign(&user.email)?;

    let session = sessions::service::open_session(
        &state.db,
        user.id,
        ctx.ip_address.as_deref(),
        ctx.user_agent.as_deref(),
        state.config.session_ttl_minutes,
    )
    .await?;

    info!(user_id = %user.id, session_id = %session.id, "user logged in");
    Ok(Json(TokenResponse {
        access_token,
        token_type: "bearer".into(),
        session_id: session.id,
    }))
}

#[instrument(skip(state, user))]
async fn logout(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<MessageResponse>, ApiError> {
    let terminated = sessions::repo::terminate_all_for_user(&state.db, user.id).await?;
    info!(user_id = %user.id, terminated, "user logged out");
    Ok(Json(MessageResponse {
        message: "successfully logged out".into(),
    }))
}

#[instrument(skip(user))]
async fn me(CurrentUser(user): CurrentUser) -> Json<users::dto::UserFull> {
    Json(user.into())
}

fn reset_token_expired(expires_at: OffsetDateTime, now: OffsetDateTime) -> bool {
    expires_at < now
}

fn generate_reset_token() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(48)
        .map(char::from)
        .collect()
}

#[instrument(skip(state, payload))]
async fn request_password_reset(
    State(state): State<AppState>,
    Json(payload): Json<PasswordResetRequest>,
) -> Result<Json<PasswordResetIssued>, ApiError> {
    let email = payload.email.trim().to_lowercase();
    let user = users::repo::find_by_email(&state.db, &email)
        .await?
        .ok_or_else(|| ApiError::not_found("user not found"))?;

    let token = generate_reset_token();
    let expires_at =
        OffsetDateTime::now_utc() + Duration::minutes(state.config.reset_token_ttl_minutes);
    let reset = repo::replace_for_user(&state.db, user.id, &token, expires_at).await?;

    // Best-effort heads-up to the account owner; the reset itself must not
    // depend on notification delivery.
    let payload = json!({ "message": "A password reset was requested for your account." });
    if let Err(e) = notifications::service::send_to_user(
        &state.db,
        user.id,
        None,
        "system_alert",
        payload.as_object().cloned().unwrap_or_default(),
        None,
    )
    .await
    {
        warn!(error = %e, user_id = %user.id, "password reset notification failed");
    }

    info!(user_id = %user.id, "password reset token issued");
    Ok(Json(PasswordResetIssued {
        reset_token: reset.token,
        expires_at: reset.expires_at,
    }))
}

#[instrument(skip(state, payload))]
async fn confirm_password_reset(
    State(state): State<AppState>,
    Json(payload): Json<PasswordResetConfirm>,
) -> Result<Json<MessageResponse>, ApiError> {
    let reset = repo::find_by_token(&state.db, &payload.token)
        .await?
        .ok_or_else(|| ApiError::Unauthorized("invalid reset token".into()))?;

    if reset_token_expired(reset.expires_at, OffsetDateTime::now_utc()) {
        // Expired tokens are purged on sight; they stay single-use either way.
        repo::delete_token(&state.db, &reset.token).await?;
        return Err(ApiError::Unauthorized("reset token expired".into()));
    }

    check_strength(&payload.new_password)?;
    let new_hash = hash_password(&payload.new_password)?;
    users::repo::update_password(&state.db, reset.user_id, &new_hash).await?;
    repo::delete_token(&state.db, &reset.token).await?;

    info!(user_id = %reset.user_id, "password reset completed");
    Ok(Json(MessageResponse {
        message: "password updated".into(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reset_tokens_are_long_and_distinct() {
        let a = generate_reset_token();
        let b = generate_reset_token();
        assert_eq!(a.len(), 48);
        assert_eq!(b.len(), 48);
        assert_ne!(a, b);
        assert!(a.chars().all(|c| c.is_ascii_alphanumeric()));
    }

    #[test]
    fn reset_tokens_expire_at_the_cutoff() {
        let now = OffsetDateTime::now_utc();
        assert!(!reset_token_expired(now + Duration::minutes(1), now));
        assert!(reset_token_expired(now - Duration::seconds(1), now));
    }
}
