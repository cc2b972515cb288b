use sqlx::PgPool;
use time::{Duration, OffsetDateTime};
use tracing::{debug, info};
use uuid::Uuid;

use super::repo::{self, NewSession, Session};
use super::ua;

/// Create a session for a fresh login and make it the user's current one.
pub async fn open_session(
    db: &PgPool,
    user_id: Uuid,
    ip_address: Option<&str>,
    user_agent: Option<&str>,
    ttl_minutes: i64,
) -> Result<Session, sqlx::Error> {
    let parsed = user_agent.map(ua::parse).unwrap_or_default();

    let session = repo::insert(
        db,
        &NewSession {
            user_id,
            device_name: parsed.device_name,
            browser_name: parsed.browser_name,
            browser_version: parsed.browser_version,
            operating_system: parsed.operating_system,
            device_type: parsed.device_type,
            ip_address: ip_address.map(str::to_owned),
            user_agent: user_agent.map(str::to_owned),
            expires_at: Some(OffsetDateTime::now_utc() + Duration::minutes(ttl_minutes)),
        },
    )
    .await?;

    repo::set_current(db, user_id, session.id).await?;

    info!(user_id = %user_id, session_id = %session.id, "session opened");
    Ok(session)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SessionCheck {
    Invalid,
    Expired,
    Valid,
}

/// A session is usable when it belongs to the claimed user, is active and not
/// past its expiry.
fn session_check(session: &Session, user_id: Uuid, now: OffsetDateTime) -> SessionCheck {
    if session.user_id != user_id || !session.is_active {
        return SessionCheck::Invalid;
    }
    if matches!(session.expires_at, Some(expires_at) if expires_at < now) {
        return SessionCheck::Expired;
    }
    SessionCheck::Valid
}

/// Expired sessions are terminated on detection; valid ones get their
/// last-activity timestamp refreshed.
pub async fn validate_session(
    db: &PgPool,
    session_id: Uuid,
    user_id: Uuid,
) -> Result<bool, sqlx::Error> {
    let Some(session) = repo::find_by_id(db, session_id).await? else {
        return Ok(false);
    };

    match session_check(&session, user_id, OffsetDateTime::now_utc()) {
        SessionCheck::Invalid => Ok(false),
        SessionCheck::Expired => {
            debug!(session_id = %session_id, "session expired, terminating");
            repo::terminate(db, session_id).await?;
            Ok(false)
        }
        SessionCheck::Valid => {
            repo::touch_last_activity(db, session_id).await?;
            Ok(true)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session(user_id: Uuid, is_active: bool, expires_at: Option<OffsetDateTime>) -> Session {
        Session {
            id: Uuid::new_v4(),
            user_id,
            device_name: None,
            browser_name: None,
            browser_version: None,
            operating_system: None,
            device_type: None,
            ip_address: None,
            country: None,
            city: None,
            user_agent: None,
            fingerprint: None,
            created_at: OffsetDateTime::now_utc(),
            last_activity: OffsetDateTime::now_utc(),
            expires_at,
            is_active,
            is_current: false,
        }
    }

    #[test]
    fn another_users_session_is_invalid() {
        let now = OffsetDateTime::now_utc();
        let s = session(Uuid::new_v4(), true, None);
        assert_eq!(session_check(&s, Uuid::new_v4(), now), SessionCheck::Invalid);
    }

    #[test]
    fn terminated_sessions_stay_invalid() {
        let now = OffsetDateTime::now_utc();
        let user_id = Uuid::new_v4();
        let s = session(user_id, false, None);
        assert_eq!(session_check(&s, user_id, now), SessionCheck::Invalid);
    }

    #[test]
    fn expiry_is_detected_and_distinct_from_invalid() {
        let now = OffsetDateTime::now_utc();
        let user_id = Uuid::new_v4();

        let s = session(user_id, true, Some(now - Duration::seconds(1)));
        assert_eq!(session_check(&s, user_id, now), SessionCheck::Expired);

        let s = session(user_id, true, Some(now + Duration::minutes(5)));
        assert_eq!(session_check(&s, user_id, now), SessionCheck::Valid);
    }

    #[test]
    fn sessions_without_expiry_stay_valid() {
        let now = OffsetDateTime::now_utc();
        let user_id = Uuid::new_v4();
        let s = session(user_id, true, None);
        assert_eq!(session_check(&s, user_id, now), SessionCheck::Valid);
    }
}
