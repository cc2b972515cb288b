use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use super::repo::Session;

#[derive(Debug, Default, Deserialize)]
pub struct SessionUpdate {
    pub device_name: Option<String>,
    pub browser_name: Option<String>,
    pub browser_version: Option<String>,
    pub operating_system: Option<String>,
    pub device_type: Option<String>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Serialize)]
pub struct SessionListResponse {
    pub sessions: Vec<Session>,
    pub total: usize,
    pub current_session_id: Option<Uuid>,
}

#[derive(Debug, Serialize)]
pub struct SessionStats {
    pub total_sessions: i64,
    pub active_sessions: i64,
    pub current_session: Option<Session>,
}

/// Compact per-session view for the summary endpoint; absent device data
/// collapses to "Unknown …" placeholders.
#[derive(Debug, Serialize)]
pub struct SessionDigest {
    pub id: Uuid,
    pub device_name: String,
    pub browser_name: String,
    pub operating_system: String,
    pub is_current: bool,
    #[serde(with = "time::serde::rfc3339")]
    pub last_activity: OffsetDateTime,
    pub location: String,
}

impl From<&Session> for SessionDigest {
    fn from(s: &Session) -> Self {
        let location = match (&s.city, &s.country) {
            (Some(city), Some(country)) => format!("{city}, {country}"),
            _ => "Unknown Location".to_owned(),
        };
        Self {
            id: s.id,
            device_name: s
                .device_name
                .clone()
                .unwrap_or_else(|| "Unknown Device".to_owned()),
            browser_name: s
                .browser_name
                .clone()
                .unwrap_or_else(|| "Unknown Browser".to_owned()),
            operating_system: s
                .operating_system
                .clone()
                .unwrap_or_else(|| "Unknown OS".to_owned()),
            is_current: s.is_current,
            last_activity: s.last_activity,
            location,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct SessionSummary {
    pub total_active: usize,
    pub current_session_id: Option<Uuid>,
    pub sessions: Vec<SessionDigest>,
}

#[derive(Debug, Deserialize)]
pub struct SessionTerminateRequest {
    #[serde(default)]
    pub session_ids: Vec<Uuid>,
    #[serde(default)]
    pub terminate_all_except_current: bool,
}

#[derive(Debug, Serialize)]
pub struct SessionTerminateResponse {
    pub terminated_sessions: Vec<Uuid>,
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct SessionValidateResponse {
    pub is_valid: bool,
}

#[derive(Debug, Serialize)]
pub struct SessionCleanupResponse {
    pub cleaned_sessions: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bare_session() -> Session {
        Session {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
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
            expires_at: None,
            is_active: true,
            is_current: false,
        }
    }

    #[test]
    fn digest_falls_back_to_unknown_placeholders() {
        let digest = SessionDigest::from(&bare_session());
        assert_eq!(digest.device_name, "Unknown Device");
        assert_eq!(digest.browser_name, "Unknown Browser");
        assert_eq!(digest.operating_system, "Unknown OS");
        assert_eq!(digest.location, "Unknown Location");
    }

    #[test]
    fn digest_needs_both_city_and_country_for_a_location() {
        let mut s = bare_session();
        s.city = Some("Vienna".into());
        assert_eq!(SessionDigest::from(&s).location, "Unknown Location");

        s.country = Some("Austria".into());
        assert_eq!(SessionDigest::from(&s).location, "Vienna, Austria");
    }
}
