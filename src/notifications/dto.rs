use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

#[derive(Debug, Deserialize)]
pub struct SendToUserRequest {
    pub user_id: Uuid,
    pub project_id: Option<Uuid>,
    pub template_key: String,
    #[serde(default)]
    pub payload: Map<String, Value>,
}

fn default_include_author() -> bool {
    true
}

#[derive(Debug, Deserialize)]
pub struct SendToProjectRequest {
    pub project_id: Uuid,
    pub template_key: String,
    #[serde(default)]
    pub payload: Map<String, Value>,
    #[serde(default = "default_include_author")]
    pub include_author: bool,
}

#[derive(Debug, Default, Deserialize)]
pub struct NotificationSettingsUpdate {
    pub email_enabled: Option<bool>,
    pub telegram_enabled: Option<bool>,
    pub in_app_enabled: Option<bool>,
    pub project_invitation_enabled: Option<bool>,
    pub join_request_enabled: Option<bool>,
    pub join_response_enabled: Option<bool>,
    pub project_announcement_enabled: Option<bool>,
    pub system_alert_enabled: Option<bool>,
}

#[derive(Debug, Serialize)]
pub struct TemplateInfo {
    pub key: &'static str,
    pub required: &'static [&'static str],
}

#[derive(Debug, Serialize)]
pub struct MarkAllReadResponse {
    pub marked_read: u64,
}
