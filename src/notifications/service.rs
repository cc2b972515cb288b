use std::collections::BTreeSet;

use serde_json::{Map, Value};
use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

use crate::{error::ApiError, projects};

use super::repo::{self, NewNotification, Notification, NotificationSettings};
use super::templates;

/// Delivery channels a recipient has opted into; in-app is the default.
fn channels_for(settings: Option<&NotificationSettings>) -> Vec<String> {
    let Some(settings) = settings else {
        return vec!["in_app".to_owned()];
    };
    let mut channels = Vec::new();
    if settings.in_app_enabled {
        channels.push("in_app".to_owned());
    }
    if settings.email_enabled {
        channels.push("email".to_owned());
    }
    if settings.telegram_enabled {
        channels.push("telegram".to_owned());
    }
    channels
}

pub async fn send_to_user(
    db: &PgPool,
    recipient_id: Uuid,
    sender_id: Option<Uuid>,
    template_key: &str,
    payload: Map<String, Value>,
    project_id: Option<Uuid>,
) -> Result<Notification, ApiError> {
    let (title, body) = templates::render(template_key, &payload)?;
    let settings = repo::get_settings(db, recipient_id).await?;

    let notification = repo::insert_one(
        db,
        &NewNotification {
            recipient_id,
            sender_id,
            project_id,
            kind: template_key.to_owned(),
            title,
            body,
            channels: channels_for(settings.as_ref()),
        },
    )
    .await?;

    info!(notification_id = %notification.id, recipient_id = %recipient_id, "notification queued");
    Ok(notification)
}

/// Fan a notification out to a project's participants, optionally including
/// the author. Recipients are deduplicated.
pub async fn send_to_project(
    db: &PgPool,
    project_id: Uuid,
    sender_id: Option<Uuid>,
    template_key: &str,
    payload: Map<String, Value>,
    include_author: bool,
) -> Result<Vec<Notification>, ApiError> {
    let project = projects::repo::find_by_id(db, project_id)
        .await?
        .ok_or_else(|| ApiError::not_found("project not found"))?;

    let mut recipients: BTreeSet<Uuid> =
        projects::repo::participant_ids(db, project_id).await?.into_iter().collect();
    if include_author {
        recipients.insert(project.author_id);
    }
    if recipients.is_empty() {
        return Ok(Vec::new());
    }

    let (title, body) = templates::render(template_key, &payload)?;

    let mut batch = Vec::with_capacity(recipients.len());
    for recipient_id in recipients {
        let settings = repo::get_settings(db, recipient_id).await?;
        batch.push(NewNotification {
            recipient_id,
            sender_id,
            project_id: Some(project_id),
            kind: template_key.to_owned(),
            title: title.clone(),
            body: body.clone(),
            channels: channels_for(settings.as_ref()),
        });
    }

    let created = repo::insert_many(db, &batch).await?;
    info!(project_id = %project_id, count = created.len(), "project notifications queued");
    Ok(created)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings(in_app: bool, email: bool, telegram: bool) -> NotificationSettings {
        NotificationSettings {
            user_id: Uuid::new_v4(),
            email_enabled: email,
            telegram_enabled: telegram,
            in_app_enabled: in_app,
            project_invitation_enabled: true,
            join_request_enabled: true,
            join_response_enabled: true,
            project_announcement_enabled: true,
            system_alert_enabled: true,
        }
    }

    #[test]
    fn missing_settings_fall_back_to_in_app() {
        assert_eq!(channels_for(None), vec!["in_app".to_owned()]);
    }

    #[test]
    fn channels_follow_the_settings_flags() {
        let s = settings(true, true, false);
        assert_eq!(channels_for(Some(&s)), vec!["in_app", "email"]);

        let s = settings(false, false, true);
        assert_eq!(channels_for(Some(&s)), vec!["telegram"]);
    }
}
