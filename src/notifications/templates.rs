use serde_json::{Map, Value};

use crate::error::ApiError;

/// A notification template: title/body format strings plus the payload fields
/// they need. The registry is fixed at compile time.
#[derive(Debug, Clone, Copy)]
pub struct Template {
    pub key: &'static str,
    pub title: &'static str,
    pub body: &'static str,
    pub required: &'static [&'static str],
}

pub const TEMPLATES: &[Template] = &[
    Template {
        key: "project_invitation",
        title: "Project invitation",
        body: "You have been invited to the project \"{project_name}\".",
        required: &["project_name"],
    },
    Template {
        key: "project_removal",
        title: "Removed from project",
        body: "You have been removed from the project \"{project_name}\".",
        required: &["project_name"],
    },
    Template {
        key: "join_request",
        title: "Join request",
        body: "{requester_name} wants to join the project \"{project_name}\".",
        required: &["requester_name", "project_name"],
    },
    Template {
        key: "join_request_approved",
        title: "Request approved",
        body: "Your request to join the project \"{project_name}\" was approved.",
        required: &["project_name"],
    },
    Template {
        key: "join_request_rejected",
        title: "Request rejected",
        body: "Your request to join the project \"{project_name}\" was rejected.",
        required: &["project_name"],
    },
    Template {
        key: "project_announcement",
        title: "Project announcement",
        body: "New announcement in the project \"{project_name}\": {message}",
        required: &["project_name", "message"],
    },
    Template {
        key: "system_alert",
        title: "System notification",
        body: "{message}",
        required: &["message"],
    },
];

pub fn get(key: &str) -> Option<&'static Template> {
    TEMPLATES.iter().find(|t| t.key == key)
}

/// Render a template's title and body, validating the payload first.
pub fn render(key: &str, payload: &Map<String, Value>) -> Result<(String, String), ApiError> {
    let template = get(key)
        .ok_or_else(|| ApiError::Validation(format!("unknown template key: {key}")))?;

    let missing: Vec<&str> = template
        .required
        .iter()
        .filter(|field| !payload.contains_key(**field))
        .copied()
        .collect();
    if !missing.is_empty() {
        return Err(ApiError::Validation(format!(
            "missing payload fields for template '{key}': {}",
            missing.join(", ")
        )));
    }

    Ok((
        substitute(template.title, payload),
        substitute(template.body, payload),
    ))
}

fn substitute(format: &str, payload: &Map<String, Value>) -> String {
    let mut out = format.to_owned();
    for (field, value) in payload {
        let needle = format!("{{{field}}}");
        let rendered = match value {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        };
        out = out.replace(&needle, &rendered);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn payload(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap_or_default()
    }

    #[test]
    fn renders_title_and_body_with_substitution() {
        let p = payload(json!({ "project_name": "Alpha" }));
        let (title, body) = render("project_invitation", &p).expect("render");
        assert_eq!(title, "Project invitation");
        assert_eq!(body, "You have been invited to the project \"Alpha\".");
    }

    #[test]
    fn renders_multi_field_templates() {
        let p = payload(json!({ "project_name": "Alpha", "message": "Standup at 10:00" }));
        let (_, body) = render("project_announcement", &p).expect("render");
        assert_eq!(body, "New announcement in the project \"Alpha\": Standup at 10:00");
    }

    #[test]
    fn rejects_unknown_template_key() {
        let err = render("no_such_template", &Map::new()).unwrap_err();
        assert!(err.to_string().contains("unknown template key"));
    }

    #[test]
    fn rejects_missing_required_fields() {
        let p = payload(json!({ "project_name": "Alpha" }));
        let err = render("join_request", &p).unwrap_err();
        assert!(err.to_string().contains("requester_name"));
    }

    #[test]
    fn non_string_payload_values_render_as_json() {
        let p = payload(json!({ "message": 42 }));
        let (_, body) = render("system_alert", &p).expect("render");
        assert_eq!(body, "42");
    }

    #[test]
    fn registry_has_the_expected_keys() {
        let keys: Vec<&str> = TEMPLATES.iter().map(|t| t.key).collect();
        assert_eq!(keys.len(), 7);
        assert!(keys.contains(&"system_alert"));
        assert!(keys.contains(&"join_request_approved"));
    }
}
