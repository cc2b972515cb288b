use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct ProjectCreate {
    pub name: String,
    pub description: Option<String>,
    pub max_participants: Option<i32>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ProjectUpdate {
    pub name: Option<String>,
    pub description: Option<String>,
    pub max_participants: Option<i32>,
}

#[derive(Debug, Deserialize)]
pub struct ResponseCreate {
    pub note: Option<String>,
}
