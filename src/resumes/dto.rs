use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct ResumeCreate {
    pub header: String,
    pub resume_text: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ResumeUpdate {
    pub header: Option<String>,
    pub resume_text: Option<String>,
}
