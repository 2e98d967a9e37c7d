use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct CreateSubjectRequest {
    pub name: String,
    pub code: Option<String>,
}
