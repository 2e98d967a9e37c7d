use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct CreateStudentRequest {
    pub name: String,
    pub class_id: i64,
    pub roll_number: String,
    pub phone: Option<String>,
}
