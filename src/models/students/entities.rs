use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Student {
    pub id: i64,
    pub name: String,
    pub class_id: i64,
    // 学号，导入时没有则使用 STU{id}
    pub roll_number: String,
    pub phone: Option<String>,
    pub created_at: chrono::DateTime<chrono::Utc>,
}
