use serde::{Deserialize, Serialize};

// 科目
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Subject {
    pub id: i64,
    pub name: String,
    pub code: Option<String>,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

// 教师与科目的关联
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TeacherSubject {
    pub id: i64,
    pub teacher_id: i64,
    pub subject_id: i64,
}
