use super::entities::UserRole;
use serde::Deserialize;

// 用户创建请求（password 字段在进入存储层前已经是哈希值）
#[derive(Debug, Clone, Deserialize)]
pub struct CreateUserRequest {
    pub username: String,
    pub email: Option<String>,
    pub password: String,
    pub role: UserRole,
    pub national_id: Option<String>,
}
