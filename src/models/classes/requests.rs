use serde::Deserialize;

// 创建班级请求
#[derive(Debug, Clone, Deserialize)]
pub struct CreateClassRequest {
    pub name: String,
}
