//! 业务数据模型
//!
//! 与 `entity` 模块中的数据库实体分离，存储层返回这里定义的类型。

pub mod attendance;
pub mod classes;
pub mod common;
pub mod periods;
pub mod schema;
pub mod students;
pub mod subjects;
pub mod users;

pub use common::{ApiResponse, ErrorCode};
