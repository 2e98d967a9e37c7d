use serde::{Deserialize, Serialize};

use crate::errors::AttendanceError;

// 业务错误码
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[repr(i32)]
pub enum ErrorCode {
    Success = 0,

    // 请求错误
    BadRequest = 1000,
    ValidationFailed = 1001,

    // 资源不存在
    NotFound = 2000,

    // 冲突（权限或数据一致性）
    Conflict = 3000,

    // 服务端错误
    InternalServerError = 5000,
    ServiceUnavailable = 5003,
    GatewayTimeout = 5004,
}

impl From<&AttendanceError> for ErrorCode {
    fn from(err: &AttendanceError) -> Self {
        match err {
            AttendanceError::Validation(_) | AttendanceError::DateParse(_) => {
                ErrorCode::ValidationFailed
            }
            AttendanceError::NotFound(_) => ErrorCode::NotFound,
            AttendanceError::Conflict(_) => ErrorCode::Conflict,
            AttendanceError::Connection(_) => ErrorCode::ServiceUnavailable,
            AttendanceError::Timeout(_) => ErrorCode::GatewayTimeout,
            _ => ErrorCode::InternalServerError,
        }
    }
}
