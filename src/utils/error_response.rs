use actix_web::HttpResponse;
use actix_web::http::StatusCode;
use tracing::{error, warn};

use crate::errors::AttendanceError;
use crate::models::{ApiResponse, ErrorCode};

/// 把数据访问层错误翻译为 HTTP 响应
pub fn error_response(err: &AttendanceError) -> HttpResponse {
    let (status, message) = match err {
        AttendanceError::Validation(msg) | AttendanceError::DateParse(msg) => {
            (StatusCode::BAD_REQUEST, msg.clone())
        }
        AttendanceError::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone()),
        AttendanceError::Conflict(msg) => (StatusCode::CONFLICT, msg.clone()),
        AttendanceError::Connection(_) => {
            warn!("{}", err.format_simple());
            (
                StatusCode::SERVICE_UNAVAILABLE,
                "Database is temporarily unavailable, please try again".to_string(),
            )
        }
        AttendanceError::Timeout(_) => {
            warn!("{}", err.format_simple());
            (
                StatusCode::GATEWAY_TIMEOUT,
                "The request timed out and its outcome is unknown; reload before retrying"
                    .to_string(),
            )
        }
        _ => {
            error!("{}", err.format_simple());
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal server error".to_string(),
            )
        }
    };

    HttpResponse::build(status).json(ApiResponse::error_empty(ErrorCode::from(err), message))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        let cases = [
            (AttendanceError::conflict("x"), StatusCode::CONFLICT),
            (AttendanceError::not_found("x"), StatusCode::NOT_FOUND),
            (AttendanceError::validation("x"), StatusCode::BAD_REQUEST),
            (
                AttendanceError::connection("x"),
                StatusCode::SERVICE_UNAVAILABLE,
            ),
            (AttendanceError::timeout("x"), StatusCode::GATEWAY_TIMEOUT),
            (
                AttendanceError::database_operation("x"),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];
        for (err, status) in cases {
            assert_eq!(error_response(&err).status(), status, "{err}");
        }
    }
}
