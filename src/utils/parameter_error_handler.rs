use actix_web::error::{InternalError, JsonPayloadError, PathError, QueryPayloadError};
use actix_web::{Error, HttpRequest, HttpResponse};
use tracing::debug;

use crate::models::{ApiResponse, ErrorCode};

fn bad_request(detail: String) -> Error {
    debug!("请求参数错误: {detail}");
    let response = HttpResponse::BadRequest().json(ApiResponse::error_empty(
        ErrorCode::BadRequest,
        format!("Invalid request: {detail}"),
    ));
    InternalError::from_response(detail, response).into()
}

/// JSON 请求体解析失败
pub fn json_error_handler(err: JsonPayloadError, _req: &HttpRequest) -> Error {
    bad_request(err.to_string())
}

/// 查询参数解析失败
pub fn query_error_handler(err: QueryPayloadError, _req: &HttpRequest) -> Error {
    bad_request(err.to_string())
}

/// 路径参数解析失败
pub fn path_error_handler(err: PathError, _req: &HttpRequest) -> Error {
    bad_request(err.to_string())
}
