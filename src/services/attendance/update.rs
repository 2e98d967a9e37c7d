use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};

use super::AttendanceService;
use crate::models::attendance::requests::{UpdateNotesRequest, UpdateRemarkRequest};
use crate::models::{ApiResponse, ErrorCode};
use crate::utils::error_response;
use crate::utils::validate::validate_note;

pub async fn update_remark(
    service: &AttendanceService,
    request: &HttpRequest,
    id: i64,
    data: UpdateRemarkRequest,
) -> ActixResult<HttpResponse> {
    if let Err(msg) = validate_note(data.remark.as_deref()) {
        return Ok(HttpResponse::BadRequest()
            .json(ApiResponse::error_empty(ErrorCode::ValidationFailed, msg)));
    }

    let storage = service.get_storage(request)?;

    match storage.update_remark(id, data.remark).await {
        Ok(attendance) => Ok(HttpResponse::Ok().json(ApiResponse::success(
            attendance,
            "Remark updated successfully",
        ))),
        Err(e) => Ok(error_response(&e)),
    }
}

pub async fn update_notes(
    service: &AttendanceService,
    request: &HttpRequest,
    id: i64,
    data: UpdateNotesRequest,
) -> ActixResult<HttpResponse> {
    if let Err(msg) = validate_note(data.notes.as_deref()) {
        return Ok(HttpResponse::BadRequest()
            .json(ApiResponse::error_empty(ErrorCode::ValidationFailed, msg)));
    }

    let storage = service.get_storage(request)?;

    match storage.update_notes(id, data.notes).await {
        Ok(attendance) => Ok(HttpResponse::Ok().json(ApiResponse::success(
            attendance,
            "Notes updated successfully",
        ))),
        Err(e) => Ok(error_response(&e)),
    }
}
