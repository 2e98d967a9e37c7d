use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use tracing::info;

use super::AttendanceService;
use crate::models::attendance::requests::{RollCall, UpsertAttendance};
use crate::models::{ApiResponse, ErrorCode};
use crate::utils::error_response;
use crate::utils::validate::validate_note;

pub async fn upsert_attendance(
    service: &AttendanceService,
    request: &HttpRequest,
    data: UpsertAttendance,
) -> ActixResult<HttpResponse> {
    if let Err(msg) = validate_note(data.remark.as_deref()) {
        return Ok(HttpResponse::BadRequest()
            .json(ApiResponse::error_empty(ErrorCode::ValidationFailed, msg)));
    }

    let storage = service.get_storage(request)?;

    match storage.upsert_attendance(data).await {
        Ok(attendance) => Ok(HttpResponse::Ok().json(ApiResponse::success(
            attendance,
            "Attendance recorded successfully",
        ))),
        Err(e) => Ok(error_response(&e)),
    }
}

pub async fn submit_roll_call(
    service: &AttendanceService,
    request: &HttpRequest,
    roll: RollCall,
) -> ActixResult<HttpResponse> {
    if let Some(msg) = roll
        .entries
        .iter()
        .find_map(|entry| validate_note(entry.remark.as_deref()).err())
    {
        return Ok(HttpResponse::BadRequest()
            .json(ApiResponse::error_empty(ErrorCode::ValidationFailed, msg)));
    }

    let storage = service.get_storage(request)?;
    let (teacher_id, class_id, period, date) =
        (roll.teacher_id, roll.class_id, roll.period, roll.date);

    match storage.submit_roll_call(roll).await {
        Ok(records) => {
            info!(
                "Roll call saved: teacher={} class={} date={} period={} students={}",
                teacher_id,
                class_id,
                date,
                period,
                records.len()
            );
            Ok(HttpResponse::Ok().json(ApiResponse::success(
                records,
                "Roll call submitted successfully",
            )))
        }
        Err(e) => Ok(error_response(&e)),
    }
}
