use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use chrono::{Datelike, Local};

use super::AttendanceService;
use crate::models::attendance::requests::{DashboardQuery, DateClassQuery, DateRange};
use crate::models::periods::entities::{DaySchedule, resolve_current};
use crate::models::periods::requests::ScheduleQuery;
use crate::models::{ApiResponse, ErrorCode};
use crate::utils::error_response;

pub async fn list_by_date_and_class(
    service: &AttendanceService,
    request: &HttpRequest,
    query: DateClassQuery,
) -> ActixResult<HttpResponse> {
    let storage = service.get_storage(request)?;

    match storage
        .get_attendance_by_date_and_class(query.date, query.class_id)
        .await
    {
        Ok(records) => Ok(HttpResponse::Ok().json(ApiResponse::success(
            records,
            "Attendance retrieved successfully",
        ))),
        Err(e) => Ok(error_response(&e)),
    }
}

pub async fn dashboard(
    service: &AttendanceService,
    request: &HttpRequest,
    query: DashboardQuery,
) -> ActixResult<HttpResponse> {
    let storage = service.get_storage(request)?;

    match storage.get_dashboard_counts(query.date, query.class_id).await {
        Ok(counts) => Ok(HttpResponse::Ok().json(ApiResponse::success(
            counts,
            "Dashboard counts retrieved successfully",
        ))),
        Err(e) => Ok(error_response(&e)),
    }
}

pub async fn get_attendance(
    service: &AttendanceService,
    request: &HttpRequest,
    id: i64,
) -> ActixResult<HttpResponse> {
    let storage = service.get_storage(request)?;

    match storage.get_attendance_by_id(id).await {
        Ok(Some(attendance)) => Ok(HttpResponse::Ok().json(ApiResponse::success(
            attendance,
            "Attendance retrieved successfully",
        ))),
        Ok(None) => Ok(HttpResponse::NotFound().json(ApiResponse::error_empty(
            ErrorCode::NotFound,
            format!("Attendance {id} not found"),
        ))),
        Err(e) => Ok(error_response(&e)),
    }
}

pub async fn student_history(
    service: &AttendanceService,
    request: &HttpRequest,
    student_id: i64,
    range: DateRange,
) -> ActixResult<HttpResponse> {
    let storage = service.get_storage(request)?;
    let range = (!range.is_unbounded()).then_some(range);

    match storage.get_attendance_by_student(student_id, range).await {
        Ok(records) => Ok(HttpResponse::Ok().json(ApiResponse::success(
            records,
            "Student attendance retrieved successfully",
        ))),
        Err(e) => Ok(error_response(&e)),
    }
}

pub async fn class_schedule(
    service: &AttendanceService,
    request: &HttpRequest,
    class_id: i64,
    query: ScheduleQuery,
) -> ActixResult<HttpResponse> {
    let storage = service.get_storage(request)?;
    let now = Local::now();
    let day_of_week = query
        .day_of_week
        .unwrap_or_else(|| now.weekday().num_days_from_sunday() as i32);
    let time = query.time.unwrap_or_else(|| now.time());

    match storage.list_periods_for_day(class_id, day_of_week).await {
        Ok(periods) => {
            let current_period = resolve_current(&periods, time).map(|p| p.period_num);
            Ok(HttpResponse::Ok().json(ApiResponse::success(
                DaySchedule {
                    day_of_week,
                    periods,
                    current_period,
                },
                "Schedule retrieved successfully",
            )))
        }
        Err(e) => Ok(error_response(&e)),
    }
}
