use actix_web::{HttpRequest, HttpResponse, Result as ActixResult, web};
use once_cell::sync::Lazy;

use crate::models::attendance::requests::{
    DashboardQuery, DateClassQuery, DateRange, RollCall, UpdateNotesRequest, UpdateRemarkRequest,
    UpsertAttendance,
};
use crate::models::periods::requests::ScheduleQuery;
use crate::services::AttendanceService;

// 懒加载的全局 ATTENDANCE_SERVICE 实例
static ATTENDANCE_SERVICE: Lazy<AttendanceService> = Lazy::new(AttendanceService::new_lazy);

// HTTP处理程序
pub async fn upsert_attendance(
    req: HttpRequest,
    data: web::Json<UpsertAttendance>,
) -> ActixResult<HttpResponse> {
    ATTENDANCE_SERVICE
        .upsert_attendance(&req, data.into_inner())
        .await
}

pub async fn submit_roll_call(
    req: HttpRequest,
    roll: web::Json<RollCall>,
) -> ActixResult<HttpResponse> {
    ATTENDANCE_SERVICE
        .submit_roll_call(&req, roll.into_inner())
        .await
}

pub async fn list_attendance(
    req: HttpRequest,
    query: web::Query<DateClassQuery>,
) -> ActixResult<HttpResponse> {
    ATTENDANCE_SERVICE
        .list_by_date_and_class(&req, query.into_inner())
        .await
}

pub async fn dashboard(
    req: HttpRequest,
    query: web::Query<DashboardQuery>,
) -> ActixResult<HttpResponse> {
    ATTENDANCE_SERVICE.dashboard(&req, query.into_inner()).await
}

pub async fn get_attendance(req: HttpRequest, id: web::Path<i64>) -> ActixResult<HttpResponse> {
    ATTENDANCE_SERVICE
        .get_attendance(&req, id.into_inner())
        .await
}

pub async fn update_remark(
    req: HttpRequest,
    id: web::Path<i64>,
    data: web::Json<UpdateRemarkRequest>,
) -> ActixResult<HttpResponse> {
    ATTENDANCE_SERVICE
        .update_remark(&req, id.into_inner(), data.into_inner())
        .await
}

pub async fn update_notes(
    req: HttpRequest,
    id: web::Path<i64>,
    data: web::Json<UpdateNotesRequest>,
) -> ActixResult<HttpResponse> {
    ATTENDANCE_SERVICE
        .update_notes(&req, id.into_inner(), data.into_inner())
        .await
}

pub async fn student_history(
    req: HttpRequest,
    student_id: web::Path<i64>,
    range: web::Query<DateRange>,
) -> ActixResult<HttpResponse> {
    ATTENDANCE_SERVICE
        .student_history(&req, student_id.into_inner(), range.into_inner())
        .await
}

pub async fn class_schedule(
    req: HttpRequest,
    class_id: web::Path<i64>,
    query: web::Query<ScheduleQuery>,
) -> ActixResult<HttpResponse> {
    ATTENDANCE_SERVICE
        .class_schedule(&req, class_id.into_inner(), query.into_inner())
        .await
}

// 配置路由
pub fn configure_attendance_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/v1/attendance")
            .service(
                web::resource("")
                    // 员工看板：按日期和班级查询
                    .route(web::get().to(list_attendance))
                    // 教师写入单条考勤
                    .route(web::post().to(upsert_attendance)),
            )
            .service(web::resource("/roll-call").route(web::post().to(submit_roll_call)))
            .service(web::resource("/dashboard").route(web::get().to(dashboard)))
            .service(web::resource("/{id}").route(web::get().to(get_attendance)))
            .service(web::resource("/{id}/remark").route(web::put().to(update_remark)))
            .service(web::resource("/{id}/notes").route(web::put().to(update_notes))),
    )
    .service(
        web::scope("/api/v1/students")
            .service(web::resource("/{id}/attendance").route(web::get().to(student_history))),
    )
    .service(
        web::scope("/api/v1/classes")
            .service(web::resource("/{id}/schedule").route(web::get().to(class_schedule))),
    );
}
