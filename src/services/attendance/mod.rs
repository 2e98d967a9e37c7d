pub mod query;
pub mod record;
pub mod update;

use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use std::sync::Arc;

use crate::models::attendance::requests::{
    DashboardQuery, DateClassQuery, DateRange, RollCall, UpdateNotesRequest, UpdateRemarkRequest,
    UpsertAttendance,
};
use crate::models::periods::requests::ScheduleQuery;
use crate::storage::Storage;

pub struct AttendanceService;

impl AttendanceService {
    pub fn new_lazy() -> Self {
        Self
    }

    pub(crate) fn get_storage(&self, request: &HttpRequest) -> ActixResult<Arc<dyn Storage>> {
        super::storage_from_request(request)
    }

    // 写入单条考勤
    pub async fn upsert_attendance(
        &self,
        request: &HttpRequest,
        data: UpsertAttendance,
    ) -> ActixResult<HttpResponse> {
        record::upsert_attendance(self, request, data).await
    }

    // 整班点名
    pub async fn submit_roll_call(
        &self,
        request: &HttpRequest,
        roll: RollCall,
    ) -> ActixResult<HttpResponse> {
        record::submit_roll_call(self, request, roll).await
    }

    // 员工看板：某天某班的记录
    pub async fn list_by_date_and_class(
        &self,
        request: &HttpRequest,
        query: DateClassQuery,
    ) -> ActixResult<HttpResponse> {
        query::list_by_date_and_class(self, request, query).await
    }

    // 看板统计
    pub async fn dashboard(
        &self,
        request: &HttpRequest,
        query: DashboardQuery,
    ) -> ActixResult<HttpResponse> {
        query::dashboard(self, request, query).await
    }

    // 根据 ID 获取考勤记录
    pub async fn get_attendance(
        &self,
        request: &HttpRequest,
        id: i64,
    ) -> ActixResult<HttpResponse> {
        query::get_attendance(self, request, id).await
    }

    // 学生考勤历史
    pub async fn student_history(
        &self,
        request: &HttpRequest,
        student_id: i64,
        range: DateRange,
    ) -> ActixResult<HttpResponse> {
        query::student_history(self, request, student_id, range).await
    }

    // 班级当天课表与当前课节
    pub async fn class_schedule(
        &self,
        request: &HttpRequest,
        class_id: i64,
        query: ScheduleQuery,
    ) -> ActixResult<HttpResponse> {
        query::class_schedule(self, request, class_id, query).await
    }

    // 更新备注
    pub async fn update_remark(
        &self,
        request: &HttpRequest,
        id: i64,
        data: UpdateRemarkRequest,
    ) -> ActixResult<HttpResponse> {
        update::update_remark(self, request, id, data).await
    }

    // 更新说明
    pub async fn update_notes(
        &self,
        request: &HttpRequest,
        id: i64,
        data: UpdateNotesRequest,
    ) -> ActixResult<HttpResponse> {
        update::update_notes(self, request, id, data).await
    }
}
