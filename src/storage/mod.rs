//! 数据访问层
//!
//! 路由和服务只通过 [`Storage`] 访问数据库；每个方法对应一种访问模式，
//! 由一条参数化语句（或一个把授权检查和写入放在一起的事务）完成。

use std::sync::Arc;
use std::time::Duration;

use chrono::{NaiveDate, NaiveTime};

use crate::config::DatabaseConfig;
use crate::errors::Result;
use crate::models::{
    attendance::{
        entities::{Attendance, AttendanceWithStudent, DashboardCounts},
        requests::{DateRange, RollCall, UpsertAttendance},
    },
    classes::{entities::Class, requests::CreateClassRequest},
    periods::{entities::Period, requests::CreatePeriodRequest},
    schema::entities::SchemaReport,
    students::{entities::Student, requests::CreateStudentRequest},
    subjects::{
        entities::{Subject, TeacherSubject},
        requests::CreateSubjectRequest,
    },
    users::{entities::User, requests::CreateUserRequest},
};

pub mod sea_orm_storage;

#[async_trait::async_trait]
pub trait Storage: Send + Sync {
    /// 返回使用指定超时的存储句柄，共享同一个连接池
    fn with_timeout(&self, timeout: Duration) -> Arc<dyn Storage>;

    /// 结构管理方法
    // 建表并创建索引，可重复执行
    async fn init_schema(&self) -> Result<()>;
    // 检查必需索引是否存在
    async fn verify_schema(&self) -> Result<SchemaReport>;

    /// 考勤方法
    // 按 (student_id, date, period) 写入或更新
    async fn upsert_attendance(&self, req: UpsertAttendance) -> Result<Attendance>;
    // 整班点名，全部成功或全部不写入
    async fn submit_roll_call(&self, roll: RollCall) -> Result<Vec<Attendance>>;
    // 员工看板：某天某班的全部记录
    async fn get_attendance_by_date_and_class(
        &self,
        date: NaiveDate,
        class_id: i64,
    ) -> Result<Vec<AttendanceWithStudent>>;
    // 单个学生的历史
    async fn get_attendance_by_student(
        &self,
        student_id: i64,
        range: Option<DateRange>,
    ) -> Result<Vec<Attendance>>;
    // 单个学生某天的记录
    async fn get_attendance_for_student_on_date(
        &self,
        student_id: i64,
        date: NaiveDate,
    ) -> Result<Vec<Attendance>>;
    // 班级考勤
    async fn get_attendance_by_class(
        &self,
        class_id: i64,
        range: Option<DateRange>,
    ) -> Result<Vec<Attendance>>;
    // 教师自己的记录
    async fn get_attendance_by_teacher(
        &self,
        teacher_id: i64,
        range: Option<DateRange>,
    ) -> Result<Vec<Attendance>>;
    // 按课节筛选
    async fn get_attendance_by_period(
        &self,
        period: i32,
        date: NaiveDate,
        class_id: Option<i64>,
    ) -> Result<Vec<Attendance>>;
    // 日报
    async fn get_attendance_by_date(&self, date: NaiveDate) -> Result<Vec<Attendance>>;
    // 看板统计
    async fn get_dashboard_counts(
        &self,
        date: NaiveDate,
        class_id: Option<i64>,
    ) -> Result<DashboardCounts>;
    // 更新备注
    async fn update_remark(&self, id: i64, remark: Option<String>) -> Result<Attendance>;
    // 更新说明
    async fn update_notes(&self, id: i64, notes: Option<String>) -> Result<Attendance>;
    // 通过ID获取考勤记录
    async fn get_attendance_by_id(&self, id: i64) -> Result<Option<Attendance>>;

    /// 用户管理方法
    // 创建用户
    async fn create_user(&self, user: CreateUserRequest) -> Result<User>;
    // 通过ID获取用户信息
    async fn get_user_by_id(&self, id: i64) -> Result<Option<User>>;
    // 通过用户名获取用户信息
    async fn get_user_by_username(&self, username: &str) -> Result<Option<User>>;
    // 用户总数
    async fn count_users(&self) -> Result<u64>;
    // 停用用户（不删除）
    async fn disable_user(&self, id: i64) -> Result<bool>;
    // 替换用户的班级分配，保留顺序
    async fn set_user_classes(&self, user_id: i64, class_ids: Vec<i64>) -> Result<()>;
    // 列出用户的班级分配
    async fn list_user_classes(&self, user_id: i64) -> Result<Vec<i64>>;

    /// 班级管理方法
    async fn create_class(&self, class: CreateClassRequest) -> Result<Class>;
    async fn list_classes(&self) -> Result<Vec<Class>>;

    /// 科目管理方法
    async fn create_subject(&self, subject: CreateSubjectRequest) -> Result<Subject>;
    // 给教师分配科目，重复分配返回已有记录
    async fn assign_teacher_subject(
        &self,
        teacher_id: i64,
        subject_id: i64,
    ) -> Result<TeacherSubject>;
    async fn list_teacher_subjects(&self, teacher_id: i64) -> Result<Vec<TeacherSubject>>;

    /// 课节管理方法
    async fn create_period(&self, period: CreatePeriodRequest) -> Result<Period>;
    async fn list_periods_by_class(&self, class_id: i64) -> Result<Vec<Period>>;
    async fn list_periods_for_day(
        &self,
        class_id: i64,
        day_of_week: i32,
    ) -> Result<Vec<Period>>;
    async fn current_period(
        &self,
        class_id: i64,
        day_of_week: i32,
        time: NaiveTime,
    ) -> Result<Option<Period>>;

    /// 学生管理方法
    async fn create_student(&self, student: CreateStudentRequest) -> Result<Student>;
    async fn list_students_by_class(&self, class_id: i64) -> Result<Vec<Student>>;
}

/// 连接数据库并初始化结构
pub async fn create_storage(config: &DatabaseConfig) -> Result<Arc<dyn Storage>> {
    let storage = sea_orm_storage::SeaOrmStorage::connect(config).await?;
    storage.init_schema().await?;
    Ok(Arc::new(storage))
}
