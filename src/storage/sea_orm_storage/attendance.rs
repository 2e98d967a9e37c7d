use std::collections::HashSet;

use super::SeaOrmStorage;
use crate::entity::attendance::{ActiveModel, Column, Entity as Attendances, Model};
use crate::entity::students::{Column as StudentColumn, Entity as Students};
use crate::entity::user_classes::{Column as UserClassColumn, Entity as UserClasses};
use crate::entity::users::Entity as Users;
use crate::errors::{AttendanceError, Result, db_error};
use crate::models::attendance::{
    entities::{Attendance, AttendanceStatus, AttendanceWithStudent, DashboardCounts},
    requests::{DateRange, RollCall, UpsertAttendance},
};
use chrono::NaiveDate;
use sea_orm::sea_query::{CaseStatement, Expr, ExprTrait, OnConflict};
use sea_orm::{
    ActiveValue::{NotSet, Set},
    ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, QueryOrder, QuerySelect, Select,
    TransactionTrait,
};
use tracing::{debug, warn};

/// updated_at 只能前进：取 max(now, 原值 + 1)
fn advance_updated_at(now: i64) -> CaseStatement {
    let previous = Expr::col((Attendances, Column::UpdatedAt));
    Expr::case(previous.clone().lt(now), Expr::val(now)).finally(previous.add(1))
}

/// 按日期区间过滤，区间两端均包含
fn filter_range(
    select: Select<Attendances>,
    range: Option<DateRange>,
) -> Result<Select<Attendances>> {
    let Some(range) = range else {
        return Ok(select);
    };
    range.validate()?;

    let mut select = select;
    if let Some(from) = range.from {
        select = select.filter(Column::Date.gte(from));
    }
    if let Some(to) = range.to {
        select = select.filter(Column::Date.lte(to));
    }
    Ok(select)
}

fn into_attendances(models: Vec<Model>) -> Vec<Attendance> {
    models.into_iter().map(|m| m.into_attendance()).collect()
}

impl SeaOrmStorage {
    /// 检查教师是否可以为班级记录考勤
    async fn authorize_teacher<C: ConnectionTrait>(
        conn: &C,
        teacher_id: i64,
        class_id: i64,
    ) -> Result<()> {
        let teacher = Users::find_by_id(teacher_id)
            .one(conn)
            .await
            .map_err(db_error("查询教师失败"))?
            .ok_or_else(|| AttendanceError::conflict(format!("教师 {teacher_id} 不存在")))?
            .into_user();

        if !teacher.can_take_attendance() {
            return Err(AttendanceError::conflict(format!(
                "用户 {teacher_id} 不是在职教师，不能记录考勤"
            )));
        }

        let assigned = UserClasses::find()
            .filter(UserClassColumn::UserId.eq(teacher_id))
            .filter(UserClassColumn::ClassId.eq(class_id))
            .one(conn)
            .await
            .map_err(db_error("查询教师班级失败"))?;

        if assigned.is_none() {
            return Err(AttendanceError::conflict(format!(
                "教师 {teacher_id} 未分配到班级 {class_id}"
            )));
        }
        Ok(())
    }

    /// 检查学生是否属于班级
    async fn check_student_class<C: ConnectionTrait>(
        conn: &C,
        student_id: i64,
        class_id: i64,
    ) -> Result<()> {
        let student = Students::find_by_id(student_id)
            .one(conn)
            .await
            .map_err(db_error("查询学生失败"))?
            .ok_or_else(|| AttendanceError::conflict(format!("学生 {student_id} 不存在")))?;

        if student.class_id != class_id {
            return Err(AttendanceError::conflict(format!(
                "学生 {student_id} 属于班级 {}，不属于班级 {class_id}",
                student.class_id
            )));
        }
        Ok(())
    }

    /// 按去重键写入一条记录并读回
    async fn upsert_row<C: ConnectionTrait>(
        conn: &C,
        req: UpsertAttendance,
        now: i64,
    ) -> Result<Attendance> {
        if req.period < 1 {
            return Err(AttendanceError::validation(format!(
                "课节必须从 1 开始: {}",
                req.period
            )));
        }

        let mut update_columns = vec![Column::ClassId, Column::TeacherId, Column::Status];
        // 未提供备注时保留原值
        if req.remark.is_some() {
            update_columns.push(Column::Remark);
        }

        let on_conflict = OnConflict::columns([Column::StudentId, Column::Date, Column::Period])
            .update_columns(update_columns)
            .value(Column::UpdatedAt, advance_updated_at(now))
            .to_owned();

        let model = ActiveModel {
            id: NotSet,
            student_id: Set(req.student_id),
            class_id: Set(req.class_id),
            teacher_id: Set(req.teacher_id),
            period: Set(req.period),
            date: Set(req.date),
            status: Set(req.status.to_string()),
            remark: Set(req.remark),
            notes: NotSet,
            created_at: Set(now),
            updated_at: Set(now),
        };

        Attendances::insert(model)
            .on_conflict(on_conflict)
            .exec_without_returning(conn)
            .await
            .map_err(db_error("写入考勤失败"))?;

        let row = Attendances::find()
            .filter(Column::StudentId.eq(req.student_id))
            .filter(Column::Date.eq(req.date))
            .filter(Column::Period.eq(req.period))
            .one(conn)
            .await
            .map_err(db_error("读取考勤失败"))?
            .ok_or_else(|| {
                AttendanceError::database_operation(format!(
                    "写入后未找到考勤记录: 学生 {} {} 第 {} 节",
                    req.student_id, req.date, req.period
                ))
            })?;

        Ok(row.into_attendance())
    }

    /// 写入单条考勤，授权检查与写入在同一事务中
    pub async fn upsert_attendance_impl(&self, req: UpsertAttendance) -> Result<Attendance> {
        let txn = self.db.begin().await.map_err(db_error("开启事务失败"))?;

        Self::authorize_teacher(&txn, req.teacher_id, req.class_id).await?;
        Self::check_student_class(&txn, req.student_id, req.class_id).await?;
        let attendance = Self::upsert_row(&txn, req, Self::now_millis()).await?;

        txn.commit().await.map_err(db_error("提交事务失败"))?;

        debug!(
            "考勤已写入: id={} 学生={} 日期={} 课节={} 状态={}",
            attendance.id,
            attendance.student_id,
            attendance.date,
            attendance.period,
            attendance.status
        );
        Ok(attendance)
    }

    /// 整班点名，任何一条失败则全部回滚
    pub async fn submit_roll_call_impl(&self, roll: RollCall) -> Result<Vec<Attendance>> {
        if roll.entries.is_empty() {
            return Err(AttendanceError::validation("点名名单为空"));
        }
        let mut seen = HashSet::with_capacity(roll.entries.len());
        if let Some(dup) = roll.entries.iter().find(|e| !seen.insert(e.student_id)) {
            return Err(AttendanceError::validation(format!(
                "点名名单中学生 {} 重复",
                dup.student_id
            )));
        }

        let txn = self.db.begin().await.map_err(db_error("开启事务失败"))?;

        Self::authorize_teacher(&txn, roll.teacher_id, roll.class_id).await?;

        let now = Self::now_millis();
        let (teacher_id, class_id, period, date) =
            (roll.teacher_id, roll.class_id, roll.period, roll.date);
        let mut written = Vec::with_capacity(roll.entries.len());
        for upsert in roll.into_upserts() {
            Self::check_student_class(&txn, upsert.student_id, class_id).await?;
            written.push(Self::upsert_row(&txn, upsert, now).await?);
        }

        txn.commit().await.map_err(db_error("提交事务失败"))?;

        debug!(
            "点名已提交: 教师={} 班级={} 日期={} 课节={} 人数={}",
            teacher_id,
            class_id,
            date,
            period,
            written.len()
        );
        Ok(written)
    }

    /// 某天某班的全部记录，按课节、学生姓名排序
    pub async fn get_attendance_by_date_and_class_impl(
        &self,
        date: NaiveDate,
        class_id: i64,
    ) -> Result<Vec<AttendanceWithStudent>> {
        let rows = Attendances::find()
            .find_also_related(Students)
            .filter(Column::Date.eq(date))
            .filter(Column::ClassId.eq(class_id))
            .order_by_asc(Column::Period)
            .order_by_asc(StudentColumn::Name)
            .order_by_asc(Column::Id)
            .all(&self.db)
            .await
            .map_err(db_error("查询班级当日考勤失败"))?;

        Ok(rows
            .into_iter()
            .map(|(attendance, student)| AttendanceWithStudent {
                attendance: attendance.into_attendance(),
                student_name: student.map(|s| s.name).unwrap_or_default(),
            })
            .collect())
    }

    pub async fn get_attendance_by_student_impl(
        &self,
        student_id: i64,
        range: Option<DateRange>,
    ) -> Result<Vec<Attendance>> {
        let select = filter_range(
            Attendances::find().filter(Column::StudentId.eq(student_id)),
            range,
        )?;

        let rows = select
            .order_by_asc(Column::Date)
            .order_by_asc(Column::Period)
            .all(&self.db)
            .await
            .map_err(db_error("查询学生考勤失败"))?;

        Ok(into_attendances(rows))
    }

    pub async fn get_attendance_for_student_on_date_impl(
        &self,
        student_id: i64,
        date: NaiveDate,
    ) -> Result<Vec<Attendance>> {
        let rows = Attendances::find()
            .filter(Column::StudentId.eq(student_id))
            .filter(Column::Date.eq(date))
            .order_by_asc(Column::Period)
            .all(&self.db)
            .await
            .map_err(db_error("查询学生当日考勤失败"))?;

        Ok(into_attendances(rows))
    }

    pub async fn get_attendance_by_class_impl(
        &self,
        class_id: i64,
        range: Option<DateRange>,
    ) -> Result<Vec<Attendance>> {
        let select = filter_range(
            Attendances::find().filter(Column::ClassId.eq(class_id)),
            range,
        )?;

        let rows = select
            .order_by_asc(Column::Date)
            .order_by_asc(Column::Period)
            .order_by_asc(Column::StudentId)
            .all(&self.db)
            .await
            .map_err(db_error("查询班级考勤失败"))?;

        Ok(into_attendances(rows))
    }

    pub async fn get_attendance_by_teacher_impl(
        &self,
        teacher_id: i64,
        range: Option<DateRange>,
    ) -> Result<Vec<Attendance>> {
        let select = filter_range(
            Attendances::find().filter(Column::TeacherId.eq(teacher_id)),
            range,
        )?;

        let rows = select
            .order_by_desc(Column::Date)
            .order_by_asc(Column::Period)
            .order_by_asc(Column::ClassId)
            .order_by_asc(Column::StudentId)
            .all(&self.db)
            .await
            .map_err(db_error("查询教师考勤失败"))?;

        Ok(into_attendances(rows))
    }

    pub async fn get_attendance_by_period_impl(
        &self,
        period: i32,
        date: NaiveDate,
        class_id: Option<i64>,
    ) -> Result<Vec<Attendance>> {
        let mut select = Attendances::find()
            .filter(Column::Period.eq(period))
            .filter(Column::Date.eq(date));
        if let Some(class_id) = class_id {
            select = select.filter(Column::ClassId.eq(class_id));
        }

        let rows = select
            .order_by_asc(Column::ClassId)
            .order_by_asc(Column::StudentId)
            .all(&self.db)
            .await
            .map_err(db_error("查询课节考勤失败"))?;

        Ok(into_attendances(rows))
    }

    pub async fn get_attendance_by_date_impl(&self, date: NaiveDate) -> Result<Vec<Attendance>> {
        let rows = Attendances::find()
            .filter(Column::Date.eq(date))
            .order_by_asc(Column::ClassId)
            .order_by_asc(Column::Period)
            .order_by_asc(Column::StudentId)
            .all(&self.db)
            .await
            .map_err(db_error("查询当日考勤失败"))?;

        Ok(into_attendances(rows))
    }

    /// 一次 GROUP BY status 统计出勤、缺勤、迟到人次
    pub async fn get_dashboard_counts_impl(
        &self,
        date: NaiveDate,
        class_id: Option<i64>,
    ) -> Result<DashboardCounts> {
        let mut select = Attendances::find()
            .select_only()
            .column(Column::Status)
            .column_as(Column::Id.count(), "count")
            .filter(Column::Date.eq(date));
        if let Some(class_id) = class_id {
            select = select.filter(Column::ClassId.eq(class_id));
        }

        let rows: Vec<(String, i64)> = select
            .group_by(Column::Status)
            .into_tuple()
            .all(&self.db)
            .await
            .map_err(db_error("统计考勤失败"))?;

        let mut counts = DashboardCounts::default();
        for (status, count) in rows {
            // 与读取单条记录时一致，无法识别的状态计为缺勤
            let parsed = status.parse::<AttendanceStatus>().unwrap_or_else(|_| {
                warn!("考勤状态无法识别，按缺勤统计: {status}");
                AttendanceStatus::Absent
            });
            counts.add(parsed, Ord::max(count, 0) as u64);
        }
        Ok(counts)
    }

    /// 只更新一列和 updated_at，id 不存在时返回 NotFound
    async fn update_column_impl(
        &self,
        id: i64,
        column: Column,
        value: Option<String>,
        context: &'static str,
    ) -> Result<Attendance> {
        let result = Attendances::update_many()
            .col_expr(column, Expr::value(value))
            .col_expr(Column::UpdatedAt, advance_updated_at(Self::now_millis()).into())
            .filter(Column::Id.eq(id))
            .exec(&self.db)
            .await
            .map_err(db_error(context))?;

        if result.rows_affected == 0 {
            return Err(AttendanceError::not_found(format!("考勤记录 {id} 不存在")));
        }

        self.get_attendance_by_id_impl(id)
            .await?
            .ok_or_else(|| AttendanceError::not_found(format!("考勤记录 {id} 不存在")))
    }

    pub async fn update_remark_impl(&self, id: i64, remark: Option<String>) -> Result<Attendance> {
        self.update_column_impl(id, Column::Remark, remark, "更新考勤备注失败")
            .await
    }

    pub async fn update_notes_impl(&self, id: i64, notes: Option<String>) -> Result<Attendance> {
        self.update_column_impl(id, Column::Notes, notes, "更新考勤说明失败")
            .await
    }

    pub async fn get_attendance_by_id_impl(&self, id: i64) -> Result<Option<Attendance>> {
        let result = Attendances::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(db_error("查询考勤记录失败"))?;

        Ok(result.map(|m| m.into_attendance()))
    }
}
