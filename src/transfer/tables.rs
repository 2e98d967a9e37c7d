//! 逐表复制
//!
//! 每行旧数据先转换为目标表的 ActiveModel，无法映射的行计为跳过，
//! 写入失败的行计为失败，两者都会记录日志并继续处理后续行。

use std::collections::{HashMap, HashSet};

use chrono::NaiveDate;
use sea_orm::sea_query::OnConflict;
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, DatabaseConnection, DbErr, EntityTrait, QuerySelect,
};
use tracing::{debug, warn};

use super::TableReport;
use super::legacy::{
    self, LegacyAttendance, LegacyClass, LegacyPeriod, LegacyStudent, LegacySubject,
    LegacyTeacherSubject, LegacyUser, non_empty,
};
use crate::entity::{attendance, classes, periods, students, subjects, teacher_subjects, users};
use crate::errors::{Result, db_error};
use crate::models::attendance::entities::AttendanceStatus;
use crate::models::users::entities::UserRole;
use crate::storage::sea_orm_storage::SeaOrmStorage;

/// 旧库行的主键，用于日志
pub(super) trait LegacyRow {
    fn legacy_id(&self) -> i64;
}

macro_rules! impl_legacy_row {
    ($($ty:ty),* $(,)?) => {
        $(
            impl LegacyRow for $ty {
                fn legacy_id(&self) -> i64 {
                    self.id
                }
            }
        )*
    };
}

impl_legacy_row!(
    LegacyUser,
    LegacyClass,
    LegacySubject,
    LegacyTeacherSubject,
    LegacyStudent,
    LegacyPeriod,
    LegacyAttendance,
);

async fn upsert_one<A>(
    db: &DatabaseConnection,
    model: A,
    on_conflict: &OnConflict,
) -> std::result::Result<(), DbErr>
where
    A: ActiveModelTrait + Send,
{
    <A::Entity as EntityTrait>::insert(model)
        .on_conflict(on_conflict.clone())
        .exec_without_returning(db)
        .await?;
    Ok(())
}

/// 把一组旧数据行写入目标表
///
/// `convert` 返回 `Err(原因)` 表示该行无法映射，计为跳过。
/// 返回成功写入的旧主键。
pub(super) async fn copy_rows<T, A, F>(
    db: &DatabaseConnection,
    report: &mut TableReport,
    rows: Vec<T>,
    on_conflict: &OnConflict,
    mut convert: F,
) -> Vec<i64>
where
    T: LegacyRow,
    A: ActiveModelTrait + Send,
    F: FnMut(T) -> std::result::Result<A, String>,
{
    let mut written = Vec::with_capacity(rows.len());
    for row in rows {
        report.read += 1;
        let id = row.legacy_id();

        let model = match convert(row) {
            Ok(model) => model,
            Err(reason) => {
                warn!("跳过 {} 行 {id}: {reason}", report.table);
                report.skipped += 1;
                continue;
            }
        };

        match upsert_one(db, model, on_conflict).await {
            Ok(()) => {
                report.written += 1;
                written.push(id);
            }
            Err(e) => {
                warn!("写入 {} 行 {id} 失败: {e}", report.table);
                report.failed += 1;
            }
        }
    }
    debug!(
        "{}: 读取 {}，写入 {}",
        report.table, report.read, report.written
    );
    written
}

fn required<T>(value: Option<T>, column: &str) -> std::result::Result<T, String> {
    value.ok_or_else(|| format!("缺少 {column}"))
}

fn required_text(value: Option<String>, column: &str) -> std::result::Result<String, String> {
    required(non_empty(value), column)
}

pub(super) async fn copy_users(
    source: &DatabaseConnection,
    db: &DatabaseConnection,
    now: i64,
) -> Result<(TableReport, HashMap<i64, Vec<i64>>)> {
    let mut report = TableReport::new("users");
    let Some(rows) =
        legacy::fetch::<LegacyUser>(source, "user", legacy::USER_COLUMNS).await?
    else {
        warn!("旧库中没有 user 表");
        return Ok((report, HashMap::new()));
    };

    let on_conflict = OnConflict::column(users::Column::Id)
        .update_columns([
            users::Column::Username,
            users::Column::Email,
            users::Column::PasswordHash,
            users::Column::Role,
            users::Column::NationalId,
            users::Column::UpdatedAt,
        ])
        .to_owned();

    let mut class_lists: HashMap<i64, Vec<i64>> = HashMap::new();
    let written = copy_rows(db, &mut report, rows, &on_conflict, |row: LegacyUser| {
        let username = required_text(row.name, "name")?;
        let role = required_text(row.role, "role")?;
        let role = role
            .to_ascii_lowercase()
            .parse::<UserRole>()
            .map_err(|_| format!("未知角色 '{role}'"))?;
        let password_hash = required_text(row.password_hash, "password_hash")?;

        if let Some(classes) = non_empty(row.classes) {
            class_lists.insert(row.id, legacy::parse_class_list(&classes));
        }

        Ok(users::ActiveModel {
            id: Set(row.id),
            username: Set(username),
            email: Set(non_empty(row.email)),
            password_hash: Set(password_hash),
            role: Set(role.to_string()),
            national_id: Set(non_empty(row.national_id)),
            is_active: Set(true),
            created_at: Set(now),
            updated_at: Set(now),
        })
    })
    .await;

    let written: HashSet<i64> = written.into_iter().collect();
    class_lists.retain(|user_id, _| written.contains(user_id));
    Ok((report, class_lists))
}

pub(super) async fn copy_classes(
    source: &DatabaseConnection,
    db: &DatabaseConnection,
    now: i64,
) -> Result<TableReport> {
    let mut report = TableReport::new("classes");
    let Some(rows) =
        legacy::fetch::<LegacyClass>(source, "school_class", legacy::CLASS_COLUMNS).await?
    else {
        warn!("旧库中没有 school_class 表");
        return Ok(report);
    };

    let on_conflict = OnConflict::column(classes::Column::Id)
        .update_column(classes::Column::Name)
        .to_owned();

    copy_rows(db, &mut report, rows, &on_conflict, |row: LegacyClass| {
        Ok(classes::ActiveModel {
            id: Set(row.id),
            name: Set(required_text(row.name, "name")?),
            created_at: Set(now),
        })
    })
    .await;
    Ok(report)
}

/// 按旧库的逗号列表重建教师班级分配，忽略目标库中不存在的班级
pub(super) async fn copy_user_classes(
    target: &SeaOrmStorage,
    class_lists: HashMap<i64, Vec<i64>>,
) -> Result<TableReport> {
    let mut report = TableReport::new("user_classes");

    let known: HashSet<i64> = classes::Entity::find()
        .select_only()
        .column(classes::Column::Id)
        .into_tuple::<i64>()
        .all(target.connection())
        .await
        .map_err(db_error("读取班级列表失败"))?
        .into_iter()
        .collect();

    let mut assignments: Vec<(i64, Vec<i64>)> = class_lists.into_iter().collect();
    assignments.sort_by_key(|(user_id, _)| *user_id);

    for (user_id, class_ids) in assignments {
        report.read += 1;
        let (kept, dropped): (Vec<i64>, Vec<i64>) =
            class_ids.into_iter().partition(|id| known.contains(id));
        if !dropped.is_empty() {
            warn!("用户 {user_id} 的班级 {dropped:?} 不存在，已忽略");
        }
        if kept.is_empty() {
            report.skipped += 1;
            continue;
        }

        match target.set_user_classes_impl(user_id, kept).await {
            Ok(()) => report.written += 1,
            Err(e) => {
                warn!("写入用户 {user_id} 的班级分配失败: {e}");
                report.failed += 1;
            }
        }
    }
    Ok(report)
}

pub(super) async fn copy_subjects(
    source: &DatabaseConnection,
    db: &DatabaseConnection,
    now: i64,
) -> Result<TableReport> {
    let mut report = TableReport::new("subjects");
    let Some(rows) =
        legacy::fetch::<LegacySubject>(source, "subject", legacy::SUBJECT_COLUMNS).await?
    else {
        warn!("旧库中没有 subject 表");
        return Ok(report);
    };

    let on_conflict = OnConflict::column(subjects::Column::Id)
        .update_columns([subjects::Column::Name, subjects::Column::Code])
        .to_owned();

    copy_rows(db, &mut report, rows, &on_conflict, |row: LegacySubject| {
        Ok(subjects::ActiveModel {
            id: Set(row.id),
            name: Set(required_text(row.name, "name")?),
            code: Set(non_empty(row.code)),
            created_at: Set(now),
        })
    })
    .await;
    Ok(report)
}

pub(super) async fn copy_teacher_subjects(
    source: &DatabaseConnection,
    db: &DatabaseConnection,
    now: i64,
) -> Result<TableReport> {
    let mut report = TableReport::new("teacher_subjects");
    let Some(rows) = legacy::fetch::<LegacyTeacherSubject>(
        source,
        "teacher_subject",
        legacy::TEACHER_SUBJECT_COLUMNS,
    )
    .await?
    else {
        // 早期旧库没有这张表
        debug!("旧库中没有 teacher_subject 表");
        return Ok(report);
    };

    let on_conflict = OnConflict::column(teacher_subjects::Column::Id)
        .update_columns([
            teacher_subjects::Column::TeacherId,
            teacher_subjects::Column::SubjectId,
        ])
        .to_owned();

    copy_rows(
        db,
        &mut report,
        rows,
        &on_conflict,
        |row: LegacyTeacherSubject| {
            Ok(teacher_subjects::ActiveModel {
                id: Set(row.id),
                teacher_id: Set(required(row.teacher_id, "teacher_id")?),
                subject_id: Set(required(row.subject_id, "subject_id")?),
                created_at: Set(now),
            })
        },
    )
    .await;
    Ok(report)
}

pub(super) async fn copy_students(
    source: &DatabaseConnection,
    db: &DatabaseConnection,
    now: i64,
) -> Result<TableReport> {
    let mut report = TableReport::new("students");
    let Some(rows) =
        legacy::fetch::<LegacyStudent>(source, "student", legacy::STUDENT_COLUMNS).await?
    else {
        warn!("旧库中没有 student 表");
        return Ok(report);
    };

    let on_conflict = OnConflict::column(students::Column::Id)
        .update_columns([
            students::Column::Name,
            students::Column::ClassId,
            students::Column::RollNumber,
            students::Column::Phone,
        ])
        .to_owned();

    copy_rows(db, &mut report, rows, &on_conflict, |row: LegacyStudent| {
        let roll_number =
            non_empty(row.national_id).unwrap_or_else(|| format!("STU{}", row.id));
        Ok(students::ActiveModel {
            id: Set(row.id),
            name: Set(required_text(row.name, "name")?),
            class_id: Set(required(row.class_id, "class_id")?),
            roll_number: Set(roll_number),
            phone: Set(non_empty(row.phone)),
            created_at: Set(now),
        })
    })
    .await;
    Ok(report)
}

pub(super) async fn copy_periods(
    source: &DatabaseConnection,
    db: &DatabaseConnection,
    now: i64,
) -> Result<TableReport> {
    let mut report = TableReport::new("periods");
    let Some(rows) =
        legacy::fetch::<LegacyPeriod>(source, "period", legacy::PERIOD_COLUMNS).await?
    else {
        warn!("旧库中没有 period 表");
        return Ok(report);
    };

    let on_conflict = OnConflict::column(periods::Column::Id)
        .update_columns([
            periods::Column::ClassId,
            periods::Column::PeriodNum,
            periods::Column::DayOfWeek,
            periods::Column::StartTime,
            periods::Column::EndTime,
            periods::Column::TeacherId,
            periods::Column::SubjectId,
        ])
        .to_owned();

    copy_rows(db, &mut report, rows, &on_conflict, |row: LegacyPeriod| {
        let period_num = required(row.period, "period")?;
        let period_num =
            i32::try_from(period_num).map_err(|_| format!("课节超出范围: {period_num}"))?;
        if period_num < 1 {
            return Err(format!("课节必须从 1 开始: {period_num}"));
        }

        Ok(periods::ActiveModel {
            id: Set(row.id),
            class_id: Set(required(row.class_id, "class_id")?),
            period_num: Set(period_num),
            day_of_week: Set(row.day_of_week.as_deref().and_then(legacy::parse_day_of_week)),
            start_time: Set(row.start_time.as_deref().and_then(legacy::parse_time)),
            end_time: Set(row.end_time.as_deref().and_then(legacy::parse_time)),
            // 旧库没有授课教师时保持为空，由管理员后续分配
            teacher_id: Set(row.teacher_id),
            subject_id: Set(row.subject_id),
            created_at: Set(now),
        })
    })
    .await;
    Ok(report)
}

/// 旧考勤行的时间戳：无法解析时使用导入时间，updated_at 不早于 created_at
fn attendance_timestamps(
    created_at: Option<&str>,
    updated_at: Option<&str>,
    now: i64,
) -> (i64, i64) {
    let created = created_at
        .and_then(legacy::parse_timestamp_millis)
        .unwrap_or(now);
    let updated = updated_at
        .and_then(legacy::parse_timestamp_millis)
        .unwrap_or(created);
    (created, updated.max(created))
}

fn check_student_class(
    student_classes: &HashMap<i64, i64>,
    student_id: i64,
    class_id: i64,
) -> std::result::Result<(), String> {
    match student_classes.get(&student_id) {
        None => Err(format!("学生 {student_id} 不存在")),
        Some(&actual) if actual != class_id => Err(format!(
            "学生 {student_id} 属于班级 {actual}，与考勤班级 {class_id} 不一致"
        )),
        Some(_) => Ok(()),
    }
}

pub(super) async fn copy_attendance(
    source: &DatabaseConnection,
    db: &DatabaseConnection,
    now: i64,
) -> Result<TableReport> {
    let mut report = TableReport::new("attendance");
    let Some(rows) =
        legacy::fetch::<LegacyAttendance>(source, "attendance", legacy::ATTENDANCE_COLUMNS)
            .await?
    else {
        warn!("旧库中没有 attendance 表");
        return Ok(report);
    };

    // 考勤的班级必须与学生当前所在班级一致
    let student_classes: HashMap<i64, i64> = students::Entity::find()
        .select_only()
        .columns([students::Column::Id, students::Column::ClassId])
        .into_tuple::<(i64, i64)>()
        .all(db)
        .await
        .map_err(db_error("读取学生班级失败"))?
        .into_iter()
        .collect();

    // 旧库可能存在同一去重键的多行，按去重键合并，后出现的行覆盖前者
    let on_conflict = OnConflict::columns([
        attendance::Column::StudentId,
        attendance::Column::Date,
        attendance::Column::Period,
    ])
    .update_columns([
        attendance::Column::ClassId,
        attendance::Column::TeacherId,
        attendance::Column::Status,
        attendance::Column::Remark,
        attendance::Column::Notes,
        attendance::Column::UpdatedAt,
    ])
    .to_owned();

    copy_rows(
        db,
        &mut report,
        rows,
        &on_conflict,
        |row: LegacyAttendance| {
            let date_text = required_text(row.date, "date")?;
            let date: NaiveDate = legacy::parse_date(&date_text)
                .ok_or_else(|| format!("无法解析日期 '{date_text}'"))?;
            let status_text = required_text(row.status, "status")?;
            let status = status_text
                .parse::<AttendanceStatus>()
                .map_err(|_| format!("未知考勤状态 '{status_text}'"))?;
            let period = required(row.period, "period")?;
            let period = i32::try_from(period).map_err(|_| format!("课节超出范围: {period}"))?;
            let student_id = required(row.student_id, "student_id")?;
            let class_id = required(row.class_id, "class_id")?;
            check_student_class(&student_classes, student_id, class_id)?;
            let (created_at, updated_at) =
                attendance_timestamps(row.created_at.as_deref(), row.updated_at.as_deref(), now);

            Ok(attendance::ActiveModel {
                id: Set(row.id),
                student_id: Set(student_id),
                class_id: Set(class_id),
                teacher_id: Set(required(row.teacher_id, "teacher_id")?),
                period: Set(period),
                date: Set(date),
                status: Set(status.to_string()),
                remark: Set(non_empty(row.remark)),
                notes: Set(non_empty(row.notes)),
                created_at: Set(created_at),
                updated_at: Set(updated_at),
            })
        },
    )
    .await;
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_attendance_timestamps_default_to_transfer_time() {
        assert_eq!(attendance_timestamps(None, None, 1_000), (1_000, 1_000));
    }

    #[test]
    fn test_attendance_updated_never_before_created() {
        let (created, updated) =
            attendance_timestamps(Some("2024-01-10 08:00:00"), Some("2024-01-09"), 0);
        assert_eq!(created, 1_704_873_600_000);
        assert_eq!(updated, created);
    }

    #[test]
    fn test_attendance_unparseable_updated_uses_created() {
        let (created, updated) =
            attendance_timestamps(Some("1704873600"), Some("not a time"), 0);
        assert_eq!(created, 1_704_873_600_000);
        assert_eq!(updated, created);
    }

    #[test]
    fn test_attendance_class_must_match_student() {
        let student_classes = HashMap::from([(10, 1), (11, 1)]);
        assert!(check_student_class(&student_classes, 10, 1).is_ok());
        assert!(check_student_class(&student_classes, 10, 2).is_err());
        assert!(check_student_class(&student_classes, 99, 1).is_err());
    }

    #[test]
    fn test_required_text_rejects_blank() {
        assert!(required_text(Some("  ".to_string()), "name").is_err());
        assert_eq!(
            required_text(Some(" 7A ".to_string()), "name").as_deref(),
            Ok("7A")
        );
    }
}
