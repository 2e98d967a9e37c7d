//! 旧版 SQLite 数据库读取
//!
//! 旧库的列随版本增减，先用 `pragma_table_info` 取得实际列名，
//! 缺失的可选列以 NULL 代替，再按固定结构读取。

use std::collections::HashSet;
use std::path::Path;

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use sea_orm::{
    ConnectionTrait, Database, DatabaseConnection, DbBackend, FromQueryResult, Statement,
};

use crate::errors::{AttendanceError, Result, db_error};

#[derive(Debug, Clone, Copy)]
pub(super) enum SqlKind {
    Integer,
    Text,
}

/// 目标列及其在旧库中可能的列名
pub(super) struct ColumnSpec {
    pub alias: &'static str,
    pub candidates: &'static [&'static str],
    pub kind: SqlKind,
}

const fn col(
    alias: &'static str,
    candidates: &'static [&'static str],
    kind: SqlKind,
) -> ColumnSpec {
    ColumnSpec {
        alias,
        candidates,
        kind,
    }
}

pub(super) const USER_COLUMNS: &[ColumnSpec] = &[
    col("id", &["id"], SqlKind::Integer),
    col("name", &["name", "username"], SqlKind::Text),
    col("role", &["role"], SqlKind::Text),
    col("password_hash", &["password_hash", "password"], SqlKind::Text),
    col("email", &["email"], SqlKind::Text),
    col("national_id", &["national_id"], SqlKind::Text),
    col("classes", &["classes"], SqlKind::Text),
];

pub(super) const CLASS_COLUMNS: &[ColumnSpec] = &[
    col("id", &["id"], SqlKind::Integer),
    col("name", &["name"], SqlKind::Text),
];

pub(super) const SUBJECT_COLUMNS: &[ColumnSpec] = &[
    col("id", &["id"], SqlKind::Integer),
    col("name", &["name"], SqlKind::Text),
    col("code", &["code"], SqlKind::Text),
];

pub(super) const TEACHER_SUBJECT_COLUMNS: &[ColumnSpec] = &[
    col("id", &["id"], SqlKind::Integer),
    col("teacher_id", &["teacher_id"], SqlKind::Integer),
    col("subject_id", &["subject_id"], SqlKind::Integer),
];

pub(super) const STUDENT_COLUMNS: &[ColumnSpec] = &[
    col("id", &["id"], SqlKind::Integer),
    col("name", &["name"], SqlKind::Text),
    col("class_id", &["class_id"], SqlKind::Integer),
    col("national_id", &["national_id", "roll_number"], SqlKind::Text),
    col("phone", &["phone1", "phone"], SqlKind::Text),
];

pub(super) const PERIOD_COLUMNS: &[ColumnSpec] = &[
    col("id", &["id"], SqlKind::Integer),
    col("day_of_week", &["day_of_week"], SqlKind::Text),
    col("period", &["period", "period_num"], SqlKind::Integer),
    col("start_time", &["start_time"], SqlKind::Text),
    col("end_time", &["end_time"], SqlKind::Text),
    col("class_id", &["class_id"], SqlKind::Integer),
    col("subject_id", &["subject_id"], SqlKind::Integer),
    col("teacher_id", &["teacher_id"], SqlKind::Integer),
];

pub(super) const ATTENDANCE_COLUMNS: &[ColumnSpec] = &[
    col("id", &["id"], SqlKind::Integer),
    col("student_id", &["student_id"], SqlKind::Integer),
    col("class_id", &["class_id"], SqlKind::Integer),
    col("teacher_id", &["teacher_id"], SqlKind::Integer),
    col("period", &["period"], SqlKind::Integer),
    col("date", &["date"], SqlKind::Text),
    col("status", &["status"], SqlKind::Text),
    col("remark", &["remark"], SqlKind::Text),
    col("notes", &["notes"], SqlKind::Text),
    col("created_at", &["created_at"], SqlKind::Text),
    col("updated_at", &["updated_at"], SqlKind::Text),
];

#[derive(Debug, FromQueryResult)]
pub(super) struct LegacyUser {
    pub id: i64,
    pub name: Option<String>,
    pub role: Option<String>,
    pub password_hash: Option<String>,
    pub email: Option<String>,
    pub national_id: Option<String>,
    pub classes: Option<String>,
}

#[derive(Debug, FromQueryResult)]
pub(super) struct LegacyClass {
    pub id: i64,
    pub name: Option<String>,
}

#[derive(Debug, FromQueryResult)]
pub(super) struct LegacySubject {
    pub id: i64,
    pub name: Option<String>,
    pub code: Option<String>,
}

#[derive(Debug, FromQueryResult)]
pub(super) struct LegacyTeacherSubject {
    pub id: i64,
    pub teacher_id: Option<i64>,
    pub subject_id: Option<i64>,
}

#[derive(Debug, FromQueryResult)]
pub(super) struct LegacyStudent {
    pub id: i64,
    pub name: Option<String>,
    pub class_id: Option<i64>,
    pub national_id: Option<String>,
    pub phone: Option<String>,
}

#[derive(Debug, FromQueryResult)]
pub(super) struct LegacyPeriod {
    pub id: i64,
    pub day_of_week: Option<String>,
    pub period: Option<i64>,
    pub start_time: Option<String>,
    pub end_time: Option<String>,
    pub class_id: Option<i64>,
    pub subject_id: Option<i64>,
    pub teacher_id: Option<i64>,
}

#[derive(Debug, FromQueryResult)]
pub(super) struct LegacyAttendance {
    pub id: i64,
    pub student_id: Option<i64>,
    pub class_id: Option<i64>,
    pub teacher_id: Option<i64>,
    pub period: Option<i64>,
    pub date: Option<String>,
    pub status: Option<String>,
    pub remark: Option<String>,
    pub notes: Option<String>,
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
}

#[derive(Debug, FromQueryResult)]
struct TableColumn {
    name: String,
}

/// 以只读方式打开旧库，接受文件路径或 sqlite: URL
pub(super) async fn open(source: &str) -> Result<DatabaseConnection> {
    let source = source.trim();
    let url = if source.starts_with("sqlite:") {
        source.to_string()
    } else {
        if !Path::new(source).is_file() {
            return Err(AttendanceError::file_operation(format!(
                "旧数据库文件不存在: {source}"
            )));
        }
        format!("sqlite://{source}?mode=ro")
    };

    Database::connect(url)
        .await
        .map_err(|e| AttendanceError::connection(format!("无法打开旧数据库: {e}")))
}

/// 旧库表的实际列名，表不存在时返回 None
async fn table_columns(
    source: &DatabaseConnection,
    table: &str,
) -> Result<Option<HashSet<String>>> {
    let columns = TableColumn::find_by_statement(Statement::from_sql_and_values(
        DbBackend::Sqlite,
        "SELECT name FROM pragma_table_info(?)",
        [table.into()],
    ))
    .all(source)
    .await
    .map_err(db_error("读取旧表结构失败"))?;

    if columns.is_empty() {
        return Ok(None);
    }
    Ok(Some(
        columns
            .into_iter()
            .map(|c| c.name.to_ascii_lowercase())
            .collect(),
    ))
}

/// 按列规格拼出查询语句，缺失的列读作 NULL
pub(super) fn select_sql(
    table: &str,
    specs: &[ColumnSpec],
    present: &HashSet<String>,
) -> String {
    let columns: Vec<String> = specs
        .iter()
        .map(|spec| {
            let found = spec
                .candidates
                .iter()
                .find(|name| present.contains(**name));
            match (found, spec.kind) {
                (Some(name), SqlKind::Integer) => {
                    format!("CAST(\"{name}\" AS INTEGER) AS \"{}\"", spec.alias)
                }
                (Some(name), SqlKind::Text) => {
                    format!("CAST(\"{name}\" AS TEXT) AS \"{}\"", spec.alias)
                }
                (None, _) => format!("NULL AS \"{}\"", spec.alias),
            }
        })
        .collect();
    format!(
        "SELECT {} FROM \"{table}\" ORDER BY \"id\"",
        columns.join(", ")
    )
}

/// 读取整张旧表，表不存在时返回 None
pub(super) async fn fetch<T: FromQueryResult>(
    source: &DatabaseConnection,
    table: &str,
    specs: &[ColumnSpec],
) -> Result<Option<Vec<T>>> {
    let Some(present) = table_columns(source, table).await? else {
        return Ok(None);
    };

    let sql = select_sql(table, specs, &present);
    let rows = T::find_by_statement(Statement::from_string(source.get_database_backend(), sql))
        .all(source)
        .await
        .map_err(db_error("读取旧表失败"))?;
    Ok(Some(rows))
}

/// 去掉首尾空白，空字符串视为缺失
pub(super) fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// 逗号分隔的班级 ID 列表，忽略无法解析的项
pub(super) fn parse_class_list(value: &str) -> Vec<i64> {
    value
        .split(',')
        .filter_map(|part| part.trim().parse::<i64>().ok())
        .collect()
}

pub(super) fn parse_date(value: &str) -> Option<NaiveDate> {
    let value = value.trim();
    let head = value.get(..10).unwrap_or(value);
    NaiveDate::parse_from_str(head, "%Y-%m-%d").ok()
}

pub(super) fn parse_time(value: &str) -> Option<NaiveTime> {
    let value = value.trim();
    NaiveTime::parse_from_str(value, "%H:%M:%S%.f")
        .or_else(|_| NaiveTime::parse_from_str(value, "%H:%M"))
        .ok()
}

/// 0 = 周日 ... 6 = 周六，也接受英文星期名
pub(super) fn parse_day_of_week(value: &str) -> Option<i32> {
    let value = value.trim();
    if let Ok(day) = value.parse::<i32>() {
        return (0..=6).contains(&day).then_some(day);
    }
    let day = match value.to_ascii_lowercase().get(..3)? {
        "sun" => 0,
        "mon" => 1,
        "tue" => 2,
        "wed" => 3,
        "thu" => 4,
        "fri" => 5,
        "sat" => 6,
        _ => return None,
    };
    Some(day)
}

/// 旧库时间戳转为毫秒，支持文本日期时间和秒/毫秒整数
pub(super) fn parse_timestamp_millis(value: &str) -> Option<i64> {
    let value = value.trim();
    if let Ok(n) = value.parse::<i64>() {
        // 小于 1e11 的数按秒处理
        return Some(if n.abs() < 100_000_000_000 { n * 1000 } else { n });
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.with_timezone(&Utc).timestamp_millis());
    }
    ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(value, fmt).ok())
        .or_else(|| parse_date(value).and_then(|d| d.and_hms_opt(0, 0, 0)))
        .map(|dt| dt.and_utc().timestamp_millis())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_select_sql_fills_missing_columns() {
        let present: HashSet<String> = ["id", "name", "password", "role"]
            .into_iter()
            .map(String::from)
            .collect();
        let sql = select_sql("user", USER_COLUMNS, &present);
        assert!(sql.starts_with("SELECT CAST(\"id\" AS INTEGER) AS \"id\""));
        assert!(sql.contains("CAST(\"password\" AS TEXT) AS \"password_hash\""));
        assert!(sql.contains("NULL AS \"classes\""));
        assert!(sql.ends_with("FROM \"user\" ORDER BY \"id\""));
    }

    #[test]
    fn test_parse_class_list() {
        assert_eq!(parse_class_list("1, 2,x,,5"), vec![1, 2, 5]);
        assert!(parse_class_list("").is_empty());
    }

    #[test]
    fn test_parse_day_of_week() {
        assert_eq!(parse_day_of_week("3"), Some(3));
        assert_eq!(parse_day_of_week("Monday"), Some(1));
        assert_eq!(parse_day_of_week("sun"), Some(0));
        assert_eq!(parse_day_of_week("9"), None);
        assert_eq!(parse_day_of_week("someday"), None);
    }

    #[test]
    fn test_parse_timestamp_millis() {
        assert_eq!(
            parse_timestamp_millis("2024-01-10 08:15:00.500000"),
            Some(1_704_874_500_500)
        );
        assert_eq!(parse_timestamp_millis("1704874500"), Some(1_704_874_500_000));
        assert_eq!(
            parse_timestamp_millis("1704874500500"),
            Some(1_704_874_500_500)
        );
        assert_eq!(parse_timestamp_millis("2024-01-10"), Some(1_704_844_800_000));
        assert_eq!(parse_timestamp_millis("yesterday"), None);
    }

    #[test]
    fn test_parse_date_and_time() {
        assert_eq!(
            parse_date("2024-01-10 00:00:00"),
            NaiveDate::from_ymd_opt(2024, 1, 10)
        );
        assert_eq!(parse_time("08:05"), NaiveTime::from_hms_opt(8, 5, 0));
        assert_eq!(parse_time("08:05:30"), NaiveTime::from_hms_opt(8, 5, 30));
        assert_eq!(parse_time("8 o'clock"), None);
    }
}
