use chrono::NaiveDate;
use serde::Deserialize;

use super::entities::AttendanceStatus;
use crate::errors::{AttendanceError, Result};

// 单条考勤写入（按去重键 upsert）
#[derive(Debug, Clone, Deserialize)]
pub struct UpsertAttendance {
    pub student_id: i64,
    pub class_id: i64,
    pub teacher_id: i64,
    pub period: i32,
    pub date: NaiveDate,
    pub status: AttendanceStatus,
    pub remark: Option<String>,
}

// 一节课的整班点名
#[derive(Debug, Clone, Deserialize)]
pub struct RollCall {
    pub teacher_id: i64,
    pub class_id: i64,
    pub period: i32,
    pub date: NaiveDate,
    pub entries: Vec<RollCallEntry>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RollCallEntry {
    pub student_id: i64,
    pub status: AttendanceStatus,
    pub remark: Option<String>,
}

impl RollCall {
    /// 拆分为逐个学生的写入请求
    pub fn into_upserts(self) -> Vec<UpsertAttendance> {
        let RollCall {
            teacher_id,
            class_id,
            period,
            date,
            entries,
        } = self;
        entries
            .into_iter()
            .map(|entry| UpsertAttendance {
                student_id: entry.student_id,
                class_id,
                teacher_id,
                period,
                date,
                status: entry.status,
                remark: entry.remark,
            })
            .collect()
    }
}

// 日期区间，两端均为闭区间，均可省略
#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
pub struct DateRange {
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

impl DateRange {
    pub fn new(from: Option<NaiveDate>, to: Option<NaiveDate>) -> Result<Self> {
        let range = Self { from, to };
        range.validate()?;
        Ok(range)
    }

    pub fn validate(&self) -> Result<()> {
        if let (Some(from), Some(to)) = (self.from, self.to)
            && from > to
        {
            return Err(AttendanceError::validation(format!(
                "date range start {from} is after end {to}"
            )));
        }
        Ok(())
    }

    pub fn is_unbounded(&self) -> bool {
        self.from.is_none() && self.to.is_none()
    }
}

// 员工看板查询参数
#[derive(Debug, Clone, Deserialize)]
pub struct DateClassQuery {
    pub date: NaiveDate,
    pub class_id: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DashboardQuery {
    pub date: NaiveDate,
    pub class_id: Option<i64>,
}

// 备注更新请求
#[derive(Debug, Clone, Deserialize)]
pub struct UpdateRemarkRequest {
    pub remark: Option<String>,
}

// 说明更新请求
#[derive(Debug, Clone, Deserialize)]
pub struct UpdateNotesRequest {
    pub notes: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, d).unwrap()
    }

    #[test]
    fn test_date_range_rejects_reversed_bounds() {
        assert!(DateRange::new(Some(day(10)), Some(day(9))).is_err());
        assert!(DateRange::new(Some(day(9)), Some(day(9))).is_ok());
        assert!(DateRange::new(None, Some(day(9))).is_ok());
    }

    #[test]
    fn test_roll_call_into_upserts_copies_header() {
        let roll = RollCall {
            teacher_id: 3,
            class_id: 5,
            period: 2,
            date: day(10),
            entries: vec![
                RollCallEntry {
                    student_id: 42,
                    status: AttendanceStatus::Present,
                    remark: None,
                },
                RollCallEntry {
                    student_id: 43,
                    status: AttendanceStatus::Late,
                    remark: Some("bus".into()),
                },
            ],
        };
        let upserts = roll.into_upserts();
        assert_eq!(upserts.len(), 2);
        assert!(upserts
            .iter()
            .all(|u| u.teacher_id == 3 && u.class_id == 5 && u.period == 2 && u.date == day(10)));
        assert_eq!(upserts[1].remark.as_deref(), Some("bus"));
    }
}
