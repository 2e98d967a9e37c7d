use chrono::NaiveTime;
use serde::Deserialize;

use crate::errors::{AttendanceError, Result};

#[derive(Debug, Clone, Deserialize)]
pub struct CreatePeriodRequest {
    pub class_id: i64,
    pub period_num: i32,
    pub day_of_week: Option<i32>,
    pub start_time: Option<NaiveTime>,
    pub end_time: Option<NaiveTime>,
    pub teacher_id: Option<i64>,
    pub subject_id: Option<i64>,
}

impl CreatePeriodRequest {
    pub fn validate(&self) -> Result<()> {
        if self.period_num < 1 {
            return Err(AttendanceError::validation(format!(
                "节次必须从 1 开始: {}",
                self.period_num
            )));
        }
        if let Some(day) = self.day_of_week
            && !(0..=6).contains(&day)
        {
            return Err(AttendanceError::validation(format!(
                "星期取值 0-6（0 为周日）: {day}"
            )));
        }
        if let (Some(start), Some(end)) = (self.start_time, self.end_time)
            && start >= end
        {
            return Err(AttendanceError::validation(format!(
                "开始时间 {start} 必须早于结束时间 {end}"
            )));
        }
        Ok(())
    }
}

/// 课表查询参数，缺省时使用服务器本地的今天和当前时刻
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ScheduleQuery {
    pub day_of_week: Option<i32>,
    pub time: Option<NaiveTime>,
}
