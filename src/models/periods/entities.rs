use chrono::NaiveTime;
use serde::{Deserialize, Serialize};

// 课节：属于一个班级的时间段
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Period {
    pub id: i64,
    pub class_id: i64,
    // 第几节课
    pub period_num: i32,
    // 0 = 周日 ... 6 = 周六
    pub day_of_week: Option<i32>,
    pub start_time: Option<NaiveTime>,
    pub end_time: Option<NaiveTime>,
    pub teacher_id: Option<i64>,
    pub subject_id: Option<i64>,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

impl Period {
    /// 判断某个时刻是否落在本节课的时间段内
    pub fn contains(&self, time: NaiveTime) -> bool {
        match (self.start_time, self.end_time) {
            (Some(start), Some(end)) => start <= time && time <= end,
            _ => false,
        }
    }
}

/// 当前课节：按节次顺序找第一个覆盖该时刻的课节，都不覆盖时取当天第一节
///
/// `periods` 需已按节次排序。
pub fn resolve_current(periods: &[Period], time: NaiveTime) -> Option<&Period> {
    periods
        .iter()
        .find(|p| p.contains(time))
        .or_else(|| periods.first())
}

/// 某班某天的课表及当前课节
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct DaySchedule {
    pub day_of_week: i32,
    pub periods: Vec<Period>,
    pub current_period: Option<i32>,
}
