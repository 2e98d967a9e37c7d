use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

// 考勤状态
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum AttendanceStatus {
    Present, // 出勤
    Absent,  // 缺勤
    Late,    // 迟到
}

impl AttendanceStatus {
    pub const PRESENT: &'static str = "present";
    pub const ABSENT: &'static str = "absent";
    pub const LATE: &'static str = "late";
}

impl<'de> Deserialize<'de> for AttendanceStatus {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse::<AttendanceStatus>().map_err(|_| {
            serde::de::Error::custom(format!(
                "无效的考勤状态: '{s}'. 支持的状态: present, absent, late"
            ))
        })
    }
}

impl std::fmt::Display for AttendanceStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AttendanceStatus::Present => write!(f, "{}", AttendanceStatus::PRESENT),
            AttendanceStatus::Absent => write!(f, "{}", AttendanceStatus::ABSENT),
            AttendanceStatus::Late => write!(f, "{}", AttendanceStatus::LATE),
        }
    }
}

impl std::str::FromStr for AttendanceStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            AttendanceStatus::PRESENT => Ok(AttendanceStatus::Present),
            AttendanceStatus::ABSENT => Ok(AttendanceStatus::Absent),
            AttendanceStatus::LATE => Ok(AttendanceStatus::Late),
            _ => Err(format!("Invalid attendance status: {s}")),
        }
    }
}

// 考勤记录
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Attendance {
    pub id: i64,
    pub student_id: i64,
    pub class_id: i64,
    pub teacher_id: i64,
    pub period: i32,
    pub date: NaiveDate,
    pub status: AttendanceStatus,
    pub remark: Option<String>,
    pub notes: Option<String>,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

// 带学生姓名的考勤记录（员工看板使用）
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AttendanceWithStudent {
    #[serde(flatten)]
    pub attendance: Attendance,
    pub student_name: String,
}

// 看板统计
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct DashboardCounts {
    pub present: u64,
    pub absent: u64,
    pub late: u64,
}

impl DashboardCounts {
    pub fn add(&mut self, status: AttendanceStatus, count: u64) {
        match status {
            AttendanceStatus::Present => self.present += count,
            AttendanceStatus::Absent => self.absent += count,
            AttendanceStatus::Late => self.late += count,
        }
    }

    pub fn total(&self) -> u64 {
        self.present + self.absent + self.late
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_parse_is_case_insensitive() {
        assert_eq!(
            " Present ".parse::<AttendanceStatus>().unwrap(),
            AttendanceStatus::Present
        );
        assert_eq!("LATE".parse::<AttendanceStatus>().unwrap(), AttendanceStatus::Late);
        assert!("excused".parse::<AttendanceStatus>().is_err());
    }

    #[test]
    fn test_dashboard_counts_total() {
        let mut counts = DashboardCounts::default();
        counts.add(AttendanceStatus::Present, 10);
        counts.add(AttendanceStatus::Absent, 2);
        counts.add(AttendanceStatus::Late, 1);
        counts.add(AttendanceStatus::Present, 1);
        assert_eq!(
            counts,
            DashboardCounts {
                present: 11,
                absent: 2,
                late: 1
            }
        );
        assert_eq!(counts.total(), 14);
    }
}
