use serde::Serialize;

// 单个索引的检查结果
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct IndexStatus {
    pub name: String,
    pub table: String,
    pub present: bool,
}

// 结构检查报告
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct SchemaReport {
    pub indexes: Vec<IndexStatus>,
    // (student_id, date, period) 唯一索引
    pub dedup_index_present: bool,
}

impl SchemaReport {
    pub fn missing(&self) -> Vec<&IndexStatus> {
        self.indexes.iter().filter(|i| !i.present).collect()
    }

    pub fn is_complete(&self) -> bool {
        self.dedup_index_present && self.indexes.iter().all(|i| i.present)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn status(name: &str, present: bool) -> IndexStatus {
        IndexStatus {
            name: name.to_string(),
            table: "attendance".to_string(),
            present,
        }
    }

    #[test]
    fn test_report_lists_missing_indexes() {
        let report = SchemaReport {
            indexes: vec![
                status("idx_attendance_date", true),
                status("idx_attendance_period", false),
            ],
            dedup_index_present: true,
        };
        assert!(!report.is_complete());
        assert_eq!(report.missing().len(), 1);
        assert_eq!(report.missing()[0].name, "idx_attendance_period");
    }

    #[test]
    fn test_report_requires_dedup_index() {
        let report = SchemaReport {
            indexes: vec![status("idx_attendance_date", true)],
            dedup_index_present: false,
        };
        assert!(!report.is_complete());
    }
}
