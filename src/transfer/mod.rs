//! 旧版 SQLite 数据导入
//!
//! 一次性、可重复执行的数据迁移：先建表，按外键顺序逐表复制并保留主键，
//! 最后再建索引。每行都是按主键（考勤按去重键）冲突更新的写入，
//! 因此重复执行会收敛到相同结果。

mod legacy;
mod tables;

use std::fmt;

use migration::{Migrator, MigratorTrait, TABLE_MIGRATIONS};
use sea_orm::{ConnectionTrait, DbBackend};
use tracing::{info, warn};

use crate::errors::{AttendanceError, Result, db_error};
use crate::storage::sea_orm_storage::SeaOrmStorage;

/// 带自增主键的目标表，PostgreSQL 上导入后需要推进序列
const SEQUENCE_TABLES: [&str; 8] = [
    "users",
    "classes",
    "subjects",
    "teacher_subjects",
    "students",
    "periods",
    "attendance",
    "user_classes",
];

/// 单表导入统计
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TableReport {
    pub table: &'static str,
    pub read: u64,
    pub written: u64,
    pub skipped: u64,
    pub failed: u64,
}

impl TableReport {
    pub fn new(table: &'static str) -> Self {
        Self {
            table,
            ..Default::default()
        }
    }
}

/// 整体导入统计
#[derive(Debug, Clone, Default)]
pub struct TransferReport {
    pub tables: Vec<TableReport>,
}

impl TransferReport {
    pub fn table(&self, name: &str) -> Option<&TableReport> {
        self.tables.iter().find(|t| t.table == name)
    }

    pub fn failed_total(&self) -> u64 {
        self.tables.iter().map(|t| t.failed).sum()
    }

    /// 没有任何行写入失败（跳过的行不算失败）
    pub fn is_success(&self) -> bool {
        self.failed_total() == 0
    }
}

impl fmt::Display for TransferReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "{:<18} {:>8} {:>8} {:>8} {:>8}",
            "table", "read", "written", "skipped", "failed"
        )?;
        for t in &self.tables {
            writeln!(
                f,
                "{:<18} {:>8} {:>8} {:>8} {:>8}",
                t.table, t.read, t.written, t.skipped, t.failed
            )?;
        }
        let status = if self.is_success() {
            "OK".to_string()
        } else {
            format!("FAILED ({} rows)", self.failed_total())
        };
        write!(f, "status: {status}")
    }
}

/// 把旧库数据导入目标库
///
/// `source` 为旧 SQLite 文件路径或 `sqlite:` URL。
/// 单行失败只记录并计数，不会中断导入；连接或建表失败直接返回错误。
pub async fn run(source: &str, target: &SeaOrmStorage) -> Result<TransferReport> {
    let legacy_db = legacy::open(source).await?;
    let db = target.connection();

    Migrator::up(db, Some(TABLE_MIGRATIONS))
        .await
        .map_err(|e| AttendanceError::from(e).with_context("创建数据表失败"))?;

    let now = chrono::Utc::now().timestamp_millis();
    let mut report = TransferReport::default();

    info!("开始导入旧库数据: {source}");

    let (users, class_lists) = tables::copy_users(&legacy_db, db, now).await?;
    report.tables.push(users);
    report
        .tables
        .push(tables::copy_classes(&legacy_db, db, now).await?);
    report
        .tables
        .push(tables::copy_user_classes(target, class_lists).await?);
    report
        .tables
        .push(tables::copy_subjects(&legacy_db, db, now).await?);
    report
        .tables
        .push(tables::copy_teacher_subjects(&legacy_db, db, now).await?);
    report
        .tables
        .push(tables::copy_students(&legacy_db, db, now).await?);
    report
        .tables
        .push(tables::copy_periods(&legacy_db, db, now).await?);
    report
        .tables
        .push(tables::copy_attendance(&legacy_db, db, now).await?);

    if db.get_database_backend() == DbBackend::Postgres {
        reset_sequences(target).await?;
    }

    Migrator::up(db, None)
        .await
        .map_err(|e| AttendanceError::from(e).with_context("创建索引失败"))?;

    if let Err(e) = legacy_db.close().await {
        warn!("关闭旧数据库失败: {e}");
    }

    if report.is_success() {
        info!("旧库数据导入完成");
    } else {
        warn!("旧库数据导入完成，{} 行写入失败", report.failed_total());
    }
    Ok(report)
}

/// 显式主键写入不会推进 PostgreSQL 序列，导入后把序列移到 MAX(id) 之后
async fn reset_sequences(target: &SeaOrmStorage) -> Result<()> {
    for table in SEQUENCE_TABLES {
        let sql = format!(
            "SELECT setval(pg_get_serial_sequence('\"{table}\"', 'id'), \
             COALESCE((SELECT MAX(id) FROM \"{table}\"), 0) + 1, false)"
        );
        target
            .connection()
            .execute_unprepared(&sql)
            .await
            .map_err(db_error("推进主键序列失败"))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_report(failed: u64) -> TransferReport {
        TransferReport {
            tables: vec![
                TableReport {
                    table: "users",
                    read: 3,
                    written: 2,
                    skipped: 1,
                    failed: 0,
                },
                TableReport {
                    table: "attendance",
                    read: 10,
                    written: 10 - failed,
                    skipped: 0,
                    failed,
                },
            ],
        }
    }

    #[test]
    fn test_skipped_rows_do_not_fail_transfer() {
        let report = sample_report(0);
        assert!(report.is_success());
        assert_eq!(report.table("users").map(|t| t.skipped), Some(1));
    }

    #[test]
    fn test_failed_rows_are_totalled() {
        let report = sample_report(2);
        assert!(!report.is_success());
        assert_eq!(report.failed_total(), 2);
        assert!(report.to_string().ends_with("status: FAILED (2 rows)"));
    }

    #[test]
    fn test_display_lists_every_table() {
        let text = sample_report(0).to_string();
        assert!(text.contains("users"));
        assert!(text.contains("attendance"));
        assert!(text.ends_with("status: OK"));
    }
}
