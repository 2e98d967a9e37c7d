//! 考勤系统数据库迁移
//!
//! 迁移顺序即建表顺序：先建表，再做增量列，最后建索引。
//! 旧库数据导入时会先执行前 [`TABLE_MIGRATIONS`] 步，导入完成后再执行剩余的索引迁移。

pub use sea_orm_migration::prelude::*;

mod m20250301_000001_create_tables;
mod m20250301_000002_add_attendance_audit_columns;
mod m20250301_000003_create_indexes;

/// 建表相关迁移的数量（不含索引迁移）
pub const TABLE_MIGRATIONS: u32 = 2;

/// 考勤表上必须存在的唯一索引（去重键）
pub const ATTENDANCE_DEDUP_INDEX: &str = "uq_attendance_student_date_period";

/// 查询模式所需的二级索引：(索引名, 表名)
pub const REQUIRED_INDEXES: [(&str, &str); 10] = [
    ("idx_attendance_period", "attendance"),
    ("idx_attendance_class_id", "attendance"),
    ("idx_attendance_teacher_id", "attendance"),
    ("idx_attendance_student_id", "attendance"),
    ("idx_attendance_date", "attendance"),
    ("idx_attendance_student_date", "attendance"),
    ("idx_attendance_date_class", "attendance"),
    ("idx_student_class_id", "students"),
    ("idx_period_class_id", "periods"),
    ("idx_teacher_subject_teacher", "teacher_subjects"),
];

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20250301_000001_create_tables::Migration),
            Box::new(m20250301_000002_add_attendance_audit_columns::Migration),
            Box::new(m20250301_000003_create_indexes::Migration),
        ]
    }
}
