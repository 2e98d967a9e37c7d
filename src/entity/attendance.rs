//! 考勤记录实体
//!
//! (student_id, date, period) 在数据库层唯一。

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "attendance")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub student_id: i64,
    pub class_id: i64,
    pub teacher_id: i64,
    pub period: i32,
    pub date: Date,
    pub status: String,
    pub remark: Option<String>,
    #[sea_orm(column_type = "Text", nullable)]
    pub notes: Option<String>,
    pub created_at: i64,
    pub updated_at: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::students::Entity",
        from = "Column::StudentId",
        to = "super::students::Column::Id"
    )]
    Student,
    #[sea_orm(
        belongs_to = "super::classes::Entity",
        from = "Column::ClassId",
        to = "super::classes::Column::Id"
    )]
    Class,
    #[sea_orm(
        belongs_to = "super::users::Entity",
        from = "Column::TeacherId",
        to = "super::users::Column::Id"
    )]
    Teacher,
}

impl Related<super::students::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Student.def()
    }
}

impl Related<super::classes::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Class.def()
    }
}

impl Related<super::users::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Teacher.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

// 从数据库模型转换为业务模型
impl Model {
    pub fn into_attendance(self) -> crate::models::attendance::entities::Attendance {
        use crate::models::attendance::entities::{Attendance, AttendanceStatus};
        use chrono::{DateTime, Utc};

        Attendance {
            id: self.id,
            student_id: self.student_id,
            class_id: self.class_id,
            teacher_id: self.teacher_id,
            period: self.period,
            date: self.date,
            // 历史数据中无法识别的状态按缺勤处理
            status: self
                .status
                .parse::<AttendanceStatus>()
                .unwrap_or(AttendanceStatus::Absent),
            remark: self.remark,
            notes: self.notes,
            created_at: DateTime::<Utc>::from_timestamp_millis(self.created_at)
                .unwrap_or_default(),
            updated_at: DateTime::<Utc>::from_timestamp_millis(self.updated_at)
                .unwrap_or_default(),
        }
    }
}
