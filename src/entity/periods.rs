//! 课节实体

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "periods")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub class_id: i64,
    pub period_num: i32,
    pub day_of_week: Option<i32>,
    pub start_time: Option<Time>,
    pub end_time: Option<Time>,
    pub teacher_id: Option<i64>,
    pub subject_id: Option<i64>,
    pub created_at: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
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
    #[sea_orm(
        belongs_to = "super::subjects::Entity",
        from = "Column::SubjectId",
        to = "super::subjects::Column::Id"
    )]
    Subject,
}

impl Related<super::classes::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Class.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    pub fn into_period(self) -> crate::models::periods::entities::Period {
        use crate::models::periods::entities::Period;
        use chrono::{DateTime, Utc};

        Period {
            id: self.id,
            class_id: self.class_id,
            period_num: self.period_num,
            day_of_week: self.day_of_week,
            start_time: self.start_time,
            end_time: self.end_time,
            teacher_id: self.teacher_id,
            subject_id: self.subject_id,
            created_at: DateTime::<Utc>::from_timestamp_millis(self.created_at)
                .unwrap_or_default(),
        }
    }
}
