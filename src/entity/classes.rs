//! 班级实体

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "classes")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    #[sea_orm(unique)]
    pub name: String,
    pub created_at: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::students::Entity")]
    Students,
    #[sea_orm(has_many = "super::periods::Entity")]
    Periods,
    #[sea_orm(has_many = "super::user_classes::Entity")]
    UserClasses,
}

impl Related<super::students::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Students.def()
    }
}

impl Related<super::periods::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Periods.def()
    }
}

impl Related<super::user_classes::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::UserClasses.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

// 从数据库模型转换为业务模型
impl Model {
    pub fn into_class(self) -> crate::models::classes::entities::Class {
        use crate::models::classes::entities::Class;
        use chrono::{DateTime, Utc};

        Class {
            id: self.id,
            name: self.name,
            created_at: DateTime::<Utc>::from_timestamp_millis(self.created_at)
                .unwrap_or_default(),
        }
    }
}
