//! 班级存储操作

use super::SeaOrmStorage;
use crate::entity::classes::{ActiveModel, Column, Entity as Classes};
use crate::errors::{Result, db_error};
use crate::models::classes::{entities::Class, requests::CreateClassRequest};
use sea_orm::{ActiveModelTrait, EntityTrait, QueryOrder, Set};

impl SeaOrmStorage {
    /// 创建班级
    pub async fn create_class_impl(&self, req: CreateClassRequest) -> Result<Class> {
        let model = ActiveModel {
            name: Set(req.name.trim().to_string()),
            created_at: Set(Self::now_millis()),
            ..Default::default()
        };

        let result = model
            .insert(&self.db)
            .await
            .map_err(db_error("创建班级失败"))?;

        Ok(result.into_class())
    }

    /// 列出全部班级，按名称排序
    pub async fn list_classes_impl(&self) -> Result<Vec<Class>> {
        let classes = Classes::find()
            .order_by_asc(Column::Name)
            .all(&self.db)
            .await
            .map_err(db_error("查询班级列表失败"))?;

        Ok(classes.into_iter().map(|m| m.into_class()).collect())
    }
}
