use super::SeaOrmStorage;
use crate::entity::user_classes::{
    ActiveModel as UserClassActiveModel, Column as UserClassColumn, Entity as UserClasses,
};
use crate::entity::users::{ActiveModel, Column, Entity as Users};
use crate::errors::{AttendanceError, Result, db_error};
use crate::models::users::{entities::User, requests::CreateUserRequest};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
    QuerySelect, Set, TransactionTrait,
};

impl SeaOrmStorage {
    /// 创建用户
    pub async fn create_user_impl(&self, req: CreateUserRequest) -> Result<User> {
        let now = Self::now_millis();

        let model = ActiveModel {
            username: Set(req.username),
            email: Set(req.email),
            password_hash: Set(req.password),
            role: Set(req.role.to_string()),
            national_id: Set(req.national_id),
            is_active: Set(true),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        };

        let result = model
            .insert(&self.db)
            .await
            .map_err(db_error("创建用户失败"))?;

        Ok(result.into_user())
    }

    /// 通过 ID 获取用户
    pub async fn get_user_by_id_impl(&self, id: i64) -> Result<Option<User>> {
        let result = Users::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(db_error("查询用户失败"))?;

        Ok(result.map(|m| m.into_user()))
    }

    /// 通过用户名获取用户
    pub async fn get_user_by_username_impl(&self, username: &str) -> Result<Option<User>> {
        let result = Users::find()
            .filter(Column::Username.eq(username))
            .one(&self.db)
            .await
            .map_err(db_error("查询用户失败"))?;

        Ok(result.map(|m| m.into_user()))
    }

    /// 用户总数
    pub async fn count_users_impl(&self) -> Result<u64> {
        Users::find()
            .count(&self.db)
            .await
            .map_err(db_error("统计用户失败"))
    }

    /// 停用用户，返回是否存在该用户
    pub async fn disable_user_impl(&self, id: i64) -> Result<bool> {
        let result = Users::update_many()
            .col_expr(Column::IsActive, sea_orm::sea_query::Expr::value(false))
            .col_expr(
                Column::UpdatedAt,
                sea_orm::sea_query::Expr::value(Self::now_millis()),
            )
            .filter(Column::Id.eq(id))
            .exec(&self.db)
            .await
            .map_err(db_error("停用用户失败"))?;

        Ok(result.rows_affected > 0)
    }

    /// 用新的有序列表替换用户的班级分配
    pub async fn set_user_classes_impl(&self, user_id: i64, class_ids: Vec<i64>) -> Result<()> {
        let mut ordered: Vec<i64> = Vec::with_capacity(class_ids.len());
        for class_id in class_ids {
            if !ordered.contains(&class_id) {
                ordered.push(class_id);
            }
        }

        let txn = self.db.begin().await.map_err(db_error("开启事务失败"))?;

        if Users::find_by_id(user_id)
            .one(&txn)
            .await
            .map_err(db_error("查询用户失败"))?
            .is_none()
        {
            return Err(AttendanceError::not_found(format!("用户 {user_id} 不存在")));
        }

        UserClasses::delete_many()
            .filter(UserClassColumn::UserId.eq(user_id))
            .exec(&txn)
            .await
            .map_err(db_error("清除班级分配失败"))?;

        if !ordered.is_empty() {
            let rows = ordered
                .into_iter()
                .enumerate()
                .map(|(position, class_id)| UserClassActiveModel {
                    user_id: Set(user_id),
                    class_id: Set(class_id),
                    position: Set(position as i32),
                    ..Default::default()
                });
            UserClasses::insert_many(rows)
                .exec(&txn)
                .await
                .map_err(db_error("写入班级分配失败"))?;
        }

        txn.commit().await.map_err(db_error("提交事务失败"))?;
        Ok(())
    }

    /// 用户的班级 ID，按分配顺序
    pub async fn list_user_classes_impl(&self, user_id: i64) -> Result<Vec<i64>> {
        UserClasses::find()
            .select_only()
            .column(UserClassColumn::ClassId)
            .filter(UserClassColumn::UserId.eq(user_id))
            .order_by_asc(UserClassColumn::Position)
            .into_tuple::<i64>()
            .all(&self.db)
            .await
            .map_err(db_error("查询用户班级失败"))
    }
}
