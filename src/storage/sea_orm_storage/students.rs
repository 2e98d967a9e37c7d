//! 学生存储操作

use super::SeaOrmStorage;
use crate::entity::students::{ActiveModel, Column, Entity as Students};
use crate::errors::{AttendanceError, Result, db_error};
use crate::models::students::{entities::Student, requests::CreateStudentRequest};
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, Set};

impl SeaOrmStorage {
    /// 创建学生
    pub async fn create_student_impl(&self, req: CreateStudentRequest) -> Result<Student> {
        let name = req.name.trim().to_string();
        let roll_number = req.roll_number.trim().to_string();
        if name.is_empty() || roll_number.is_empty() {
            return Err(AttendanceError::validation("学生姓名和学号不能为空"));
        }

        let model = ActiveModel {
            name: Set(name),
            class_id: Set(req.class_id),
            roll_number: Set(roll_number),
            phone: Set(req.phone),
            created_at: Set(Self::now_millis()),
            ..Default::default()
        };

        let result = model
            .insert(&self.db)
            .await
            .map_err(db_error("创建学生失败"))?;

        Ok(result.into_student())
    }

    /// 班级学生名单，按姓名排序
    pub async fn list_students_by_class_impl(&self, class_id: i64) -> Result<Vec<Student>> {
        let rows = Students::find()
            .filter(Column::ClassId.eq(class_id))
            .order_by_asc(Column::Name)
            .order_by_asc(Column::Id)
            .all(&self.db)
            .await
            .map_err(db_error("查询班级学生失败"))?;

        Ok(rows.into_iter().map(|m| m.into_student()).collect())
    }
}
