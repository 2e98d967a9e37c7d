//! 科目与教师科目存储操作

use super::SeaOrmStorage;
use crate::entity::subjects::ActiveModel;
use crate::entity::teacher_subjects::{
    ActiveModel as TeacherSubjectActiveModel, Column as TeacherSubjectColumn,
    Entity as TeacherSubjects,
};
use crate::errors::{Result, db_error};
use crate::models::subjects::{
    entities::{Subject, TeacherSubject},
    requests::CreateSubjectRequest,
};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, Set, TransactionTrait,
};

impl SeaOrmStorage {
    /// 创建科目
    pub async fn create_subject_impl(&self, req: CreateSubjectRequest) -> Result<Subject> {
        let model = ActiveModel {
            name: Set(req.name.trim().to_string()),
            code: Set(req.code.filter(|c| !c.trim().is_empty())),
            created_at: Set(Self::now_millis()),
            ..Default::default()
        };

        let result = model
            .insert(&self.db)
            .await
            .map_err(db_error("创建科目失败"))?;

        Ok(result.into_subject())
    }

    /// 分配教师科目，已存在时直接返回
    pub async fn assign_teacher_subject_impl(
        &self,
        teacher_id: i64,
        subject_id: i64,
    ) -> Result<TeacherSubject> {
        let txn = self.db.begin().await.map_err(db_error("开启事务失败"))?;

        let existing = TeacherSubjects::find()
            .filter(TeacherSubjectColumn::TeacherId.eq(teacher_id))
            .filter(TeacherSubjectColumn::SubjectId.eq(subject_id))
            .one(&txn)
            .await
            .map_err(db_error("查询教师科目失败"))?;

        let model = match existing {
            Some(model) => model,
            None => TeacherSubjectActiveModel {
                teacher_id: Set(teacher_id),
                subject_id: Set(subject_id),
                created_at: Set(Self::now_millis()),
                ..Default::default()
            }
            .insert(&txn)
            .await
            .map_err(db_error("分配教师科目失败"))?,
        };

        txn.commit().await.map_err(db_error("提交事务失败"))?;
        Ok(model.into_teacher_subject())
    }

    /// 教师的科目列表
    pub async fn list_teacher_subjects_impl(&self, teacher_id: i64) -> Result<Vec<TeacherSubject>> {
        let rows = TeacherSubjects::find()
            .filter(TeacherSubjectColumn::TeacherId.eq(teacher_id))
            .order_by_asc(TeacherSubjectColumn::SubjectId)
            .all(&self.db)
            .await
            .map_err(db_error("查询教师科目失败"))?;

        Ok(rows.into_iter().map(|m| m.into_teacher_subject()).collect())
    }
}
