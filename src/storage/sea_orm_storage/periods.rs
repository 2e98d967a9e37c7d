//! 课节存储操作

use super::SeaOrmStorage;
use crate::entity::periods::{ActiveModel, Column, Entity as Periods};
use crate::errors::{AttendanceError, Result, db_error};
use crate::models::periods::{
    entities::{Period, resolve_current},
    requests::CreatePeriodRequest,
};
use chrono::NaiveTime;
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, Set};

impl SeaOrmStorage {
    /// 创建课节
    pub async fn create_period_impl(&self, req: CreatePeriodRequest) -> Result<Period> {
        req.validate()?;

        let model = ActiveModel {
            class_id: Set(req.class_id),
            period_num: Set(req.period_num),
            day_of_week: Set(req.day_of_week),
            start_time: Set(req.start_time),
            end_time: Set(req.end_time),
            teacher_id: Set(req.teacher_id),
            subject_id: Set(req.subject_id),
            created_at: Set(Self::now_millis()),
            ..Default::default()
        };

        let result = model
            .insert(&self.db)
            .await
            .map_err(db_error("创建课节失败"))?;

        Ok(result.into_period())
    }

    /// 班级课表，按星期和节次排序
    pub async fn list_periods_by_class_impl(&self, class_id: i64) -> Result<Vec<Period>> {
        let rows = Periods::find()
            .filter(Column::ClassId.eq(class_id))
            .order_by_asc(Column::DayOfWeek)
            .order_by_asc(Column::PeriodNum)
            .order_by_asc(Column::Id)
            .all(&self.db)
            .await
            .map_err(db_error("查询班级课节失败"))?;

        Ok(rows.into_iter().map(|m| m.into_period()).collect())
    }

    /// 班级某天的课节，按节次排序；`day_of_week` 0 为周日
    pub async fn list_periods_for_day_impl(
        &self,
        class_id: i64,
        day_of_week: i32,
    ) -> Result<Vec<Period>> {
        if !(0..=6).contains(&day_of_week) {
            return Err(AttendanceError::validation(format!(
                "星期取值 0-6（0 为周日）: {day_of_week}"
            )));
        }

        let rows = Periods::find()
            .filter(Column::ClassId.eq(class_id))
            .filter(Column::DayOfWeek.eq(day_of_week))
            .order_by_asc(Column::PeriodNum)
            .order_by_asc(Column::Id)
            .all(&self.db)
            .await
            .map_err(db_error("查询当天课节失败"))?;

        Ok(rows.into_iter().map(|m| m.into_period()).collect())
    }

    /// 按时刻确定当前课节，没有课节覆盖该时刻时取当天第一节
    pub async fn current_period_impl(
        &self,
        class_id: i64,
        day_of_week: i32,
        time: NaiveTime,
    ) -> Result<Option<Period>> {
        let periods = self.list_periods_for_day_impl(class_id, day_of_week).await?;
        Ok(resolve_current(&periods, time).cloned())
    }
}
