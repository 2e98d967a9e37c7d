//! 数据库结构初始化与检查

use super::SeaOrmStorage;
use crate::errors::{Result, db_error};
use crate::models::schema::entities::{IndexStatus, SchemaReport};
use migration::{
    ATTENDANCE_DEDUP_INDEX, Migrator, MigratorTrait, REQUIRED_INDEXES, SchemaManager,
};
use tracing::{info, warn};

impl SeaOrmStorage {
    /// 执行全部迁移，已执行的步骤会被跳过
    pub async fn init_schema_impl(&self) -> Result<()> {
        Migrator::up(&self.db, None)
            .await
            .map_err(db_error("数据库迁移失败"))?;

        info!("数据库结构已就绪");
        Ok(())
    }

    /// 逐个检查必需索引和考勤去重唯一索引
    pub async fn verify_schema_impl(&self) -> Result<SchemaReport> {
        let manager = SchemaManager::new(&self.db);

        let mut indexes = Vec::with_capacity(REQUIRED_INDEXES.len());
        for (name, table) in REQUIRED_INDEXES {
            let present = manager
                .has_index(table, name)
                .await
                .map_err(db_error("查询索引失败"))?;
            if !present {
                warn!("缺少索引 {name} ({table})");
            }
            indexes.push(IndexStatus {
                name: name.to_string(),
                table: table.to_string(),
                present,
            });
        }

        let dedup_index_present = manager
            .has_index("attendance", ATTENDANCE_DEDUP_INDEX)
            .await
            .map_err(db_error("查询索引失败"))?;
        if !dedup_index_present {
            warn!("缺少考勤去重唯一索引 {ATTENDANCE_DEDUP_INDEX}");
        }

        Ok(SchemaReport {
            indexes,
            dedup_index_present,
        })
    }
}
