//! 为考勤表增量添加 notes 与时间戳列
//!
//! 旧版本建出的考勤表没有这些列，这里只在列不存在时添加，
//! 对空库、已有数据的库都可以重复执行。

use sea_orm_migration::prelude::*;

const TABLE: &str = "attendance";

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        if !manager.has_column(TABLE, "notes").await? {
            manager
                .alter_table(
                    Table::alter()
                        .table(Attendance::Table)
                        .add_column(ColumnDef::new(Attendance::Notes).text().null())
                        .to_owned(),
                )
                .await?;
        }

        // SQLite 每条 ALTER 只能加一列
        for (column, name) in [
            (Attendance::CreatedAt, "created_at"),
            (Attendance::UpdatedAt, "updated_at"),
        ] {
            if !manager.has_column(TABLE, name).await? {
                manager
                    .alter_table(
                        Table::alter()
                            .table(Attendance::Table)
                            .add_column(
                                ColumnDef::new(column)
                                    .big_integer()
                                    .not_null()
                                    .default(0),
                            )
                            .to_owned(),
                    )
                    .await?;
            }
        }

        // 回填历史记录的时间戳
        let now = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_millis() as i64)
            .unwrap_or_default();

        let backfill = Query::update()
            .table(Attendance::Table)
            .value(Attendance::CreatedAt, now)
            .value(Attendance::UpdatedAt, now)
            .and_where(Expr::col(Attendance::CreatedAt).eq(0))
            .to_owned();
        manager.exec_stmt(backfill).await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        for (column, name) in [
            (Attendance::UpdatedAt, "updated_at"),
            (Attendance::CreatedAt, "created_at"),
            (Attendance::Notes, "notes"),
        ] {
            if manager.has_column(TABLE, name).await? {
                manager
                    .alter_table(
                        Table::alter()
                            .table(Attendance::Table)
                            .drop_column(column)
                            .to_owned(),
                    )
                    .await?;
            }
        }
        Ok(())
    }
}

#[derive(DeriveIden, Clone, Copy)]
enum Attendance {
    #[sea_orm(iden = "attendance")]
    Table,
    Notes,
    CreatedAt,
    UpdatedAt,
}
