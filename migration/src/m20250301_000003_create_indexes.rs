use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // 考勤表单列索引
        // 教师按课节筛选
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_attendance_period")
                    .table(Attendance::Table)
                    .col(Attendance::Period)
                    .to_owned(),
            )
            .await?;

        // 班级考勤视图
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_attendance_class_id")
                    .table(Attendance::Table)
                    .col(Attendance::ClassId)
                    .to_owned(),
            )
            .await?;

        // 教师自己的记录
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_attendance_teacher_id")
                    .table(Attendance::Table)
                    .col(Attendance::TeacherId)
                    .to_owned(),
            )
            .await?;

        // 单个学生的历史
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_attendance_student_id")
                    .table(Attendance::Table)
                    .col(Attendance::StudentId)
                    .to_owned(),
            )
            .await?;

        // 日报
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_attendance_date")
                    .table(Attendance::Table)
                    .col(Attendance::Date)
                    .to_owned(),
            )
            .await?;

        // 考勤表复合索引
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_attendance_student_date")
                    .table(Attendance::Table)
                    .col(Attendance::StudentId)
                    .col(Attendance::Date)
                    .to_owned(),
            )
            .await?;

        // 员工看板：日期 + 班级是主要筛选条件
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_attendance_date_class")
                    .table(Attendance::Table)
                    .col(Attendance::Date)
                    .col(Attendance::ClassId)
                    .to_owned(),
            )
            .await?;

        // 学生表索引
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_student_class_id")
                    .table(Students::Table)
                    .col(Students::ClassId)
                    .to_owned(),
            )
            .await?;

        // 课节表索引
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_period_class_id")
                    .table(Periods::Table)
                    .col(Periods::ClassId)
                    .to_owned(),
            )
            .await?;

        // 教师科目表索引
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_teacher_subject_teacher")
                    .table(TeacherSubjects::Table)
                    .col(TeacherSubjects::TeacherId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        for (name, table) in crate::REQUIRED_INDEXES {
            manager
                .drop_index(
                    Index::drop()
                        .if_exists()
                        .name(name)
                        .table(Alias::new(table))
                        .to_owned(),
                )
                .await?;
        }
        Ok(())
    }
}

#[derive(DeriveIden)]
enum Attendance {
    #[sea_orm(iden = "attendance")]
    Table,
    StudentId,
    ClassId,
    TeacherId,
    Period,
    Date,
}

#[derive(DeriveIden)]
enum Students {
    #[sea_orm(iden = "students")]
    Table,
    ClassId,
}

#[derive(DeriveIden)]
enum Periods {
    #[sea_orm(iden = "periods")]
    Table,
    ClassId,
}

#[derive(DeriveIden)]
enum TeacherSubjects {
    #[sea_orm(iden = "teacher_subjects")]
    Table,
    TeacherId,
}
