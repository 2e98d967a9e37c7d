use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // 创建用户表
        manager
            .create_table(
                Table::create()
                    .table(Users::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Users::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(Users::Username)
                            .string()
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(Users::Email).string().null().unique_key())
                    .col(ColumnDef::new(Users::PasswordHash).string().not_null())
                    .col(ColumnDef::new(Users::Role).string().not_null())
                    .col(ColumnDef::new(Users::NationalId).string().null())
                    .col(
                        ColumnDef::new(Users::IsActive)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(ColumnDef::new(Users::CreatedAt).big_integer().not_null())
                    .col(ColumnDef::new(Users::UpdatedAt).big_integer().not_null())
                    .to_owned(),
            )
            .await?;

        // 创建班级表
        manager
            .create_table(
                Table::create()
                    .table(Classes::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Classes::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(Classes::Name)
                            .string()
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(Classes::CreatedAt).big_integer().not_null())
                    .to_owned(),
            )
            .await?;

        // 创建科目表
        manager
            .create_table(
                Table::create()
                    .table(Subjects::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Subjects::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(Subjects::Name)
                            .string()
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(Subjects::Code).string().null().unique_key())
                    .col(ColumnDef::new(Subjects::CreatedAt).big_integer().not_null())
                    .to_owned(),
            )
            .await?;

        // 创建用户班级分配表（有序）
        manager
            .create_table(
                Table::create()
                    .table(UserClasses::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(UserClasses::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(UserClasses::UserId).big_integer().not_null())
                    .col(ColumnDef::new(UserClasses::ClassId).big_integer().not_null())
                    .col(ColumnDef::new(UserClasses::Position).integer().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .from(UserClasses::Table, UserClasses::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(UserClasses::Table, UserClasses::ClassId)
                            .to(Classes::Table, Classes::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // 创建教师科目关联表
        manager
            .create_table(
                Table::create()
                    .table(TeacherSubjects::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(TeacherSubjects::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(TeacherSubjects::TeacherId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(TeacherSubjects::SubjectId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(TeacherSubjects::CreatedAt)
                            .big_integer()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(TeacherSubjects::Table, TeacherSubjects::TeacherId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(TeacherSubjects::Table, TeacherSubjects::SubjectId)
                            .to(Subjects::Table, Subjects::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // 创建课节表
        manager
            .create_table(
                Table::create()
                    .table(Periods::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Periods::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Periods::ClassId).big_integer().not_null())
                    .col(ColumnDef::new(Periods::PeriodNum).integer().not_null())
                    .col(ColumnDef::new(Periods::DayOfWeek).integer().null())
                    .col(ColumnDef::new(Periods::StartTime).time().null())
                    .col(ColumnDef::new(Periods::EndTime).time().null())
                    .col(ColumnDef::new(Periods::TeacherId).big_integer().null())
                    .col(ColumnDef::new(Periods::SubjectId).big_integer().null())
                    .col(ColumnDef::new(Periods::CreatedAt).big_integer().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .from(Periods::Table, Periods::ClassId)
                            .to(Classes::Table, Classes::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(Periods::Table, Periods::TeacherId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(Periods::Table, Periods::SubjectId)
                            .to(Subjects::Table, Subjects::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .to_owned(),
            )
            .await?;

        // 创建学生表
        manager
            .create_table(
                Table::create()
                    .table(Students::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Students::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Students::Name).string().not_null())
                    .col(ColumnDef::new(Students::ClassId).big_integer().not_null())
                    .col(
                        ColumnDef::new(Students::RollNumber)
                            .string()
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(Students::Phone).string().null())
                    .col(ColumnDef::new(Students::CreatedAt).big_integer().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .from(Students::Table, Students::ClassId)
                            .to(Classes::Table, Classes::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // 创建考勤表（notes 与时间戳列由后续迁移增量添加）
        manager
            .create_table(
                Table::create()
                    .table(Attendance::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Attendance::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Attendance::StudentId).big_integer().not_null())
                    .col(ColumnDef::new(Attendance::ClassId).big_integer().not_null())
                    .col(ColumnDef::new(Attendance::TeacherId).big_integer().not_null())
                    .col(ColumnDef::new(Attendance::Period).integer().not_null())
                    .col(ColumnDef::new(Attendance::Date).date().not_null())
                    .col(
                        ColumnDef::new(Attendance::Status)
                            .string()
                            .not_null()
                            .default("absent"),
                    )
                    .col(ColumnDef::new(Attendance::Remark).string().null())
                    .foreign_key(
                        ForeignKey::create()
                            .from(Attendance::Table, Attendance::StudentId)
                            .to(Students::Table, Students::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(Attendance::Table, Attendance::ClassId)
                            .to(Classes::Table, Classes::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(Attendance::Table, Attendance::TeacherId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // 唯一约束
        // 考勤去重键：同一学生同一天同一节课只有一条记录
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .unique()
                    .name(crate::ATTENDANCE_DEDUP_INDEX)
                    .table(Attendance::Table)
                    .col(Attendance::StudentId)
                    .col(Attendance::Date)
                    .col(Attendance::Period)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .unique()
                    .name("uq_teacher_subjects_pair")
                    .table(TeacherSubjects::Table)
                    .col(TeacherSubjects::TeacherId)
                    .col(TeacherSubjects::SubjectId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .unique()
                    .name("uq_user_classes_pair")
                    .table(UserClasses::Table)
                    .col(UserClasses::UserId)
                    .col(UserClasses::ClassId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // 按照创建的相反顺序删除
        manager
            .drop_table(Table::drop().table(Attendance::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Students::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Periods::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(TeacherSubjects::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(UserClasses::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Subjects::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Classes::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Users::Table).to_owned())
            .await?;
        Ok(())
    }
}

#[derive(DeriveIden)]
enum Users {
    #[sea_orm(iden = "users")]
    Table,
    Id,
    Username,
    Email,
    PasswordHash,
    Role,
    NationalId,
    IsActive,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Classes {
    #[sea_orm(iden = "classes")]
    Table,
    Id,
    Name,
    CreatedAt,
}

#[derive(DeriveIden)]
enum Subjects {
    #[sea_orm(iden = "subjects")]
    Table,
    Id,
    Name,
    Code,
    CreatedAt,
}

#[derive(DeriveIden)]
enum UserClasses {
    #[sea_orm(iden = "user_classes")]
    Table,
    Id,
    UserId,
    ClassId,
    Position,
}

#[derive(DeriveIden)]
enum TeacherSubjects {
    #[sea_orm(iden = "teacher_subjects")]
    Table,
    Id,
    TeacherId,
    SubjectId,
    CreatedAt,
}

#[derive(DeriveIden)]
enum Periods {
    #[sea_orm(iden = "periods")]
    Table,
    Id,
    ClassId,
    PeriodNum,
    DayOfWeek,
    StartTime,
    EndTime,
    TeacherId,
    SubjectId,
    CreatedAt,
}

#[derive(DeriveIden)]
enum Students {
    #[sea_orm(iden = "students")]
    Table,
    Id,
    Name,
    ClassId,
    RollNumber,
    Phone,
    CreatedAt,
}

#[derive(DeriveIden)]
enum Attendance {
    #[sea_orm(iden = "attendance")]
    Table,
    Id,
    StudentId,
    ClassId,
    TeacherId,
    Period,
    Date,
    Status,
    Remark,
}
