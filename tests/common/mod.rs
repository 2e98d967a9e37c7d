//! 集成测试共用的内存数据库与基础数据
#![allow(dead_code)]

use chrono::NaiveDate;
use rust_attendance_system::config::DatabaseConfig;
use rust_attendance_system::entity::{classes, students, user_classes, users};
use rust_attendance_system::models::attendance::entities::AttendanceStatus;
use rust_attendance_system::models::attendance::requests::UpsertAttendance;
use rust_attendance_system::storage::Storage;
use rust_attendance_system::storage::sea_orm_storage::SeaOrmStorage;
use sea_orm::{ActiveModelTrait, Set};

pub const CLASS_ID: i64 = 5;
pub const OTHER_CLASS_ID: i64 = 6;
pub const TEACHER_ID: i64 = 3;
pub const OTHER_TEACHER_ID: i64 = 4;
pub const STAFF_ID: i64 = 7;
pub const STUDENT_ID: i64 = 42;
pub const OTHER_CLASS_STUDENT_ID: i64 = 90;

pub fn memory_config() -> DatabaseConfig {
    DatabaseConfig {
        url: "sqlite::memory:".to_string(),
        pool_size: 1,
        ..Default::default()
    }
}

/// 已建表的空内存库
pub async fn empty_storage() -> SeaOrmStorage {
    let storage = SeaOrmStorage::connect(&memory_config())
        .await
        .expect("connect in-memory sqlite");
    storage.init_schema().await.expect("init schema");
    storage
}

pub fn jan(day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 1, day).unwrap()
}

async fn insert_user(storage: &SeaOrmStorage, id: i64, username: &str, role: &str) {
    users::ActiveModel {
        id: Set(id),
        username: Set(username.to_string()),
        email: Set(None),
        password_hash: Set("$argon2id$test".to_string()),
        role: Set(role.to_string()),
        national_id: Set(None),
        is_active: Set(true),
        created_at: Set(0),
        updated_at: Set(0),
    }
    .insert(storage.connection())
    .await
    .expect("insert user");
}

async fn insert_class(storage: &SeaOrmStorage, id: i64, name: &str) {
    classes::ActiveModel {
        id: Set(id),
        name: Set(name.to_string()),
        created_at: Set(0),
    }
    .insert(storage.connection())
    .await
    .expect("insert class");
}

pub async fn insert_student(storage: &SeaOrmStorage, id: i64, class_id: i64, name: &str) {
    students::ActiveModel {
        id: Set(id),
        name: Set(name.to_string()),
        class_id: Set(class_id),
        roll_number: Set(format!("R{id}")),
        phone: Set(None),
        created_at: Set(0),
    }
    .insert(storage.connection())
    .await
    .expect("insert student");
}

/// 班级 5 由教师 3 负责，学生 42 在班级 5；
/// 班级 6 由教师 4 负责，学生 90 在班级 6；用户 7 是教务人员。
pub async fn seeded_storage() -> SeaOrmStorage {
    let storage = empty_storage().await;

    insert_class(&storage, CLASS_ID, "7A").await;
    insert_class(&storage, OTHER_CLASS_ID, "7B").await;
    insert_user(&storage, TEACHER_ID, "teacher3", "teacher").await;
    insert_user(&storage, OTHER_TEACHER_ID, "teacher4", "teacher").await;
    insert_user(&storage, STAFF_ID, "office", "staff").await;

    let assignments = [(1, TEACHER_ID, CLASS_ID), (2, OTHER_TEACHER_ID, OTHER_CLASS_ID)];
    for (id, user_id, class_id) in assignments {
        user_classes::ActiveModel {
            id: Set(id),
            user_id: Set(user_id),
            class_id: Set(class_id),
            position: Set(0),
        }
        .insert(storage.connection())
        .await
        .expect("assign class");
    }

    insert_student(&storage, STUDENT_ID, CLASS_ID, "Alice").await;
    insert_student(&storage, OTHER_CLASS_STUDENT_ID, OTHER_CLASS_ID, "Zed").await;
    storage
}

pub fn mark(
    student_id: i64,
    date: NaiveDate,
    period: i32,
    status: AttendanceStatus,
) -> UpsertAttendance {
    UpsertAttendance {
        student_id,
        class_id: CLASS_ID,
        teacher_id: TEACHER_ID,
        period,
        date,
        status,
        remark: None,
    }
}
