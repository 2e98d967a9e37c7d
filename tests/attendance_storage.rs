//! 考勤存储层集成测试，使用 SQLite 内存库

mod common;

use common::*;
use rust_attendance_system::errors::AttendanceError;
use rust_attendance_system::models::attendance::entities::{AttendanceStatus, DashboardCounts};
use rust_attendance_system::models::attendance::requests::{
    DateRange, RollCall, RollCallEntry, UpsertAttendance,
};
use rust_attendance_system::storage::Storage;

#[tokio::test]
async fn test_double_upsert_keeps_one_row() {
    let storage = seeded_storage().await;

    let first = storage
        .upsert_attendance(mark(STUDENT_ID, jan(10), 2, AttendanceStatus::Present))
        .await
        .unwrap();

    let mut again = mark(STUDENT_ID, jan(10), 2, AttendanceStatus::Absent);
    again.remark = Some("left early".to_string());
    let second = storage.upsert_attendance(again).await.unwrap();

    assert_eq!(first.id, second.id);
    assert_eq!(second.status, AttendanceStatus::Absent);
    assert_eq!(second.remark.as_deref(), Some("left early"));
    assert_eq!(second.created_at, first.created_at);
    assert!(second.updated_at > second.created_at);

    let rows = storage
        .get_attendance_for_student_on_date(STUDENT_ID, jan(10))
        .await
        .unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].class_id, CLASS_ID);
    assert_eq!(rows[0].teacher_id, TEACHER_ID);
    assert_eq!(rows[0].period, 2);
}

#[tokio::test]
async fn test_upsert_without_remark_keeps_existing_remark() {
    let storage = seeded_storage().await;

    let mut first = mark(STUDENT_ID, jan(10), 1, AttendanceStatus::Late);
    first.remark = Some("bus".to_string());
    storage.upsert_attendance(first).await.unwrap();

    let second = storage
        .upsert_attendance(mark(STUDENT_ID, jan(10), 1, AttendanceStatus::Present))
        .await
        .unwrap();
    assert_eq!(second.status, AttendanceStatus::Present);
    assert_eq!(second.remark.as_deref(), Some("bus"));
}

#[tokio::test]
async fn test_updated_at_advances_on_every_write() {
    let storage = seeded_storage().await;

    let mut last = storage
        .upsert_attendance(mark(STUDENT_ID, jan(10), 3, AttendanceStatus::Present))
        .await
        .unwrap();
    for status in [
        AttendanceStatus::Late,
        AttendanceStatus::Absent,
        AttendanceStatus::Present,
    ] {
        let next = storage
            .upsert_attendance(mark(STUDENT_ID, jan(10), 3, status))
            .await
            .unwrap();
        assert!(next.updated_at > last.updated_at);
        last = next;
    }

    let noted = storage
        .update_notes(last.id, Some("parent called".to_string()))
        .await
        .unwrap();
    assert!(noted.updated_at > last.updated_at);
}

#[tokio::test]
async fn test_date_and_class_filter() {
    let storage = seeded_storage().await;
    insert_student(&storage, 43, CLASS_ID, "Bob").await;

    for (student, date, period) in [
        (STUDENT_ID, jan(10), 1),
        (43, jan(10), 1),
        (STUDENT_ID, jan(10), 2),
        (STUDENT_ID, jan(11), 1),
    ] {
        storage
            .upsert_attendance(mark(student, date, period, AttendanceStatus::Present))
            .await
            .unwrap();
    }
    storage
        .upsert_attendance(UpsertAttendance {
            student_id: OTHER_CLASS_STUDENT_ID,
            class_id: OTHER_CLASS_ID,
            teacher_id: OTHER_TEACHER_ID,
            period: 1,
            date: jan(10),
            status: AttendanceStatus::Absent,
            remark: None,
        })
        .await
        .unwrap();

    let rows = storage
        .get_attendance_by_date_and_class(jan(10), CLASS_ID)
        .await
        .unwrap();
    assert_eq!(rows.len(), 3);
    assert!(rows
        .iter()
        .all(|r| r.attendance.date == jan(10) && r.attendance.class_id == CLASS_ID));
    // 按课节再按学生姓名排序
    let order: Vec<(i32, &str)> = rows
        .iter()
        .map(|r| (r.attendance.period, r.student_name.as_str()))
        .collect();
    assert_eq!(order, vec![(1, "Alice"), (1, "Bob"), (2, "Alice")]);

    let day = storage.get_attendance_by_date(jan(10)).await.unwrap();
    assert_eq!(day.len(), 4);

    let first_periods = storage
        .get_attendance_by_period(1, jan(10), Some(CLASS_ID))
        .await
        .unwrap();
    assert_eq!(first_periods.len(), 2);
}

#[tokio::test]
async fn test_student_history_respects_range() {
    let storage = seeded_storage().await;
    for day in [8, 9, 10, 11] {
        storage
            .upsert_attendance(mark(STUDENT_ID, jan(day), 1, AttendanceStatus::Present))
            .await
            .unwrap();
    }

    let all = storage
        .get_attendance_by_student(STUDENT_ID, None)
        .await
        .unwrap();
    assert_eq!(all.len(), 4);
    assert!(all.windows(2).all(|w| w[0].date <= w[1].date));

    let range = DateRange::new(Some(jan(9)), Some(jan(10))).unwrap();
    let some = storage
        .get_attendance_by_student(STUDENT_ID, Some(range))
        .await
        .unwrap();
    assert_eq!(some.len(), 2);

    let reversed = DateRange {
        from: Some(jan(11)),
        to: Some(jan(9)),
    };
    let err = storage
        .get_attendance_by_class(CLASS_ID, Some(reversed))
        .await
        .unwrap_err();
    assert!(matches!(err, AttendanceError::Validation(_)));

    let mine = storage
        .get_attendance_by_teacher(TEACHER_ID, None)
        .await
        .unwrap();
    assert_eq!(mine.len(), 4);
    assert!(mine.windows(2).all(|w| w[0].date >= w[1].date));
}

#[tokio::test]
async fn test_dashboard_counts_match_rows() {
    let storage = seeded_storage().await;

    let mut plan = Vec::new();
    for (status, n) in [
        (AttendanceStatus::Present, 10),
        (AttendanceStatus::Absent, 2),
        (AttendanceStatus::Late, 1),
    ] {
        for _ in 0..n {
            plan.push((100 + plan.len() as i64, status));
        }
    }

    for (student_id, status) in &plan {
        insert_student(&storage, *student_id, CLASS_ID, &format!("S{student_id}")).await;
        storage
            .upsert_attendance(mark(*student_id, jan(10), 1, *status))
            .await
            .unwrap();
    }
    // 其他日期的记录不计入
    storage
        .upsert_attendance(mark(STUDENT_ID, jan(11), 1, AttendanceStatus::Absent))
        .await
        .unwrap();

    let counts = storage
        .get_dashboard_counts(jan(10), Some(CLASS_ID))
        .await
        .unwrap();
    assert_eq!(
        counts,
        DashboardCounts {
            present: 10,
            absent: 2,
            late: 1
        }
    );

    let rows = storage
        .get_attendance_by_date_and_class(jan(10), CLASS_ID)
        .await
        .unwrap();
    assert_eq!(counts.total(), rows.len() as u64);

    let everywhere = storage.get_dashboard_counts(jan(10), None).await.unwrap();
    assert_eq!(everywhere, counts);
}

#[tokio::test]
async fn test_update_remark_missing_id_is_not_found() {
    let storage = seeded_storage().await;
    let row = storage
        .upsert_attendance(mark(STUDENT_ID, jan(10), 1, AttendanceStatus::Present))
        .await
        .unwrap();

    let err = storage
        .update_remark(row.id + 1000, Some("x".to_string()))
        .await
        .unwrap_err();
    assert!(matches!(err, AttendanceError::NotFound(_)));

    let unchanged = storage.get_attendance_by_id(row.id).await.unwrap().unwrap();
    assert_eq!(unchanged, row);

    let updated = storage
        .update_remark(row.id, Some("checked".to_string()))
        .await
        .unwrap();
    assert_eq!(updated.remark.as_deref(), Some("checked"));
    assert_eq!(updated.status, AttendanceStatus::Present);

    let cleared = storage.update_remark(row.id, None).await.unwrap();
    assert_eq!(cleared.remark, None);
}

#[tokio::test]
async fn test_unauthorized_writes_are_conflicts() {
    let storage = seeded_storage().await;

    let cases = [
        // 教师没有分配到该班级
        {
            let mut req = mark(STUDENT_ID, jan(10), 1, AttendanceStatus::Present);
            req.teacher_id = OTHER_TEACHER_ID;
            req
        },
        // 教务人员不能登记考勤
        {
            let mut req = mark(STUDENT_ID, jan(10), 1, AttendanceStatus::Present);
            req.teacher_id = STAFF_ID;
            req
        },
        // 教师不存在
        {
            let mut req = mark(STUDENT_ID, jan(10), 1, AttendanceStatus::Present);
            req.teacher_id = 999;
            req
        },
        // 学生不在该班级
        mark(OTHER_CLASS_STUDENT_ID, jan(10), 1, AttendanceStatus::Present),
        // 学生不存在
        mark(999, jan(10), 1, AttendanceStatus::Present),
    ];

    for req in cases {
        let err = storage.upsert_attendance(req).await.unwrap_err();
        assert!(matches!(err, AttendanceError::Conflict(_)), "{err}");
    }
    assert!(storage.get_attendance_by_date(jan(10)).await.unwrap().is_empty());

    storage.disable_user(TEACHER_ID).await.unwrap();
    let err = storage
        .upsert_attendance(mark(STUDENT_ID, jan(10), 1, AttendanceStatus::Present))
        .await
        .unwrap_err();
    assert!(matches!(err, AttendanceError::Conflict(_)));
}

#[tokio::test]
async fn test_invalid_period_is_rejected() {
    let storage = seeded_storage().await;
    let err = storage
        .upsert_attendance(mark(STUDENT_ID, jan(10), 0, AttendanceStatus::Present))
        .await
        .unwrap_err();
    assert!(matches!(err, AttendanceError::Validation(_)));
}

fn roll_call(students: &[i64]) -> RollCall {
    RollCall {
        teacher_id: TEACHER_ID,
        class_id: CLASS_ID,
        period: 2,
        date: jan(10),
        entries: students
            .iter()
            .map(|id| RollCallEntry {
                student_id: *id,
                status: AttendanceStatus::Present,
                remark: None,
            })
            .collect(),
    }
}

#[tokio::test]
async fn test_roll_call_is_all_or_nothing() {
    let storage = seeded_storage().await;
    insert_student(&storage, 43, CLASS_ID, "Bob").await;

    let err = storage
        .submit_roll_call(roll_call(&[STUDENT_ID, 43, OTHER_CLASS_STUDENT_ID]))
        .await
        .unwrap_err();
    assert!(matches!(err, AttendanceError::Conflict(_)));
    assert!(storage.get_attendance_by_date(jan(10)).await.unwrap().is_empty());

    let written = storage
        .submit_roll_call(roll_call(&[STUDENT_ID, 43]))
        .await
        .unwrap();
    assert_eq!(written.len(), 2);
    assert_eq!(
        storage
            .get_attendance_by_date_and_class(jan(10), CLASS_ID)
            .await
            .unwrap()
            .len(),
        2
    );
}

#[tokio::test]
async fn test_roll_call_rejects_empty_and_duplicates() {
    let storage = seeded_storage().await;

    let err = storage.submit_roll_call(roll_call(&[])).await.unwrap_err();
    assert!(matches!(err, AttendanceError::Validation(_)));

    let err = storage
        .submit_roll_call(roll_call(&[STUDENT_ID, STUDENT_ID]))
        .await
        .unwrap_err();
    assert!(matches!(err, AttendanceError::Validation(_)));
}
