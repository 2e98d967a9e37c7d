//! HTTP 路由测试

mod common;

use std::sync::Arc;

use actix_web::http::StatusCode;
use actix_web::{App, test, web};
use common::*;
use rust_attendance_system::models::periods::requests::CreatePeriodRequest;
use rust_attendance_system::routes;
use rust_attendance_system::services::TIMEOUT_HEADER;
use rust_attendance_system::storage::Storage;
use rust_attendance_system::utils::{json_error_handler, path_error_handler, query_error_handler};
use serde_json::{Value, json};

macro_rules! test_app {
    ($storage:expr) => {
        test::init_service(
            App::new()
                .app_data(web::QueryConfig::default().error_handler(query_error_handler))
                .app_data(web::JsonConfig::default().error_handler(json_error_handler))
                .app_data(web::PathConfig::default().error_handler(path_error_handler))
                .app_data(web::Data::new($storage))
                .configure(routes::configure_attendance_routes)
                .configure(routes::configure_system_routes),
        )
        .await
    };
}

async fn storage() -> Arc<dyn Storage> {
    Arc::new(seeded_storage().await)
}

fn upsert_body(teacher_id: i64, student_id: i64, status: &str) -> Value {
    json!({
        "student_id": student_id,
        "class_id": CLASS_ID,
        "teacher_id": teacher_id,
        "period": 2,
        "date": "2024-01-10",
        "status": status,
    })
}

#[actix_web::test]
async fn test_health() {
    let app = test_app!(storage().await);
    let req = test::TestRequest::get().uri("/api/v1/health").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
}

#[actix_web::test]
async fn test_upsert_then_list() {
    let app = test_app!(storage().await);

    let req = test::TestRequest::post()
        .uri("/api/v1/attendance")
        .insert_header((TIMEOUT_HEADER, "2000"))
        .set_json(upsert_body(TEACHER_ID, STUDENT_ID, "present"))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["data"]["status"], "present");
    let id = body["data"]["id"].as_i64().unwrap();

    let req = test::TestRequest::get()
        .uri(&format!("/api/v1/attendance?date=2024-01-10&class_id={CLASS_ID}"))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    let rows = body["data"].as_array().unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["student_name"], "Alice");
    assert_eq!(rows[0]["id"].as_i64(), Some(id));

    let req = test::TestRequest::get()
        .uri(&format!(
            "/api/v1/attendance/dashboard?date=2024-01-10&class_id={CLASS_ID}"
        ))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["data"], json!({"present": 1, "absent": 0, "late": 0}));

    let req = test::TestRequest::get()
        .uri(&format!(
            "/api/v1/students/{STUDENT_ID}/attendance?from=2024-01-01&to=2024-01-31"
        ))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["data"].as_array().map(Vec::len), Some(1));
}

#[actix_web::test]
async fn test_wrong_teacher_is_conflict() {
    let app = test_app!(storage().await);

    let req = test::TestRequest::post()
        .uri("/api/v1/attendance")
        .set_json(upsert_body(OTHER_TEACHER_ID, STUDENT_ID, "present"))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CONFLICT);
}

#[actix_web::test]
async fn test_unknown_status_is_bad_request() {
    let app = test_app!(storage().await);

    let req = test::TestRequest::post()
        .uri("/api/v1/attendance")
        .set_json(upsert_body(TEACHER_ID, STUDENT_ID, "excused"))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn test_remark_on_missing_record_is_not_found() {
    let app = test_app!(storage().await);

    let req = test::TestRequest::put()
        .uri("/api/v1/attendance/12345/remark")
        .set_json(json!({"remark": "late bus"}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    let req = test::TestRequest::get()
        .uri("/api/v1/attendance/12345")
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn test_roll_call_route() {
    let app = test_app!(storage().await);

    let req = test::TestRequest::post()
        .uri("/api/v1/attendance/roll-call")
        .set_json(json!({
            "teacher_id": TEACHER_ID,
            "class_id": CLASS_ID,
            "period": 1,
            "date": "2024-01-10",
            "entries": [
                {"student_id": STUDENT_ID, "status": "late", "remark": "bus"}
            ]
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["data"][0]["remark"], "bus");

    let id = body["data"][0]["id"].as_i64().unwrap();
    let req = test::TestRequest::put()
        .uri(&format!("/api/v1/attendance/{id}/notes"))
        .set_json(json!({"notes": "parent informed"}))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["data"]["notes"], "parent informed");
}

#[actix_web::test]
async fn test_class_schedule_route() {
    let storage = storage().await;
    for (period_num, start, end) in [(1, (8, 0), (8, 45)), (2, (9, 0), (9, 45))] {
        storage
            .create_period(CreatePeriodRequest {
                class_id: CLASS_ID,
                period_num,
                day_of_week: Some(1),
                start_time: chrono::NaiveTime::from_hms_opt(start.0, start.1, 0),
                end_time: chrono::NaiveTime::from_hms_opt(end.0, end.1, 0),
                teacher_id: Some(TEACHER_ID),
                subject_id: None,
            })
            .await
            .unwrap();
    }
    let app = test_app!(storage);

    let req = test::TestRequest::get()
        .uri(&format!(
            "/api/v1/classes/{CLASS_ID}/schedule?day_of_week=1&time=09:30:00"
        ))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["data"]["day_of_week"], 1);
    assert_eq!(body["data"]["periods"].as_array().unwrap().len(), 2);
    assert_eq!(body["data"]["current_period"], 2);

    let req = test::TestRequest::get()
        .uri(&format!(
            "/api/v1/classes/{CLASS_ID}/schedule?day_of_week=1&time=16:00:00"
        ))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["data"]["current_period"], 1);

    let req = test::TestRequest::get()
        .uri(&format!("/api/v1/classes/{CLASS_ID}/schedule?day_of_week=9"))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}
