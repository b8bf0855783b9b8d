#![cfg(feature = "http_api")]

use axum::{
    body::{self, Body},
    http::{Request, StatusCode},
};
use class_scheduler::{
    JsonFileStorage, MemoryStorage, ScheduledClass, Scheduler, SnapshotStorage, Teacher, WeekGrid,
    http_api,
};
use serde_json::{Value, json};
use tower::util::ServiceExt;

fn new_router() -> axum::Router {
    let scheduler = Scheduler::new(Box::new(MemoryStorage::new()), WeekGrid::default());
    let state = http_api::AppState::new(scheduler);
    http_api::router(state)
}

fn json_request(method: &str, uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(serde_json::to_vec(&body).unwrap()))
        .unwrap()
}

fn empty_request(method: &str, uri: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

async fn read_json(response: axum::response::Response) -> Value {
    let bytes = body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

async fn seed_people(app: &axum::Router) {
    for (uri, body) in [
        ("/teachers", json!({ "id": "t1", "name": "Dr. Smith" })),
        ("/teachers", json!({ "id": "t2", "name": "Prof. Jones" })),
        ("/students", json!({ "id": "s1", "name": "Alice", "crmProfileLink": "link1" })),
        (
            "/groups",
            json!({ "id": "g1", "name": "Math 101", "teacherId": "t1", "studentIds": ["s1"] }),
        ),
    ] {
        let response = app
            .clone()
            .oneshot(json_request("POST", uri, body))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
    }
}

fn group_draft(teacher: &str, group: &str, start: &str) -> Value {
    json!({
        "teacherId": teacher,
        "groupId": group,
        "startTime": start
    })
}

#[tokio::test]
async fn class_lifecycle_via_http_api() {
    let app = new_router();
    seed_people(&app).await;

    // Create class
    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/classes",
            group_draft("t1", "g1", "2025-03-10T09:00:00Z"),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let created: ScheduledClass = serde_json::from_value(read_json(response).await).unwrap();
    assert_eq!(created.group_id(), Some("g1"));

    // Same teacher, same hour
    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/classes",
            group_draft("t1", "g2", "2025-03-10T09:00:00Z"),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);
    let body = read_json(response).await;
    assert_eq!(body["error"], "conflict");

    // Drag to Tuesday 10:00
    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/drop",
            json!({
                "classId": created.id,
                "source": { "droppableId": "cell-Monday-09:00", "index": 0 },
                "destination": { "droppableId": "cell-Tuesday-10:00", "index": 0 }
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json(response).await;
    assert_eq!(body["status"], "moved");
    assert_eq!(body["class"]["startTime"], "2025-03-11T10:00:00Z");
    assert_eq!(body["class"]["endTime"], "2025-03-11T11:00:00Z");

    // Filtered listing
    let response = app
        .clone()
        .oneshot(empty_request("GET", "/classes?teacher_id=t2"))
        .await
        .unwrap();
    assert_eq!(read_json(response).await, json!([]));

    // Delete, then delete again
    let uri = format!("/classes/{}", created.id);
    let response = app
        .clone()
        .oneshot(empty_request("DELETE", &uri))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    let response = app.oneshot(empty_request("DELETE", &uri)).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn created_class_can_be_sent_back_unchanged() {
    let app = new_router();
    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/classes",
            json!({ "teacherId": "t1", "studentId": "s1", "startTime": "2025-03-12T15:00:00Z" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let created = read_json(response).await;
    assert_eq!(created["studentId"], "s1");
    assert!(created.get("groupId").is_none());

    // The PUT body has the same shape as the POST body plus the id.
    let id = created["id"].as_str().unwrap().to_string();
    let mut moved = created.clone();
    moved["startTime"] = json!("2025-03-12T16:00:00Z");
    let response = app
        .clone()
        .oneshot(json_request("PUT", &format!("/classes/{id}"), moved))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .oneshot(json_request(
            "POST",
            "/classes",
            json!({
                "teacherId": "t1",
                "groupId": "g1",
                "studentId": "s1",
                "startTime": "2025-03-12T17:00:00Z"
            }),
        ))
        .await
        .unwrap();
    assert!(response.status().is_client_error());
}

#[tokio::test]
async fn misaligned_class_is_bad_request() {
    let app = new_router();
    let response = app
        .oneshot(json_request(
            "POST",
            "/classes",
            group_draft("t1", "g1", "2025-03-10T09:15:00Z"),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn deleting_teacher_reports_cascade() {
    let app = new_router();
    seed_people(&app).await;
    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/classes",
            group_draft("t1", "g1", "2025-03-10T09:00:00Z"),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    let response = app
        .clone()
        .oneshot(empty_request("DELETE", "/teachers/t1"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let outcome = read_json(response).await;
    assert_eq!(outcome["teachers"], 1);
    assert_eq!(outcome["groups"], 1);
    assert_eq!(outcome["scheduled_classes"], 1);

    let response = app
        .clone()
        .oneshot(empty_request("GET", "/groups"))
        .await
        .unwrap();
    assert_eq!(read_json(response).await, json!([]));

    let response = app
        .oneshot(empty_request("DELETE", "/teachers/t1"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn duplicate_and_mismatched_entities_are_rejected() {
    let app = new_router();
    seed_people(&app).await;

    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/teachers",
            json!({ "id": "t1", "name": "Again" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);

    let response = app
        .clone()
        .oneshot(json_request(
            "PUT",
            "/teachers/t2",
            json!({ "id": "t1", "name": "Wrong" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = app
        .clone()
        .oneshot(json_request(
            "PUT",
            "/teachers/t2",
            json!({ "id": "t2", "name": "Prof. Jones-Smith" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .oneshot(empty_request("GET", "/teachers"))
        .await
        .unwrap();
    let teachers: Vec<Teacher> = serde_json::from_value(read_json(response).await).unwrap();
    assert_eq!(teachers[1].name, "Prof. Jones-Smith");
}

#[tokio::test]
async fn snapshot_export_import_and_clear() {
    let app = new_router();
    seed_people(&app).await;

    let response = app
        .clone()
        .oneshot(empty_request("GET", "/snapshot"))
        .await
        .unwrap();
    let snapshot = read_json(response).await;
    assert_eq!(snapshot["version"], "1.0");
    assert_eq!(snapshot["teachers"].as_array().unwrap().len(), 2);

    // Missing collections
    let response = app
        .clone()
        .oneshot(json_request("PUT", "/snapshot", json!({ "teachers": [] })))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = read_json(response).await;
    assert_eq!(
        body["message"],
        "invalid data: invalid data format: missing required fields: groups, students, scheduledClasses"
    );

    let response = app
        .clone()
        .oneshot(empty_request("DELETE", "/snapshot"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = app
        .clone()
        .oneshot(json_request("PUT", "/snapshot", snapshot))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let summary = read_json(response).await;
    assert_eq!(summary["teachers"], 2);
    assert_eq!(summary["groups"], 1);

    let response = app.oneshot(empty_request("GET", "/report")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let bytes = body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let text = String::from_utf8(bytes.to_vec()).unwrap();
    assert!(text.contains("No scheduled classes"));
}

#[tokio::test]
async fn mutations_reach_file_storage() {
    let dir = tempfile::tempdir().unwrap();
    let storage = JsonFileStorage::new(dir.path(), "teachcalc_data").unwrap();
    let file = storage.path().to_path_buf();
    let scheduler = Scheduler::new(Box::new(storage), WeekGrid::default());
    let app = http_api::router(http_api::AppState::new(scheduler));

    seed_people(&app).await;
    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/classes",
            group_draft("t1", "g1", "2025-03-10T09:00:00Z"),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    let reader = JsonFileStorage::new(dir.path(), "teachcalc_data").unwrap();
    let saved = reader.load_snapshot().unwrap().expect("snapshot on disk");
    assert_eq!(saved.teachers.len(), 2);
    assert_eq!(saved.scheduled_classes.len(), 1);

    let response = app
        .oneshot(empty_request("DELETE", "/snapshot"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    assert!(!file.exists());
}
