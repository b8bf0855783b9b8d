use std::{net::SocketAddr, sync::Arc};

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::{get, post, put},
};
use parking_lot::RwLock;
use serde::Serialize;
use serde_json::json;
use tracing::info;

use crate::{
    ClassDraft, ClassFilter, DeleteOutcome, DropEvent, DropOutcome, Group, PersistenceError,
    ScheduleError, ScheduledClass, Scheduler, Snapshot, StoreSummary, Student, Teacher,
    apply_drop, render_text_report,
};

#[derive(Clone)]
pub struct AppState {
    scheduler: Arc<RwLock<Scheduler>>,
}

impl AppState {
    pub fn new(scheduler: Scheduler) -> Self {
        Self {
            scheduler: Arc::new(RwLock::new(scheduler)),
        }
    }

    pub fn with_shared(scheduler: Arc<RwLock<Scheduler>>) -> Self {
        Self { scheduler }
    }

    fn scheduler(&self) -> Arc<RwLock<Scheduler>> {
        self.scheduler.clone()
    }

    /// Runs a mutation on the blocking pool. Every mutation persists, so the
    /// write lock and the storage write stay off the async workers.
    async fn mutate<T, F>(&self, f: F) -> Result<T, ApiError>
    where
        T: Send + 'static,
        F: FnOnce(&mut Scheduler) -> Result<T, ApiError> + Send + 'static,
    {
        let scheduler = self.scheduler();
        tokio::task::spawn_blocking(move || f(&mut scheduler.write()))
            .await
            .map_err(|err| ApiError::Internal(format!("scheduler task failed: {err}")))?
    }
}

#[derive(Debug, Serialize)]
struct ErrorBody<'a> {
    error: &'a str,
    message: String,
}

#[derive(Debug)]
enum ApiError {
    NotFound(String),
    Conflict(String),
    Invalid(String),
    Internal(String),
}

impl ApiError {
    fn not_found(message: impl Into<String>) -> Self {
        ApiError::NotFound(message.into())
    }

    fn invalid(message: impl Into<String>) -> Self {
        ApiError::Invalid(message.into())
    }

    fn conflict(message: impl Into<String>) -> Self {
        ApiError::Conflict(message.into())
    }
}

impl From<ScheduleError> for ApiError {
    fn from(value: ScheduleError) -> Self {
        match value {
            ScheduleError::Conflict(_) => ApiError::Conflict(value.to_string()),
            ScheduleError::NotFound(_) => ApiError::NotFound(value.to_string()),
            ScheduleError::MisalignedStart(_) => ApiError::Invalid(value.to_string()),
        }
    }
}

impl From<PersistenceError> for ApiError {
    fn from(value: PersistenceError) -> Self {
        match value {
            PersistenceError::InvalidData(_) | PersistenceError::Serialization(_) => {
                ApiError::Invalid(value.to_string())
            }
            other => ApiError::Internal(other.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error, message) = match self {
            ApiError::NotFound(message) => (StatusCode::NOT_FOUND, "not_found", message),
            ApiError::Conflict(message) => (StatusCode::CONFLICT, "conflict", message),
            ApiError::Invalid(message) => (StatusCode::BAD_REQUEST, "invalid_request", message),
            ApiError::Internal(message) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "internal_error", message)
            }
        };
        (status, Json(ErrorBody { error, message })).into_response()
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/teachers", get(list_teachers).post(create_teacher))
        .route("/teachers/:id", put(update_teacher).delete(delete_teacher))
        .route("/students", get(list_students).post(create_student))
        .route("/students/:id", put(update_student).delete(delete_student))
        .route("/groups", get(list_groups).post(create_group))
        .route("/groups/:id", put(update_group).delete(delete_group))
        .route("/classes", get(list_classes).post(create_class))
        .route("/classes/:id", put(update_class).delete(delete_class))
        .route("/drop", post(drop_class))
        .route(
            "/snapshot",
            get(export_snapshot)
                .put(import_snapshot)
                .delete(clear_snapshot),
        )
        .route("/report", get(report))
        .route("/summary", get(summary))
        .with_state(state)
}

pub async fn serve(addr: SocketAddr, scheduler: Scheduler) -> std::io::Result<()> {
    let state = AppState::new(scheduler);
    let app = router(state);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(%addr, "http api listening");
    axum::serve(listener, app).await
}

async fn health() -> impl IntoResponse {
    Json(json!({ "status": "ok" }))
}

fn ensure_path_id(path_id: &str, body_id: &str) -> Result<(), ApiError> {
    if path_id != body_id {
        return Err(ApiError::invalid(
            "id in payload does not match path parameter",
        ));
    }
    Ok(())
}

fn deleted(outcome: DeleteOutcome, what: &str, id: &str) -> Result<Json<DeleteOutcome>, ApiError> {
    if outcome.is_noop() {
        return Err(ApiError::not_found(format!("{what} {id} not found")));
    }
    Ok(Json(outcome))
}

async fn list_teachers(State(state): State<AppState>) -> Json<Vec<Teacher>> {
    let scheduler = state.scheduler();
    let teachers = scheduler.read().teachers().to_vec();
    Json(teachers)
}

async fn create_teacher(
    State(state): State<AppState>,
    Json(teacher): Json<Teacher>,
) -> Result<(StatusCode, Json<Teacher>), ApiError> {
    let created = state
        .mutate(move |scheduler| {
            if scheduler.find_teacher(&teacher.id).is_some() {
                return Err(ApiError::conflict(format!(
                    "teacher {} already exists",
                    teacher.id
                )));
            }
            scheduler.add_teacher(teacher.clone());
            Ok(teacher)
        })
        .await?;
    Ok((StatusCode::CREATED, Json(created)))
}

async fn update_teacher(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(teacher): Json<Teacher>,
) -> Result<Json<Teacher>, ApiError> {
    ensure_path_id(&id, &teacher.id)?;
    let updated = state
        .mutate(move |scheduler| {
            if !scheduler.update_teacher(teacher.clone()) {
                return Err(ApiError::not_found(format!("teacher {id} not found")));
            }
            Ok(teacher)
        })
        .await?;
    Ok(Json(updated))
}

async fn delete_teacher(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<DeleteOutcome>, ApiError> {
    let target = id.clone();
    let outcome = state
        .mutate(move |scheduler| Ok(scheduler.delete_teacher(&target)))
        .await?;
    deleted(outcome, "teacher", &id)
}

async fn list_students(State(state): State<AppState>) -> Json<Vec<Student>> {
    let scheduler = state.scheduler();
    let students = scheduler.read().students().to_vec();
    Json(students)
}

async fn create_student(
    State(state): State<AppState>,
    Json(student): Json<Student>,
) -> Result<(StatusCode, Json<Student>), ApiError> {
    let created = state
        .mutate(move |scheduler| {
            if scheduler.find_student(&student.id).is_some() {
                return Err(ApiError::conflict(format!(
                    "student {} already exists",
                    student.id
                )));
            }
            scheduler.add_student(student.clone());
            Ok(student)
        })
        .await?;
    Ok((StatusCode::CREATED, Json(created)))
}

async fn update_student(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(student): Json<Student>,
) -> Result<Json<Student>, ApiError> {
    ensure_path_id(&id, &student.id)?;
    let updated = state
        .mutate(move |scheduler| {
            if !scheduler.update_student(student.clone()) {
                return Err(ApiError::not_found(format!("student {id} not found")));
            }
            Ok(student)
        })
        .await?;
    Ok(Json(updated))
}

async fn delete_student(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<DeleteOutcome>, ApiError> {
    let target = id.clone();
    let outcome = state
        .mutate(move |scheduler| Ok(scheduler.delete_student(&target)))
        .await?;
    deleted(outcome, "student", &id)
}

async fn list_groups(State(state): State<AppState>) -> Json<Vec<Group>> {
    let scheduler = state.scheduler();
    let groups = scheduler.read().groups().to_vec();
    Json(groups)
}

async fn create_group(
    State(state): State<AppState>,
    Json(group): Json<Group>,
) -> Result<(StatusCode, Json<Group>), ApiError> {
    let created = state
        .mutate(move |scheduler| {
            if scheduler.find_group(&group.id).is_some() {
                return Err(ApiError::conflict(format!(
                    "group {} already exists",
                    group.id
                )));
            }
            scheduler.add_group(group.clone());
            Ok(group)
        })
        .await?;
    Ok((StatusCode::CREATED, Json(created)))
}

async fn update_group(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(group): Json<Group>,
) -> Result<Json<Group>, ApiError> {
    ensure_path_id(&id, &group.id)?;
    let updated = state
        .mutate(move |scheduler| {
            if !scheduler.update_group(group.clone()) {
                return Err(ApiError::not_found(format!("group {id} not found")));
            }
            Ok(group)
        })
        .await?;
    Ok(Json(updated))
}

async fn delete_group(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<DeleteOutcome>, ApiError> {
    let target = id.clone();
    let outcome = state
        .mutate(move |scheduler| Ok(scheduler.delete_group(&target)))
        .await?;
    deleted(outcome, "group", &id)
}

async fn list_classes(
    State(state): State<AppState>,
    Query(filter): Query<ClassFilter>,
) -> Json<Vec<ScheduledClass>> {
    let scheduler = state.scheduler();
    let guard = scheduler.read();
    let classes = filter
        .apply(guard.scheduled_classes())
        .into_iter()
        .cloned()
        .collect();
    Json(classes)
}

async fn create_class(
    State(state): State<AppState>,
    Json(draft): Json<ClassDraft>,
) -> Result<(StatusCode, Json<ScheduledClass>), ApiError> {
    let created = state
        .mutate(move |scheduler| Ok(scheduler.add_scheduled_class(draft)?))
        .await?;
    Ok((StatusCode::CREATED, Json(created)))
}

async fn update_class(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(class): Json<ScheduledClass>,
) -> Result<Json<ScheduledClass>, ApiError> {
    ensure_path_id(&id, &class.id)?;
    let updated = state
        .mutate(move |scheduler| {
            scheduler.update_scheduled_class(class.clone())?;
            Ok(class)
        })
        .await?;
    Ok(Json(updated))
}

async fn delete_class(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    state
        .mutate(move |scheduler| {
            if !scheduler.delete_scheduled_class(&id) {
                return Err(ApiError::not_found(format!("scheduled class {id} not found")));
            }
            Ok(StatusCode::NO_CONTENT)
        })
        .await
}

async fn drop_class(
    State(state): State<AppState>,
    Json(event): Json<DropEvent>,
) -> Result<Json<DropOutcome>, ApiError> {
    let outcome = state
        .mutate(move |scheduler| Ok(apply_drop(scheduler, &event)?))
        .await?;
    Ok(Json(outcome))
}

async fn export_snapshot(State(state): State<AppState>) -> Json<Snapshot> {
    let scheduler = state.scheduler();
    let snapshot = scheduler.read().export_snapshot();
    Json(snapshot)
}

async fn import_snapshot(
    State(state): State<AppState>,
    Json(data): Json<serde_json::Value>,
) -> Result<Json<StoreSummary>, ApiError> {
    let summary = state
        .mutate(move |scheduler| {
            scheduler.import_value(data)?;
            Ok(StoreSummary::collect(scheduler))
        })
        .await?;
    Ok(Json(summary))
}

async fn clear_snapshot(State(state): State<AppState>) -> Result<StatusCode, ApiError> {
    state
        .mutate(|scheduler| {
            if !scheduler.clear_all() {
                return Err(ApiError::Internal(
                    "schedule cleared but persisted data could not be erased".into(),
                ));
            }
            Ok(StatusCode::NO_CONTENT)
        })
        .await
}

async fn report(State(state): State<AppState>) -> impl IntoResponse {
    let scheduler = state.scheduler();
    let text = render_text_report(&scheduler.read());
    ([(header::CONTENT_TYPE, "text/plain; charset=utf-8")], text)
}

async fn summary(State(state): State<AppState>) -> Json<StoreSummary> {
    let scheduler = state.scheduler();
    let summary = StoreSummary::collect(&scheduler.read());
    Json(summary)
}
