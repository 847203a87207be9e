//! Axum gateway handlers.
//!
//! Read routes return hydrated read models. Transaction routes run the form
//! rules and the builder, and return the composed transaction unsigned; the
//! caller's wallet signs and submits it.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{error, warn};

use crate::builder::{NewTask, TransactionBuilder};
use crate::errors::{BoardError, Result};
use crate::models::{Board, BoardCreatedEvent, OwnedObject, ReviewDecision, Submission, Task};
use crate::store::ObjectStore;
use crate::sync::Synchronizer;
use crate::tx::ProgrammableTransaction;
use crate::validation;

pub struct ApiState<S> {
    pub sync: Synchronizer<S>,
    pub builder: TransactionBuilder,
}

pub fn router<S: ObjectStore + 'static>(state: Arc<ApiState<S>>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/boards", get(list_boards::<S>))
        .route("/boards/:id", get(get_board::<S>))
        .route("/boards/:id/tasks", get(get_board_tasks::<S>))
        .route("/tasks/:object_id", get(get_task::<S>))
        .route("/tasks/:object_id/submissions", get(get_task_submissions::<S>))
        .route("/profiles/:id", get(get_profile::<S>))
        .route("/accounts/:address/objects", get(get_owned_objects::<S>))
        .route("/tx/profiles", post(tx_create_profile::<S>))
        .route("/tx/boards", post(tx_create_board::<S>))
        .route("/tx/boards/:id/join", post(tx_join_board::<S>))
        .route("/tx/boards/:id/close", post(tx_close_board::<S>))
        .route("/tx/boards/:id/tasks", post(tx_create_task::<S>))
        .route("/tx/boards/:id/tasks/:key/proofs", post(tx_submit_proof::<S>))
        .route("/tx/boards/:id/tasks/:key/reviews", post(tx_review::<S>))
        .route("/tx/boards/:id/tasks/:key/reviewers", post(tx_add_reviewers::<S>))
        .with_state(state)
}

// ─────────────────────────────────────────────────────────
// Request / response shapes
// ─────────────────────────────────────────────────────────

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
}

#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

#[derive(Serialize)]
pub struct BoardsResponse {
    pub count: usize,
    pub boards: Vec<BoardCreatedEvent>,
}

#[derive(Serialize)]
pub struct BoardTasksResponse {
    pub board: Board,
    pub count: usize,
    pub tasks: Vec<Task>,
}

#[derive(Serialize)]
pub struct SubmissionsResponse {
    pub task: Task,
    pub count: usize,
    pub submissions: Vec<Submission>,
}

#[derive(Serialize)]
pub struct ObjectsResponse {
    pub owner: String,
    pub count: usize,
    pub objects: Vec<OwnedObject>,
}

#[derive(Serialize)]
pub struct TransactionResponse {
    pub transaction: ProgrammableTransaction,
}

#[derive(Debug, Deserialize)]
pub struct CreateProfileRequest {
    pub username: String,
    pub email: String,
    pub role: String,
    pub bio: String,
}

#[derive(Debug, Deserialize)]
pub struct CreateBoardRequest {
    pub name: String,
    pub description: String,
    #[serde(default)]
    pub image_url: Option<String>,
    /// Decimal coin amount, e.g. `"1.5"`.
    pub reward_amount: String,
}

#[derive(Debug, Deserialize)]
pub struct CreateTaskRequest {
    pub name: String,
    pub description: String,
    pub deadline: DateTime<Utc>,
    pub max_completions: u64,
    pub reward_amount: String,
    #[serde(default)]
    pub allow_self_review: bool,
    #[serde(default = "default_task_config")]
    pub config: String,
}

/// Task config sent when the client leaves it out.
pub const DEFAULT_TASK_CONFIG: &str = "test_config";

fn default_task_config() -> String {
    DEFAULT_TASK_CONFIG.to_string()
}

#[derive(Debug, Deserialize)]
pub struct ProofRequest {
    pub proof: String,
}

#[derive(Debug, Deserialize)]
pub struct ReviewRequest {
    pub submitter: String,
    pub comment: String,
    pub status: ReviewDecision,
}

#[derive(Debug, Deserialize)]
pub struct ReviewersRequest {
    pub reviewers: Vec<String>,
}

// ─────────────────────────────────────────────────────────
// Error mapping
// ─────────────────────────────────────────────────────────

fn status_for(err: &BoardError) -> StatusCode {
    match err {
        BoardError::InvalidAddress(_) | BoardError::Validation(_) => StatusCode::BAD_REQUEST,
        BoardError::NotFound(_) => StatusCode::NOT_FOUND,
        BoardError::MalformedData(_)
        | BoardError::AggregateFailure { .. }
        | BoardError::RemoteCall(_)
        | BoardError::Http(_)
        | BoardError::Json(_) => StatusCode::BAD_GATEWAY,
        BoardError::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
        BoardError::Cancelled => StatusCode::SERVICE_UNAVAILABLE,
        BoardError::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn respond<T: Serialize>(result: Result<T>) -> Response {
    match result {
        Ok(body) => (StatusCode::OK, Json(body)).into_response(),
        Err(e) => {
            let status = status_for(&e);
            if status.is_server_error() {
                error!("Request failed ({status}): {e}");
            } else {
                warn!("Request rejected ({status}): {e}");
            }
            (status, Json(ErrorResponse { error: e.to_string() })).into_response()
        }
    }
}

fn respond_tx(result: Result<ProgrammableTransaction>) -> Response {
    respond(result.map(|transaction| TransactionResponse { transaction }))
}

// ─────────────────────────────────────────────────────────
// Read handlers
// ─────────────────────────────────────────────────────────

/// `GET /health`
pub async fn health() -> impl IntoResponse {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// `GET /boards`
///
/// Every board ever created, from the board-created event log.
pub async fn list_boards<S: ObjectStore>(State(state): State<Arc<ApiState<S>>>) -> Response {
    respond(
        state
            .sync
            .fetch_board_created_events()
            .await
            .map(|boards| BoardsResponse {
                count: boards.len(),
                boards,
            }),
    )
}

/// `GET /boards/:id`
pub async fn get_board<S: ObjectStore>(
    State(state): State<Arc<ApiState<S>>>,
    Path(id): Path<String>,
) -> Response {
    respond(state.sync.fetch_board(&id).await)
}

/// `GET /boards/:id/tasks`
///
/// The board together with all of its tasks.
pub async fn get_board_tasks<S: ObjectStore>(
    State(state): State<Arc<ApiState<S>>>,
    Path(id): Path<String>,
) -> Response {
    let result = async {
        let board = state.sync.fetch_board(&id).await?;
        let tasks = state.sync.fetch_board_tasks(&board).await?;
        Ok::<_, BoardError>(BoardTasksResponse {
            board,
            count: tasks.len(),
            tasks,
        })
    }
    .await;
    respond(result)
}

/// `GET /tasks/:object_id`
pub async fn get_task<S: ObjectStore>(
    State(state): State<Arc<ApiState<S>>>,
    Path(object_id): Path<String>,
) -> Response {
    respond(state.sync.fetch_task(&object_id).await)
}

/// `GET /tasks/:object_id/submissions`
pub async fn get_task_submissions<S: ObjectStore>(
    State(state): State<Arc<ApiState<S>>>,
    Path(object_id): Path<String>,
) -> Response {
    let result = async {
        let task = state.sync.fetch_task(&object_id).await?;
        let submissions = state.sync.fetch_task_submissions(&task).await?;
        Ok::<_, BoardError>(SubmissionsResponse {
            task,
            count: submissions.len(),
            submissions,
        })
    }
    .await;
    respond(result)
}

/// `GET /profiles/:id`
pub async fn get_profile<S: ObjectStore>(
    State(state): State<Arc<ApiState<S>>>,
    Path(id): Path<String>,
) -> Response {
    respond(state.sync.fetch_profile(&id).await)
}

/// `GET /accounts/:address/objects`
pub async fn get_owned_objects<S: ObjectStore>(
    State(state): State<Arc<ApiState<S>>>,
    Path(address): Path<String>,
) -> Response {
    respond(
        state
            .sync
            .fetch_owned_objects(&address)
            .await
            .map(|objects| ObjectsResponse {
                owner: address.clone(),
                count: objects.len(),
                objects,
            }),
    )
}

// ─────────────────────────────────────────────────────────
// Transaction handlers
// ─────────────────────────────────────────────────────────

/// `POST /tx/profiles`
pub async fn tx_create_profile<S: ObjectStore>(
    State(state): State<Arc<ApiState<S>>>,
    Json(req): Json<CreateProfileRequest>,
) -> Response {
    respond_tx(
        validation::validate_profile_form(&req.username, &req.email, &req.bio).and_then(|_| {
            state
                .builder
                .create_profile(&req.username, &req.email, &req.role, &req.bio)
        }),
    )
}

/// `POST /tx/boards`
pub async fn tx_create_board<S: ObjectStore>(
    State(state): State<Arc<ApiState<S>>>,
    Json(req): Json<CreateBoardRequest>,
) -> Response {
    let image_url = req.image_url.as_deref().filter(|u| !u.is_empty());
    respond_tx(
        validation::validate_board_form(&req.name, &req.description, image_url).and_then(|_| {
            state
                .builder
                .create_board(&req.name, &req.description, image_url, &req.reward_amount)
        }),
    )
}

/// `POST /tx/boards/:id/join`
pub async fn tx_join_board<S: ObjectStore>(
    State(state): State<Arc<ApiState<S>>>,
    Path(id): Path<String>,
) -> Response {
    respond_tx(state.builder.join_board(&id))
}

/// `POST /tx/boards/:id/close`
pub async fn tx_close_board<S: ObjectStore>(
    State(state): State<Arc<ApiState<S>>>,
    Path(id): Path<String>,
) -> Response {
    respond_tx(state.builder.close_board(&id))
}

/// `POST /tx/boards/:id/tasks`
pub async fn tx_create_task<S: ObjectStore>(
    State(state): State<Arc<ApiState<S>>>,
    Path(id): Path<String>,
    Json(req): Json<CreateTaskRequest>,
) -> Response {
    respond_tx(
        validation::validate_task_form(&req.name, &req.description).and_then(|_| {
            state.builder.create_task(&NewTask {
                board: id,
                name: req.name,
                description: req.description,
                deadline: req.deadline,
                max_completions: req.max_completions,
                reward_amount: req.reward_amount,
                allow_self_review: req.allow_self_review,
                config: req.config,
            })
        }),
    )
}

/// `POST /tx/boards/:id/tasks/:key/proofs`
pub async fn tx_submit_proof<S: ObjectStore>(
    State(state): State<Arc<ApiState<S>>>,
    Path((id, key)): Path<(String, String)>,
    Json(req): Json<ProofRequest>,
) -> Response {
    respond_tx(state.builder.submit_task_proof(&id, &key, &req.proof))
}

/// `POST /tx/boards/:id/tasks/:key/reviews`
pub async fn tx_review<S: ObjectStore>(
    State(state): State<Arc<ApiState<S>>>,
    Path((id, key)): Path<(String, String)>,
    Json(req): Json<ReviewRequest>,
) -> Response {
    respond_tx(validation::validate_review_form(&req.comment).and_then(|_| {
        state
            .builder
            .review_submission(&id, &key, &req.submitter, &req.comment, req.status)
    }))
}

/// `POST /tx/boards/:id/tasks/:key/reviewers`
pub async fn tx_add_reviewers<S: ObjectStore>(
    State(state): State<Arc<ApiState<S>>>,
    Path((id, key)): Path<(String, String)>,
    Json(req): Json<ReviewersRequest>,
) -> Response {
    respond_tx(state.builder.add_reviewers(&id, &key, &req.reviewers))
}

// ─────────────────────────────────────────────────────────
// Unit tests
// ─────────────────────────────────────────────────────────
