// [apps/coordinator/src/handlers/jobs.rs]
//! C3 §4.3.3/§4.3.4: atomic claim and the start/complete/fail state guards.
//! Every mutation is a single transaction against the persistence layer
//! (C1); the atomicity of the claim itself lives in
//! `JobRepository::claim_job`'s conditional `UPDATE`.

use crate::errors::CoordinatorError;
use crate::state::AppState;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use fleet_domain_models::{is_known_operation, Job, JobResult, JobStatus};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument, warn};
use uuid::Uuid;

#[derive(Debug, Deserialize)]
pub struct ClaimRequest {
    pub bot_id: Uuid,
    pub operation: Option<String>,
}

#[instrument(skip(state), fields(bot_id = %request.bot_id))]
pub async fn claim(State(state): State<AppState>, Json(request): Json<ClaimRequest>) -> Result<Response, CoordinatorError> {
    let workers = state.workers()?;
    let worker = workers.get_worker(request.bot_id).await?;

    if worker.current_job_id.is_some() {
        return Err(CoordinatorError::Conflict("bot already has an active job".into()));
    }

    let jobs = state.jobs()?;
    match jobs.claim_job(request.bot_id, worker.assigned_operation.as_deref()).await? {
        Some(job) => {
            if let Err(assign_error) = workers.assign_current_job(request.bot_id, job.id).await {
                // The job row is already claimed; a failed worker-side assign (e.g. a
                // concurrent claim on the same bot_id won the race) must not strand it.
                jobs.release_job(job.id, "bot assignment rejected after claim").await?;
                warn!("↩️ [CLAIM_REVERTED]: job=[{}] bot=[{}] released after assign failure", job.id, request.bot_id);
                return Err(assign_error.into());
            }
            info!("📦 [CLAIMED]: job=[{}] bot=[{}]", job.id, request.bot_id);
            Ok(Response::Claimed(Json(job)))
        }
        None => Ok(Response::NoContent),
    }
}

/// Claim either renders the claimed job or a bare 204, so it can't be a
/// plain `Json<T>` return type.
pub enum Response {
    Claimed(Json<Job>),
    NoContent,
}

impl axum::response::IntoResponse for Response {
    fn into_response(self) -> axum::response::Response {
        match self {
            Response::Claimed(job) => job.into_response(),
            Response::NoContent => StatusCode::NO_CONTENT.into_response(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct BotScopedRequest {
    pub bot_id: Uuid,
}

#[instrument(skip(state))]
pub async fn start(State(state): State<AppState>, Path(job_id): Path<Uuid>, Json(request): Json<BotScopedRequest>) -> Result<StatusCode, CoordinatorError> {
    state.jobs()?.start_job(job_id, request.bot_id).await?;
    info!("▶️  [STARTED]: job=[{}] bot=[{}]", job_id, request.bot_id);
    Ok(StatusCode::OK)
}

#[derive(Debug, Deserialize)]
pub struct CompleteRequest {
    pub bot_id: Uuid,
    pub value: i64,
    pub duration_ms: u64,
}

#[instrument(skip(state))]
pub async fn complete(State(state): State<AppState>, Path(job_id): Path<Uuid>, Json(request): Json<CompleteRequest>) -> Result<StatusCode, CoordinatorError> {
    let jobs = state.jobs()?;
    let job = jobs.get_job(job_id).await?;
    jobs.complete_job(job_id, request.bot_id).await?;

    let result = JobResult::success(job_id, job.operand_a, job.operand_b, job.operation, request.value, request.bot_id, request.duration_ms);
    state.results()?.insert_result(&result).await?;

    state.workers()?.clear_current_job(request.bot_id).await?;
    info!("✅ [COMPLETED]: job=[{}] bot=[{}] value=[{}]", job_id, request.bot_id, request.value);
    Ok(StatusCode::OK)
}

#[derive(Debug, Deserialize)]
pub struct FailRequest {
    pub bot_id: Uuid,
    pub error: String,
    pub duration_ms: u64,
}

#[instrument(skip(state))]
pub async fn fail(State(state): State<AppState>, Path(job_id): Path<Uuid>, Json(request): Json<FailRequest>) -> Result<StatusCode, CoordinatorError> {
    let jobs = state.jobs()?;
    let job = jobs.get_job(job_id).await?;
    jobs.fail_job(job_id, request.bot_id, &request.error).await?;

    let result = JobResult::failure(job_id, job.operand_a, job.operand_b, job.operation, request.bot_id, request.duration_ms, request.error.clone());
    state.results()?.insert_result(&result).await?;

    state.workers()?.clear_current_job(request.bot_id).await?;
    warn!("🔥 [FAILED]: job=[{}] bot=[{}] error=[{}]", job_id, request.bot_id, request.error);
    Ok(StatusCode::OK)
}

#[derive(Deserialize)]
pub struct JobListQuery {
    pub status: Option<JobStatus>,
    pub limit: Option<i64>,
}

pub async fn list_jobs(State(state): State<AppState>, Query(query): Query<JobListQuery>) -> Result<Json<Vec<Job>>, CoordinatorError> {
    let jobs = state.jobs()?.list_jobs(query.status, query.limit.unwrap_or(100)).await?;
    Ok(Json(jobs))
}

pub async fn get_job(State(state): State<AppState>, Path(job_id): Path<Uuid>) -> Result<Json<Job>, CoordinatorError> {
    Ok(Json(state.jobs()?.get_job(job_id).await?))
}

#[derive(Deserialize)]
pub struct PopulateRequest {
    pub operand_a: i64,
    pub operand_b: i64,
    pub operation: String,
}

#[derive(Serialize)]
pub struct PopulateResponse {
    pub created: usize,
}

#[instrument(skip(state, requests))]
pub async fn populate(State(state): State<AppState>, Json(requests): Json<Vec<PopulateRequest>>) -> Result<Json<PopulateResponse>, CoordinatorError> {
    let jobs = state.jobs()?;
    let mut created = 0;
    for request in requests {
        if !is_known_operation(&request.operation) {
            return Err(CoordinatorError::Validation(format!("unknown operation: {}", request.operation)));
        }
        jobs.create_job(request.operand_a, request.operand_b, &request.operation).await?;
        created += 1;
    }
    info!("📬 [POPULATED]: {} jobs created via admin batch insert.", created);
    Ok(Json(PopulateResponse { created }))
}
