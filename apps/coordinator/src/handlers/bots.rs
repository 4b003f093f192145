// [apps/coordinator/src/handlers/bots.rs]
//! C3 §4.3.1/§4.3.2: idempotent registration and heartbeat, plus the
//! worker-facing diagnostic reads and admin fleet operations.

use crate::errors::CoordinatorError;
use crate::state::AppState;
use axum::extract::{Extension, Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::Json;
use chrono::Utc;
use fleet_domain_models::{HealthStatus, Worker, WorkerClaims};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::{info, instrument, warn};
use uuid::Uuid;

#[derive(Deserialize, Serialize)]
struct AgentDescriptor {
    version: String,
    platform: String,
}

#[derive(Deserialize, Serialize)]
struct CapabilitiesDescriptor {
    operations: Vec<String>,
    max_concurrency: u32,
}

#[derive(Deserialize, Serialize)]
pub struct RegisterRequest {
    bot_key: String,
    instance_id: String,
    agent: AgentDescriptor,
    capabilities: CapabilitiesDescriptor,
}

#[derive(Serialize, Deserialize)]
struct SessionDescriptor {
    session_id: Uuid,
    expires_in_sec: i64,
    heartbeat_interval_sec: i64,
}

#[derive(Serialize, Deserialize)]
struct AssignmentDescriptor {
    operation: Option<String>,
    queue: String,
    max_concurrency: u32,
}

#[derive(Serialize, Deserialize)]
struct PolicyDescriptor {
    rate_limits: String,
    backoff: String,
}

#[derive(Serialize, Deserialize)]
struct EndpointsDescriptor {
    heartbeat: String,
    claim: String,
    report: String,
}

#[derive(Serialize, Deserialize)]
struct ServerDescriptor {
    region: String,
    version: String,
}

#[derive(Serialize, Deserialize)]
pub struct RegisterResponse {
    bot_id: Uuid,
    registered_at: chrono::DateTime<Utc>,
    session: SessionDescriptor,
    assignment: AssignmentDescriptor,
    policy: PolicyDescriptor,
    endpoints: EndpointsDescriptor,
    server: ServerDescriptor,
}

/// Session lifetime for the descriptor returned on registration; distinct
/// from the bearer token's own `MAX_TOKEN_LIFETIME_SECS` (§4.3.1's
/// `heartbeat_interval_sec` must stay ≤ a third of this).
const SESSION_LIFETIME_SECS: i64 = 1800;
const HEARTBEAT_INTERVAL_SECS: i64 = SESSION_LIFETIME_SECS / 6;

fn request_hash(request: &RegisterRequest) -> String {
    let canonical = serde_json::to_vec(request).expect("FATAL: register request is always serializable.");
    let digest = Sha256::digest(&canonical);
    hex_encode(&digest)
}

fn hex_encode(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

#[instrument(skip(state, claims, request), fields(bot_key = %request.bot_key))]
pub async fn register(
    State(state): State<AppState>,
    Extension(claims): Extension<WorkerClaims>,
    headers: HeaderMap,
    Json(request): Json<RegisterRequest>,
) -> Result<(StatusCode, HeaderMap, Json<RegisterResponse>), CoordinatorError> {
    if claims.sub != request.bot_key {
        return Err(CoordinatorError::Forbidden("token does not match registering bot_key".into()));
    }

    let idempotency_key = headers
        .get("Idempotency-Key")
        .and_then(|h| h.to_str().ok())
        .ok_or_else(|| CoordinatorError::Validation("Idempotency-Key header is required".into()))?
        .to_string();

    let hash = request_hash(&request);
    let idempotency = state.idempotency()?;

    if let Some(existing) = idempotency.find(&idempotency_key, &request.bot_key).await? {
        if existing.request_hash != hash {
            return Err(CoordinatorError::Conflict("idempotency key reused with a different body".into()));
        }
        info!("🔁 [REGISTER_REPLAY]: bot_key=[{}] key=[{}]", request.bot_key, idempotency_key);
        let body: RegisterResponse = serde_json::from_str(&existing.response_body)
            .map_err(|e| CoordinatorError::Unavailable(format!("corrupted idempotency record: {e}")))?;
        let mut replay_headers = HeaderMap::new();
        replay_headers.insert("Idempotency-Replayed", "true".parse().expect("ASCII literal"));
        return Ok((StatusCode::OK, replay_headers, Json(body)));
    }

    let operation = request.capabilities.operations.first().cloned();
    let worker = state.workers()?.register(&request.bot_key, operation.as_deref()).await?;

    let response = RegisterResponse {
        bot_id: worker.id,
        registered_at: worker.created_at,
        session: SessionDescriptor {
            session_id: Uuid::new_v4(),
            expires_in_sec: SESSION_LIFETIME_SECS,
            heartbeat_interval_sec: HEARTBEAT_INTERVAL_SECS,
        },
        assignment: AssignmentDescriptor {
            operation: worker.assigned_operation.clone(),
            queue: "default".to_string(),
            max_concurrency: request.capabilities.max_concurrency,
        },
        policy: PolicyDescriptor { rate_limits: "standard".to_string(), backoff: "exponential".to_string() },
        endpoints: EndpointsDescriptor { heartbeat: "/bots/heartbeat".to_string(), claim: "/jobs/claim".to_string(), report: "/jobs/{id}/complete".to_string() },
        server: ServerDescriptor { region: "local".to_string(), version: env!("CARGO_PKG_VERSION").to_string() },
    };

    let response_body = serde_json::to_string(&response).expect("FATAL: register response is always serializable.");
    let record = fleet_domain_models::IdempotencyRecord::new(idempotency_key, request.bot_key.clone(), hash, StatusCode::CREATED.as_u16(), response_body);
    idempotency.insert(&record).await?;

    info!("🆕 [REGISTERED]: bot_id=[{}] bot_key=[{}]", worker.id, request.bot_key);
    Ok((StatusCode::CREATED, HeaderMap::new(), Json(response)))
}

#[derive(Debug, Deserialize)]
pub struct HeartbeatRequest {
    pub bot_id: Uuid,
}

#[instrument(skip(state))]
pub async fn heartbeat(State(state): State<AppState>, Json(request): Json<HeartbeatRequest>) -> Result<StatusCode, CoordinatorError> {
    state.workers()?.update_heartbeat(request.bot_id, Utc::now()).await?;
    Ok(StatusCode::OK)
}

pub async fn list_workers(State(state): State<AppState>) -> Result<Json<Vec<Worker>>, CoordinatorError> {
    Ok(Json(state.workers()?.list_workers().await?))
}

#[derive(Serialize)]
pub struct WorkerStats {
    #[serde(flatten)]
    worker: Worker,
    is_live: bool,
}

pub async fn get_worker_stats(State(state): State<AppState>, Path(bot_id): Path<Uuid>) -> Result<Json<WorkerStats>, CoordinatorError> {
    let worker = state.workers()?.get_worker(bot_id).await?;
    let is_live = worker.is_live(Utc::now());
    Ok(Json(WorkerStats { worker, is_live }))
}

#[instrument(skip(state))]
pub async fn soft_delete(State(state): State<AppState>, Path(bot_id): Path<Uuid>) -> Result<StatusCode, CoordinatorError> {
    let workers = state.workers()?;
    let worker = workers.get_worker(bot_id).await?;

    if let Some(job_id) = worker.current_job_id {
        state.jobs()?.release_job(job_id, "worker soft-deleted").await?;
        warn!("⚠️ [JOB_RELEASED]: job=[{}] released by soft-delete of bot=[{}]", job_id, bot_id);
    }

    workers.soft_delete(bot_id, Utc::now()).await?;
    info!("🗑️  [WORKER_DELETED]: bot=[{}]", bot_id);
    Ok(StatusCode::NO_CONTENT)
}

#[instrument(skip(state))]
pub async fn reset(State(state): State<AppState>, Path(bot_id): Path<Uuid>) -> Result<StatusCode, CoordinatorError> {
    let workers = state.workers()?;
    let worker = workers.get_worker(bot_id).await?;

    if let Some(job_id) = worker.current_job_id {
        state.jobs()?.release_job(job_id, "worker manually reset").await?;
    }
    workers.clear_current_job(bot_id).await?;
    workers.mark_health_status(bot_id, HealthStatus::Normal).await?;
    info!("♻️  [WORKER_RESET]: bot=[{}]", bot_id);
    Ok(StatusCode::OK)
}

#[derive(Debug, Deserialize)]
pub struct AssignOperationRequest {
    pub operation: Option<String>,
}

#[instrument(skip(state))]
pub async fn assign_operation(
    State(state): State<AppState>,
    Path(bot_id): Path<Uuid>,
    Json(request): Json<AssignOperationRequest>,
) -> Result<StatusCode, CoordinatorError> {
    if let Some(operation) = &request.operation {
        if !fleet_domain_models::is_known_operation(operation) {
            return Err(CoordinatorError::Validation(format!("unknown operation: {operation}")));
        }
    }
    state.workers()?.assign_operation(bot_id, request.operation.as_deref()).await?;
    info!("🎯 [OPERATION_ASSIGNED]: bot=[{}] operation=[{:?}]", bot_id, request.operation);
    Ok(StatusCode::OK)
}
