// [libs/infra/coordinator-client/src/client.rs]
/*!
 * =================================================================
 * APARATO: SOVEREIGN COORDINATOR UPLINK (V1.0)
 * CLASIFICACIÓN: INFRASTRUCTURE ADAPTER (ESTRATO L3)
 * RESPONSABILIDAD: NEGOCIACIÓN DE SESIÓN Y CICLO DE VIDA DE TRABAJOS
 *
 * Implementa el túnel de comunicación asíncrono entre el agente de
 * trabajo (C5) y el motor coordinador (C3): autenticación, registro
 * idempotente, latido, reclamo atómico y reporte de resultado.
 * =================================================================
 */

use crate::errors::ClientError;
use fleet_domain_models::TokenEnvelope;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument, warn};
use uuid::Uuid;

#[derive(Serialize)]
struct IssueTokenRequest<'a> {
    bot_key: &'a str,
    bootstrap_secret: &'a str,
}

#[derive(Serialize)]
struct AgentDescriptor<'a> {
    version: &'a str,
    platform: &'a str,
}

#[derive(Serialize)]
struct CapabilitiesDescriptor<'a> {
    operations: &'a [String],
    max_concurrency: u32,
}

#[derive(Serialize)]
struct RegisterRequest<'a> {
    bot_key: &'a str,
    instance_id: &'a str,
    agent: AgentDescriptor<'a>,
    capabilities: CapabilitiesDescriptor<'a>,
}

#[derive(Deserialize)]
pub struct SessionDescriptor {
    pub session_id: String,
    pub expires_in_sec: i64,
    pub heartbeat_interval_sec: i64,
}

#[derive(Deserialize)]
pub struct RegisterResponse {
    pub bot_id: Uuid,
    pub registered_at: chrono::DateTime<chrono::Utc>,
    pub session: SessionDescriptor,
}

#[derive(Serialize)]
struct HeartbeatRequest {
    bot_id: Uuid,
}

#[derive(Serialize)]
struct ClaimRequest<'a> {
    bot_id: Uuid,
    operation: Option<&'a str>,
}

#[derive(Debug, Deserialize)]
pub struct ClaimedJob {
    pub id: Uuid,
    pub operand_a: i64,
    pub operand_b: i64,
    pub operation: String,
}

#[derive(Serialize)]
struct StartRequest {
    bot_id: Uuid,
}

#[derive(Serialize)]
struct CompleteRequest {
    bot_id: Uuid,
    value: i64,
    duration_ms: u64,
}

#[derive(Serialize)]
struct FailRequest<'a> {
    bot_id: Uuid,
    error: &'a str,
    duration_ms: u64,
}

/// HTTP uplink from a worker agent to the coordinator's public surface
/// (§6.1). Holds no session state beyond the underlying `reqwest::Client`;
/// the caller (the worker's runtime) owns the current bearer token and
/// `bot_id`, since those are part of the worker's own state machine.
pub struct CoordinatorClient {
    http: Client,
    base_url: String,
}

impl CoordinatorClient {
    pub fn new(base_url: String) -> Self {
        Self {
            http: Client::builder()
                .user_agent("fleet-worker-agent/1.0")
                .timeout(std::time::Duration::from_secs(30))
                .build()
                .expect("FATAL: HTTP client initialization failed."),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    #[instrument(skip(self, bootstrap_secret))]
    pub async fn issue_token(&self, bot_key: &str, bootstrap_secret: &str) -> Result<TokenEnvelope, ClientError> {
        let url = format!("{}/v1/auth/token", self.base_url);
        let response = self.http
            .post(&url)
            .json(&IssueTokenRequest { bot_key, bootstrap_secret })
            .send()
            .await?;

        match response.status() {
            StatusCode::OK => Ok(response.json::<TokenEnvelope>().await?),
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Err(ClientError::Unauthorized),
            StatusCode::TOO_MANY_REQUESTS => {
                let retry_after = response
                    .headers()
                    .get("Retry-After")
                    .and_then(|v| v.to_str().ok())
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(60);
                Err(ClientError::RateLimited(retry_after))
            }
            status => Err(ClientError::ServerRejection(format!("HTTP_{status}"))),
        }
    }

    #[instrument(skip(self, access_token))]
    pub async fn register(
        &self,
        access_token: &str,
        idempotency_key: Uuid,
        bot_key: &str,
        instance_id: &str,
        version: &str,
        platform: &str,
        operations: &[String],
        max_concurrency: u32,
    ) -> Result<RegisterResponse, ClientError> {
        let url = format!("{}/v1/bots/register", self.base_url);
        let response = self.http
            .post(&url)
            .bearer_auth(access_token)
            .header("Idempotency-Key", idempotency_key.to_string())
            .json(&RegisterRequest {
                bot_key,
                instance_id,
                agent: AgentDescriptor { version, platform },
                capabilities: CapabilitiesDescriptor { operations, max_concurrency },
            })
            .send()
            .await?;

        match response.status() {
            StatusCode::OK | StatusCode::CREATED => {
                let body = response.json::<RegisterResponse>().await?;
                info!("🆕 [REGISTERED]: bot_id=[{}]", body.bot_id);
                Ok(body)
            }
            StatusCode::UNAUTHORIZED => Err(ClientError::Unauthorized),
            StatusCode::CONFLICT => Err(ClientError::Conflict("registration idempotency mismatch".into())),
            status => Err(ClientError::ServerRejection(format!("HTTP_{status}"))),
        }
    }

    pub async fn heartbeat(&self, bot_id: Uuid) -> Result<(), ClientError> {
        let url = format!("{}/bots/heartbeat", self.base_url);
        let response = self.http.post(&url).json(&HeartbeatRequest { bot_id }).send().await?;
        match response.status() {
            StatusCode::OK | StatusCode::NO_CONTENT => Ok(()),
            StatusCode::NOT_FOUND => Err(ClientError::ServerRejection("bot not found".into())),
            status => Err(ClientError::ServerRejection(format!("HTTP_{status}"))),
        }
    }

    #[instrument(skip(self))]
    pub async fn claim(&self, bot_id: Uuid, operation: Option<&str>) -> Result<ClaimedJob, ClientError> {
        let url = format!("{}/jobs/claim", self.base_url);
        let response = self.http
            .post(&url)
            .json(&ClaimRequest { bot_id, operation })
            .send()
            .await?;

        match response.status() {
            StatusCode::OK => Ok(response.json::<ClaimedJob>().await?),
            StatusCode::NO_CONTENT => Err(ClientError::NoJobAvailable),
            StatusCode::CONFLICT => Err(ClientError::Conflict("bot already has an active job".into())),
            status => Err(ClientError::ServerRejection(format!("HTTP_{status}"))),
        }
    }

    pub async fn start(&self, bot_id: Uuid, job_id: Uuid) -> Result<(), ClientError> {
        let url = format!("{}/jobs/{}/start", self.base_url, job_id);
        let response = self.http.post(&url).json(&StartRequest { bot_id }).send().await?;
        match response.status() {
            StatusCode::OK => Ok(()),
            StatusCode::CONFLICT => Err(ClientError::Conflict("job not claimed by this bot".into())),
            status => Err(ClientError::ServerRejection(format!("HTTP_{status}"))),
        }
    }

    pub async fn complete(&self, bot_id: Uuid, job_id: Uuid, value: i64, duration_ms: u64) -> Result<(), ClientError> {
        let url = format!("{}/jobs/{}/complete", self.base_url, job_id);
        let response = self.http
            .post(&url)
            .json(&CompleteRequest { bot_id, value, duration_ms })
            .send()
            .await?;
        match response.status() {
            StatusCode::OK => Ok(()),
            StatusCode::CONFLICT => Err(ClientError::Conflict("job not in processing state for this bot".into())),
            status => Err(ClientError::ServerRejection(format!("HTTP_{status}"))),
        }
    }

    /// Health probe 1/3 (§4.5.2): confirms this bot_id is still visible in
    /// the coordinator's worker listing.
    pub async fn is_registration_visible(&self, bot_id: Uuid) -> Result<bool, ClientError> {
        let url = format!("{}/bots", self.base_url);
        let response = self.http.get(&url).send().await?;
        match response.status() {
            StatusCode::OK => {
                let workers = response.json::<Vec<serde_json::Value>>().await?;
                Ok(workers.iter().any(|worker| worker.get("id").and_then(|id| id.as_str()) == Some(&bot_id.to_string())))
            }
            status => Err(ClientError::ServerRejection(format!("HTTP_{status}"))),
        }
    }

    /// Health probe 2/3: the coordinator's own liveness endpoint.
    pub async fn check_coordinator_health(&self) -> Result<bool, ClientError> {
        let url = format!("{}/healthz", self.base_url);
        let response = self.http.get(&url).send().await?;
        Ok(response.status() == StatusCode::OK)
    }

    /// Health probe 3/3: the metrics endpoint responds with the expected
    /// Prometheus text-exposition shape.
    pub async fn check_coordinator_metrics(&self) -> Result<bool, ClientError> {
        let url = format!("{}/metrics", self.base_url);
        let response = self.http.get(&url).send().await?;
        if response.status() != StatusCode::OK {
            return Ok(false);
        }
        let body = response.text().await?;
        Ok(body.contains("# TYPE"))
    }

    #[instrument(skip(self, error))]
    pub async fn fail(&self, bot_id: Uuid, job_id: Uuid, error: &str, duration_ms: u64) -> Result<(), ClientError> {
        let url = format!("{}/jobs/{}/fail", self.base_url, job_id);
        let response = self.http
            .post(&url)
            .json(&FailRequest { bot_id, error, duration_ms })
            .send()
            .await?;
        match response.status() {
            StatusCode::OK => Ok(()),
            StatusCode::CONFLICT => {
                warn!("⚠️ [FAIL_REPORT_CONFLICT]: job [{}] no longer in processing state", job_id);
                Err(ClientError::Conflict("job not in processing state for this bot".into()))
            }
            status => Err(ClientError::ServerRejection(format!("HTTP_{status}"))),
        }
    }
}
