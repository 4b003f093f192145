// [apps/worker-agent/src/engine.rs]
/*!
 * =================================================================
 * APARATO: WORKER RUNTIME ENGINE (V1.0)
 * CLASIFICACIÓN: WORKER EXECUTION LAYER (ESTRATO L1-WORKER)
 * RESPONSABILIDAD: ORQUESTACIÓN DEL CICLO DE VIDA Y TAREAS COOPERATIVAS
 *
 * Un único planificador cooperativo por proceso: las tareas de latido,
 * reclamo de trabajos y vigilancia de fase se multiplexan sobre el mismo
 * event loop de tokio, compartiendo estado mutable protegido por un solo
 * `tokio::sync::Mutex` en vez de bloqueos dispersos por el aparato.
 * =================================================================
 */

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use fleet_domain_models::{execute_operation, TokenEnvelope};
use fleet_infra_coordinator_client::{ClientError, ClaimedJob, CoordinatorClient};
use rand::Rng;
use tokio::sync::Mutex;
use tokio::time::sleep;
use tracing::{debug, error, info, instrument, warn};
use uuid::Uuid;

use crate::backoff::{delay_for_attempt, BackoffConfig};
use crate::breaker::{BreakerConfig, CircuitBreaker};
use crate::metrics::WorkerMetrics;
use crate::state_machine::{transition, TransitionError, WorkerEvent, WorkerState};

/// Static runtime knobs sourced from CLI/env at startup (§4.5's CLI ergonomics).
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    pub coordinator_url: String,
    pub bot_key: String,
    pub bootstrap_secret: String,
    pub instance_id: String,
    pub max_concurrency: u32,
    pub simulated_processing_ms: u64,
    pub simulated_failure_rate: f64,
    pub startup_max_attempts: u32,
    pub auth_refresh_skew: Duration,
    pub backoff: BackoffConfig,
    pub breaker: BreakerConfig,
}

struct BreakerSet {
    register: CircuitBreaker,
    heartbeat: CircuitBreaker,
    claim: CircuitBreaker,
    report: CircuitBreaker,
}

impl BreakerSet {
    fn new(config: BreakerConfig) -> Self {
        Self {
            register: CircuitBreaker::new(config),
            heartbeat: CircuitBreaker::new(config),
            claim: CircuitBreaker::new(config),
            report: CircuitBreaker::new(config),
        }
    }
}

struct TokenState {
    access_token: String,
    expires_at: Instant,
}

/// Everything the runtime's tasks touch is gathered here behind one mutex,
/// per the concurrency model's guidance to avoid contended locking scattered
/// across call sites.
struct RuntimeInner {
    state: WorkerState,
    entered_state_at: Instant,
    bot_id: Option<Uuid>,
    heartbeat_interval: Duration,
    token: Option<TokenState>,
    breakers: BreakerSet,
    startup_attempts: u32,
    consecutive_probe_failures: u32,
    consecutive_heartbeat_failures: u32,
    current_job: Option<Uuid>,
}

pub struct WorkerRuntime {
    client: Arc<CoordinatorClient>,
    config: WorkerConfig,
    inner: Arc<Mutex<RuntimeInner>>,
    running: Arc<AtomicBool>,
    metrics: Arc<WorkerMetrics>,
}

impl WorkerRuntime {
    pub fn new(config: WorkerConfig, client: CoordinatorClient) -> Self {
        let inner = RuntimeInner {
            state: WorkerState::Initializing,
            entered_state_at: Instant::now(),
            bot_id: None,
            heartbeat_interval: Duration::from_secs(30),
            token: None,
            breakers: BreakerSet::new(config.breaker),
            startup_attempts: 0,
            consecutive_probe_failures: 0,
            consecutive_heartbeat_failures: 0,
            current_job: None,
        };

        Self {
            client: Arc::new(client),
            config,
            inner: Arc::new(Mutex::new(inner)),
            running: Arc::new(AtomicBool::new(true)),
            metrics: Arc::new(WorkerMetrics::new()),
        }
    }

    async fn move_to(&self, event: WorkerEvent) -> Result<WorkerState, TransitionError> {
        let mut inner = self.inner.lock().await;
        let from = inner.state;
        let to = transition(from, event)?;
        inner.state = to;
        inner.entered_state_at = Instant::now();
        info!("🔀 [STATE_TRANSITION]: {:?} -> {:?} on {:?}", from, to, event);
        Ok(to)
    }

    async fn current_state(&self) -> WorkerState {
        self.inner.lock().await.state
    }

    /// Blocking entry point: drives the agent from `initializing` through
    /// to `stopped`, spawning the heartbeat/job/watchdog tasks once ready.
    #[instrument(skip(self), fields(bot_key = %self.config.bot_key))]
    pub async fn run(&self) {
        info!("🚀 [RUNTIME]: Worker ignition sequence starting.");
        self.move_to(WorkerEvent::BeginRegistration).await.expect("initial transition is always valid");

        let mut background_tasks: Vec<tokio::task::JoinHandle<()>> = Vec::new();
        let mut handed_off_to_background = false;

        loop {
            if !self.running.load(Ordering::SeqCst) {
                self.shut_down(&mut background_tasks).await;
                return;
            }

            match self.current_state().await {
                WorkerState::Registering => self.drive_registration().await,
                WorkerState::HealthCheck => self.drive_health_check().await,
                WorkerState::Ready | WorkerState::Processing => {
                    if !handed_off_to_background {
                        background_tasks.push(self.spawn_heartbeat_task());
                        background_tasks.push(self.spawn_watchdog_task());
                        handed_off_to_background = true;
                    }
                    self.drive_job_cycle().await;
                }
                WorkerState::Error => self.drive_error_recovery().await,
                WorkerState::Stopped => {
                    info!("🏁 [RUNTIME]: Worker reached terminal state. Shutting down.");
                    self.shut_down(&mut background_tasks).await;
                    return;
                }
                WorkerState::Initializing | WorkerState::ShuttingDown => {
                    sleep(Duration::from_millis(50)).await;
                }
            }
        }
    }

    pub fn request_shutdown(&self) {
        self.running.store(false, Ordering::SeqCst);
    }

    async fn shut_down(&self, background_tasks: &mut Vec<tokio::task::JoinHandle<()>>) {
        let state = self.current_state().await;
        if state == WorkerState::Stopped {
            for task in background_tasks.drain(..) {
                task.abort();
            }
            info!("🛑 [RUNTIME]: Worker offline.");
            return;
        }

        if state != WorkerState::ShuttingDown {
            let _ = self.move_to(WorkerEvent::ShutdownRequested).await;
        }

        for task in background_tasks.drain(..) {
            task.abort();
        }

        if let Some(job_id) = self.fail_in_flight_job_best_effort().await {
            warn!("⚠️ [SHUTDOWN]: Reported in-flight job [{}] as failed.", job_id);
        }

        let _ = self.move_to(WorkerEvent::ShutdownComplete).await;
        info!("🛑 [RUNTIME]: Worker offline.");
    }

    async fn fail_in_flight_job_best_effort(&self) -> Option<Uuid> {
        let (bot_id, job_id) = {
            let inner = self.inner.lock().await;
            (inner.bot_id, inner.current_job)
        };
        let (bot_id, job_id) = (bot_id?, job_id?);
        let _ = self.client.fail(bot_id, job_id, "Bot terminated", 0).await;
        self.inner.lock().await.current_job = None;
        Some(job_id)
    }

    #[instrument(skip(self))]
    async fn drive_registration(&self) {
        let mut inner = self.inner.lock().await;
        inner.startup_attempts += 1;
        if inner.startup_attempts > self.config.startup_max_attempts {
            drop(inner);
            error!("💀 [STARTUP_EXHAUSTED]: Exceeded {} registration attempts.", self.config.startup_max_attempts);
            let _ = self.move_to(WorkerEvent::StartupAttemptsExhausted).await;
            return;
        }
        let attempt = inner.startup_attempts;
        let can_call = inner.breakers.register.can_execute();
        drop(inner);

        if !can_call {
            debug!("⛔ [BREAKER_OPEN]: register breaker open, backing off.");
            sleep(delay_for_attempt(&self.config.backoff, attempt)).await;
            return;
        }

        match self.attempt_registration().await {
            Ok(()) => {
                self.inner.lock().await.breakers.register.record_success();
                let _ = self.move_to(WorkerEvent::RegistrationSucceeded).await;
            }
            Err(fault) => {
                warn!("⚠️ [REGISTRATION_FAULT]: attempt {}: {}", attempt, fault);
                self.inner.lock().await.breakers.register.record_failure();
                sleep(delay_for_attempt(&self.config.backoff, attempt)).await;
            }
        }
    }

    async fn attempt_registration(&self) -> Result<(), ClientError> {
        let token = self.issue_token().await?;
        self.inner.lock().await.token = Some(TokenState {
            access_token: token.access_token.clone(),
            expires_at: Instant::now() + Duration::from_secs(token.expires_in as u64),
        });

        let idempotency_key = Uuid::new_v4();
        let known = fleet_domain_models::known_operations();
        let operations: Vec<String> = known.iter().map(|op| op.to_string()).collect();

        let response = self
            .client
            .register(
                &token.access_token,
                idempotency_key,
                &self.config.bot_key,
                &self.config.instance_id,
                env!("CARGO_PKG_VERSION"),
                std::env::consts::OS,
                &operations,
                self.config.max_concurrency,
            )
            .await?;

        let mut inner = self.inner.lock().await;
        inner.bot_id = Some(response.bot_id);
        inner.heartbeat_interval = Duration::from_secs(response.session.heartbeat_interval_sec.max(1) as u64);
        info!("🆕 [REGISTERED]: bot_id=[{}] heartbeat_interval=[{}s]", response.bot_id, response.session.heartbeat_interval_sec);
        Ok(())
    }

    async fn issue_token(&self) -> Result<TokenEnvelope, ClientError> {
        self.client.issue_token(&self.config.bot_key, &self.config.bootstrap_secret).await
    }

    /// Ensures the cached token has not crossed `expires_at - skew`,
    /// refreshing through C2 when it has (§4.5.5).
    async fn ensure_fresh_token(&self) -> Result<String, ClientError> {
        let needs_refresh = {
            let inner = self.inner.lock().await;
            match &inner.token {
                Some(token) => Instant::now() + self.config.auth_refresh_skew >= token.expires_at,
                None => true,
            }
        };

        if needs_refresh {
            let token = self.issue_token().await?;
            let mut inner = self.inner.lock().await;
            inner.token = Some(TokenState {
                access_token: token.access_token.clone(),
                expires_at: Instant::now() + Duration::from_secs(token.expires_in as u64),
            });
            return Ok(token.access_token);
        }

        Ok(self.inner.lock().await.token.as_ref().expect("checked above").access_token.clone())
    }

    #[instrument(skip(self))]
    async fn drive_health_check(&self) {
        let probes_passed = self.run_health_probes().await;

        if probes_passed {
            self.inner.lock().await.consecutive_probe_failures = 0;
            let _ = self.move_to(WorkerEvent::ProbesPassed).await;
            return;
        }

        let time_in_state = self.inner.lock().await.entered_state_at.elapsed();
        if time_in_state > Duration::from_secs(3 * 60) {
            let _ = self.move_to(WorkerEvent::HealthCheckTimedOut).await;
            return;
        }

        let mut inner = self.inner.lock().await;
        inner.consecutive_probe_failures += 1;
        let failures = inner.consecutive_probe_failures;
        drop(inner);

        if failures >= 3 {
            warn!("⚠️ [HEALTH_CHECK]: Three consecutive probe failures, retreating to registering.");
            self.inner.lock().await.consecutive_probe_failures = 0;
            let _ = self.move_to(WorkerEvent::ProbesFailedRepeatedly).await;
        } else {
            sleep(Duration::from_secs(2)).await;
        }
    }

    /// Registration visibility, coordinator health, and metrics shape —
    /// all three must pass before the worker is allowed to claim work.
    async fn run_health_probes(&self) -> bool {
        let bot_id = match self.inner.lock().await.bot_id {
            Some(id) => id,
            None => return false,
        };

        let registration_visible = self.client.is_registration_visible(bot_id).await.unwrap_or(false);
        let coordinator_healthy = self.client.check_coordinator_health().await.unwrap_or(false);
        let metrics_shaped = self.client.check_coordinator_metrics().await.unwrap_or(false);

        if !(registration_visible && coordinator_healthy && metrics_shaped) {
            debug!(
                "💤 [HEALTH_PROBE]: registration_visible=[{}] coordinator_healthy=[{}] metrics_shaped=[{}]",
                registration_visible, coordinator_healthy, metrics_shaped
            );
        }

        registration_visible && coordinator_healthy && metrics_shaped
    }

    #[instrument(skip(self))]
    async fn drive_job_cycle(&self) {
        let bot_id = match self.inner.lock().await.bot_id {
            Some(id) => id,
            None => {
                let _ = self.move_to(WorkerEvent::BreakerReprobeFailed).await;
                return;
            }
        };

        let can_claim = self.inner.lock().await.breakers.claim.can_execute();
        if !can_claim {
            sleep(Duration::from_secs(1)).await;
            return;
        }

        match self.client.claim(bot_id, None).await {
            Ok(job) => {
                self.inner.lock().await.breakers.claim.record_success();
                self.metrics.record_claim();
                let _ = self.move_to(WorkerEvent::JobClaimed).await;
                self.execute_claimed_job(bot_id, job).await;
                let _ = self.move_to(WorkerEvent::JobTerminated).await;
            }
            Err(ClientError::NoJobAvailable) => {
                self.inner.lock().await.breakers.claim.record_success();
                sleep(Duration::from_secs(2)).await;
            }
            Err(fault) => {
                warn!("⚠️ [CLAIM_FAULT]: {}", fault);
                self.inner.lock().await.breakers.claim.record_failure();
                sleep(Duration::from_secs(2)).await;
            }
        }
    }

    async fn execute_claimed_job(&self, bot_id: Uuid, job: ClaimedJob) {
        info!("🎯 [JOB_CLAIMED]: id=[{}] operation=[{}]", job.id, job.operation);
        self.inner.lock().await.current_job = Some(job.id);

        if let Err(fault) = self.client.start(bot_id, job.id).await {
            warn!("⚠️ [JOB_START_FAULT]: {}", fault);
        }

        let started_at = Instant::now();
        sleep(Duration::from_millis(self.config.simulated_processing_ms)).await;

        let should_simulate_failure = self.config.simulated_failure_rate > 0.0
            && rand::thread_rng().gen_bool(self.config.simulated_failure_rate.min(1.0));

        let outcome = if should_simulate_failure {
            Err("simulated processing fault".to_string())
        } else {
            execute_operation(&job.operation, job.operand_a, job.operand_b).map_err(|fault| fault.to_string())
        };

        let duration_ms = started_at.elapsed().as_millis() as u64;
        let report_result = match outcome {
            Ok(value) => {
                let result = self.client.complete(bot_id, job.id, value, duration_ms).await;
                if result.is_ok() {
                    self.metrics.record_success();
                }
                result
            }
            Err(error_message) => {
                let result = self.client.fail(bot_id, job.id, &error_message, duration_ms).await;
                if result.is_ok() {
                    self.metrics.record_failure();
                }
                result
            }
        };

        let mut inner = self.inner.lock().await;
        inner.current_job = None;
        match report_result {
            Ok(()) => inner.breakers.report.record_success(),
            Err(fault) => {
                error!("❌ [JOB_REPORT_FAULT]: id=[{}]: {}", job.id, fault);
                inner.breakers.report.record_failure();
            }
        }
    }

    #[instrument(skip(self))]
    async fn drive_error_recovery(&self) {
        let attempts = self.inner.lock().await.startup_attempts;
        if attempts >= self.config.startup_max_attempts {
            let _ = self.move_to(WorkerEvent::StartupAttemptsExhausted).await;
            return;
        }
        sleep(delay_for_attempt(&self.config.backoff, attempts)).await;
        let _ = self.move_to(WorkerEvent::BackoffElapsed).await;
    }

    /// Periodic liveness ping while the worker is `ready` or `processing`.
    /// Five consecutive failures trigger a synchronous reprobe; failing
    /// that, the runtime escalates to `error`.
    fn spawn_heartbeat_task(&self) -> tokio::task::JoinHandle<()> {
        let inner = Arc::clone(&self.inner);
        let client = Arc::clone(&self.client);
        let running = Arc::clone(&self.running);

        tokio::spawn(async move {
            loop {
                if !running.load(Ordering::SeqCst) {
                    return;
                }

                let (bot_id, period, can_call) = {
                    let mut guard = inner.lock().await;
                    let bot_id = guard.bot_id;
                    let period = guard.heartbeat_interval;
                    let can_call = guard.breakers.heartbeat.can_execute();
                    (bot_id, period, can_call)
                };

                sleep(period).await;

                let Some(bot_id) = bot_id else { continue };
                if !can_call {
                    continue;
                }

                match client.heartbeat(bot_id).await {
                    Ok(()) => {
                        let mut guard = inner.lock().await;
                        guard.breakers.heartbeat.record_success();
                        guard.consecutive_heartbeat_failures = 0;
                    }
                    Err(fault) => {
                        let mut guard = inner.lock().await;
                        guard.breakers.heartbeat.record_failure();
                        guard.consecutive_heartbeat_failures += 1;
                        warn!("⚠️ [HEARTBEAT_FAULT]: consecutive=[{}]: {}", guard.consecutive_heartbeat_failures, fault);

                        if guard.consecutive_heartbeat_failures >= 5 {
                            drop(guard);
                            if client.heartbeat(bot_id).await.is_err() {
                                error!("💀 [HEARTBEAT_REPROBE_FAILED]: transitioning worker to error.");
                                let mut guard = inner.lock().await;
                                if let Ok(next) = transition(guard.state, WorkerEvent::BreakerReprobeFailed) {
                                    guard.state = next;
                                    guard.entered_state_at = Instant::now();
                                }
                            }
                        }
                    }
                }
            }
        })
    }

    /// Forces a transition to `error` if the runtime overstays a
    /// time-bounded phase — catches a wedged registration or health check.
    fn spawn_watchdog_task(&self) -> tokio::task::JoinHandle<()> {
        let inner = Arc::clone(&self.inner);
        let running = Arc::clone(&self.running);

        tokio::spawn(async move {
            loop {
                sleep(Duration::from_secs(5)).await;
                if !running.load(Ordering::SeqCst) {
                    return;
                }

                let mut guard = inner.lock().await;
                let overstay_event = match guard.state {
                    WorkerState::Registering if guard.entered_state_at.elapsed() > Duration::from_secs(5 * 60) => {
                        Some(WorkerEvent::RegistrationRetriesExhausted)
                    }
                    WorkerState::HealthCheck if guard.entered_state_at.elapsed() > Duration::from_secs(3 * 60) => {
                        Some(WorkerEvent::HealthCheckTimedOut)
                    }
                    _ => None,
                };

                if let Some(event) = overstay_event {
                    warn!("⏱️ [WATCHDOG]: {:?} overstayed its phase budget, forcing error.", guard.state);
                    if let Ok(next) = transition(guard.state, event) {
                        guard.state = next;
                        guard.entered_state_at = Instant::now();
                    }
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn breaker_set_starts_all_closed() {
        let set = BreakerSet::new(BreakerConfig::default());
        assert_eq!(set.register.state(), crate::breaker::BreakerState::Closed);
        assert_eq!(set.heartbeat.state(), crate::breaker::BreakerState::Closed);
        assert_eq!(set.claim.state(), crate::breaker::BreakerState::Closed);
        assert_eq!(set.report.state(), crate::breaker::BreakerState::Closed);
    }
}
