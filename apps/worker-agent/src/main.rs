// [apps/worker-agent/src/main.rs]
/*!
 * =================================================================
 * APARATO: WORKER AGENT SHELL (V1.0)
 * CLASIFICACIÓN: APPLICATION LAYER (ENTRY POINT)
 * RESPONSABILIDAD: BOOTSTRAP DE DIRECTIVAS E IGNICIÓN DEL RUNTIME
 *
 * Switchboard puro de configuración y señales: delega la totalidad del
 * ciclo de vida cooperativo a `WorkerRuntime`.
 * =================================================================
 */

use clap::Parser;
use fleet_infra_coordinator_client::CoordinatorClient;
use fleet_shared_observability::init_tracing;
use fleet_worker_agent::prelude::*;
use std::time::Duration;
use tracing::{info, warn};

/// Runtime knobs for the worker agent. Every field is settable via CLI
/// flag or environment variable, mirroring the host's own worker shell.
#[derive(Parser, Debug)]
#[command(author, version, about = "Distributed job-fleet worker agent")]
struct WorkerDirectives {
    /// Base URL of the coordinator's HTTP surface.
    #[arg(long, env = "COORDINATOR_URL")]
    coordinator_url: String,

    /// This worker's provisioned bot_key (§4.2.1).
    #[arg(long, env = "WORKER_BOT_KEY")]
    bot_key: String,

    /// Bootstrap secret paired with bot_key for token issuance.
    #[arg(long, env = "WORKER_BOOTSTRAP_SECRET")]
    bootstrap_secret: String,

    /// Stable identifier for this process instance, distinct from bot_key.
    #[arg(long, env = "WORKER_INSTANCE_ID", default_value = "worker-instance-01")]
    instance_id: String,

    /// Maximum number of jobs this worker claims concurrently (advisory,
    /// reported at registration; the runtime itself processes one at a time).
    #[arg(long, env = "WORKER_MAX_CONCURRENCY", default_value_t = 1)]
    max_concurrency: u32,

    /// Simulated per-job processing duration in milliseconds.
    #[arg(long, env = "WORKER_SIMULATED_PROCESSING_MS", default_value_t = 250)]
    simulated_processing_ms: u64,

    /// Probability in [0, 1] that a claimed job is reported as failed
    /// regardless of the underlying operation's outcome.
    #[arg(long, env = "WORKER_SIMULATED_FAILURE_RATE", default_value_t = 0.0)]
    simulated_failure_rate: f64,

    /// Hard cap on total startup attempts before the worker gives up.
    #[arg(long, env = "WORKER_STARTUP_MAX_ATTEMPTS", default_value_t = 20)]
    startup_max_attempts: u32,

    /// Seconds of clock skew subtracted from a token's expiry before the
    /// runtime proactively refreshes it.
    #[arg(long, env = "WORKER_AUTH_REFRESH_SKEW_SECS", default_value_t = 60)]
    auth_refresh_skew_secs: u64,

    /// Backoff base delay in seconds for phase retries.
    #[arg(long, env = "WORKER_BACKOFF_BASE_SECS", default_value_t = 1)]
    backoff_base_secs: u64,

    /// Backoff exponential multiplier.
    #[arg(long, env = "WORKER_BACKOFF_EXPO", default_value_t = 2.0)]
    backoff_expo: f64,

    /// Backoff ceiling in seconds.
    #[arg(long, env = "WORKER_BACKOFF_MAX_SECS", default_value_t = 60)]
    backoff_max_secs: u64,

    /// Circuit breaker: consecutive failures before a breaker opens.
    #[arg(long, env = "WORKER_BREAKER_FAILURE_THRESHOLD", default_value_t = 5)]
    breaker_failure_threshold: u32,

    /// Circuit breaker: seconds an open breaker waits before a trial call.
    #[arg(long, env = "WORKER_BREAKER_RECOVERY_TIMEOUT_SECS", default_value_t = 30)]
    breaker_recovery_timeout_secs: u64,

    /// Circuit breaker: probe calls permitted while half-open.
    #[arg(long, env = "WORKER_BREAKER_HALF_OPEN_MAX_CALLS", default_value_t = 3)]
    breaker_half_open_max_calls: u32,
}

impl From<WorkerDirectives> for WorkerConfig {
    fn from(directives: WorkerDirectives) -> Self {
        WorkerConfig {
            coordinator_url: directives.coordinator_url,
            bot_key: directives.bot_key,
            bootstrap_secret: directives.bootstrap_secret,
            instance_id: directives.instance_id,
            max_concurrency: directives.max_concurrency,
            simulated_processing_ms: directives.simulated_processing_ms,
            simulated_failure_rate: directives.simulated_failure_rate,
            startup_max_attempts: directives.startup_max_attempts,
            auth_refresh_skew: Duration::from_secs(directives.auth_refresh_skew_secs),
            backoff: fleet_worker_agent::backoff::BackoffConfig {
                base: Duration::from_secs(directives.backoff_base_secs),
                expo: directives.backoff_expo,
                max: Duration::from_secs(directives.backoff_max_secs),
            },
            breaker: fleet_worker_agent::breaker::BreakerConfig {
                failure_threshold: directives.breaker_failure_threshold,
                recovery_timeout: Duration::from_secs(directives.breaker_recovery_timeout_secs),
                half_open_max_calls: directives.breaker_half_open_max_calls,
            },
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing("fleet_worker_agent");
    info!("💠 [SHELL]: Worker agent ignition sequence starting...");

    let directives = WorkerDirectives::parse();
    let coordinator_url = directives.coordinator_url.clone();
    let config: WorkerConfig = directives.into();

    let client = CoordinatorClient::new(coordinator_url);
    let runtime = std::sync::Arc::new(WorkerRuntime::new(config, client));

    let shutdown_runtime = std::sync::Arc::clone(&runtime);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("⚠️ [SIGNAL]: Termination requested by host. Sealing current job...");
            shutdown_runtime.request_shutdown();
        }
    });

    info!("🚀 [SHELL]: Handing control to WorkerRuntime. Transitioning to OPERATIONAL.");
    runtime.run().await;

    info!("🏁 [SHELL]: Shutdown sequence concluded. Worker agent offline.");
    Ok(())
}
