// [apps/coordinator/src/handlers/admin.rs]
/*!
 * =================================================================
 * APARATO: ADMINISTRATIVE HANDLER (V1.0)
 * CLASIFICACIÓN: API ADAPTER LAYER (ESTRATO L3)
 * RESPONSABILIDAD: MANTENIMIENTO MANUAL Y LECTURAS DE DIAGNÓSTICO
 *
 * Cada operación aquí es el contrapunto manual de un lazo de
 * recuperación de C4 (§4.3.6): un operador puede inspeccionar o forzar
 * lo que los daemons periódicos harían de todos modos, reutilizando las
 * mismas funciones de `services::recovery`.
 * =================================================================
 */

use crate::errors::CoordinatorError;
use crate::services::recovery::{self, CleanupSummary, CycleSummary};
use crate::state::AppState;
use axum::extract::State;
use axum::Json;
use chrono::Utc;
use fleet_domain_models::{HealthStatus, Job, Worker};
use serde::Serialize;
use tracing::instrument;

const DIAGNOSTIC_PAGE_SIZE: usize = 50;

#[derive(Serialize)]
pub struct StuckJobsSummary {
    processing_over_timeout: Vec<Job>,
    claimed_over_timeout: Vec<Job>,
    potentially_stuck_workers: Vec<Worker>,
}

#[instrument(skip(state))]
pub async fn query(State(state): State<AppState>) -> Result<Json<StuckJobsSummary>, CoordinatorError> {
    let now = Utc::now();
    let jobs = state.jobs()?;
    let workers = state.workers()?;

    let processing_cutoff = now - chrono::Duration::from_std(state.config.processing_job_timeout).expect("positive duration");
    let claimed_cutoff = now - chrono::Duration::from_std(state.config.claimed_job_timeout).expect("positive duration");

    let mut processing_over_timeout = jobs.find_stuck_processing_jobs(processing_cutoff).await?;
    processing_over_timeout.truncate(DIAGNOSTIC_PAGE_SIZE);

    let mut claimed_over_timeout = jobs.find_stuck_claimed_jobs(claimed_cutoff).await?;
    claimed_over_timeout.truncate(DIAGNOSTIC_PAGE_SIZE);

    let mut potentially_stuck_workers: Vec<Worker> = workers
        .list_workers()
        .await?
        .into_iter()
        .filter(|w| w.health_status == HealthStatus::PotentiallyStuck)
        .collect();
    potentially_stuck_workers.truncate(DIAGNOSTIC_PAGE_SIZE);

    Ok(Json(StuckJobsSummary { processing_over_timeout, claimed_over_timeout, potentially_stuck_workers }))
}

#[derive(Serialize)]
pub struct RecoverySummary {
    orphaned: CycleSummary,
    stuck_claims: CycleSummary,
    stuck_processing: CycleSummary,
}

/// Manual trigger for one L1+L2+L3 cycle, outside the periodic schedule
/// (§4.4) — an operator's equivalent of waiting for the next tick.
#[instrument(skip(state))]
pub async fn recover_jobs(State(state): State<AppState>) -> Result<Json<RecoverySummary>, CoordinatorError> {
    let jobs = state.jobs()?;
    let workers = state.workers()?;

    let orphaned = recovery::run_orphan_recovery(&jobs).await?;
    let stuck_claims = recovery::run_stuck_claim_recovery(&jobs, &workers, state.config.claimed_job_timeout).await?;
    let stuck_processing = recovery::run_stuck_processing_recovery(&jobs, &workers, state.config.processing_job_timeout).await?;

    recovery::log_cycle("MANUAL_L1_ORPHAN", &orphaned);
    recovery::log_cycle("MANUAL_L2_STUCK_CLAIM", &stuck_claims);
    recovery::log_cycle("MANUAL_L3_STUCK_PROCESSING", &stuck_processing);

    Ok(Json(RecoverySummary { orphaned, stuck_claims, stuck_processing }))
}

/// Manual trigger for the bot-retention-cleanup scheduled task (§4.4).
#[instrument(skip(state))]
pub async fn cleanup(State(state): State<AppState>) -> Result<Json<CleanupSummary>, CoordinatorError> {
    let jobs = state.jobs()?;
    let workers = state.workers()?;
    let summary = recovery::run_bot_retention_cleanup(&jobs, &workers, state.config.bot_retention_days, state.config.cleanup_dry_run).await?;
    Ok(Json(summary))
}
