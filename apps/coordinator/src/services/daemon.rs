// [apps/coordinator/src/services/daemon.rs]
/*!
 * =================================================================
 * APARATO: RECOVERY DAEMON SCHEDULER (V1.0)
 * CLASIFICACIÓN: APPLICATION SERVICES (ESTRATO L4)
 * RESPONSABILIDAD: EJECUCIÓN PERIÓDICA DE LOS LAZOS DE RECUPERACIÓN (C4)
 *
 * Cada lazo es un `tokio::time::interval` independiente, igual que el
 * guardián de identidad del host: `MissedTickBehavior::Skip` evita que
 * un ciclo lento acumule trabajo atrasado en lugar de repetirlo en
 * ráfaga.
 * =================================================================
 */

use crate::services::recovery;
use crate::state::AppState;
use std::time::Duration;
use tokio::time::MissedTickBehavior;
use tracing::error;

const RECOVERY_LOOP_PERIOD: Duration = Duration::from_secs(60);

/// Spawns L1-L4, auto-populate and bot-retention-cleanup as independent
/// background tasks. Returns their join handles so the caller can hold
/// them for the lifetime of the process (none of them are expected to
/// return on their own).
pub fn spawn_recovery_daemons(state: AppState) -> Vec<tokio::task::JoinHandle<()>> {
    vec![
        spawn_loop("L1_ORPHANED_CLAIM", RECOVERY_LOOP_PERIOD, state.clone(), |state| async move {
            let jobs = state.jobs()?;
            let summary = recovery::run_orphan_recovery(&jobs).await?;
            recovery::log_cycle("L1_ORPHANED_CLAIM", &summary);
            Ok(())
        }),
        spawn_loop("L2_STUCK_CLAIM", RECOVERY_LOOP_PERIOD, state.clone(), |state| async move {
            let jobs = state.jobs()?;
            let workers = state.workers()?;
            let summary = recovery::run_stuck_claim_recovery(&jobs, &workers, state.config.claimed_job_timeout).await?;
            recovery::log_cycle("L2_STUCK_CLAIM", &summary);
            Ok(())
        }),
        spawn_loop("L3_STUCK_PROCESSING", RECOVERY_LOOP_PERIOD, state.clone(), |state| async move {
            let jobs = state.jobs()?;
            let workers = state.workers()?;
            let summary = recovery::run_stuck_processing_recovery(&jobs, &workers, state.config.processing_job_timeout).await?;
            recovery::log_cycle("L3_STUCK_PROCESSING", &summary);
            Ok(())
        }),
        spawn_loop("L4_BOT_HEALTH_ANNOTATION", RECOVERY_LOOP_PERIOD, state.clone(), |state| async move {
            let jobs = state.jobs()?;
            let workers = state.workers()?;
            let summary = recovery::run_bot_health_annotation(&jobs, &workers, state.config.processing_job_timeout).await?;
            recovery::log_cycle("L4_BOT_HEALTH_ANNOTATION", &summary);
            Ok(())
        }),
        spawn_loop("AUTO_POPULATE", Duration::from_millis(state.config.populate_interval_ms), state.clone(), |state| async move {
            let jobs = state.jobs()?;
            recovery::run_auto_populate(&jobs, state.config.populate_batch_size).await?;
            Ok(())
        }),
        spawn_loop("BOT_RETENTION_CLEANUP", Duration::from_secs(state.config.cleanup_interval_hours * 3600), state.clone(), |state| async move {
            let jobs = state.jobs()?;
            let workers = state.workers()?;
            let summary = recovery::run_bot_retention_cleanup(&jobs, &workers, state.config.bot_retention_days, state.config.cleanup_dry_run).await?;
            tracing::info!(eligible = summary.eligible, deleted = summary.deleted, dry_run = summary.dry_run, "🗑️  [BOT_RETENTION_CLEANUP]: cycle complete.");
            Ok(())
        }),
    ]
}

fn spawn_loop<F, Fut>(name: &'static str, period: Duration, state: AppState, run_cycle: F) -> tokio::task::JoinHandle<()>
where
    F: Fn(AppState) -> Fut + Send + 'static,
    Fut: std::future::Future<Output = Result<(), fleet_infra_db::DbError>> + Send + 'static,
{
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(period.max(Duration::from_millis(1)));
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        loop {
            ticker.tick().await;
            if let Err(fault) = run_cycle(state.clone()).await {
                error!("💀 [{}_FAULT]: {}", name, fault);
            }
        }
    })
}
