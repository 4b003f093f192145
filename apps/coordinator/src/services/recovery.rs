// [apps/coordinator/src/services/recovery.rs]
/*!
 * =================================================================
 * APARATO: RECOVERY OPERATIONS (V1.0)
 * CLASIFICACIÓN: APPLICATION SERVICES (ESTRATO L4)
 * RESPONSABILIDAD: L1-L4 Y TAREAS DE MANTENIMIENTO PERIÓDICO (§4.4)
 *
 * Funciones puras sobre los repositorios, compartidas por el daemon
 * periódico (`services::daemon`) y el disparador manual del operador
 * (`handlers::admin`) — un ciclo es un ciclo, se invoque por reloj o
 * por petición HTTP.
 * =================================================================
 */

use chrono::{Duration as ChronoDuration, Utc};
use fleet_domain_models::HealthStatus;
use fleet_infra_db::{DbError, JobRepository, WorkerRepository};
use serde::Serialize;
use std::time::Duration;
use tracing::{info, warn};
use uuid::Uuid;

/// A worker absent from the claim for this long is presumed crashed
/// rather than merely slow (§4.4, L1).
const ORPHAN_HEARTBEAT_GRACE_SECS: i64 = 300;

#[derive(Debug, Default, Serialize)]
pub struct CycleSummary {
    pub candidates: usize,
    pub repaired: usize,
    pub skipped: usize,
}

fn std_to_chrono(duration: Duration) -> ChronoDuration {
    ChronoDuration::from_std(duration).expect("positive duration")
}

/// L1 — orphaned-claim recovery: the claiming worker has gone quiet.
pub async fn run_orphan_recovery(jobs: &JobRepository) -> Result<CycleSummary, DbError> {
    let cutoff = Utc::now() - ChronoDuration::seconds(ORPHAN_HEARTBEAT_GRACE_SECS);
    let candidates = jobs.find_orphaned_claimed_jobs(cutoff).await?;
    let mut summary = CycleSummary { candidates: candidates.len(), ..Default::default() };

    for job in &candidates {
        if jobs.release_job(job.id, "auto-cleanup: orphaned claim").await? {
            summary.repaired += 1;
        } else {
            summary.skipped += 1;
        }
    }
    Ok(summary)
}

/// L2 — stuck-claim recovery: claimed too long regardless of liveness.
pub async fn run_stuck_claim_recovery(jobs: &JobRepository, workers: &WorkerRepository, claimed_job_timeout: Duration) -> Result<CycleSummary, DbError> {
    let cutoff = Utc::now() - std_to_chrono(claimed_job_timeout);
    let candidates = jobs.find_stuck_claimed_jobs(cutoff).await?;
    let mut summary = CycleSummary { candidates: candidates.len(), ..Default::default() };

    for job in &candidates {
        if jobs.release_job(job.id, "auto-cleanup: stuck claim").await? {
            summary.repaired += 1;
            if let Some(worker_id) = job.claimed_by {
                workers.clear_current_job(worker_id).await?;
            }
        } else {
            summary.skipped += 1;
        }
    }
    Ok(summary)
}

/// L3 — stuck-processing recovery: the worker is still heartbeating (a
/// "zombie") but its job never reported a terminal state.
pub async fn run_stuck_processing_recovery(jobs: &JobRepository, workers: &WorkerRepository, processing_job_timeout: Duration) -> Result<CycleSummary, DbError> {
    let now = Utc::now();
    let cutoff = now - std_to_chrono(processing_job_timeout);
    let candidates = jobs.find_stuck_processing_jobs(cutoff).await?;
    let mut summary = CycleSummary { candidates: candidates.len(), ..Default::default() };

    for job in &candidates {
        let Some(worker_id) = job.claimed_by else {
            summary.skipped += 1;
            continue;
        };
        let worker_is_live = match workers.get_worker(worker_id).await {
            Ok(worker) => worker.is_live(now),
            Err(DbError::WorkerNotFound) => false,
            Err(other) => return Err(other),
        };
        if !worker_is_live {
            // Defer to L1/L2: a dead worker's job is an orphaned/stuck claim, not a zombie.
            summary.skipped += 1;
            continue;
        }
        if jobs.fail_stuck_processing_job(job.id, "Processing timeout exceeded").await? {
            workers.clear_current_job(worker_id).await?;
            workers.mark_health_status(worker_id, HealthStatus::PotentiallyStuck).await?;
            summary.repaired += 1;
        } else {
            summary.skipped += 1;
        }
    }
    Ok(summary)
}

/// L4 — bot-health annotation: mark or clear `potentially_stuck` without
/// touching job state; paired with L3's terminal action.
pub async fn run_bot_health_annotation(jobs: &JobRepository, workers: &WorkerRepository, processing_job_timeout: Duration) -> Result<CycleSummary, DbError> {
    let now = Utc::now();
    let timeout = std_to_chrono(processing_job_timeout);
    let all_workers = workers.list_workers().await?;
    let mut summary = CycleSummary { candidates: all_workers.len(), ..Default::default() };

    for worker in &all_workers {
        let Some(job_id) = worker.current_job_id else {
            if worker.health_status == HealthStatus::PotentiallyStuck {
                workers.mark_health_status(worker.id, HealthStatus::Normal).await?;
                summary.repaired += 1;
            }
            continue;
        };

        let job = match jobs.get_job(job_id).await {
            Ok(job) => job,
            Err(DbError::JobNotFound) => continue,
            Err(other) => return Err(other),
        };

        let is_stuck_candidate = matches!(job.status, fleet_domain_models::JobStatus::Processing)
            && job.started_at.map(|started| now - started > timeout).unwrap_or(false)
            && worker.is_live(now);

        match (is_stuck_candidate, worker.health_status) {
            (true, HealthStatus::Normal) => {
                workers.mark_health_status(worker.id, HealthStatus::PotentiallyStuck).await?;
                summary.repaired += 1;
            }
            (false, HealthStatus::PotentiallyStuck) => {
                workers.mark_health_status(worker.id, HealthStatus::Normal).await?;
                summary.repaired += 1;
            }
            _ => {}
        }
    }
    Ok(summary)
}

#[derive(Debug, Default, Serialize)]
pub struct CleanupSummary {
    pub eligible: usize,
    pub deleted: usize,
    pub dry_run: bool,
}

/// Bot retention cleanup: soft-deletes workers that have been dead (not
/// live) for longer than `bot_retention_days`. Distinct from L1-L4 — it
/// prunes registrations rather than repairing job state, though it
/// releases any job a deleted worker still holds.
pub async fn run_bot_retention_cleanup(jobs: &JobRepository, workers: &WorkerRepository, bot_retention_days: i64, dry_run: bool) -> Result<CleanupSummary, DbError> {
    let now = Utc::now();
    let cutoff = now - ChronoDuration::days(bot_retention_days);

    let candidates: Vec<_> = workers
        .find_live_workers_without_recent_heartbeat(cutoff)
        .await?
        .into_iter()
        .filter(|w| !w.is_live(now))
        .collect();

    let mut summary = CleanupSummary { eligible: candidates.len(), dry_run, ..Default::default() };

    for worker in &candidates {
        if dry_run {
            warn!("🧪 [CLEANUP_DRY_RUN]: would soft-delete bot=[{}] (last heartbeat {})", worker.id, worker.last_heartbeat_at);
            continue;
        }
        if let Some(job_id) = worker.current_job_id {
            jobs.release_job(job_id, "auto-cleanup: retention soft-delete").await?;
        }
        workers.soft_delete(worker.id, now).await?;
        summary.deleted += 1;
    }
    Ok(summary)
}

/// Liveness harness: periodically seeds synthetic jobs so the pipeline
/// never runs dry in a quiet deployment (§4.4, not application logic).
pub async fn run_auto_populate(jobs: &JobRepository, batch_size: u32) -> Result<usize, DbError> {
    let operations = fleet_domain_models::known_operations();
    if operations.is_empty() {
        return Ok(0);
    }

    let mut created = 0;
    for i in 0..batch_size {
        let operation = operations[i as usize % operations.len()];
        let seed = Uuid::new_v4().as_u128() as i64;
        jobs.create_job(seed % 1_000, (seed / 1_000) % 1_000, operation).await?;
        created += 1;
    }
    info!("🌱 [AUTO_POPULATE]: seeded {} synthetic jobs.", created);
    Ok(created)
}

pub fn log_cycle(loop_name: &str, summary: &CycleSummary) {
    info!(
        candidates = summary.candidates,
        repaired = summary.repaired,
        skipped = summary.skipped,
        "🩺 [{}]: cycle complete.",
        loop_name
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use fleet_domain_models::JobStatus;
    use fleet_infra_db::TursoClient;

    async fn memory_client() -> TursoClient {
        TursoClient::connect("file::memory:?cache=shared", None).await.unwrap()
    }

    #[tokio::test]
    async fn orphan_recovery_ignores_a_worker_with_a_recent_heartbeat() {
        let client = memory_client().await;
        let jobs = JobRepository::new(client.get_connection().unwrap());
        let workers = WorkerRepository::new(client.get_connection().unwrap());

        let worker = workers.register("bot-orphan-live", None).await.unwrap();
        jobs.create_job(1, 2, "sum").await.unwrap();
        jobs.claim_job(worker.id, None).await.unwrap();

        let summary = run_orphan_recovery(&jobs).await.unwrap();
        assert_eq!(summary.candidates, 0);
        assert_eq!(summary.repaired, 0);
    }

    #[tokio::test]
    async fn orphan_recovery_releases_a_claim_held_by_a_silent_worker() {
        let client = memory_client().await;
        let jobs = JobRepository::new(client.get_connection().unwrap());
        let workers = WorkerRepository::new(client.get_connection().unwrap());

        let worker = workers.register("bot-orphan-dead", None).await.unwrap();
        let job = jobs.create_job(1, 2, "sum").await.unwrap();
        jobs.claim_job(worker.id, None).await.unwrap();
        workers.update_heartbeat(worker.id, Utc::now() - ChronoDuration::seconds(ORPHAN_HEARTBEAT_GRACE_SECS + 60)).await.unwrap();

        let summary = run_orphan_recovery(&jobs).await.unwrap();
        assert_eq!(summary.candidates, 1);
        assert_eq!(summary.repaired, 1);

        let reloaded = jobs.get_job(job.id).await.unwrap();
        assert!(matches!(reloaded.status, JobStatus::Pending));
        assert_eq!(reloaded.attempts, 1);
    }

    #[tokio::test]
    async fn stuck_claim_recovery_releases_the_job_and_frees_the_worker() {
        let client = memory_client().await;
        let jobs = JobRepository::new(client.get_connection().unwrap());
        let workers = WorkerRepository::new(client.get_connection().unwrap());

        let worker = workers.register("bot-stuck-claim", None).await.unwrap();
        let job = jobs.create_job(4, 5, "sum").await.unwrap();
        jobs.claim_job(worker.id, None).await.unwrap();
        workers.assign_current_job(worker.id, job.id).await.unwrap();

        let summary = run_stuck_claim_recovery(&jobs, &workers, Duration::ZERO).await.unwrap();
        assert_eq!(summary.candidates, 1);
        assert_eq!(summary.repaired, 1);

        let reloaded_job = jobs.get_job(job.id).await.unwrap();
        assert!(matches!(reloaded_job.status, JobStatus::Pending));

        let reloaded_worker = workers.get_worker(worker.id).await.unwrap();
        assert!(reloaded_worker.current_job_id.is_none());
    }

    #[tokio::test]
    async fn stuck_processing_recovery_fails_the_job_when_the_worker_is_still_live() {
        let client = memory_client().await;
        let jobs = JobRepository::new(client.get_connection().unwrap());
        let workers = WorkerRepository::new(client.get_connection().unwrap());

        let worker = workers.register("bot-stuck-live", None).await.unwrap();
        let job = jobs.create_job(2, 2, "sum").await.unwrap();
        jobs.claim_job(worker.id, None).await.unwrap();
        jobs.start_job(job.id, worker.id).await.unwrap();
        workers.assign_current_job(worker.id, job.id).await.unwrap();

        let summary = run_stuck_processing_recovery(&jobs, &workers, Duration::ZERO).await.unwrap();
        assert_eq!(summary.repaired, 1);

        let reloaded_job = jobs.get_job(job.id).await.unwrap();
        assert!(matches!(reloaded_job.status, JobStatus::Failed));

        let reloaded_worker = workers.get_worker(worker.id).await.unwrap();
        assert!(reloaded_worker.current_job_id.is_none());
        assert_eq!(reloaded_worker.health_status, HealthStatus::PotentiallyStuck);
    }

    #[tokio::test]
    async fn stuck_processing_recovery_defers_to_l1_l2_when_the_worker_has_gone_quiet() {
        let client = memory_client().await;
        let jobs = JobRepository::new(client.get_connection().unwrap());
        let workers = WorkerRepository::new(client.get_connection().unwrap());

        let worker = workers.register("bot-stuck-quiet", None).await.unwrap();
        let job = jobs.create_job(2, 2, "sum").await.unwrap();
        jobs.claim_job(worker.id, None).await.unwrap();
        jobs.start_job(job.id, worker.id).await.unwrap();
        workers.update_heartbeat(worker.id, Utc::now() - ChronoDuration::seconds(200)).await.unwrap();

        let summary = run_stuck_processing_recovery(&jobs, &workers, Duration::ZERO).await.unwrap();
        assert_eq!(summary.repaired, 0);
        assert_eq!(summary.skipped, 1);

        let reloaded_job = jobs.get_job(job.id).await.unwrap();
        assert!(matches!(reloaded_job.status, JobStatus::Processing));
    }

    #[tokio::test]
    async fn bot_health_annotation_marks_and_then_clears_a_stuck_worker() {
        let client = memory_client().await;
        let jobs = JobRepository::new(client.get_connection().unwrap());
        let workers = WorkerRepository::new(client.get_connection().unwrap());

        let worker = workers.register("bot-health-annotate", None).await.unwrap();
        let job = jobs.create_job(3, 3, "sum").await.unwrap();
        jobs.claim_job(worker.id, None).await.unwrap();
        jobs.start_job(job.id, worker.id).await.unwrap();
        workers.assign_current_job(worker.id, job.id).await.unwrap();

        let marked = run_bot_health_annotation(&jobs, &workers, Duration::ZERO).await.unwrap();
        assert_eq!(marked.repaired, 1);
        let marked_worker = workers.get_worker(worker.id).await.unwrap();
        assert_eq!(marked_worker.health_status, HealthStatus::PotentiallyStuck);

        workers.clear_current_job(worker.id).await.unwrap();
        let cleared = run_bot_health_annotation(&jobs, &workers, Duration::ZERO).await.unwrap();
        assert_eq!(cleared.repaired, 1);
        let cleared_worker = workers.get_worker(worker.id).await.unwrap();
        assert_eq!(cleared_worker.health_status, HealthStatus::Normal);
    }

    #[tokio::test]
    async fn bot_retention_cleanup_dry_run_reports_without_deleting() {
        let client = memory_client().await;
        let jobs = JobRepository::new(client.get_connection().unwrap());
        let workers = WorkerRepository::new(client.get_connection().unwrap());

        let worker = workers.register("bot-retention-dry", None).await.unwrap();
        workers.update_heartbeat(worker.id, Utc::now() - ChronoDuration::days(10)).await.unwrap();

        let summary = run_bot_retention_cleanup(&jobs, &workers, 7, true).await.unwrap();
        assert_eq!(summary.eligible, 1);
        assert_eq!(summary.deleted, 0);
        assert!(summary.dry_run);

        let reloaded = workers.get_worker(worker.id).await.unwrap();
        assert!(reloaded.deleted_at.is_none());
    }

    #[tokio::test]
    async fn bot_retention_cleanup_soft_deletes_and_releases_the_held_job() {
        let client = memory_client().await;
        let jobs = JobRepository::new(client.get_connection().unwrap());
        let workers = WorkerRepository::new(client.get_connection().unwrap());

        let worker = workers.register("bot-retention-live", None).await.unwrap();
        let job = jobs.create_job(1, 1, "sum").await.unwrap();
        jobs.claim_job(worker.id, None).await.unwrap();
        workers.assign_current_job(worker.id, job.id).await.unwrap();
        workers.update_heartbeat(worker.id, Utc::now() - ChronoDuration::days(10)).await.unwrap();

        let summary = run_bot_retention_cleanup(&jobs, &workers, 7, false).await.unwrap();
        assert_eq!(summary.deleted, 1);

        let reloaded_worker = workers.get_worker(worker.id).await.unwrap();
        assert!(reloaded_worker.deleted_at.is_some());

        let reloaded_job = jobs.get_job(job.id).await.unwrap();
        assert!(matches!(reloaded_job.status, JobStatus::Pending));
    }

    #[tokio::test]
    async fn auto_populate_seeds_the_requested_batch_with_known_operations() {
        let client = memory_client().await;
        let jobs = JobRepository::new(client.get_connection().unwrap());

        let created = run_auto_populate(&jobs, 3).await.unwrap();
        assert_eq!(created, 3);

        let pending = jobs.list_jobs(Some(JobStatus::Pending), 10).await.unwrap();
        assert_eq!(pending.len(), 3);
        for job in &pending {
            assert!(fleet_domain_models::is_known_operation(&job.operation));
        }
    }
}
