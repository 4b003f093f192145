// [apps/worker-agent/src/metrics.rs]
/*!
 * =================================================================
 * APARATO: WORKER METRICS SNAPSHOT (V1.0 - ADDED)
 * CLASIFICACIÓN: WORKER DIAGNOSTIC LAYER (ESTRATO L1-WORKER)
 * RESPONSABILIDAD: CONTADORES EN MEMORIA PARA VISIBILIDAD OPERATIVA
 *
 * Plomería diagnóstica, no un contrato con el coordinador (§4.5.6):
 * conteos expuestos únicamente a través de líneas de log estructuradas
 * en cada transición de estado.
 * =================================================================
 */

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

#[derive(Debug, Default)]
pub struct WorkerMetrics {
    jobs_claimed: AtomicU64,
    jobs_succeeded: AtomicU64,
    jobs_failed: AtomicU64,
    started_at: Option<Instant>,
}

#[derive(Debug, Clone, Copy)]
pub struct MetricsSnapshot {
    pub jobs_claimed: u64,
    pub jobs_succeeded: u64,
    pub jobs_failed: u64,
    pub uptime_secs: u64,
}

impl WorkerMetrics {
    pub fn new() -> Self {
        Self { started_at: Some(Instant::now()), ..Default::default() }
    }

    pub fn record_claim(&self) {
        self.jobs_claimed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_success(&self) {
        self.jobs_succeeded.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_failure(&self) {
        self.jobs_failed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            jobs_claimed: self.jobs_claimed.load(Ordering::Relaxed),
            jobs_succeeded: self.jobs_succeeded.load(Ordering::Relaxed),
            jobs_failed: self.jobs_failed.load(Ordering::Relaxed),
            uptime_secs: self.started_at.map(|at| at.elapsed().as_secs()).unwrap_or(0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counters_accumulate_independently() {
        let metrics = WorkerMetrics::new();
        metrics.record_claim();
        metrics.record_claim();
        metrics.record_success();
        metrics.record_failure();

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.jobs_claimed, 2);
        assert_eq!(snapshot.jobs_succeeded, 1);
        assert_eq!(snapshot.jobs_failed, 1);
    }
}
