// [apps/worker-agent/src/breaker.rs]
/*!
 * =================================================================
 * APARATO: PER-ENDPOINT CIRCUIT BREAKER (V1.0)
 * CLASIFICACIÓN: WORKER RESILIENCE LAYER (ESTRATO L1-WORKER)
 * RESPONSABILIDAD: CONTENCIÓN LOCAL DE FALLOS DE RED REPETIDOS
 *
 * Cuatro instancias independientes (registro, latido, reclamo, reporte)
 * viven dentro del runtime del agente; cada una solo conoce su propio
 * historial de llamadas, nunca el de las demás.
 * =================================================================
 */

use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BreakerState {
    Closed,
    Open,
    HalfOpen,
}

#[derive(Debug, Clone, Copy)]
pub struct BreakerConfig {
    pub failure_threshold: u32,
    pub recovery_timeout: Duration,
    pub half_open_max_calls: u32,
}

impl Default for BreakerConfig {
    fn default() -> Self {
        Self {
            failure_threshold: 5,
            recovery_timeout: Duration::from_secs(30),
            half_open_max_calls: 3,
        }
    }
}

/// A local, single-process circuit breaker. Not shared across workers —
/// each agent forms its own opinion about a given remote call class.
pub struct CircuitBreaker {
    config: BreakerConfig,
    state: BreakerState,
    consecutive_failures: u32,
    opened_at: Option<Instant>,
    half_open_calls_issued: u32,
}

impl CircuitBreaker {
    pub fn new(config: BreakerConfig) -> Self {
        Self {
            config,
            state: BreakerState::Closed,
            consecutive_failures: 0,
            opened_at: None,
            half_open_calls_issued: 0,
        }
    }

    pub fn state(&self) -> BreakerState {
        self.state
    }

    /// Call before attempting the guarded operation. Mutates internal
    /// bookkeeping for the half-open probe budget.
    pub fn can_execute(&mut self) -> bool {
        match self.state {
            BreakerState::Closed => true,
            BreakerState::Open => {
                let elapsed = self.opened_at.map(|at| at.elapsed()).unwrap_or_default();
                if elapsed >= self.config.recovery_timeout {
                    self.state = BreakerState::HalfOpen;
                    self.half_open_calls_issued = 0;
                    self.can_execute()
                } else {
                    false
                }
            }
            BreakerState::HalfOpen => {
                if self.half_open_calls_issued < self.config.half_open_max_calls {
                    self.half_open_calls_issued += 1;
                    true
                } else {
                    false
                }
            }
        }
    }

    pub fn record_success(&mut self) {
        self.consecutive_failures = 0;
        self.state = BreakerState::Closed;
        self.opened_at = None;
        self.half_open_calls_issued = 0;
    }

    pub fn record_failure(&mut self) {
        match self.state {
            BreakerState::HalfOpen => self.trip(),
            BreakerState::Closed => {
                self.consecutive_failures += 1;
                if self.consecutive_failures >= self.config.failure_threshold {
                    self.trip();
                }
            }
            BreakerState::Open => {}
        }
    }

    fn trip(&mut self) {
        self.state = BreakerState::Open;
        self.opened_at = Some(Instant::now());
        self.half_open_calls_issued = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fast_config() -> BreakerConfig {
        BreakerConfig { failure_threshold: 3, recovery_timeout: Duration::from_millis(10), half_open_max_calls: 2 }
    }

    #[test]
    fn opens_after_threshold_consecutive_failures() {
        let mut breaker = CircuitBreaker::new(fast_config());
        for _ in 0..2 {
            assert!(breaker.can_execute());
            breaker.record_failure();
        }
        assert_eq!(breaker.state(), BreakerState::Closed);
        assert!(breaker.can_execute());
        breaker.record_failure();
        assert_eq!(breaker.state(), BreakerState::Open);
        assert!(!breaker.can_execute());
    }

    #[test]
    fn half_open_success_closes_breaker() {
        let mut breaker = CircuitBreaker::new(fast_config());
        for _ in 0..3 {
            breaker.record_failure();
        }
        std::thread::sleep(Duration::from_millis(15));
        assert!(breaker.can_execute());
        assert_eq!(breaker.state(), BreakerState::HalfOpen);
        breaker.record_success();
        assert_eq!(breaker.state(), BreakerState::Closed);
    }

    #[test]
    fn half_open_failure_reopens() {
        let mut breaker = CircuitBreaker::new(fast_config());
        for _ in 0..3 {
            breaker.record_failure();
        }
        std::thread::sleep(Duration::from_millis(15));
        assert!(breaker.can_execute());
        breaker.record_failure();
        assert_eq!(breaker.state(), BreakerState::Open);
    }

    #[test]
    fn half_open_respects_probe_budget() {
        let mut breaker = CircuitBreaker::new(fast_config());
        for _ in 0..3 {
            breaker.record_failure();
        }
        std::thread::sleep(Duration::from_millis(15));
        assert!(breaker.can_execute());
        assert!(breaker.can_execute());
        assert!(!breaker.can_execute());
    }
}
