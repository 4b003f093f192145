// [apps/worker-agent/src/backoff.rs]
/*!
 * =================================================================
 * APARATO: PHASE BACKOFF CALCULATOR (V1.0)
 * CLASIFICACIÓN: WORKER RESILIENCE LAYER (ESTRATO L1-WORKER)
 * RESPONSABILIDAD: ESPACIADO EXPONENCIAL ENTRE REINTENTOS DE FASE
 * =================================================================
 */

use std::time::Duration;

#[derive(Debug, Clone, Copy)]
pub struct BackoffConfig {
    pub base: Duration,
    pub expo: f64,
    pub max: Duration,
}

impl Default for BackoffConfig {
    fn default() -> Self {
        Self { base: Duration::from_secs(1), expo: 2.0, max: Duration::from_secs(60) }
    }
}

/// `delay = min(base * expo^(attempt-1), max)`. `attempt` is 1-indexed;
/// `attempt == 0` is treated the same as `attempt == 1`.
pub fn delay_for_attempt(config: &BackoffConfig, attempt: u32) -> Duration {
    let exponent = attempt.saturating_sub(1);
    let factor = config.expo.powi(exponent as i32);
    let scaled = config.base.as_secs_f64() * factor;
    Duration::from_secs_f64(scaled.min(config.max.as_secs_f64()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_attempt_uses_base_delay() {
        let config = BackoffConfig::default();
        assert_eq!(delay_for_attempt(&config, 1), Duration::from_secs(1));
    }

    #[test]
    fn delay_doubles_each_attempt_until_capped() {
        let config = BackoffConfig::default();
        assert_eq!(delay_for_attempt(&config, 2), Duration::from_secs(2));
        assert_eq!(delay_for_attempt(&config, 3), Duration::from_secs(4));
        assert_eq!(delay_for_attempt(&config, 7), Duration::from_secs(60));
        assert_eq!(delay_for_attempt(&config, 20), Duration::from_secs(60));
    }
}
