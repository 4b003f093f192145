// [apps/coordinator/src/state/rate_limiter.rs]
//! Per-`bot_key` sliding-window auth throttle (§4.2). Locked after
//! `FAILURE_THRESHOLD` failures within `WINDOW`, with a progressive
//! backoff schedule. The lock check happens before hash comparison so
//! that cost does not leak timing of unknown keys (enforced by the
//! caller, `handlers::auth::issue_token`).

use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;
use std::sync::Mutex;

const FAILURE_THRESHOLD: u32 = 5;
const WINDOW_SECS: i64 = 300;
const BACKOFF_SCHEDULE_SECS: [i64; 4] = [60, 120, 300, 900];

#[derive(Debug, Clone)]
struct WindowState {
    failures_in_window: u32,
    window_started_at: DateTime<Utc>,
    locked_until: Option<DateTime<Utc>>,
    lock_strikes: usize,
}

pub struct AuthRateLimiter {
    windows: Mutex<HashMap<String, WindowState>>,
}

impl AuthRateLimiter {
    pub fn new() -> Self {
        Self { windows: Mutex::new(HashMap::new()) }
    }

    /// Returns `Some(retry_after_secs)` if `bot_key` is currently locked out.
    pub fn check_locked(&self, bot_key: &str) -> Option<i64> {
        let now = Utc::now();
        let windows = self.windows.lock().expect("FATAL: rate limiter lock poisoned.");
        let state = windows.get(bot_key)?;
        let locked_until = state.locked_until?;
        if now < locked_until {
            Some((locked_until - now).num_seconds().max(1))
        } else {
            None
        }
    }

    pub fn record_failure(&self, bot_key: &str) {
        let now = Utc::now();
        let mut windows = self.windows.lock().expect("FATAL: rate limiter lock poisoned.");

        // An unauthenticated caller picks bot_key, so a flood of one-shot bogus
        // keys must not grow this map forever. Sweep expired, unlocked entries
        // on every insert rather than only on success, bounding it to roughly
        // the traffic seen within one window/lockout.
        windows.retain(|_, state| {
            let locked = state.locked_until.is_some_and(|until| now < until);
            let window_active = now - state.window_started_at <= Duration::seconds(WINDOW_SECS);
            locked || window_active
        });

        let state = windows.entry(bot_key.to_string()).or_insert_with(|| WindowState {
            failures_in_window: 0,
            window_started_at: now,
            locked_until: None,
            lock_strikes: 0,
        });

        if now - state.window_started_at > Duration::seconds(WINDOW_SECS) {
            state.failures_in_window = 0;
            state.window_started_at = now;
        }

        state.failures_in_window += 1;

        if state.failures_in_window >= FAILURE_THRESHOLD {
            let backoff_secs = BACKOFF_SCHEDULE_SECS[state.lock_strikes.min(BACKOFF_SCHEDULE_SECS.len() - 1)];
            state.locked_until = Some(now + Duration::seconds(backoff_secs));
            state.lock_strikes += 1;
            state.failures_in_window = 0;
        }
    }

    pub fn record_success(&self, bot_key: &str) {
        let mut windows = self.windows.lock().expect("FATAL: rate limiter lock poisoned.");
        windows.remove(bot_key);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sixth_failure_within_window_locks_the_key() {
        let limiter = AuthRateLimiter::new();
        for _ in 0..5 {
            limiter.record_failure("k1");
        }
        assert!(limiter.check_locked("k1").is_some());
    }

    #[test]
    fn success_clears_the_window() {
        let limiter = AuthRateLimiter::new();
        limiter.record_failure("k1");
        limiter.record_failure("k1");
        limiter.record_success("k1");
        assert!(limiter.check_locked("k1").is_none());
    }
}
