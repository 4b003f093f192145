// [libs/domain/models/src/worker.rs]
//! Worker entity: a registered agent principal.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum WorkerStatus {
    Idle,
    Busy,
    Down,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum HealthStatus {
    Normal,
    PotentiallyStuck,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Worker {
    pub id: Uuid,
    pub bot_key: String,
    pub assigned_operation: Option<String>,
    pub status: WorkerStatus,
    pub health_status: HealthStatus,
    pub current_job_id: Option<Uuid>,
    pub last_heartbeat_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

/// Default liveness threshold (§3): a worker is live when not soft-deleted
/// and its last heartbeat is younger than this.
pub const LIVENESS_THRESHOLD: Duration = Duration::seconds(120);

impl Worker {
    pub fn register(bot_key: String, assigned_operation: Option<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            bot_key,
            assigned_operation,
            status: WorkerStatus::Idle,
            health_status: HealthStatus::Normal,
            current_job_id: None,
            last_heartbeat_at: now,
            created_at: now,
            deleted_at: None,
        }
    }

    pub fn is_live(&self, now: DateTime<Utc>) -> bool {
        self.deleted_at.is_none() && now - self.last_heartbeat_at < LIVENESS_THRESHOLD
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn liveness_threshold_expires() {
        let mut worker = Worker::register("k1".into(), None);
        worker.last_heartbeat_at = Utc::now() - Duration::minutes(3);
        assert!(!worker.is_live(Utc::now()));
    }
}
