// [libs/domain/models/src/job.rs]
//! Job entity: a unit of work dispatched to the worker fleet.
//!
//! The state field is a closed enum. The authoritative transition guard is
//! the repository's conditional SQL (`repositories/job/mod.rs`) — a single
//! atomic `UPDATE ... WHERE status = '<expected>'` per transition, re-checked
//! by rows-affected — rather than a second, parallel in-memory state machine
//! here that nothing would call.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Pending,
    Claimed,
    Processing,
    Succeeded,
    Failed,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Job {
    pub id: Uuid,
    pub operand_a: i64,
    pub operand_b: i64,
    pub operation: String,
    pub status: JobStatus,
    pub assigned_operation: Option<String>,
    pub claimed_by: Option<Uuid>,
    pub attempts: u32,
    pub error: Option<String>,
    pub created_at: DateTime<Utc>,
    pub claimed_at: Option<DateTime<Utc>>,
    pub started_at: Option<DateTime<Utc>>,
    pub finished_at: Option<DateTime<Utc>>,
}

impl Job {
    pub fn new(operand_a: i64, operand_b: i64, operation: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            operand_a,
            operand_b,
            operation,
            status: JobStatus::Pending,
            assigned_operation: None,
            claimed_by: None,
            attempts: 0,
            error: None,
            created_at: Utc::now(),
            claimed_at: None,
            started_at: None,
            finished_at: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_job_starts_pending_and_unclaimed() {
        let job = Job::new(10, 20, "sum".into());
        assert_eq!(job.status, JobStatus::Pending);
        assert!(job.claimed_by.is_none());
        assert_eq!(job.attempts, 0);
    }
}
