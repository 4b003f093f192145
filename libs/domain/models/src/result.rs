// [libs/domain/models/src/result.rs]
//! Result entity: an immutable audit record emitted on terminal transition.
//!
//! Named `JobResult` to avoid colliding with `std::result::Result`. Carries a
//! single schema — the source this was modeled on wrote two parallel schemas
//! (a legacy `sum` column plus a generic `result` column) reflecting an
//! incomplete migration; that dual-path branching is not reproduced here.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TerminalStatus {
    Succeeded,
    Failed,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobResult {
    pub id: Uuid,
    pub job_id: Uuid,
    pub operand_a: i64,
    pub operand_b: i64,
    pub operation: String,
    pub value: Option<i64>,
    pub status: TerminalStatus,
    pub processed_by: Uuid,
    pub duration_ms: u64,
    pub error: Option<String>,
    pub processed_at: DateTime<Utc>,
}

impl JobResult {
    pub fn success(job_id: Uuid, operand_a: i64, operand_b: i64, operation: String, value: i64, processed_by: Uuid, duration_ms: u64) -> Self {
        Self {
            id: Uuid::new_v4(),
            job_id,
            operand_a,
            operand_b,
            operation,
            value: Some(value),
            status: TerminalStatus::Succeeded,
            processed_by,
            duration_ms,
            error: None,
            processed_at: Utc::now(),
        }
    }

    pub fn failure(job_id: Uuid, operand_a: i64, operand_b: i64, operation: String, processed_by: Uuid, duration_ms: u64, error: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            job_id,
            operand_a,
            operand_b,
            operation,
            value: None,
            status: TerminalStatus::Failed,
            processed_by,
            duration_ms,
            error: Some(error),
            processed_at: Utc::now(),
        }
    }
}
