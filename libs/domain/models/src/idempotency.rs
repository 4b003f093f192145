// [libs/domain/models/src/idempotency.rs]
//! Idempotency record: the persisted replay-guard for retried writes
//! (worker registration, job reporting) keyed by (idempotency_key, bot_key).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdempotencyRecord {
    pub idempotency_key: String,
    pub bot_key: String,
    pub request_hash: String,
    pub response_status: u16,
    pub response_body: String,
    pub created_at: DateTime<Utc>,
}

impl IdempotencyRecord {
    pub fn new(idempotency_key: String, bot_key: String, request_hash: String, response_status: u16, response_body: String) -> Self {
        Self {
            idempotency_key,
            bot_key,
            request_hash,
            response_status,
            response_body,
            created_at: Utc::now(),
        }
    }
}
