// [libs/domain/models/src/lib.rs]
/*!
 * =================================================================
 * APARATO: JOB FLEET DOMAIN MODELS (V1.0)
 * CLASIFICACIÓN: DOMAIN ENTITIES (ESTRATO L2)
 * RESPONSABILIDAD: DEFINICIÓN DE CONTRATOS SOBERANOS DE TRABAJO
 *
 * Entidades del dominio (Job, Worker, JobResult, Session) y el registro
 * cerrado de operaciones. Single Source of Truth para el estado
 * compartido entre el coordinador y los agentes de trabajo.
 * =================================================================
 */

pub mod idempotency;
pub mod job;
pub mod operation;
pub mod result;
pub mod session;
pub mod worker;

pub use idempotency::IdempotencyRecord;
pub use job::{Job, JobStatus};
pub use operation::{execute as execute_operation, is_known_operation, known_operations, OperationError};
pub use result::{JobResult, TerminalStatus};
pub use session::{
    validate_token_lifetime, LifetimeError, TokenEnvelope, WorkerClaims, MAX_TOKEN_LIFETIME_SECS,
    MIN_TOKEN_LIFETIME_SECS,
};
pub use worker::{HealthStatus, Worker, WorkerStatus, LIVENESS_THRESHOLD};
