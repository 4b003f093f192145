// INICIO DEL ARCHIVO [libs/infra/coordinator-client/src/errors.rs]
//! =================================================================
//! APARATO: COORDINATOR CLIENT ERRORS (V1.0)
//! RESPONSABILIDAD: CATALOGACIÓN DE FALLOS DE COMUNICACIÓN CON EL C3
//! =================================================================

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ClientError {
    #[error("NETWORK_UNREACHABLE: Failed to reach coordinator: {0}")]
    NetworkFault(#[from] reqwest::Error),

    #[error("ENVELOPE_CORRUPTION: Failed to decode coordinator response: {0}")]
    DecodingFault(#[from] serde_json::Error),

    #[error("COMMAND_REJECTION: Coordinator returned status {0}")]
    ServerRejection(String),

    #[error("IDENTITY_REVOKED: Session token invalid or expired")]
    Unauthorized,

    #[error("RATE_LIMITED: Auth throttle in effect, retry after {0}s")]
    RateLimited(u64),

    #[error("NO_JOB_AVAILABLE: Claim found nothing to assign")]
    NoJobAvailable,

    #[error("CONFLICT: {0}")]
    Conflict(String),
}
// FIN DEL ARCHIVO [libs/infra/coordinator-client/src/errors.rs]
