// [apps/coordinator/src/errors.rs]
/*!
 * =================================================================
 * APARATO: COORDINATOR ERROR TAXONOMY (V1.0)
 * CLASIFICACIÓN: APPLICATION LAYER (ESTRATO L1-APP)
 * RESPONSABILIDAD: TRADUCCIÓN DE FALLOS INTERNOS A LA TAXONOMÍA DE RED
 *
 * Cada variante mapea determinísticamente a (StatusCode, ErrorKind,
 * mensaje) en la frontera de Axum. Los errores internos del driver de
 * base de datos nunca se filtran hacia el cliente: se registran con
 * `error!`/`warn!` y se traducen al mensaje genérico de su categoría.
 * =================================================================
 */

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use fleet_infra_db::DbError;
use serde_json::json;
use thiserror::Error;
use tracing::{error, warn};

#[derive(Debug, Error)]
pub enum CoordinatorError {
    #[error("VALIDATION: {0}")]
    Validation(String),
    #[error("AUTH: missing or invalid token")]
    Unauthenticated,
    #[error("FORBIDDEN: {0}")]
    Forbidden(String),
    #[error("NOT_FOUND: {0}")]
    NotFound(String),
    #[error("CONFLICT: {0}")]
    Conflict(String),
    #[error("RATE_LIMITED: retry after {0}s")]
    RateLimited(i64),
    #[error("OUTDATED_CLIENT")]
    OutdatedClient,
    #[error("UNAVAILABLE: {0}")]
    Unavailable(String),
}

impl From<DbError> for CoordinatorError {
    fn from(db_error: DbError) -> Self {
        match db_error {
            DbError::JobNotFound => CoordinatorError::NotFound("job not found".into()),
            DbError::WorkerNotFound => CoordinatorError::NotFound("worker not found".into()),
            DbError::PrincipalNotFound => CoordinatorError::NotFound("principal not found".into()),
            DbError::InvalidJobState => CoordinatorError::Conflict("job is not in the expected state".into()),
            DbError::WorkerAlreadyBusy => CoordinatorError::Conflict("bot already has an active job".into()),
            DbError::IdempotencyBodyMismatch => CoordinatorError::Conflict("idempotency key reused with a different body".into()),
            other => {
                error!("💀 [DB_FAULT]: {}", other);
                CoordinatorError::Unavailable("persistence layer unavailable".into())
            }
        }
    }
}

impl IntoResponse for CoordinatorError {
    fn into_response(self) -> Response {
        let (status, kind) = match &self {
            CoordinatorError::Validation(_) => (StatusCode::BAD_REQUEST, "VALIDATION"),
            CoordinatorError::Unauthenticated => (StatusCode::UNAUTHORIZED, "AUTH"),
            CoordinatorError::Forbidden(_) => (StatusCode::FORBIDDEN, "FORBIDDEN"),
            CoordinatorError::NotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            CoordinatorError::Conflict(_) => (StatusCode::CONFLICT, "CONFLICT"),
            CoordinatorError::RateLimited(_) => (StatusCode::TOO_MANY_REQUESTS, "RATE_LIMITED"),
            CoordinatorError::OutdatedClient => (StatusCode::UPGRADE_REQUIRED, "OUTDATED_CLIENT"),
            CoordinatorError::Unavailable(_) => (StatusCode::SERVICE_UNAVAILABLE, "UNAVAILABLE"),
        };

        if status.is_server_error() {
            error!("💀 [COORDINATOR_FAULT]: {}", self);
        } else {
            warn!("⚠️ [REJECTED]: {}", self);
        }

        let mut response = (status, Json(json!({ "error": kind, "message": self.to_string() }))).into_response();

        if let CoordinatorError::RateLimited(retry_after) = self {
            response.headers_mut().insert(
                "Retry-After",
                retry_after.to_string().parse().expect("retry_after is always ASCII digits"),
            );
        }

        response
    }
}
