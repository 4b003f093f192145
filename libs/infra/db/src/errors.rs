// [libs/infra/db/src/errors.rs]
/*!
 * =================================================================
 * APARATO: DATABASE ERROR CATALOG (V1.0)
 * CLASIFICACIÓN: INFRASTRUCTURE CORE (ESTRATO L3)
 * RESPONSABILIDAD: CATALOGACIÓN SEMÁNTICA DE FALLOS DE PERSISTENCIA
 *
 * Cada variante lleva un prefijo entre corchetes para su renderizado
 * en los logs estructurados; el texto de error del driver nunca
 * llega al cliente HTTP sin pasar por esta capa.
 * =================================================================
 */

use thiserror::Error;

#[derive(Error, Debug)]
pub enum DbError {
    /// Error de enlace físico o de red con el motor de persistencia.
    #[error("[L3_DB_NET_FAULT]: DATABASE_UPLINK_SEVERED -> {0}")]
    ConnectionError(String),

    /// Fallo en la configuración del entorno (Variables vacías o malformadas).
    #[error("[L3_DB_CONFIG_FAULT]: STRATEGIC_ENV_VOID -> {0}")]
    ConfigurationError(String),

    /// El pool de conexiones acotado (§4.1) está saturado.
    #[error("[L3_DB_POOL_FAULT]: CONNECTION_POOL_SATURATED")]
    PoolExhausted,

    /// Error de sintaxis o ejecución devuelto por el motor libSQL.
    #[error("[L3_DB_QUERY_FAULT]: SQL_QUERY_REJECTED -> {0}")]
    QueryError(#[from] libsql::Error),

    /// Fallo en la transformación de tipos entre SQLite y el Dominio Rust.
    #[error("[L3_DB_MAPPING_FAULT]: DATA_MAPPING_VIOLATION -> {0}")]
    MappingError(String),

    // --- ESTRATO DE TRABAJOS (JOBS) ---
    #[error("[L3_JOB_FAULT]: IDENTIFIER_NOT_FOUND")]
    JobNotFound,

    #[error("[L3_JOB_FAULT]: INVALID_STATE_TRANSITION")]
    InvalidJobState,

    // --- ESTRATO DE TRABAJADORES (WORKERS) ---
    #[error("[L3_WORKER_FAULT]: IDENTIFIER_NOT_FOUND")]
    WorkerNotFound,

    #[error("[L3_WORKER_FAULT]: ALREADY_HAS_ACTIVE_JOB")]
    WorkerAlreadyBusy,

    // --- ESTRATO DE IDEMPOTENCIA ---
    #[error("[L3_IDEMPOTENCY_FAULT]: REPLAYED_KEY_BODY_MISMATCH")]
    IdempotencyBodyMismatch,

    // --- ESTRATO DE AUTENTICACIÓN ---
    #[error("[L3_AUTH_FAULT]: PRINCIPAL_NOT_FOUND")]
    PrincipalNotFound,

    /// Error al comprometer cambios en una secuencia multi-tabla.
    #[error("[L3_DB_FAULT]: TRANSACTION_COLLAPSE")]
    TransactionError,
}
