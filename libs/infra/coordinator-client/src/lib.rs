// INICIO DEL ARCHIVO [libs/infra/coordinator-client/src/lib.rs]
/*!
 * =================================================================
 * APARATO: COORDINATOR CLIENT LIBRARY BARREL (V1.0)
 * CLASIFICACIÓN: INFRASTRUCTURE LIB (ESTRATO L3)
 * RESPONSABILIDAD: EXPOSICIÓN PÚBLICA DEL UPLINK HACIA EL C3
 * =================================================================
 */

pub mod client;
pub mod errors;

pub use client::{ClaimedJob, CoordinatorClient, RegisterResponse, SessionDescriptor};
pub use errors::ClientError;
// FIN DEL ARCHIVO [libs/infra/coordinator-client/src/lib.rs]
