// [libs/infra/db/src/repositories/mod.rs]
/*!
 * =================================================================
 * APARATO: REPOSITORY ACCESS MATRIX (V1.0)
 * CLASIFICACIÓN: INFRASTRUCTURE LAYER (ESTRATO L3)
 * RESPONSABILIDAD: ORQUESTACIÓN DE SUBSISTEMAS DE PERSISTENCIA
 *
 * El barrel file actúa como una interfaz galvánica: los sub-módulos
 * permanecen aislados, y solo las estructuras de autoridad
 * (Repositories) son expuestas al exterior.
 * =================================================================
 */

/// Gestión del ciclo de vida de órdenes de trabajo.
pub mod job;
/// Gestión del ciclo de vida de trabajadores registrados.
pub mod worker;
/// Registro de auditoría inmutable de transiciones terminales.
pub mod result;
/// Guarda de repeticiones para escrituras reintentadas.
pub mod idempotency;
/// Custodia de credenciales de principales de autenticación.
pub mod auth;

pub use self::auth::{AuthPrincipal, AuthPrincipalRepository};
pub use self::idempotency::IdempotencyRepository;
pub use self::result::ResultRepository;
pub use job::JobRepository;
pub use worker::WorkerRepository;
