// [apps/coordinator/src/lib.rs]
/*!
 * =================================================================
 * APARATO: COORDINATOR LIBRARY ROOT (V1.0)
 * CLASIFICACIÓN: CRATE ROOT (ESTRATO L3)
 * RESPONSABILIDAD: DEFINICIÓN DEL ÁRBOL DE MÓDULOS
 * =================================================================
 */

/// Traducción de fallos internos a la taxonomía de red (§4.3.5).
pub mod errors;
/// Adaptadores de entrada HTTP: auth, bots, jobs, admin, health.
pub mod handlers;
/// Núcleo de mando: ignición de infraestructura y arranque de daemons.
pub mod kernel;
/// Guardianes de autenticación RS256 y bearer pre-compartido.
pub mod middleware;
/// Topología de rutas HTTP (§6.1).
pub mod routes;
/// Daemons de recuperación periódica (C4, §4.4).
pub mod services;
/// Composición de repositorios, credenciales y configuración (C2/C3 state).
pub mod state;

pub mod prelude {
    pub use crate::kernel::CoordinatorKernel;
    pub use crate::state::AppState;
}
