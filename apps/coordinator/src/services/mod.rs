// [apps/coordinator/src/services/mod.rs]
/*!
 * =================================================================
 * APARATO: SERVICE ORCHESTRATION HUB (V1.0)
 * CLASIFICACIÓN: APPLICATION SERVICES (ESTRATO L4)
 * RESPONSABILIDAD: EXPOSICIÓN NOMINAL DE LOS DAEMONS DE RECUPERACIÓN
 *
 * # Topología de Módulos:
 * - recovery: Funciones puras L1-L4 + limpieza de retención + auto-populate.
 * - daemon:   Programador `tokio::time::interval` que las ejecuta en bucle.
 * =================================================================
 */

pub mod daemon;
pub mod recovery;

pub use daemon::spawn_recovery_daemons;
