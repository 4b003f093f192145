// [apps/worker-agent/src/lib.rs]
/*!
 * =================================================================
 * APARATO: WORKER AGENT LIBRARY ROOT (V1.0)
 * CLASIFICACIÓN: ESTRATO L1-WORKER
 * RESPONSABILIDAD: EXPOSICIÓN NOMINAL DEL RUNTIME COOPERATIVO
 * =================================================================
 */

pub mod backoff;
pub mod breaker;
pub mod engine;
pub mod metrics;
pub mod state_machine;

pub mod prelude {
    pub use crate::engine::{WorkerConfig, WorkerRuntime};
    pub use crate::state_machine::{WorkerEvent, WorkerState};
}

pub use engine::{WorkerConfig, WorkerRuntime};
