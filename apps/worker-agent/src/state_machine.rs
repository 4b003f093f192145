// [apps/worker-agent/src/state_machine.rs]
/*!
 * =================================================================
 * APARATO: WORKER STATE MACHINE (V1.0)
 * CLASIFICACIÓN: WORKER EXECUTION LAYER (ESTRATO L1-WORKER)
 * RESPONSABILIDAD: TRANSICIÓN CENTRALIZADA DEL CICLO DE VIDA DEL AGENTE
 *
 * Una única función `transition` valida cada cambio de fase en vez de
 * dejar la mutación dispersa por el motor. El estado es un enum cerrado;
 * cualquier transición no listada aquí es, por definición, inválida.
 * =================================================================
 */

use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WorkerState {
    Initializing,
    Registering,
    HealthCheck,
    Ready,
    Processing,
    Error,
    ShuttingDown,
    Stopped,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerEvent {
    BeginRegistration,
    RegistrationSucceeded,
    RegistrationRetriesExhausted,
    ProbesPassed,
    ProbesFailedRepeatedly,
    HealthCheckTimedOut,
    JobClaimed,
    JobTerminated,
    BreakerReprobeFailed,
    BackoffElapsed,
    StartupAttemptsExhausted,
    ShutdownRequested,
    ShutdownComplete,
}

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
#[error("no transition for event {event:?} while in state {current:?}")]
pub struct TransitionError {
    pub current: WorkerState,
    pub event: WorkerEvent,
}

/// Validates and computes the next state for `(current, event)` per the
/// table governing the agent's lifecycle. Every arrow the runtime takes
/// must flow through here.
pub fn transition(current: WorkerState, event: WorkerEvent) -> Result<WorkerState, TransitionError> {
    use WorkerEvent::*;
    use WorkerState::*;

    let next = match (current, event) {
        (_, ShutdownRequested) if current != Stopped => ShuttingDown,
        (ShuttingDown, ShutdownComplete) => Stopped,

        (Initializing, BeginRegistration) => Registering,
        (Registering, RegistrationSucceeded) => HealthCheck,
        (Registering, RegistrationRetriesExhausted) => Error,

        (HealthCheck, ProbesPassed) => Ready,
        (HealthCheck, ProbesFailedRepeatedly) => Registering,
        (HealthCheck, HealthCheckTimedOut) => Error,

        (Ready, JobClaimed) => Processing,
        (Processing, JobTerminated) => Ready,

        (Ready, BreakerReprobeFailed) => Error,
        (Processing, BreakerReprobeFailed) => Error,

        (Error, BackoffElapsed) => Registering,
        (Error, StartupAttemptsExhausted) => Stopped,

        _ => return Err(TransitionError { current, event }),
    };

    Ok(next)
}

#[cfg(test)]
mod tests {
    use super::*;
    use WorkerEvent::*;
    use WorkerState::*;

    #[test]
    fn happy_path_reaches_ready() {
        let mut state = Initializing;
        for event in [BeginRegistration, RegistrationSucceeded, ProbesPassed] {
            state = transition(state, event).unwrap();
        }
        assert_eq!(state, Ready);
    }

    #[test]
    fn ready_cycles_through_processing_and_back() {
        let state = transition(Ready, JobClaimed).unwrap();
        assert_eq!(state, Processing);
        let state = transition(state, JobTerminated).unwrap();
        assert_eq!(state, Ready);
    }

    #[test]
    fn error_recovers_via_backoff_or_gives_up() {
        assert_eq!(transition(Error, BackoffElapsed).unwrap(), Registering);
        assert_eq!(transition(Error, StartupAttemptsExhausted).unwrap(), Stopped);
    }

    #[test]
    fn shutdown_is_reachable_from_any_live_state() {
        for state in [Initializing, Registering, HealthCheck, Ready, Processing, Error] {
            assert_eq!(transition(state, ShutdownRequested).unwrap(), ShuttingDown);
        }
        assert_eq!(transition(ShuttingDown, ShutdownComplete).unwrap(), Stopped);
    }

    #[test]
    fn unlisted_transition_is_rejected() {
        assert!(transition(Initializing, JobClaimed).is_err());
    }

    #[test]
    fn three_consecutive_probe_failures_fall_back_to_registering_not_error() {
        assert_eq!(transition(HealthCheck, ProbesFailedRepeatedly).unwrap(), Registering);
    }
}
