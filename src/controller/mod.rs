// Flow controller state machine and the overlay snapshot it publishes

pub mod snapshot;
pub mod state;

pub use snapshot::OverlaySnapshot;
pub use state::{FlowController, FlowPhase, PhaseTransition, StepOutcome, TransitionCause};
