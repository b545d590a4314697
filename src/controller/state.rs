use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;
use tracing::{debug, info, trace};

use crate::events::DemoEvent;
use crate::flows::{Flow, FlowCatalog, FlowError, FlowStep};
use crate::role::Role;

/// Transitions kept in [`FlowController::history`]; older entries are dropped
pub const MAX_HISTORY: usize = 256;

/// Lifecycle of the guided tour
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FlowPhase {
    /// No flow loaded
    #[default]
    Idle,
    /// Flow loaded, not started
    Ready,
    /// Showing the step at this index
    Running(usize),
    /// Every step finished
    Complete,
}

impl FlowPhase {
    pub fn label(&self) -> &'static str {
        match self {
            FlowPhase::Idle => "idle",
            FlowPhase::Ready => "ready",
            FlowPhase::Running(_) => "running",
            FlowPhase::Complete => "complete",
        }
    }
}

impl fmt::Display for FlowPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FlowPhase::Running(index) => write!(f, "running({index})"),
            other => f.write_str(other.label()),
        }
    }
}

/// What caused a phase change
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "detail", rename_all = "camelCase")]
pub enum TransitionCause {
    Load,
    Start,
    Event(String),
    AutoAdvance,
    Reset,
    Unload,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PhaseTransition {
    pub from: FlowPhase,
    pub to: FlowPhase,
    pub cause: TransitionCause,
    pub timestamp: DateTime<Utc>,
}

/// Result of offering an event to the controller
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepOutcome {
    /// Not running, or the event does not finish the current step
    Ignored,
    /// The tour moved on to another step
    Advanced { step_index: usize, step_id: String },
    /// The last step finished
    Completed,
}

/// Drives a single flow from its first step to completion.
///
/// The step index only moves forward, one step per matching event. A step
/// marked `auto_advance` finishes the moment it becomes current.
#[derive(Debug, Default)]
pub struct FlowController {
    flow: Option<Flow>,
    phase: FlowPhase,
    active_role: Option<Role>,
    history: Vec<PhaseTransition>,
}

impl FlowController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_flow(flow: Flow) -> Self {
        let mut controller = Self::new();
        controller.load_flow(flow);
        controller
    }

    /// Load `name` from `catalog`. On a miss the controller is left untouched.
    pub fn load(&mut self, catalog: &FlowCatalog, name: &str) -> Result<(), FlowError> {
        let flow = catalog.get(name)?.clone();
        self.load_flow(flow);
        Ok(())
    }

    pub fn load_flow(&mut self, flow: Flow) {
        info!(flow = %flow.name(), steps = flow.len(), "Flow loaded");
        self.active_role = flow.step(0).map(|step| step.role);
        self.flow = Some(flow);
        self.history.clear();
        self.transition(FlowPhase::Ready, TransitionCause::Load);
    }

    /// Drop the loaded flow and return to `Idle`
    pub fn unload(&mut self) {
        if self.flow.take().is_some() {
            self.active_role = None;
            self.transition(FlowPhase::Idle, TransitionCause::Unload);
        }
    }

    /// `Ready -> Running(0)`. Returns false (and does nothing) in any other phase.
    pub fn start(&mut self) -> bool {
        if self.phase != FlowPhase::Ready {
            debug!(phase = %self.phase, "Start ignored");
            return false;
        }
        self.enter_step(0, TransitionCause::Start);
        true
    }

    pub fn handle_event(&mut self, event: &DemoEvent) -> StepOutcome {
        let FlowPhase::Running(index) = self.phase else {
            return StepOutcome::Ignored;
        };
        let completed = self
            .flow
            .as_ref()
            .and_then(|flow| flow.step(index))
            .is_some_and(|step| step.is_completed_by(event));
        if !completed {
            trace!(
                event_type = %event.event_type(),
                step_index = index,
                "Event does not complete current step"
            );
            return StepOutcome::Ignored;
        }

        self.enter_step(index + 1, TransitionCause::Event(event.event_type().to_string()));

        match self.phase {
            FlowPhase::Running(next) => StepOutcome::Advanced {
                step_index: next,
                step_id: self
                    .current_step()
                    .map(|step| step.id.clone())
                    .unwrap_or_default(),
            },
            _ => StepOutcome::Completed,
        }
    }

    /// Preview the tour as `role` without moving the step index
    pub fn switch_role(&mut self, role: Role) {
        if self.active_role != Some(role) {
            info!(from = ?self.active_role, to = %role, "Active role switched");
            self.active_role = Some(role);
        }
    }

    /// Back to `Ready` at step 0. Stays `Idle` when no flow is loaded.
    pub fn reset(&mut self) {
        let Some(first_role) = self.flow.as_ref().and_then(|f| f.step(0)).map(|s| s.role) else {
            debug!("Reset with no flow loaded");
            return;
        };
        self.active_role = Some(first_role);
        self.transition(FlowPhase::Ready, TransitionCause::Reset);
    }

    pub fn phase(&self) -> FlowPhase {
        self.phase
    }

    pub fn flow(&self) -> Option<&Flow> {
        self.flow.as_ref()
    }

    pub fn active_role(&self) -> Option<Role> {
        self.active_role
    }

    pub fn history(&self) -> &[PhaseTransition] {
        &self.history
    }

    pub fn is_started(&self) -> bool {
        matches!(self.phase, FlowPhase::Running(_) | FlowPhase::Complete)
    }

    pub fn is_complete(&self) -> bool {
        self.phase == FlowPhase::Complete
    }

    pub fn step_count(&self) -> usize {
        self.flow.as_ref().map_or(0, Flow::len)
    }

    /// Index of the current step; equals the flow length once complete
    pub fn current_step_index(&self) -> usize {
        match self.phase {
            FlowPhase::Running(index) => index,
            FlowPhase::Complete => self.step_count(),
            FlowPhase::Idle | FlowPhase::Ready => 0,
        }
    }

    pub fn current_step(&self) -> Option<&FlowStep> {
        match self.phase {
            FlowPhase::Running(index) => self.flow.as_ref()?.step(index),
            _ => None,
        }
    }

    pub fn progress_percent(&self) -> u8 {
        match self.phase {
            FlowPhase::Running(index) => {
                let total = self.step_count().max(1) as f64;
                (((index + 1) as f64 / total) * 100.0).round() as u8
            }
            FlowPhase::Complete => 100,
            FlowPhase::Idle | FlowPhase::Ready => 0,
        }
    }

    /// Move to `index`, skipping through auto-advancing steps
    fn enter_step(&mut self, index: usize, cause: TransitionCause) {
        let mut index = index;
        let mut cause = cause;
        loop {
            let Some(step) = self.flow.as_ref().and_then(|flow| flow.step(index)) else {
                self.transition(FlowPhase::Complete, cause);
                info!(flow = ?self.flow.as_ref().map(Flow::name), "Flow complete");
                return;
            };
            let role = step.role;
            let auto_advance = step.auto_advance;

            self.active_role = Some(role);
            self.transition(FlowPhase::Running(index), cause);

            if !auto_advance {
                return;
            }
            index += 1;
            cause = TransitionCause::AutoAdvance;
        }
    }

    fn transition(&mut self, to: FlowPhase, cause: TransitionCause) {
        let from = self.phase;
        self.phase = to;
        info!(from = %from, to = %to, cause = ?cause, "Flow phase transition");
        if self.history.len() >= MAX_HISTORY {
            self.history.remove(0);
        }
        self.history.push(PhaseTransition {
            from,
            to,
            cause,
            timestamp: Utc::now(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flows::{Completion, FlowStep};

    fn two_step_flow() -> Flow {
        Flow::new(
            "two",
            vec![
                FlowStep::new("one", Role::Customer, "One").completes_on(Completion::on("A")),
                FlowStep::new("two", Role::Kitchen, "Two").completes_on(Completion::on("B")),
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_new_controller_is_idle_with_zero_progress() {
        let controller = FlowController::new();
        assert_eq!(controller.phase(), FlowPhase::Idle);
        assert_eq!(controller.progress_percent(), 0);
        assert!(controller.current_step().is_none());
    }

    #[test]
    fn test_start_is_idempotent() {
        let mut controller = FlowController::with_flow(two_step_flow());
        assert!(controller.start());
        assert!(!controller.start());
        assert_eq!(controller.phase(), FlowPhase::Running(0));
    }

    #[test]
    fn test_events_before_start_are_ignored() {
        let mut controller = FlowController::with_flow(two_step_flow());
        let event = DemoEvent::custom("A", Default::default());
        assert_eq!(controller.handle_event(&event), StepOutcome::Ignored);
        assert_eq!(controller.phase(), FlowPhase::Ready);
    }

    #[test]
    fn test_step_change_resyncs_active_role() {
        let mut controller = FlowController::with_flow(two_step_flow());
        controller.start();
        controller.switch_role(Role::Admin);
        assert_eq!(controller.active_role(), Some(Role::Admin));

        let outcome = controller.handle_event(&DemoEvent::custom("A", Default::default()));
        assert_eq!(
            outcome,
            StepOutcome::Advanced {
                step_index: 1,
                step_id: "two".to_string()
            }
        );
        assert_eq!(controller.active_role(), Some(Role::Kitchen));
    }

    #[test]
    fn test_reset_on_idle_stays_idle() {
        let mut controller = FlowController::new();
        controller.reset();
        assert_eq!(controller.phase(), FlowPhase::Idle);
        assert!(controller.history().is_empty());
    }

    #[test]
    fn test_history_records_each_transition() {
        let mut controller = FlowController::with_flow(two_step_flow());
        controller.start();
        controller.handle_event(&DemoEvent::custom("A", Default::default()));
        controller.handle_event(&DemoEvent::custom("B", Default::default()));

        let phases: Vec<FlowPhase> = controller.history().iter().map(|t| t.to).collect();
        assert_eq!(
            phases,
            vec![
                FlowPhase::Ready,
                FlowPhase::Running(0),
                FlowPhase::Running(1),
                FlowPhase::Complete
            ]
        );
        assert_eq!(controller.history()[3].cause, TransitionCause::Event("B".to_string()));
    }

    #[test]
    fn test_loading_a_flow_starts_a_fresh_history() {
        let mut controller = FlowController::with_flow(two_step_flow());
        controller.start();
        controller.handle_event(&DemoEvent::custom("A", Default::default()));

        controller.load_flow(two_step_flow());

        assert_eq!(controller.history().len(), 1);
        assert_eq!(controller.history()[0].cause, TransitionCause::Load);
    }

    #[test]
    fn test_looping_tour_keeps_history_bounded() {
        let mut controller = FlowController::with_flow(two_step_flow());
        for _ in 0..MAX_HISTORY {
            controller.start();
            controller.handle_event(&DemoEvent::custom("A", Default::default()));
            controller.handle_event(&DemoEvent::custom("B", Default::default()));
            controller.reset();
        }

        assert_eq!(controller.history().len(), MAX_HISTORY);
        let last = controller.history().last().unwrap();
        assert_eq!(last.cause, TransitionCause::Reset);
        assert_eq!(last.to, FlowPhase::Ready);
    }
}
