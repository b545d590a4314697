use serde::Serialize;

use super::state::FlowController;
use crate::capabilities::{landing_route, resolve_route_for_capability};
use crate::flows::{FlowStep, Hint};
use crate::role::Role;

/// Read-only view of the tour consumed by overlay renderers
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OverlaySnapshot {
    pub flow: Option<String>,
    pub phase: String,
    pub step_index: usize,
    pub step_count: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub step: Option<FlowStep>,
    /// Role the current step is written for
    #[serde(skip_serializing_if = "Option::is_none")]
    pub step_role: Option<Role>,
    /// Persona the operator is previewing
    pub active_role: Option<Role>,
    pub progress_percent: u8,
    pub hints: Vec<Hint>,
    /// Demo screen that exposes the current step's capability
    #[serde(skip_serializing_if = "Option::is_none")]
    pub route: Option<String>,
}

impl OverlaySnapshot {
    pub fn is_running(&self) -> bool {
        self.step.is_some()
    }
}

impl FlowController {
    pub fn snapshot(&self) -> OverlaySnapshot {
        let step = self.current_step().cloned();
        let route = step
            .as_ref()
            .and_then(|s| s.capability.as_deref())
            .and_then(resolve_route_for_capability)
            .or_else(|| self.active_role().map(landing_route).filter(|_| step.is_some()))
            .map(str::to_string);

        OverlaySnapshot {
            flow: self.flow().map(|flow| flow.name().to_string()),
            phase: self.phase().label().to_string(),
            step_index: self.current_step_index(),
            step_count: self.step_count(),
            step_role: step.as_ref().map(|s| s.role),
            active_role: self.active_role(),
            progress_percent: self.progress_percent(),
            hints: step.as_ref().map(|s| s.hints.clone()).unwrap_or_default(),
            route,
            step,
        }
    }
}
