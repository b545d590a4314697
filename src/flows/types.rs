use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashSet;

use super::anchors::Anchor;
use super::error::FlowError;
use crate::events::DemoEvent;
use crate::role::Role;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HintPosition {
    Top,
    #[default]
    Bottom,
    Left,
    Right,
}

/// Overlay tooltip attached to a UI anchor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Hint {
    pub anchor: Anchor,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub position: HintPosition,
}

impl Hint {
    pub fn new(anchor: Anchor, title: impl Into<String>) -> Self {
        Self {
            anchor,
            title: title.into(),
            description: None,
            position: HintPosition::default(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn at(mut self, position: HintPosition) -> Self {
        self.position = position;
        self
    }
}

/// Rule deciding which event finishes a step.
///
/// An event matches when its type equals `event` and every field listed in
/// `when` is present in the payload with an equal value. A JSON array in
/// `when` accepts any of its elements.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Completion {
    pub event: String,
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub when: Map<String, Value>,
}

impl Completion {
    pub fn on(event: impl Into<String>) -> Self {
        Self {
            event: event.into(),
            when: Map::new(),
        }
    }

    pub fn when(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.when.insert(field.into(), value.into());
        self
    }

    pub fn when_any<I, V>(mut self, field: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        let options = values.into_iter().map(Into::into).collect();
        self.when.insert(field.into(), Value::Array(options));
        self
    }

    pub fn matches(&self, event: &DemoEvent) -> bool {
        if event.event_type() != self.event {
            return false;
        }
        if self.when.is_empty() {
            return true;
        }

        let payload = event.payload();
        self.when.iter().all(|(field, expected)| {
            payload.get(field).is_some_and(|actual| match expected {
                Value::Array(options) => options.contains(actual),
                value => value == actual,
            })
        })
    }

    /// An event that satisfies this rule, for scripted replays
    pub fn sample_event(&self) -> DemoEvent {
        let fields = self
            .when
            .iter()
            .filter_map(|(field, expected)| {
                let value = match expected {
                    Value::Array(options) => options.first()?.clone(),
                    value => value.clone(),
                };
                Some((field.clone(), value))
            })
            .collect();
        DemoEvent::synthesize(&self.event, fields)
    }
}

fn is_false(value: &bool) -> bool {
    !*value
}

/// One stage of a guided tour
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct FlowStep {
    pub id: String,
    pub role: Role,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub capability: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_action: Option<String>,
    /// Event that typically leads into this step. Informational only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trigger_event: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completion: Option<Completion>,
    #[serde(default)]
    pub hints: Vec<Hint>,
    /// Step finishes as soon as it becomes current
    #[serde(default, skip_serializing_if = "is_false")]
    pub auto_advance: bool,
}

impl FlowStep {
    pub fn new(id: impl Into<String>, role: Role, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            role,
            title: title.into(),
            description: None,
            capability: None,
            target_action: None,
            trigger_event: None,
            completion: None,
            hints: Vec::new(),
            auto_advance: false,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_capability(mut self, capability: impl Into<String>) -> Self {
        self.capability = Some(capability.into());
        self
    }

    pub fn with_target_action(mut self, action: impl Into<String>) -> Self {
        self.target_action = Some(action.into());
        self
    }

    pub fn triggered_by(mut self, event_type: impl Into<String>) -> Self {
        self.trigger_event = Some(event_type.into());
        self
    }

    pub fn completes_on(mut self, completion: Completion) -> Self {
        self.completion = Some(completion);
        self
    }

    pub fn with_hint(mut self, hint: Hint) -> Self {
        self.hints.push(hint);
        self
    }

    pub fn auto_advancing(mut self) -> Self {
        self.auto_advance = true;
        self
    }

    /// Whether `event` finishes this step
    pub fn is_completed_by(&self, event: &DemoEvent) -> bool {
        self.completion
            .as_ref()
            .is_some_and(|completion| completion.matches(event))
    }
}

/// A named, validated, immutable sequence of steps
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Flow {
    name: String,
    steps: Vec<FlowStep>,
}

impl Flow {
    pub fn new(name: impl Into<String>, steps: Vec<FlowStep>) -> Result<Self, FlowError> {
        let name = name.into();
        if steps.is_empty() {
            return Err(FlowError::EmptyFlow(name));
        }

        let mut seen = HashSet::new();
        for step in &steps {
            if !seen.insert(step.id.as_str()) {
                return Err(FlowError::DuplicateStep {
                    flow: name,
                    step: step.id.clone(),
                });
            }
            if step
                .completion
                .as_ref()
                .is_some_and(|completion| completion.event.trim().is_empty())
            {
                return Err(FlowError::EmptyCompletionEvent {
                    flow: name,
                    step: step.id.clone(),
                });
            }
        }

        Ok(Self { name, steps })
    }

    /// Skips validation; only for flows compiled into the binary, which are
    /// checked by tests instead.
    pub(crate) fn trusted(name: &str, steps: Vec<FlowStep>) -> Self {
        debug_assert!(!steps.is_empty());
        Self {
            name: name.to_string(),
            steps,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn steps(&self) -> &[FlowStep] {
        &self.steps
    }

    pub fn step(&self, index: usize) -> Option<&FlowStep> {
        self.steps.get(index)
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    /// Always false for a constructed flow
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn position(&self, step_id: &str) -> Option<usize> {
        self.steps.iter().position(|step| step.id == step_id)
    }
}
