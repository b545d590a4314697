use anyhow::{Context, Result};
use std::cell::RefCell;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use tracing::{info, warn};

use super::load_catalog;
use crate::config::DemoConfig;
use crate::controller::{FlowController, OverlaySnapshot};
use crate::events::{DemoEvent, EventBus};
use crate::host::attach_controller;
use crate::telemetry::{create_demo_span, generate_correlation_id};

/// Result of replaying a flow
#[derive(Debug, Clone)]
pub struct WalkthroughSummary {
    pub events_emitted: usize,
    pub completed: bool,
    pub snapshot: OverlaySnapshot,
}

pub struct WalkthroughCommand {
    pub flow: String,
    pub events: Option<PathBuf>,
    pub file: Option<PathBuf>,
    pub json: bool,
}

impl WalkthroughCommand {
    pub fn new(flow: String) -> Self {
        Self {
            flow,
            events: None,
            file: None,
            json: false,
        }
    }

    pub fn with_events(mut self, events: Option<PathBuf>) -> Self {
        self.events = events;
        self
    }

    pub fn with_file(mut self, file: Option<PathBuf>) -> Self {
        self.file = file;
        self
    }

    pub fn with_json(mut self, json: bool) -> Self {
        self.json = json;
        self
    }

    pub fn execute(&self, config: &DemoConfig) -> Result<WalkthroughSummary> {
        let catalog = load_catalog(config, self.file.as_deref())?;
        let correlation_id = generate_correlation_id();
        let span = create_demo_span("walkthrough", Some(&self.flow), Some(&correlation_id));
        let _entered = span.enter();

        let bus = EventBus::new();
        let controller = Rc::new(RefCell::new(FlowController::new()));
        let subscription = attach_controller(&bus, &controller);

        controller.borrow_mut().load(&catalog, &self.flow)?;
        controller.borrow_mut().start();
        println!("▶️  Walking through '{}'", self.flow);
        print_position(&controller.borrow().snapshot());

        let events_emitted = match &self.events {
            Some(path) => replay_file(&bus, &controller, path)?,
            None => replay_completions(&bus, &controller),
        };
        subscription.unsubscribe();

        let snapshot = controller.borrow().snapshot();
        let completed = controller.borrow().is_complete();
        if completed {
            println!("🏁 Flow complete after {events_emitted} events");
        } else {
            println!(
                "⏸️  Stopped at step {}/{} after {events_emitted} events",
                snapshot.step_index + 1,
                snapshot.step_count
            );
        }
        if self.json {
            println!("{}", serde_json::to_string_pretty(&snapshot)?);
        }
        info!(flow = %self.flow, events = events_emitted, completed, "Walkthrough finished");

        Ok(WalkthroughSummary {
            events_emitted,
            completed,
            snapshot,
        })
    }
}

/// Events from a JSON-lines file; blank lines and `#` comments are skipped
pub fn read_events(path: &Path) -> Result<Vec<DemoEvent>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read events from {}", path.display()))?;
    content
        .lines()
        .enumerate()
        .filter(|(_, line)| {
            let line = line.trim();
            !line.is_empty() && !line.starts_with('#')
        })
        .map(|(number, line)| {
            serde_json::from_str(line)
                .with_context(|| format!("{}:{}: invalid event", path.display(), number + 1))
        })
        .collect()
}

fn replay_file(bus: &EventBus, controller: &Rc<RefCell<FlowController>>, path: &Path) -> Result<usize> {
    let events = read_events(path)?;
    let count = events.len();
    for event in events {
        emit_and_report(bus, controller, event);
    }
    Ok(count)
}

/// Emit each current step's own completion event until the flow ends or a
/// step cannot be completed
fn replay_completions(bus: &EventBus, controller: &Rc<RefCell<FlowController>>) -> usize {
    let mut emitted = 0;
    loop {
        let (index, next) = {
            let controller = controller.borrow();
            let Some(step) = controller.current_step() else {
                break;
            };
            (
                controller.current_step_index(),
                step.completion.as_ref().map(|completion| completion.sample_event()),
            )
        };
        let Some(event) = next else {
            println!("   ⚠️  Current step has no completion rule; stopping");
            break;
        };

        emit_and_report(bus, controller, event);
        emitted += 1;

        if controller.borrow().current_step_index() == index && !controller.borrow().is_complete() {
            warn!(step_index = index, "Completion event did not advance the flow");
            break;
        }
    }
    emitted
}

fn emit_and_report(bus: &EventBus, controller: &Rc<RefCell<FlowController>>, event: DemoEvent) {
    println!("   📨 {event}");
    bus.emit(event);
    print_position(&controller.borrow().snapshot());
}

fn print_position(snapshot: &OverlaySnapshot) {
    match &snapshot.step {
        Some(step) => println!(
            "   ➡️  step {}/{} [{}] {} ({}%)",
            snapshot.step_index + 1,
            snapshot.step_count,
            step.role,
            step.title,
            snapshot.progress_percent
        ),
        None => println!("   ✅ {} ({}%)", snapshot.phase, snapshot.progress_percent),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;
    use std::io::Write;

    #[test]
    fn test_default_flow_replays_to_completion() {
        let summary = WalkthroughCommand::new("default".to_string())
            .execute(&DemoConfig::default())
            .unwrap();

        assert!(summary.completed);
        assert_eq!(summary.events_emitted, 7);
        assert_eq!(summary.snapshot.progress_percent, 100);
    }

    #[test]
    fn test_events_file_skips_comments_and_blank_lines() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "# kiosk run").unwrap();
        writeln!(file, r#"{{"type": "ORDER_STARTED"}}"#).unwrap();
        writeln!(file).unwrap();
        writeln!(file, r#"{{"type": "CART_ITEM_ADDED", "data": {{"itemId": "burger"}}}}"#).unwrap();

        let events = read_events(file.path()).unwrap();
        assert_eq!(events, vec![DemoEvent::OrderStarted, DemoEvent::cart_item_added("burger")]);
    }

    #[test]
    fn test_invalid_event_line_reports_line_number() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, r#"{{"type": "DEMO_START"}}"#).unwrap();
        writeln!(file, r#"{{"type": "ORDER_CREATED"}}"#).unwrap();

        let error = read_events(file.path()).unwrap_err();
        assert!(format!("{error:#}").contains(":2: invalid event"));
    }
}
