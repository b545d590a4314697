//! End-to-end tour scenarios: bus + controller driven by the builtin flows

use foodgrid_demo::events::{DemoEvent, EventBus};
use foodgrid_demo::flows::{FlowCatalog, FlowError};
use foodgrid_demo::{attach_controller, FlowController, FlowPhase, Role, StepOutcome};
use std::cell::RefCell;
use std::rc::Rc;

/// The seven events that finish the default tour, in order
fn default_completion_events() -> Vec<DemoEvent> {
    vec![
        DemoEvent::DemoStart,
        DemoEvent::order_created("o-100", "OPEN"),
        DemoEvent::cart_item_added("burger-classic"),
        DemoEvent::order_status_changed("o-100", "SERVED"),
        DemoEvent::order_status_changed("o-100", "BILLED"),
        DemoEvent::order_status_changed("o-100", "PAID"),
        DemoEvent::RoleSwitched { role: Role::Admin },
    ]
}

fn started(flow: &str) -> FlowController {
    let mut controller = FlowController::new();
    controller.load(&FlowCatalog::builtin(), flow).unwrap();
    assert!(controller.start());
    controller
}

#[test]
fn test_default_flow_completes_after_seven_events() {
    let mut controller = started("default");
    assert_eq!(controller.phase(), FlowPhase::Running(0));

    let events = default_completion_events();
    let last = events.len() - 1;
    for (i, event) in events.iter().enumerate() {
        let outcome = controller.handle_event(event);
        if i < last {
            assert_eq!(controller.phase(), FlowPhase::Running(i + 1), "after {event}");
            assert!(matches!(outcome, StepOutcome::Advanced { step_index, .. } if step_index == i + 1));
        } else {
            assert_eq!(outcome, StepOutcome::Completed);
        }
    }

    assert_eq!(controller.phase(), FlowPhase::Complete);
    assert_eq!(controller.current_step_index(), 8);
    assert_eq!(controller.progress_percent(), 100);
}

#[test]
fn test_out_of_order_event_causes_no_transition() {
    let mut controller = started("default");

    let outcome = controller.handle_event(&DemoEvent::order_status_changed("o-100", "COMPLETED"));

    assert_eq!(outcome, StepOutcome::Ignored);
    assert_eq!(controller.phase(), FlowPhase::Running(0));
}

#[test]
fn test_switch_role_keeps_step_index() {
    let mut controller = started("default");
    for event in &default_completion_events()[..2] {
        controller.handle_event(event);
    }
    assert_eq!(controller.phase(), FlowPhase::Running(2));

    controller.switch_role(Role::Admin);

    assert_eq!(controller.active_role(), Some(Role::Admin));
    assert_eq!(controller.current_step_index(), 2);
    let snapshot = controller.snapshot();
    assert_eq!(snapshot.step_role, Some(Role::Staff));
    assert_eq!(snapshot.active_role, Some(Role::Admin));
}

#[test]
fn test_start_progress_matches_first_step_share() {
    let catalog = FlowCatalog::builtin();
    for name in catalog.names() {
        let mut controller = FlowController::new();
        controller.load(&catalog, name).unwrap();
        controller.start();

        let len = catalog.get(name).unwrap().len() as f64;
        let expected = (100.0 / len).round() as u8;
        assert_eq!(controller.progress_percent(), expected, "flow {name}");
    }
}

/// Feed each current step its own completion event until the flow ends
fn drive_to_completion(controller: &mut FlowController) {
    for _ in 0..controller.step_count() {
        let Some(completion) = controller.current_step().and_then(|step| step.completion.clone()) else {
            return;
        };
        controller.handle_event(&completion.sample_event());
    }
}

#[test]
fn test_reset_from_complete_returns_to_ready_for_every_flow() {
    let catalog = FlowCatalog::builtin();
    for name in catalog.names() {
        let mut controller = FlowController::new();
        controller.load(&catalog, name).unwrap();
        controller.start();
        drive_to_completion(&mut controller);
        assert!(controller.is_complete(), "flow {name} did not complete");

        controller.reset();

        assert_eq!(controller.phase(), FlowPhase::Ready, "flow {name}");
        assert_eq!(controller.current_step_index(), 0);
        assert!(!controller.is_started());
        assert_eq!(controller.progress_percent(), 0);
        assert!(controller.start());
        assert_eq!(controller.phase(), FlowPhase::Running(0));
    }
}

#[test]
fn test_unknown_flow_leaves_controller_unchanged() {
    let mut controller = started("customer-order");

    let error = controller.load(&FlowCatalog::builtin(), "does-not-exist").unwrap_err();

    assert!(matches!(error, FlowError::NotFound { .. }));
    assert_eq!(controller.phase(), FlowPhase::Running(0));
    assert_eq!(controller.flow().map(|f| f.name()), Some("customer-order"));
}

#[test]
fn test_complete_flow_ignores_further_events_and_start() {
    let mut controller = started("default");
    for event in &default_completion_events() {
        controller.handle_event(event);
    }

    assert_eq!(controller.handle_event(&DemoEvent::DemoStart), StepOutcome::Ignored);
    assert!(!controller.start());
    assert_eq!(controller.phase(), FlowPhase::Complete);
    assert!(controller.snapshot().step.is_none());
}

#[test]
fn test_bus_driven_tour_with_unrelated_noise() {
    let bus = EventBus::new();
    let controller = Rc::new(RefCell::new(FlowController::new()));
    let _subscription = attach_controller(&bus, &controller);
    controller
        .borrow_mut()
        .load(&FlowCatalog::builtin(), "customer-order")
        .unwrap();
    controller.borrow_mut().start();

    bus.emit(DemoEvent::custom("KIOSK_IDLE", Default::default()));
    bus.emit(DemoEvent::OrderStarted);
    bus.emit(DemoEvent::payment_completed("o-1"));
    bus.emit(DemoEvent::cart_item_added("fries"));
    assert_eq!(controller.borrow().phase(), FlowPhase::Running(2));

    bus.emit(DemoEvent::order_created("o-2", "OPEN"));
    assert_eq!(controller.borrow().phase(), FlowPhase::Complete);
}
