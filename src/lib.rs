// FoodGrid demo library - guided product tour engine
// Exposes the tour components for the CLI, embedding hosts and tests

pub mod capabilities;
pub mod cli;
pub mod config;
pub mod controller;
pub mod events;
pub mod flows;
pub mod guard;
pub mod host;
pub mod http;
pub mod role;
pub mod session;
pub mod telemetry;

// Re-export key types for easy access
pub use capabilities::{landing_route, resolve_route_for_capability, resolve_screen_for_capability, DemoScreen};
pub use crate::config::{config, DemoConfig};
pub use controller::{FlowController, FlowPhase, OverlaySnapshot, StepOutcome};
pub use events::{DemoEvent, DispatchReport, EventBus, HandlerError, Subscription, Topic};
pub use flows::{Anchor, Completion, Flow, FlowCatalog, FlowError, FlowStep, Hint, HintPosition};
pub use guard::{check_demo_blocked, is_demo_action_disabled, DemoGuard, GuardRule, GuardRuleSpec};
pub use host::{attach_controller, DemoHost, HostError};
pub use http::{DemoApi, DemoApiError, DemoHttpClient, DemoTokenGrant};
pub use role::Role;
pub use session::{DemoSession, FileTokenStore, MemoryTokenStore, TokenStore, UntrustedClaims};
pub use telemetry::{create_demo_span, generate_correlation_id, init_telemetry};
