// Guided-tour flow definitions: step model, anchors, builtins and file loading

pub mod anchors;
pub mod builtin;
pub mod catalog;
pub mod error;
pub mod types;

pub use anchors::{Anchor, UnknownAnchor};
pub use builtin::{customer_order_flow, default_flow, CUSTOMER_ORDER_FLOW, DEFAULT_FLOW};
pub use catalog::FlowCatalog;
pub use error::FlowError;
pub use types::{Completion, Flow, FlowStep, Hint, HintPosition};
