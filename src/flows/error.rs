use std::path::PathBuf;
use thiserror::Error;

/// Configuration errors raised while building or looking up flows
#[derive(Debug, Error)]
pub enum FlowError {
    #[error("Flow '{}' not found (available: {})", .name, .available.join(", "))]
    NotFound { name: String, available: Vec<String> },

    #[error("Flow '{0}' has no steps")]
    EmptyFlow(String),

    #[error("Flow '{flow}' defines step '{step}' more than once")]
    DuplicateStep { flow: String, step: String },

    #[error("Flow '{flow}' step '{step}' has a completion rule without an event type")]
    EmptyCompletionEvent { flow: String, step: String },

    #[error("Failed to read flow file {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse flow definitions from {origin}: {message}")]
    Parse { origin: String, message: String },

    #[error("Unsupported flow file format '{0}' (expected .toml or .json)")]
    UnsupportedFormat(String),
}
