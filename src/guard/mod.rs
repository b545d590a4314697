//! Demo-mode guard: refuses destructive HTTP calls and UI actions while the
//! tour is running against shared demo data.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::sync::OnceLock;
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Debug, Error)]
pub enum GuardError {
    #[error("Invalid guard pattern '{pattern}': {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },
    #[error("Guard rule for pattern '{0}' has an empty method")]
    EmptyMethod(String),
}

/// Serializable form of a rule, as written in configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GuardRuleSpec {
    pub method: String,
    pub pattern: String,
    pub message: String,
}

/// Blocks `method` requests whose path contains a match for `pattern`
#[derive(Debug, Clone)]
pub struct GuardRule {
    method: String,
    pattern: Regex,
    message: String,
}

impl GuardRule {
    pub fn new(method: &str, pattern: &str, message: &str) -> Result<Self, GuardError> {
        let method = method.trim().to_ascii_uppercase();
        if method.is_empty() {
            return Err(GuardError::EmptyMethod(pattern.to_string()));
        }
        let regex = Regex::new(pattern).map_err(|source| GuardError::InvalidPattern {
            pattern: pattern.to_string(),
            source,
        })?;
        Ok(Self {
            method,
            pattern: regex,
            message: message.to_string(),
        })
    }

    pub fn from_spec(spec: &GuardRuleSpec) -> Result<Self, GuardError> {
        Self::new(&spec.method, &spec.pattern, &spec.message)
    }

    pub fn method(&self) -> &str {
        &self.method
    }

    pub fn pattern(&self) -> &str {
        self.pattern.as_str()
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    fn blocks(&self, method: &str, path: &str) -> bool {
        self.method.eq_ignore_ascii_case(method) && self.pattern.is_match(path)
    }
}

const FRONTEND_RULES: &[(&str, &str, &str)] = &[
    ("DELETE", r"/api/v1/", "Delete operations are disabled in demo mode"),
    ("POST", r"/api/v1/payments/initiate", "Payment gateway is disabled in demo mode"),
    ("POST", r"/api/v1/payments/refund", "Refunds are disabled in demo mode"),
    ("PUT", r"/api/v1/admin/outlets/[^/]+$", "Outlet configuration is disabled in demo mode"),
    ("POST", r"/api/v1/outlets/.*/integrations", "Integrations are disabled in demo mode"),
];

const SERVER_MESSAGE: &str = "This operation is disabled in DEMO mode to preserve data integrity.";

const SERVER_RULES: &[(&str, &str, &str)] = &[
    ("DELETE", r".*", SERVER_MESSAGE),
    ("POST", r"^/api/v1/integrations", SERVER_MESSAGE),
    ("PUT", r"^/api/v1/integrations", SERVER_MESSAGE),
    ("POST", r"^/api/v1/exports", SERVER_MESSAGE),
    ("PUT", r"^/api/v1/exports", SERVER_MESSAGE),
    ("POST", r"^/api/v1/settlements", SERVER_MESSAGE),
    ("PUT", r"^/api/v1/settlements", SERVER_MESSAGE),
];

pub const DISABLED_ACTIONS: &[&str] = &[
    "delete-order",
    "delete-employee",
    "delete-outlet",
    "payment-gateway",
    "export-data",
    "integration-config",
];

fn compile(table: &[(&str, &str, &str)]) -> Vec<GuardRule> {
    table
        .iter()
        .filter_map(|(method, pattern, message)| match GuardRule::new(method, pattern, message) {
            Ok(rule) => Some(rule),
            Err(e) => {
                warn!(method = %method, pattern = %pattern, error = %e, "Skipping builtin guard rule");
                None
            }
        })
        .collect()
}

fn standard_actions() -> BTreeSet<String> {
    DISABLED_ACTIONS.iter().map(|action| action.to_string()).collect()
}

/// Ordered rule list plus the named-action denylist. First matching rule wins.
#[derive(Debug, Clone)]
pub struct DemoGuard {
    rules: Vec<GuardRule>,
    disabled_actions: BTreeSet<String>,
}

impl Default for DemoGuard {
    fn default() -> Self {
        Self::standard()
    }
}

impl DemoGuard {
    /// Guard with no rules and no disabled actions
    pub fn permissive() -> Self {
        Self {
            rules: Vec::new(),
            disabled_actions: BTreeSet::new(),
        }
    }

    /// Rules enforced by the demo frontend before a request leaves the browser
    pub fn standard() -> Self {
        Self {
            rules: compile(FRONTEND_RULES),
            disabled_actions: standard_actions(),
        }
    }

    /// Rules the backend applies to requests against the demo outlet
    pub fn server_mirror() -> Self {
        Self {
            rules: compile(SERVER_RULES),
            disabled_actions: standard_actions(),
        }
    }

    /// Append rules after the existing ones
    pub fn with_rules<'a, I>(mut self, specs: I) -> Result<Self, GuardError>
    where
        I: IntoIterator<Item = &'a GuardRuleSpec>,
    {
        for spec in specs {
            self.rules.push(GuardRule::from_spec(spec)?);
        }
        Ok(self)
    }

    pub fn with_disabled_actions<I, S>(mut self, actions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.disabled_actions.extend(actions.into_iter().map(Into::into));
        self
    }

    /// Message of the first rule blocking this request, if any
    pub fn check_blocked(&self, method: &str, path: &str) -> Option<&str> {
        let rule = self.rules.iter().find(|rule| rule.blocks(method, path))?;
        debug!(method = %method, path = %path, pattern = %rule.pattern(), "Request blocked by demo guard");
        Some(rule.message())
    }

    pub fn is_action_disabled(&self, action: &str) -> bool {
        self.disabled_actions.contains(action)
    }

    pub fn rules(&self) -> &[GuardRule] {
        &self.rules
    }

    pub fn disabled_actions(&self) -> impl Iterator<Item = &str> {
        self.disabled_actions.iter().map(String::as_str)
    }
}

static STANDARD_GUARD: OnceLock<DemoGuard> = OnceLock::new();

fn standard_guard() -> &'static DemoGuard {
    STANDARD_GUARD.get_or_init(DemoGuard::standard)
}

/// Check a request against the standard rule set
pub fn check_demo_blocked(method: &str, path: &str) -> Option<&'static str> {
    standard_guard().check_blocked(method, path)
}

pub fn is_demo_action_disabled(action: &str) -> bool {
    standard_guard().is_action_disabled(action)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_tables_compile_completely() {
        assert_eq!(DemoGuard::standard().rules().len(), FRONTEND_RULES.len());
        assert_eq!(DemoGuard::server_mirror().rules().len(), SERVER_RULES.len());
    }

    #[test]
    fn test_method_match_is_case_insensitive() {
        assert_eq!(
            check_demo_blocked("delete", "/api/v1/orders/42"),
            Some("Delete operations are disabled in demo mode")
        );
        assert_eq!(check_demo_blocked("GET", "/api/v1/orders/42"), None);
    }

    #[test]
    fn test_outlet_rule_only_matches_final_segment() {
        let guard = DemoGuard::standard();
        assert!(guard.check_blocked("PUT", "/api/v1/admin/outlets/outlet-7").is_some());
        assert!(guard.check_blocked("PUT", "/api/v1/admin/outlets/outlet-7/tables").is_none());
    }

    #[test]
    fn test_server_mirror_blocks_every_delete_and_prefixed_writes() {
        let guard = DemoGuard::server_mirror();
        assert_eq!(guard.check_blocked("DELETE", "/anything"), Some(SERVER_MESSAGE));
        assert!(guard.check_blocked("PUT", "/api/v1/exports/daily").is_some());
        assert!(guard.check_blocked("GET", "/api/v1/exports/daily").is_none());
        assert!(guard.check_blocked("POST", "/api/v1/orders").is_none());
    }

    #[test]
    fn test_server_mirror_keeps_action_denylist() {
        let guard = DemoGuard::server_mirror();
        for action in DISABLED_ACTIONS {
            assert!(guard.is_action_disabled(action), "{action}");
        }
    }

    #[test]
    fn test_uncompilable_table_entry_is_skipped() {
        let rules = compile(&[("POST", "([", "broken"), ("GET", "^/ok", "fine")]);
        assert_eq!(rules.len(), 1);
        assert_eq!(rules[0].message(), "fine");
    }

    #[test]
    fn test_invalid_pattern_is_reported() {
        let spec = GuardRuleSpec {
            method: "POST".into(),
            pattern: "([".into(),
            message: "never".into(),
        };
        let error = DemoGuard::standard().with_rules([&spec]).unwrap_err();
        assert!(matches!(error, GuardError::InvalidPattern { .. }));
    }

    #[test]
    fn test_action_denylist() {
        assert!(is_demo_action_disabled("export-data"));
        assert!(!is_demo_action_disabled("create-order"));

        let guard = DemoGuard::permissive().with_disabled_actions(["void-bill"]);
        assert!(guard.is_action_disabled("void-bill"));
        assert!(!guard.is_action_disabled("export-data"));
    }
}
