use anyhow::Result;
use std::process::ExitCode;

use super::EXIT_BLOCKED;
use crate::config::DemoConfig;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardVerdict {
    Allowed,
    Blocked(String),
}

impl GuardVerdict {
    pub fn exit_code(&self) -> ExitCode {
        match self {
            GuardVerdict::Allowed => ExitCode::SUCCESS,
            GuardVerdict::Blocked(_) => ExitCode::from(EXIT_BLOCKED),
        }
    }
}

pub struct CheckCommand {
    pub method: String,
    pub path: String,
}

impl CheckCommand {
    pub fn new(method: String, path: String) -> Self {
        Self { method, path }
    }

    pub fn execute(&self, config: &DemoConfig) -> Result<GuardVerdict> {
        let guard = config.build_guard()?;
        let verdict = match guard.check_blocked(&self.method, &self.path) {
            Some(message) => {
                println!("⛔ {} {} blocked: {}", self.method.to_uppercase(), self.path, message);
                GuardVerdict::Blocked(message.to_string())
            }
            None => {
                println!("✅ {} {} allowed", self.method.to_uppercase(), self.path);
                GuardVerdict::Allowed
            }
        };
        Ok(verdict)
    }
}

pub struct CheckActionCommand {
    pub action: String,
}

impl CheckActionCommand {
    pub fn new(action: String) -> Self {
        Self { action }
    }

    pub fn execute(&self, config: &DemoConfig) -> Result<GuardVerdict> {
        let guard = config.build_guard()?;
        if guard.is_action_disabled(&self.action) {
            println!("⛔ Action '{}' is disabled in demo mode", self.action);
            return Ok(GuardVerdict::Blocked(self.action.clone()));
        }
        println!("✅ Action '{}' allowed", self.action);
        Ok(GuardVerdict::Allowed)
    }
}
