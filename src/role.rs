use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Personas an operator can preview during the demo
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Customer,
    Kitchen,
    Staff,
    Cashier,
    Admin,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("Unknown demo role '{value}' (expected one of: customer, kitchen, staff, cashier, admin)")]
pub struct ParseRoleError {
    pub value: String,
}

impl Role {
    pub const ALL: [Role; 5] = [
        Role::Customer,
        Role::Kitchen,
        Role::Staff,
        Role::Cashier,
        Role::Admin,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Customer => "customer",
            Role::Kitchen => "kitchen",
            Role::Staff => "staff",
            Role::Cashier => "cashier",
            Role::Admin => "admin",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = ParseRoleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lowered = s.trim().to_ascii_lowercase();
        Role::ALL
            .iter()
            .copied()
            .find(|role| role.as_str() == lowered)
            .ok_or_else(|| ParseRoleError {
                value: s.to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_parsing_is_case_insensitive() {
        assert_eq!("Admin".parse::<Role>().unwrap(), Role::Admin);
        assert_eq!(" kitchen ".parse::<Role>().unwrap(), Role::Kitchen);
        assert!("manager".parse::<Role>().is_err());
    }

    #[test]
    fn test_role_serializes_lowercase() {
        let json = serde_json::to_string(&Role::Cashier).unwrap();
        assert_eq!(json, "\"cashier\"");
    }
}
