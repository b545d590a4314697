use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use serde::Deserialize;

use super::SessionError;
use crate::role::Role;

/// Outlet id the backend seeds for demo sessions
pub const DEMO_OUTLET_ID: &str = "demo-outlet-1";

/// JWT payload fields read without verifying the signature.
///
/// Only for picking which screen to show. Never use these for authorization;
/// the backend re-validates every request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UntrustedClaims {
    #[serde(rename = "sub")]
    pub subject: Option<String>,
    pub principal_type: Option<String>,
    pub outlet_id: Option<String>,
    pub client_id: Option<String>,
    pub display_name: Option<String>,
    pub session_id: Option<String>,
    #[serde(default)]
    pub groups: Vec<String>,
}

impl UntrustedClaims {
    pub fn peek(token: &str) -> Result<Self, SessionError> {
        let mut parts = token.trim().split('.');
        let payload = match (parts.next(), parts.next(), parts.next(), parts.next()) {
            (Some(_), Some(payload), Some(_), None) if !payload.is_empty() => payload,
            _ => {
                return Err(SessionError::MalformedToken(
                    "expected three dot-separated segments".to_string(),
                ))
            }
        };

        let bytes = URL_SAFE_NO_PAD
            .decode(payload.trim_end_matches('='))
            .map_err(|e| SessionError::MalformedToken(e.to_string()))?;
        serde_json::from_slice(&bytes).map_err(|e| SessionError::MalformedToken(e.to_string()))
    }

    pub fn has_group(&self, group: &str) -> bool {
        self.groups.iter().any(|g| g.eq_ignore_ascii_case(group))
    }

    pub fn is_demo_outlet(&self) -> bool {
        self.outlet_id.as_deref() == Some(DEMO_OUTLET_ID)
    }

    /// Best guess at which demo persona issued this token
    pub fn suggested_role(&self) -> Option<Role> {
        match self.principal_type.as_deref() {
            Some("ADMIN") => return Some(Role::Admin),
            Some("CUSTOMER") => return Some(Role::Customer),
            _ => {}
        }
        if self.has_group("ADMIN") || self.has_group("CLIENT_ADMIN") {
            Some(Role::Admin)
        } else if self.has_group("KITCHEN") {
            Some(Role::Kitchen)
        } else if self.has_group("CASHIER") {
            Some(Role::Cashier)
        } else if self.has_group("MANAGER") || self.principal_type.as_deref() == Some("EMPLOYEE") {
            Some(Role::Staff)
        } else if self.has_group("CUSTOMER") {
            Some(Role::Customer)
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn token_with(payload: serde_json::Value) -> String {
        let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"HS256","typ":"JWT"}"#);
        let body = URL_SAFE_NO_PAD.encode(payload.to_string());
        format!("{header}.{body}.signature")
    }

    #[test]
    fn test_peek_reads_demo_employee_claims() {
        let token = token_with(json!({
            "sub": "demo-emp-kitchen",
            "principalType": "EMPLOYEE",
            "outletId": "demo-outlet-1",
            "groups": ["KITCHEN"]
        }));

        let claims = UntrustedClaims::peek(&token).unwrap();
        assert_eq!(claims.subject.as_deref(), Some("demo-emp-kitchen"));
        assert!(claims.is_demo_outlet());
        assert_eq!(claims.suggested_role(), Some(Role::Kitchen));
    }

    #[test]
    fn test_principal_type_takes_precedence_over_groups() {
        let token = token_with(json!({ "principalType": "ADMIN", "groups": ["CASHIER"] }));
        let claims = UntrustedClaims::peek(&token).unwrap();
        assert_eq!(claims.suggested_role(), Some(Role::Admin));
        assert!(!claims.is_demo_outlet());
    }

    #[test]
    fn test_malformed_tokens_are_rejected() {
        assert!(UntrustedClaims::peek("not-a-jwt").is_err());
        assert!(UntrustedClaims::peek("a..c").is_err());
        assert!(UntrustedClaims::peek("a.!!!.c").is_err());
    }
}
