//! Per-role demo tokens held for the lifetime of a demo session

pub mod claims;
pub mod store;

use std::path::PathBuf;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::role::Role;

pub use claims::{UntrustedClaims, DEMO_OUTLET_ID};
pub use store::{FileTokenStore, MemoryTokenStore, TokenStore};

#[cfg(any(test, feature = "testing"))]
pub use store::MockTokenStore;

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("Session storage I/O failed at {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Session storage is not valid JSON: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("Malformed token: {0}")]
    MalformedToken(String),
}

/// Storage key holding the demo token for `role`. Employee roles share one key.
pub fn storage_key(role: Role) -> &'static str {
    match role {
        Role::Customer => "fg_demo_customer_token",
        Role::Kitchen | Role::Staff | Role::Cashier => "fg_demo_staff_token",
        Role::Admin => "fg_demo_admin_token",
    }
}

/// Key the regular app reads its login token from
pub fn login_key(role: Role) -> &'static str {
    match role {
        Role::Admin => "fg_admin_access_token",
        Role::Customer => "fg_customer_token",
        Role::Kitchen | Role::Staff | Role::Cashier => "fg_access_token",
    }
}

/// Explicit holder of the tokens issued during one demo.
///
/// Storing a token also writes the app's login key so screens opened during
/// the demo act as that role. `clear` removes both.
#[derive(Clone)]
pub struct DemoSession {
    store: Arc<dyn TokenStore>,
}

impl std::fmt::Debug for DemoSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DemoSession").finish_non_exhaustive()
    }
}

impl DemoSession {
    pub fn new(store: Arc<dyn TokenStore>) -> Self {
        Self { store }
    }

    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryTokenStore::new()))
    }

    /// Store `token` under both keys. When the login alias cannot be written
    /// the demo key is restored to its previous value.
    pub fn set_token(&self, role: Role, token: &str) -> Result<(), SessionError> {
        let key = storage_key(role);
        let previous = self.store.get(key)?;
        self.store.set(key, token)?;

        if let Err(e) = self.store.set(login_key(role), token) {
            let restored = match &previous {
                Some(value) => self.store.set(key, value),
                None => self.store.remove(key),
            };
            if let Err(rollback) = restored {
                warn!(role = %role, key, error = %rollback, "Could not restore demo token");
            }
            return Err(e);
        }

        debug!(role = %role, key, "Demo token stored");
        Ok(())
    }

    pub fn token(&self, role: Role) -> Result<Option<String>, SessionError> {
        self.store.get(storage_key(role))
    }

    /// Claims of the stored token for `role`, if one is stored
    pub fn claims(&self, role: Role) -> Result<Option<UntrustedClaims>, SessionError> {
        self.token(role)?
            .map(|token| UntrustedClaims::peek(&token))
            .transpose()
    }

    /// Forget every demo token and login alias
    pub fn clear(&self) -> Result<(), SessionError> {
        let mut keys: Vec<&str> = Role::ALL
            .iter()
            .flat_map(|role| [storage_key(*role), login_key(*role)])
            .collect();
        keys.sort_unstable();
        keys.dedup();
        for key in keys {
            self.store.remove(key)?;
        }
        info!("Demo session cleared");
        Ok(())
    }
}
