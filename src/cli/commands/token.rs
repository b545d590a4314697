use anyhow::{Context, Result};

use super::file_session;
use crate::capabilities::landing_route;
use crate::config::DemoConfig;
use crate::http::{DemoApi, DemoHttpClient};
use crate::role::Role;
use crate::session::UntrustedClaims;

pub struct TokenCommand {
    pub role: Role,
    pub legacy_route: bool,
}

impl TokenCommand {
    pub fn new(role: Role) -> Self {
        Self {
            role,
            legacy_route: false,
        }
    }

    pub fn with_legacy_route(mut self, legacy_route: bool) -> Self {
        self.legacy_route = legacy_route;
        self
    }

    pub async fn execute(&self, config: &DemoConfig) -> Result<()> {
        let mut api_config = config.api.clone();
        api_config.legacy_token_route |= self.legacy_route;
        let client = DemoHttpClient::new(&api_config)?;

        println!("🔑 Requesting {} token from {}...", self.role, client.base_url());
        let grant = client
            .fetch_role_token(self.role)
            .await
            .with_context(|| format!("Failed to fetch demo token for {}", self.role))?;

        let session = file_session(config);
        session.set_token(self.role, &grant.access_token)?;
        println!("✅ Token stored in {}", config.demo.session_file);

        if let Some(name) = &grant.display_name {
            println!("   👤 {name}");
        }
        if let Some(outlet) = &grant.outlet_id {
            println!("   🏪 Outlet: {outlet}");
        }
        match UntrustedClaims::peek(&grant.access_token) {
            Ok(claims) => {
                if let Some(role) = claims.suggested_role() {
                    println!("   🧭 Token reads as {role}; landing page {}", landing_route(role));
                }
            }
            Err(e) => tracing::debug!(error = %e, "Token payload not readable"),
        }
        Ok(())
    }
}
