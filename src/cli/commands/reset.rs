use anyhow::{Context, Result};

use super::file_session;
use crate::config::DemoConfig;
use crate::http::{DemoApi, DemoHttpClient};

pub struct ResetCommand {
    pub clear_session: bool,
}

impl ResetCommand {
    pub fn new() -> Self {
        Self {
            clear_session: false,
        }
    }

    pub fn with_clear_session(mut self, clear_session: bool) -> Self {
        self.clear_session = clear_session;
        self
    }

    pub async fn execute(&self, config: &DemoConfig) -> Result<()> {
        let client = DemoHttpClient::new(&config.api)?;

        println!("🔄 Resetting demo data at {}...", client.base_url());
        client
            .reset_demo_data()
            .await
            .context("Demo reset failed")?;
        println!("✅ Demo data restored to its seeded state");

        if self.clear_session {
            file_session(config).clear()?;
            println!("🧹 Stored demo tokens cleared");
        }
        Ok(())
    }
}

impl Default for ResetCommand {
    fn default() -> Self {
        Self::new()
    }
}
