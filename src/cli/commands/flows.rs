use anyhow::Result;
use std::path::PathBuf;

use super::load_catalog;
use crate::config::DemoConfig;

pub struct FlowsCommand {
    pub file: Option<PathBuf>,
}

impl FlowsCommand {
    pub fn new(file: Option<PathBuf>) -> Self {
        Self { file }
    }

    pub fn execute(&self, config: &DemoConfig) -> Result<()> {
        let catalog = load_catalog(config, self.file.as_deref())?;

        println!("📋 Available flows ({}):", catalog.len());
        for flow in catalog.iter() {
            let marker = if flow.name() == config.demo.default_flow {
                " (default)"
            } else {
                ""
            };
            let first_role = flow.step(0).map(|step| step.role.as_str()).unwrap_or("-");
            println!(
                "  {:<20} {} steps, starts as {}{}",
                flow.name(),
                flow.len(),
                first_role,
                marker
            );
        }
        Ok(())
    }
}
