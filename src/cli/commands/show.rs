use anyhow::Result;
use std::path::PathBuf;

use super::load_catalog;
use crate::config::DemoConfig;
use crate::flows::Flow;

pub struct ShowCommand {
    pub flow: String,
    pub file: Option<PathBuf>,
    pub json: bool,
}

impl ShowCommand {
    pub fn new(flow: String) -> Self {
        Self {
            flow,
            file: None,
            json: false,
        }
    }

    pub fn with_file(mut self, file: Option<PathBuf>) -> Self {
        self.file = file;
        self
    }

    pub fn with_json(mut self, json: bool) -> Self {
        self.json = json;
        self
    }

    pub fn execute(&self, config: &DemoConfig) -> Result<()> {
        let catalog = load_catalog(config, self.file.as_deref())?;
        let flow = catalog.get(&self.flow)?;

        if self.json {
            println!("{}", serde_json::to_string_pretty(flow)?);
        } else {
            print_flow(flow);
        }
        Ok(())
    }
}

fn print_flow(flow: &Flow) {
    println!("🗺️  Flow '{}' ({} steps)", flow.name(), flow.len());
    println!();
    for (index, step) in flow.steps().iter().enumerate() {
        println!("{:>2}. [{}] {} ({})", index + 1, step.role, step.title, step.id);
        if let Some(description) = &step.description {
            println!("      {description}");
        }
        if let Some(capability) = &step.capability {
            println!("      capability: {capability}");
        }
        match (&step.completion, step.auto_advance) {
            (_, true) => println!("      completes: automatically"),
            (Some(completion), false) if completion.when.is_empty() => {
                println!("      completes on: {}", completion.event)
            }
            (Some(completion), false) => println!(
                "      completes on: {} when {}",
                completion.event,
                serde_json::Value::Object(completion.when.clone())
            ),
            (None, false) => println!("      completes: never (no completion rule)"),
        }
        for hint in &step.hints {
            println!("      💡 {} → {:?}: {}", hint.anchor, hint.position, hint.title);
        }
    }
}
