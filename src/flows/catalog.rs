use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;
use tracing::{debug, info};

use super::builtin::{customer_order_flow, default_flow};
use super::error::FlowError;
use super::types::{Flow, FlowStep};

/// On-disk layout shared by TOML and JSON flow files
#[derive(Debug, Deserialize)]
struct FlowFile {
    #[serde(default)]
    flows: BTreeMap<String, Vec<FlowStep>>,
}

/// Named flows available to the controller
#[derive(Debug, Clone, Default)]
pub struct FlowCatalog {
    flows: BTreeMap<String, Flow>,
}

impl FlowCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Catalog holding the `default` and `customer-order` flows
    pub fn builtin() -> Self {
        let mut catalog = Self::new();
        catalog.insert(default_flow());
        catalog.insert(customer_order_flow());
        catalog
    }

    pub fn get(&self, name: &str) -> Result<&Flow, FlowError> {
        self.flows.get(name).ok_or_else(|| FlowError::NotFound {
            name: name.to_string(),
            available: self.names().into_iter().map(str::to_string).collect(),
        })
    }

    pub fn contains(&self, name: &str) -> bool {
        self.flows.contains_key(name)
    }

    /// Adds or replaces a flow, returning the one it replaced
    pub fn insert(&mut self, flow: Flow) -> Option<Flow> {
        self.flows.insert(flow.name().to_string(), flow)
    }

    /// Flow names in sorted order
    pub fn names(&self) -> Vec<&str> {
        self.flows.keys().map(String::as_str).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Flow> {
        self.flows.values()
    }

    pub fn len(&self) -> usize {
        self.flows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.flows.is_empty()
    }

    /// Overlay `other` on this catalog; flows with the same name are replaced
    pub fn merge(&mut self, other: FlowCatalog) {
        for (name, flow) in other.flows {
            if self.flows.insert(name.clone(), flow).is_some() {
                debug!(flow = %name, "Flow definition overridden");
            }
        }
    }

    /// Load flows from a `.toml` or `.json` file
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, FlowError> {
        let path = path.as_ref();
        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_ascii_lowercase)
            .unwrap_or_default();

        let content = std::fs::read_to_string(path).map_err(|source| FlowError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let origin = path.display().to_string();

        let catalog = match extension.as_str() {
            "toml" => Self::parse_toml(&content, &origin)?,
            "json" => Self::parse_json(&content, &origin)?,
            _ => return Err(FlowError::UnsupportedFormat(origin)),
        };

        info!(path = %origin, flows = catalog.len(), "Loaded flow definitions");
        Ok(catalog)
    }

    pub fn from_toml_str(content: &str) -> Result<Self, FlowError> {
        Self::parse_toml(content, "<toml>")
    }

    pub fn from_json_str(content: &str) -> Result<Self, FlowError> {
        Self::parse_json(content, "<json>")
    }

    fn parse_toml(content: &str, origin: &str) -> Result<Self, FlowError> {
        let file: FlowFile = toml::from_str(content).map_err(|e| FlowError::Parse {
            origin: origin.to_string(),
            message: e.to_string(),
        })?;
        Self::from_file(file)
    }

    fn parse_json(content: &str, origin: &str) -> Result<Self, FlowError> {
        let file: FlowFile = serde_json::from_str(content).map_err(|e| FlowError::Parse {
            origin: origin.to_string(),
            message: e.to_string(),
        })?;
        Self::from_file(file)
    }

    fn from_file(file: FlowFile) -> Result<Self, FlowError> {
        let mut catalog = Self::new();
        for (name, steps) in file.flows {
            catalog.insert(Flow::new(name, steps)?);
        }
        Ok(catalog)
    }
}
