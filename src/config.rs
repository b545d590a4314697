use anyhow::Result;
use ::config::{Config, Environment, File, FileFormat};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::guard::{DemoGuard, GuardRuleSpec};

/// Main configuration structure for the demo engine
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct DemoConfig {
    /// Backend demo API settings
    pub api: ApiConfig,
    /// Tour settings
    pub demo: DemoSettings,
    /// Guard extensions
    pub guard: GuardConfig,
    /// Observability settings
    pub observability: ObservabilityConfig,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Backend base URL (FOODGRID_API_BASE overrides)
    pub base_url: String,
    /// Use `GET /api/v1/demo/auth/token/{role}` instead of `POST /api/v1/demo/token`
    pub legacy_token_route: bool,
    /// Sustained request rate
    pub requests_per_second: u32,
    /// Burst capacity
    pub burst: u32,
    /// Role token cache lifetime; 0 disables the cache
    pub token_ttl_seconds: u64,
    /// Per-request timeout
    pub timeout_seconds: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8080".to_string(),
            legacy_token_route: false,
            requests_per_second: 5,
            burst: 10,
            token_ttl_seconds: 300,
            timeout_seconds: 10,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct DemoSettings {
    /// Demo mode switch; the guard blocks nothing when off
    pub enabled: bool,
    /// Flow loaded when none is named
    pub default_flow: String,
    /// Extra flow definitions (.toml or .json) merged over the builtins
    pub flows_file: Option<String>,
    /// Where the CLI keeps fetched role tokens
    pub session_file: String,
}

impl Default for DemoSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            default_flow: "default".to_string(),
            flows_file: None,
            session_file: ".foodgrid-demo/session.json".to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum GuardProfile {
    /// Rules the web frontend applies
    #[default]
    Frontend,
    /// Rules the backend filter applies
    Server,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct GuardConfig {
    pub profile: GuardProfile,
    /// Rules appended after the profile's rules
    pub extra_rules: Vec<GuardRuleSpec>,
    /// Actions disabled on top of the standard denylist
    pub extra_disabled_actions: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level used when RUST_LOG is unset
    pub log_level: String,
    /// Emit JSON lines instead of human-readable logs
    pub json_logs: bool,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            json_logs: false,
        }
    }
}

impl DemoConfig {
    /// Load configuration from multiple sources with precedence:
    /// 1. Default values
    /// 2. Configuration files (foodgrid-demo.toml, .foodgrid-demo-rc)
    /// 3. Environment variables (prefixed with FOODGRID_DEMO__)
    pub fn load() -> Result<Self> {
        let mut builder = Config::builder().add_source(Config::try_from(&DemoConfig::default())?);

        if Path::new("foodgrid-demo.toml").exists() {
            builder = builder.add_source(File::with_name("foodgrid-demo"));
        }

        if Path::new(".foodgrid-demo-rc").exists() {
            builder = builder.add_source(
                File::with_name(".foodgrid-demo-rc").format(FileFormat::Toml),
            );
        }

        builder = builder.add_source(
            Environment::with_prefix("FOODGRID_DEMO")
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        );

        let mut demo_config: DemoConfig = builder.build()?.try_deserialize()?;
        demo_config.apply_api_base_override();
        Ok(demo_config)
    }

    /// Load defaults overlaid with a single explicit file
    pub fn load_from<P: AsRef<Path>>(path: P) -> Result<Self> {
        let config = Config::builder()
            .add_source(Config::try_from(&DemoConfig::default())?)
            .add_source(File::from(path.as_ref()))
            .build()?;
        let mut demo_config: DemoConfig = config.try_deserialize()?;
        demo_config.apply_api_base_override();
        Ok(demo_config)
    }

    fn apply_api_base_override(&mut self) {
        if let Ok(base) = std::env::var("FOODGRID_API_BASE") {
            if !base.trim().is_empty() {
                self.api.base_url = base;
            }
        }
    }

    /// Guard for the configured profile plus any configured extensions
    pub fn build_guard(&self) -> Result<DemoGuard> {
        if !self.demo.enabled {
            return Ok(DemoGuard::permissive());
        }
        let base = match self.guard.profile {
            GuardProfile::Frontend => DemoGuard::standard(),
            GuardProfile::Server => DemoGuard::server_mirror(),
        };
        Ok(base
            .with_rules(&self.guard.extra_rules)?
            .with_disabled_actions(self.guard.extra_disabled_actions.iter().cloned()))
    }

    /// Save configuration to file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let toml_content = toml::to_string_pretty(self)?;
        std::fs::write(path, toml_content)?;
        Ok(())
    }

    /// Load .env file if it exists
    pub fn load_env_file() -> Result<()> {
        if Path::new(".env").exists() {
            dotenvy::dotenv()?;
            tracing::info!("Loaded environment variables from .env file");
        }
        Ok(())
    }
}

/// Global configuration instance
static CONFIG: std::sync::LazyLock<Result<DemoConfig, anyhow::Error>> =
    std::sync::LazyLock::new(|| {
        let _ = DemoConfig::load_env_file();
        DemoConfig::load()
    });

/// Get the global configuration
pub fn config() -> Result<&'static DemoConfig> {
    CONFIG
        .as_ref()
        .map_err(|e| anyhow::anyhow!("Failed to load configuration: {}", e))
}
