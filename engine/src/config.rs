//! Configuration management for the Cylinder Stock inventory engine
//!
//! Supports hierarchical configuration loading:
//! 1. Default values in code
//! 2. Configuration files (development.toml, production.toml)
//! 3. Environment variable overrides with CYL_ prefix

use config::{ConfigError, Environment, File};
use serde::Deserialize;

/// Main engine configuration
#[derive(Debug, Deserialize, Clone)]
pub struct EngineConfig {
    /// Current environment (development, production)
    pub environment: String,

    /// Inventory policy knobs
    pub inventory: InventoryConfig,

    /// Variance workflow policy
    pub variance: VarianceConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct InventoryConfig {
    /// Default available-quantity threshold for low-stock alerts,
    /// in cylinder units
    pub low_stock_threshold: i64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct VarianceConfig {
    /// Whether variance documents created through the workflow need an
    /// approval before posting
    pub approval_required: bool,
}

impl EngineConfig {
    /// Load configuration from files and environment variables
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let environment = std::env::var("CYL_ENVIRONMENT").unwrap_or_else(|_| "development".into());

        let config = config::Config::builder()
            // Start with default values
            .set_default("environment", environment.clone())?
            .set_default("inventory.low_stock_threshold", 10)?
            .set_default("variance.approval_required", true)?
            // Load environment-specific config file
            .add_source(File::with_name(&format!("config/{}", environment)).required(false))
            // Override with environment variables (CYL_ prefix)
            .add_source(
                Environment::with_prefix("CYL")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            environment: "development".to_string(),
            inventory: InventoryConfig {
                low_stock_threshold: 10,
            },
            variance: VarianceConfig {
                approval_required: true,
            },
        }
    }
}
