//! Configuration management for the Tillbook backend
//!
//! Supports hierarchical configuration loading:
//! 1. Default values in code
//! 2. Configuration files (development.toml, production.toml)
//! 3. Environment variable overrides with TILLBOOK_ prefix

use config::{ConfigError, Environment, File};
use serde::Deserialize;
use shared::analytics::{ClassifierThresholds, InsightParams};

/// Main application configuration
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// Current environment (development, production)
    pub environment: String,

    /// Server configuration
    pub server: ServerConfig,

    /// Database configuration
    pub database: DatabaseConfig,

    /// Analytics tuning knobs
    pub analytics: AnalyticsConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    /// Server port
    pub port: u16,

    /// Server host
    pub host: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    /// PostgreSQL connection URL
    pub url: String,

    /// Maximum number of connections in the pool
    pub max_connections: u32,

    /// Minimum number of connections in the pool
    pub min_connections: u32,
}

/// Thresholds and formula inputs for the analytics endpoints.
///
/// These default to values that suit a small retail shop; deployments
/// with faster or slower turnover override them per environment.
#[derive(Debug, Deserialize, Clone)]
pub struct AnalyticsConfig {
    pub critical_coverage_days: f64,
    pub low_coverage_days: f64,
    pub high_coverage_days: f64,
    pub overstock_coverage_days: f64,
    pub stagnant_low_stock: i32,
    pub stagnant_high_stock: i32,
    pub lead_time_days: f64,
    pub safety_factor: f64,
    pub order_cost: f64,
    pub annual_holding_rate: f64,
}

impl AnalyticsConfig {
    pub fn thresholds(&self) -> ClassifierThresholds {
        ClassifierThresholds {
            critical_coverage_days: self.critical_coverage_days,
            low_coverage_days: self.low_coverage_days,
            high_coverage_days: self.high_coverage_days,
            overstock_coverage_days: self.overstock_coverage_days,
            stagnant_low_stock: self.stagnant_low_stock,
            stagnant_high_stock: self.stagnant_high_stock,
        }
    }

    pub fn insight_params(&self) -> InsightParams {
        InsightParams {
            lead_time_days: self.lead_time_days,
            safety_factor: self.safety_factor,
            order_cost: self.order_cost,
            annual_holding_rate: self.annual_holding_rate,
        }
    }
}

impl Config {
    /// Load configuration from files and environment variables
    pub fn load() -> Result<Self, ConfigError> {
        let environment =
            std::env::var("TILLBOOK_ENVIRONMENT").unwrap_or_else(|_| "development".into());

        let defaults = ClassifierThresholds::default();
        let insight_defaults = InsightParams::default();

        let config = config::Config::builder()
            // Start with default values
            .set_default("environment", environment.clone())?
            .set_default("server.port", 3000)?
            .set_default("server.host", "0.0.0.0")?
            .set_default("database.max_connections", 10)?
            .set_default("database.min_connections", 2)?
            .set_default(
                "analytics.critical_coverage_days",
                defaults.critical_coverage_days,
            )?
            .set_default("analytics.low_coverage_days", defaults.low_coverage_days)?
            .set_default("analytics.high_coverage_days", defaults.high_coverage_days)?
            .set_default(
                "analytics.overstock_coverage_days",
                defaults.overstock_coverage_days,
            )?
            .set_default(
                "analytics.stagnant_low_stock",
                i64::from(defaults.stagnant_low_stock),
            )?
            .set_default(
                "analytics.stagnant_high_stock",
                i64::from(defaults.stagnant_high_stock),
            )?
            .set_default("analytics.lead_time_days", insight_defaults.lead_time_days)?
            .set_default("analytics.safety_factor", insight_defaults.safety_factor)?
            .set_default("analytics.order_cost", insight_defaults.order_cost)?
            .set_default(
                "analytics.annual_holding_rate",
                insight_defaults.annual_holding_rate,
            )?
            // Load environment-specific config file
            .add_source(File::with_name(&format!("config/{}", environment)).required(false))
            // Override with environment variables (TILLBOOK_ prefix)
            .add_source(
                Environment::with_prefix("TILLBOOK")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 3000,
            host: "0.0.0.0".to_string(),
        }
    }
}
