//! Catalog configuration loading from config.toml
//!
//! The production types and price list defined here seed the database on first
//! run or when entries are missing. Entries already in the database are never
//! overwritten, so edits made through the bot survive restarts.

use crate::core::document::StepTemplate;
use crate::errors::{Error, Result};
use serde::Deserialize;
use std::path::Path;

/// Configuration structure representing the entire config.toml file
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// Order settings
    #[serde(default)]
    pub orders: OrderSettings,
    /// Production types to seed
    #[serde(default)]
    pub production_types: Vec<ProductionTypeConfig>,
    /// Price list entries to seed
    #[serde(default)]
    pub pricing: Vec<PricingConfig>,
}

/// `[orders]` table
#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct OrderSettings {
    /// Prefix of generated production codes
    #[serde(default = "default_code_prefix")]
    pub code_prefix: String,
}

fn default_code_prefix() -> String {
    "ORD".to_string()
}

impl Default for OrderSettings {
    fn default() -> Self {
        Self {
            code_prefix: default_code_prefix(),
        }
    }
}

/// A production type and its step template
#[derive(Debug, Deserialize, Clone)]
pub struct ProductionTypeConfig {
    /// Display name
    pub name: String,
    /// Short code used on orders (e.g. "dtf")
    pub code: String,
    /// Ordered production steps
    #[serde(default)]
    pub steps: Vec<StepTemplate>,
}

/// A single price list entry
#[derive(Debug, Deserialize, Clone)]
pub struct PricingConfig {
    /// Lookup key (e.g. "dtf.price_per_cm2")
    pub key: String,
    /// Grouping for display
    pub category: String,
    /// Display name
    pub name: String,
    /// Numeric value
    pub value: f64,
    /// Unit label
    #[serde(default)]
    pub unit: String,
}

impl Config {
    fn validate(self) -> Result<Self> {
        if self.orders.code_prefix.trim().is_empty() {
            return Err(Error::Config {
                message: "orders.code_prefix cannot be empty".to_string(),
            });
        }
        if let Some(pt) = self.production_types.iter().find(|pt| pt.steps.is_empty()) {
            tracing::warn!(code = %pt.code, "Production type has no steps");
        }
        Ok(self)
    }
}

/// Parses a configuration from TOML text.
pub fn parse_config(contents: &str) -> Result<Config> {
    let config: Config = toml::from_str(contents).map_err(|e| Error::Config {
        message: format!("Failed to parse config.toml: {e}"),
    })?;
    config.validate()
}

/// Loads configuration from a TOML file
///
/// # Errors
/// Returns an error if:
/// - The file cannot be read
/// - The TOML syntax is invalid
/// - Required fields are missing
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<Config> {
    let contents = std::fs::read_to_string(path.as_ref()).map_err(|e| Error::Config {
        message: format!("Failed to read config file: {e}"),
    })?;
    parse_config(&contents)
}

/// Loads configuration from the default location (./config.toml)
pub fn load_default_config() -> Result<Config> {
    load_config("config.toml")
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::float_cmp)]
    use super::*;
    use crate::core::document::StepKind;

    #[test]
    fn test_parse_catalog_config() {
        let toml_str = r#"
            [orders]
            code_prefix = "SBL"

            [[production_types]]
            name = "DTF"
            code = "dtf"
            steps = [
                { name = "Print film", kind = "upload-image" },
                { name = "Heat press", kind = "mark-complete" },
            ]

            [[pricing]]
            key = "dtf.price_per_cm2"
            category = "dtf"
            name = "DTF per cm²"
            value = 25.0
            unit = "cm2"
        "#;

        let config = parse_config(toml_str).unwrap();
        assert_eq!(config.orders.code_prefix, "SBL");
        assert_eq!(config.production_types.len(), 1);
        assert_eq!(config.production_types[0].steps[0].kind, StepKind::UploadImage);
        assert_eq!(config.production_types[0].steps[1].kind, StepKind::MarkComplete);
        assert_eq!(config.pricing[0].value, 25.0);
    }

    #[test]
    fn test_defaults() {
        let config = parse_config("").unwrap();
        assert_eq!(config.orders.code_prefix, "ORD");
        assert!(config.production_types.is_empty());
        assert!(config.pricing.is_empty());
    }

    #[test]
    fn test_invalid_config() {
        assert!(matches!(
            parse_config("[orders]\ncode_prefix = \" \""),
            Err(Error::Config { .. })
        ));
        assert!(matches!(
            parse_config("[[production_types]]\nname = \"x\"\ncode = \"x\"\nsteps = [{ name = \"a\", kind = \"fold\" }]"),
            Err(Error::Config { .. })
        ));
    }

    #[test]
    fn test_bundled_config_parses() {
        let config = load_config(concat!(env!("CARGO_MANIFEST_DIR"), "/config.toml")).unwrap();
        assert!(!config.production_types.is_empty());
        assert!(config.pricing.iter().any(|p| p.key == "discount.bulk_percent"));
    }
}
