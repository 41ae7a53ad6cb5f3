//! Application settings loading from config.toml
//!
//! Settings cover the HTTP bind address and the defaults applied while
//! importing spreadsheets. Every field has a default so a missing file still
//! yields a usable configuration.

use crate::entities::Category;
use crate::errors::{Error, Result};
use serde::Deserialize;
use std::path::Path;
use tracing::{debug, info};

/// Configuration structure representing the entire config.toml file
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// HTTP server settings
    pub server: ServerConfig,
    /// Inventory defaults
    pub inventory: InventoryConfig,
}

/// `[server]` table
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Address the form handlers listen on
    pub bind_address: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: "127.0.0.1:3000".to_string(),
        }
    }
}

/// `[inventory]` table
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct InventoryConfig {
    /// Category assigned to spreadsheet rows with an unknown category label
    pub default_category: Category,
    /// Reorder threshold for imported rows with a blank MINIMO column
    pub default_min_stock: i32,
}

impl Default for InventoryConfig {
    fn default() -> Self {
        Self {
            default_category: Category::Herramienta,
            default_min_stock: 1,
        }
    }
}

/// Loads configuration from a TOML file
///
/// # Errors
/// Returns an error if:
/// - The file cannot be read
/// - The TOML syntax is invalid
/// - A field has the wrong type or an unknown category
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<AppConfig> {
    debug!("Loading configuration from {:?}", path.as_ref());
    let contents = std::fs::read_to_string(path.as_ref()).map_err(|e| Error::Config {
        message: format!("Failed to read config file: {e}"),
    })?;

    parse_config(&contents)
}

/// Parses configuration from TOML text.
pub fn parse_config(contents: &str) -> Result<AppConfig> {
    toml::from_str(contents).map_err(|e| Error::Config {
        message: format!("Failed to parse config.toml: {e}"),
    })
}

/// Loads configuration from `TOOLCRIB_CONFIG` (default `./config.toml`),
/// falling back to defaults when the file does not exist.
pub fn load_default_config() -> Result<AppConfig> {
    let path = std::env::var("TOOLCRIB_CONFIG").unwrap_or_else(|_| "config.toml".to_string());
    if Path::new(&path).exists() {
        load_config(&path)
    } else {
        info!("No configuration file at {path}, using defaults");
        Ok(AppConfig::default())
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;

    #[test]
    fn test_parse_full_config() {
        let toml_str = r#"
            [server]
            bind_address = "0.0.0.0:8080"

            [inventory]
            default_category = "Consumible"
            default_min_stock = 5
        "#;

        let config = parse_config(toml_str).unwrap();
        assert_eq!(config.server.bind_address, "0.0.0.0:8080");
        assert_eq!(config.inventory.default_category, Category::Consumible);
        assert_eq!(config.inventory.default_min_stock, 5);
    }

    #[test]
    fn test_missing_tables_use_defaults() {
        let config = parse_config("").unwrap();
        assert_eq!(config.server.bind_address, "127.0.0.1:3000");
        assert_eq!(config.inventory.default_category, Category::Herramienta);
        assert_eq!(config.inventory.default_min_stock, 1);
    }

    #[test]
    fn test_unknown_category_is_config_error() {
        let result = parse_config("[inventory]\ndefault_category = \"Refacciones\"\n");
        assert!(matches!(result, Err(Error::Config { .. })));
    }

    #[test]
    fn test_missing_file_is_config_error() {
        let result = load_config("definitely/not/here.toml");
        assert!(matches!(result, Err(Error::Config { .. })));
    }
}
