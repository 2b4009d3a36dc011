//! Application configuration loaded from environment variables.

use std::path::{Path, PathBuf};
use std::time::Duration;

use domain::Money;
use serde::Deserialize;
use services::ServiceSettings;
use store::{ProductSnapshot, ProductStatus};
use thiserror::Error;

/// Errors raised while loading configuration files.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid catalog file {path}: {source}")]
    Catalog {
        path: PathBuf,
        source: serde_json::Error,
    },
}

/// Server configuration with sensible defaults.
///
/// Reads from environment variables:
/// - `HOST` — bind address (default: `"0.0.0.0"`)
/// - `PORT` — listen port (default: `3000`)
/// - `RUST_LOG` — tracing filter directive (default: `"info"`)
/// - `REQUEST_TIMEOUT_MS` — per-request deadline (default: `5000`)
/// - `CART_TTL_SECS` — cart expiry (default: 7 days)
/// - `PRODUCT_CACHE_TTL_SECS` — product cache expiry (default: 15 minutes)
/// - `DATABASE_URL` — PostgreSQL URL for orders; in-memory when unset
/// - `CATALOG_FILE` — JSON product list loaded into the catalog at startup
#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub log_level: String,
    pub request_timeout: Duration,
    pub cart_ttl: Duration,
    pub product_cache_ttl: Duration,
    pub database_url: Option<String>,
    pub catalog_file: Option<PathBuf>,
}

/// One product in a catalog file.
#[derive(Debug, Deserialize)]
struct CatalogEntry {
    product_id: String,
    name: String,
    price_cents: i64,
    #[serde(default = "active")]
    status: ProductStatus,
}

fn active() -> ProductStatus {
    ProductStatus::Active
}

impl From<CatalogEntry> for ProductSnapshot {
    fn from(entry: CatalogEntry) -> Self {
        ProductSnapshot::new(
            entry.product_id,
            entry.name,
            Money::from_cents(entry.price_cents),
            entry.status,
        )
    }
}

impl Config {
    /// Loads configuration from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            host: std::env::var("HOST").unwrap_or(defaults.host),
            port: env_parse("PORT").unwrap_or(defaults.port),
            log_level: std::env::var("RUST_LOG").unwrap_or(defaults.log_level),
            request_timeout: env_parse("REQUEST_TIMEOUT_MS")
                .map(Duration::from_millis)
                .unwrap_or(defaults.request_timeout),
            cart_ttl: env_parse("CART_TTL_SECS")
                .map(Duration::from_secs)
                .unwrap_or(defaults.cart_ttl),
            product_cache_ttl: env_parse("PRODUCT_CACHE_TTL_SECS")
                .map(Duration::from_secs)
                .unwrap_or(defaults.product_cache_ttl),
            database_url: std::env::var("DATABASE_URL")
                .ok()
                .filter(|url| !url.trim().is_empty()),
            catalog_file: std::env::var("CATALOG_FILE")
                .ok()
                .filter(|path| !path.trim().is_empty())
                .map(PathBuf::from),
        }
    }

    /// Reads the products listed in `catalog_file`. No file means an empty
    /// catalog.
    pub fn load_catalog(&self) -> Result<Vec<ProductSnapshot>, ConfigError> {
        match &self.catalog_file {
            Some(path) => read_catalog(path),
            None => Ok(Vec::new()),
        }
    }

    /// Returns the `"host:port"` bind address string.
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn service_settings(&self) -> ServiceSettings {
        ServiceSettings {
            cart_ttl: self.cart_ttl,
            product_cache_ttl: self.product_cache_ttl,
        }
    }
}

fn read_catalog(path: &Path) -> Result<Vec<ProductSnapshot>, ConfigError> {
    let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let entries: Vec<CatalogEntry> =
        serde_json::from_str(&raw).map_err(|source| ConfigError::Catalog {
            path: path.to_path_buf(),
            source,
        })?;
    Ok(entries.into_iter().map(ProductSnapshot::from).collect())
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|v| v.parse().ok())
}

impl Default for Config {
    fn default() -> Self {
        let settings = ServiceSettings::default();
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            log_level: "info".to_string(),
            request_timeout: Duration::from_millis(5000),
            cart_ttl: settings.cart_ttl,
            product_cache_ttl: settings.product_cache_ttl,
            database_url: None,
            catalog_file: None,
        }
    }
}
