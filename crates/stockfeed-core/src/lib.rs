pub mod aggregate;
pub mod app_config;
pub mod catalog;
pub mod config;
pub mod extract;

pub use aggregate::{build_catalog, build_document, CatalogSettings, PriceBook, SourceRow};
pub use app_config::{AppConfig, Environment};
pub use catalog::{CatalogDocument, CatalogGroup, CatalogProduct, RamMb};
pub use config::{load_app_config, load_app_config_from_env};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable {0}")]
    MissingEnvVar(String),
    #[error("invalid value for environment variable {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },
}
