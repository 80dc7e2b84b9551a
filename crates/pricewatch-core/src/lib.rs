//! Shared foundation for the pricewatch workspace: typed application
//! configuration, the product field carriers exchanged between acquisition
//! sources and the store, and the pure field normalizer.

use thiserror::Error;

pub mod app_config;
pub mod config;
pub mod fields;
pub mod normalize;

pub use app_config::{AppConfig, Environment, PaapiCredentials};
pub use config::{load_app_config, load_app_config_from_env};
pub use fields::{ProductFields, RawProductFields};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),
    #[error("invalid value for environment variable {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },
}
