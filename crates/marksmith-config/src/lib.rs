//! Site configuration for marksmith: loads TOML or JSON files, merges them in
//! order and applies `KEY=VALUE` overrides.
pub mod config;
pub mod error;

pub use config::SiteConfig;
pub use error::ConfigError;
