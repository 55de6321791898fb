//! Configuration module for course-backup.
//!
//! This module handles:
//! - Loading configuration from TOML files
//! - Configuration validation

pub mod loader;
pub mod validation;

pub use loader::{Config, NetworkConfig, OptionsConfig};
pub use validation::validate_config;
