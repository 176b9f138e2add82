//! Conversion configuration loading and validation.
//!
//! This crate provides:
//! - The typed [`ConvertConfig`] (JSON or TOML on disk)
//! - Config resolution (CLI → env → XDG → defaults)
//! - Semantic validation
//! - The compiled [`ChannelFilter`] used to select channels from a log

pub mod config;
pub mod filter;
pub mod resolve;
pub mod validate;

pub use config::ConvertConfig;
pub use filter::ChannelFilter;
pub use resolve::{resolve_config, ConfigPaths, ConfigSource, Overrides};
pub use validate::{validate, ValidationError};

/// Directory name under the user's config dir.
pub const CONFIG_DIR_NAME: &str = "lcm_tabulate";
