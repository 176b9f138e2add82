//! Config resolution: CLI → env → config file → defaults.

use std::path::{Path, PathBuf};

use lt_common::FlatFormat;

use crate::config::ConvertConfig;
use crate::validate::{validate, ValidationError};
use crate::CONFIG_DIR_NAME;

/// Environment variable naming a config file.
pub const ENV_CONFIG: &str = "LT_CONFIG";

/// Environment variable listing type catalogs (platform path separator).
pub const ENV_TYPE_CATALOGS: &str = "LT_TYPE_CATALOGS";

/// Values supplied on the command line; `None`/`false` means "not given".
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub channels: Option<String>,
    pub ignore: Option<String>,
    pub separator: Option<String>,
    pub print: bool,
    pub print_format: bool,
    pub no_log_time: bool,
    pub flat_format: Option<FlatFormat>,
    pub type_catalogs: Vec<PathBuf>,
    pub output: Option<PathBuf>,
}

/// Where the file layer of the configuration came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSource {
    /// `--config` on the command line.
    Explicit(PathBuf),
    /// The `LT_CONFIG` environment variable.
    Environment(PathBuf),
    /// The per-user config directory.
    UserDir(PathBuf),
    /// No file; built-in defaults.
    Defaults,
}

/// Paths consulted while resolving.
#[derive(Debug, Clone)]
pub struct ConfigPaths {
    pub source: ConfigSource,
}

impl ConfigPaths {
    pub fn using_defaults(&self) -> bool {
        self.source == ConfigSource::Defaults
    }
}

/// Default per-user config file location.
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join(CONFIG_DIR_NAME).join("config.json"))
}

/// Resolve against the process environment and the user's config dir.
pub fn resolve_config(
    explicit: Option<&Path>,
    overrides: &Overrides,
) -> Result<(ConvertConfig, ConfigPaths), ValidationError> {
    resolve_with(
        explicit,
        overrides,
        |key| std::env::var(key).ok(),
        default_config_path(),
    )
}

/// Resolution with injectable environment lookup and user config path.
pub fn resolve_with(
    explicit: Option<&Path>,
    overrides: &Overrides,
    env: impl Fn(&str) -> Option<String>,
    user_path: Option<PathBuf>,
) -> Result<(ConvertConfig, ConfigPaths), ValidationError> {
    let source = if let Some(path) = explicit {
        ConfigSource::Explicit(path.to_path_buf())
    } else if let Some(path) = env(ENV_CONFIG).filter(|p| !p.is_empty()) {
        ConfigSource::Environment(PathBuf::from(path))
    } else {
        match user_path {
            Some(path) if path.exists() => ConfigSource::UserDir(path),
            _ => ConfigSource::Defaults,
        }
    };

    let mut config = match &source {
        ConfigSource::Explicit(path)
        | ConfigSource::Environment(path)
        | ConfigSource::UserDir(path) => ConvertConfig::from_file(path)?,
        ConfigSource::Defaults => ConvertConfig::default(),
    };

    if let Some(list) = env(ENV_TYPE_CATALOGS) {
        let from_env: Vec<PathBuf> = std::env::split_paths(&list)
            .filter(|p| !p.as_os_str().is_empty())
            .collect();
        if !from_env.is_empty() {
            config.type_catalogs = from_env;
        }
    }

    apply_overrides(&mut config, overrides);
    validate(&config)?;

    Ok((config, ConfigPaths { source }))
}

fn apply_overrides(config: &mut ConvertConfig, o: &Overrides) {
    if let Some(v) = &o.channels {
        config.channels = v.clone();
    }
    if let Some(v) = &o.ignore {
        config.ignore = Some(v.clone());
    }
    if let Some(v) = &o.separator {
        config.separator = v.clone();
    }
    if o.print {
        config.print = true;
    }
    if o.print_format {
        config.print_format = true;
    }
    if o.no_log_time {
        config.append_log_time = false;
    }
    if let Some(v) = o.flat_format {
        config.flat_format = v;
    }
    if !o.type_catalogs.is_empty() {
        config.type_catalogs = o.type_catalogs.clone();
    }
    if let Some(v) = &o.output {
        config.output = Some(v.clone());
    }
}
