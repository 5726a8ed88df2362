//! Configuration for the service indicator.
//!
//! The configuration lives in an INI file with three sections:
//! - `[Service]`: unit name, indicator id and poll interval
//! - `[Icons]`: icon paths and their accessible descriptions
//! - `[Messages]`: menu labels and the quit confirmation text
//!
//! Every key is required. Relative icon paths are resolved against the
//! directory holding the configuration file.
use directories::ProjectDirs;
use ini::{Ini, ParseOption};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// File name looked up next to the executable and in the user config dir
pub const CONFIG_FILE_NAME: &str = "service-indicator.ini";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Error: Missing required configuration '{key}' in section '[{section}]'.")]
    MissingKey {
        section: &'static str,
        key: &'static str,
    },

    #[error("Error: Invalid value '{value}' for '{key}' in section '[{section}]': {reason}.")]
    InvalidValue {
        section: &'static str,
        key: &'static str,
        value: String,
        reason: String,
    },

    #[error("Error: Could not read configuration file '{}': {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: ini::Error,
    },

    #[error("Error: No configuration file found (looked next to the executable and at {})", .searched.display())]
    NotFound { searched: PathBuf },
}

/// `[Service]` section
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceSection {
    /// systemd unit name
    pub name: String,
    /// Unique identifier of the tray indicator
    pub indicator_id: String,
    /// Poll interval in seconds, always > 0
    pub update_delay: u32,
}

/// An icon file together with its accessible description
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IconSpec {
    pub path: PathBuf,
    pub description: String,
}

/// `[Icons]` section
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IconsSection {
    pub active: IconSpec,
    pub inactive: IconSpec,
}

/// `[Messages]` section
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessagesSection {
    pub quit_primary: String,
    pub quit_secondary: String,
    pub start: String,
    pub stop: String,
    pub quit: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndicatorConfig {
    pub service: ServiceSection,
    pub icons: IconsSection,
    pub messages: MessagesSection,
}

impl IndicatorConfig {
    /// Build the configuration from a parsed INI document.
    ///
    /// Keys are checked in file-schema order, so the first missing key is
    /// the one reported.
    pub fn from_ini(ini: &Ini, base_dir: &Path) -> Result<Self, ConfigError> {
        let get = |section: &'static str, key: &'static str| -> Result<String, ConfigError> {
            ini.section(Some(section))
                .and_then(|props| props.get(key))
                .map(str::to_string)
                .ok_or(ConfigError::MissingKey { section, key })
        };

        let name = get("Service", "name")?;
        let indicator_id = get("Service", "indicator_id")?;
        let update_delay = parse_delay(&get("Service", "update_delay")?)?;

        let active = base_dir.join(get("Icons", "active")?);
        let active_description = get("Icons", "active_description")?;
        let inactive = base_dir.join(get("Icons", "inactive")?);
        let inactive_description = get("Icons", "inactive_description")?;

        let messages = MessagesSection {
            quit_primary: get("Messages", "quit_primary")?,
            quit_secondary: get("Messages", "quit_secondary")?,
            start: get("Messages", "start")?,
            stop: get("Messages", "stop")?,
            quit: get("Messages", "quit")?,
        };

        Ok(Self {
            service: ServiceSection {
                name,
                indicator_id,
                update_delay,
            },
            icons: IconsSection {
                active: IconSpec {
                    path: active,
                    description: active_description,
                },
                inactive: IconSpec {
                    path: inactive,
                    description: inactive_description,
                },
            },
            messages,
        })
    }
}

fn parse_delay(raw: &str) -> Result<u32, ConfigError> {
    let invalid = |reason: &str| ConfigError::InvalidValue {
        section: "Service",
        key: "update_delay",
        value: raw.to_string(),
        reason: reason.to_string(),
    };

    let secs: u32 = raw
        .trim()
        .parse()
        .map_err(|_| invalid("expected a whole number of seconds"))?;
    if secs == 0 {
        return Err(invalid("must be at least 1 second"));
    }
    Ok(secs)
}

/// Values are taken literally: no backslash escapes, no quote stripping
fn parse_options() -> ParseOption {
    ParseOption {
        enabled_quote: false,
        enabled_escape: false,
        ..Default::default()
    }
}

/// Load and validate the configuration file at `path`
pub fn load_config(path: &Path) -> Result<IndicatorConfig, ConfigError> {
    let ini = Ini::load_from_file_opt(path, parse_options()).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;

    let base_dir = path.parent().unwrap_or_else(|| Path::new("."));
    let config = IndicatorConfig::from_ini(&ini, base_dir)?;

    tracing::debug!(
        "Loaded configuration for '{}' from {:?}",
        config.service.name,
        path
    );
    Ok(config)
}

/// Per-user configuration directory (~/.config/service-indicator on Linux)
pub fn get_config_directory() -> Option<PathBuf> {
    ProjectDirs::from("", "", "service-indicator").map(|dirs| dirs.config_dir().to_path_buf())
}

/// Decide which configuration file to load.
///
/// An explicit path always wins. Otherwise the file next to the running
/// executable is used when present, then the per-user config directory.
pub fn resolve_config_path(explicit: Option<PathBuf>) -> Result<PathBuf, ConfigError> {
    if let Some(path) = explicit {
        return Ok(path);
    }

    let beside_exe = std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(|dir| dir.join(CONFIG_FILE_NAME)));
    let user_dir = get_config_directory();

    pick_config_path(beside_exe, user_dir)
}

fn pick_config_path(
    beside_exe: Option<PathBuf>,
    user_dir: Option<PathBuf>,
) -> Result<PathBuf, ConfigError> {
    if let Some(path) = beside_exe.filter(|p| p.is_file()) {
        return Ok(path);
    }

    let user_path = user_dir
        .map(|dir| dir.join(CONFIG_FILE_NAME))
        .unwrap_or_else(|| PathBuf::from(CONFIG_FILE_NAME));
    if user_path.is_file() {
        Ok(user_path)
    } else {
        Err(ConfigError::NotFound {
            searched: user_path,
        })
    }
}
