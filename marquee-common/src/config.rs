//! Configuration loading and root folder resolution

use crate::{Error, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Environment variable naming the root folder
pub const ROOT_FOLDER_ENV: &str = "MARQUEE_ROOT_FOLDER";

/// Service configuration from the TOML config file
///
/// All fields are optional; missing fields fall back to environment
/// variables or compiled defaults at the point of use.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TomlConfig {
    /// Root folder holding the database file
    pub root_folder: Option<String>,
    /// OMDb API key (lowest-priority source, see marquee-resolver config)
    pub omdb_api_key: Option<String>,
    /// Maximum number of memoized provider searches
    pub search_cache_capacity: Option<usize>,
    /// Seconds before a memoized provider search expires
    pub search_cache_ttl_seconds: Option<u64>,
}

impl TomlConfig {
    /// Load the platform config file, or defaults when none exists
    pub fn load() -> Self {
        match find_config_file() {
            Ok(path) => Self::load_from(&path).unwrap_or_else(|e| {
                tracing::warn!("Ignoring config file: {}", e);
                Self::default()
            }),
            Err(_) => Self::default(),
        }
    }

    /// Load configuration from an explicit TOML file path
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content)
            .map_err(|e| Error::Config(format!("Invalid config file {}: {}", path.display(), e)))
    }
}

/// Root folder resolution following priority order:
/// 1. Command-line argument (highest priority)
/// 2. Environment variable
/// 3. TOML config file
/// 4. OS-dependent compiled default (fallback)
pub fn resolve_root_folder(cli_arg: Option<&Path>, toml_config: &TomlConfig) -> PathBuf {
    // Priority 1: Command-line argument
    if let Some(path) = cli_arg {
        return path.to_path_buf();
    }

    // Priority 2: Environment variable
    if let Ok(path) = std::env::var(ROOT_FOLDER_ENV) {
        return PathBuf::from(path);
    }

    // Priority 3: TOML config file
    if let Some(root_folder) = &toml_config.root_folder {
        return PathBuf::from(root_folder);
    }

    // Priority 4: OS-dependent compiled default
    get_default_root_folder()
}

/// Path of the SQLite database inside the root folder
pub fn database_path(root_folder: &Path) -> PathBuf {
    root_folder.join("marquee.db")
}

/// Get default configuration file path for the platform
fn find_config_file() -> Result<PathBuf> {
    if cfg!(target_os = "linux") {
        // Try ~/.config/marquee/config.toml first, then /etc/marquee/config.toml
        let user_config = dirs::config_dir().map(|d| d.join("marquee").join("config.toml"));
        let system_config = PathBuf::from("/etc/marquee/config.toml");

        if let Some(path) = user_config {
            if path.exists() {
                return Ok(path);
            }
        }
        if system_config.exists() {
            return Ok(system_config);
        }
        return Err(Error::Config("No config file found".to_string()));
    }

    let config_path = dirs::config_dir()
        .map(|d| d.join("marquee").join("config.toml"))
        .ok_or_else(|| Error::Config("Could not determine config directory".to_string()))?;

    if config_path.exists() {
        Ok(config_path)
    } else {
        Err(Error::Config(format!("Config file not found: {:?}", config_path)))
    }
}

/// Get OS-dependent default root folder path
fn get_default_root_folder() -> PathBuf {
    if cfg!(target_os = "linux") {
        // ~/.local/share/marquee (or /var/lib/marquee for system-wide)
        dirs::data_local_dir()
            .map(|d| d.join("marquee"))
            .unwrap_or_else(|| PathBuf::from("/var/lib/marquee"))
    } else if cfg!(target_os = "macos") {
        // ~/Library/Application Support/marquee
        dirs::data_dir()
            .map(|d| d.join("marquee"))
            .unwrap_or_else(|| PathBuf::from("/Library/Application Support/marquee"))
    } else if cfg!(target_os = "windows") {
        // %LOCALAPPDATA%\marquee
        dirs::data_local_dir()
            .map(|d| d.join("marquee"))
            .unwrap_or_else(|| PathBuf::from("C:\\ProgramData\\marquee"))
    } else {
        PathBuf::from("./marquee_data")
    }
}
