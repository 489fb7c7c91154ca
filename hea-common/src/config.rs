//! Configuration loading and data directory resolution
//!
//! The data directory (database + anything else the service persists) is
//! resolved with the following priority order:
//! 1. Command-line argument (highest priority)
//! 2. `HEA_DATA_DIR` environment variable
//! 3. TOML config file (`data_dir` key)
//! 4. OS-dependent compiled default (fallback)

use crate::{Error, Result};
use serde::Deserialize;
use std::path::PathBuf;

/// Environment variable consulted for the data directory
pub const DATA_DIR_ENV: &str = "HEA_DATA_DIR";

/// Settings read from the optional TOML config file
#[derive(Debug, Clone, Deserialize, Default)]
pub struct TomlConfig {
    /// Data directory override
    pub data_dir: Option<String>,
    /// Socket address the HTTP server binds to
    pub bind_address: Option<String>,
    /// Artificial analysis delay in milliseconds
    pub analysis_delay_ms: Option<u64>,
}

/// Fully resolved service configuration
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub data_dir: PathBuf,
    pub bind_address: String,
    pub analysis_delay_ms: u64,
}

impl ServiceConfig {
    /// Path of the sqlite database inside the data directory
    pub fn database_path(&self) -> PathBuf {
        self.data_dir.join("hea.db")
    }
}

/// Resolve the full service configuration
///
/// `cli_data_dir` and `cli_bind` come from command-line arguments and take
/// priority over environment and TOML values.
pub fn resolve(cli_data_dir: Option<&str>, cli_bind: Option<&str>) -> ServiceConfig {
    let toml_config = load_toml_config().unwrap_or_default();

    let data_dir = resolve_data_dir(cli_data_dir, &toml_config);

    let bind_address = cli_bind
        .map(str::to_string)
        .or_else(|| toml_config.bind_address.clone())
        .unwrap_or_else(|| "127.0.0.1:8000".to_string());

    let analysis_delay_ms = toml_config.analysis_delay_ms.unwrap_or(3000);

    ServiceConfig {
        data_dir,
        bind_address,
        analysis_delay_ms,
    }
}

/// Resolve the data directory following the documented priority order
pub fn resolve_data_dir(cli_arg: Option<&str>, toml_config: &TomlConfig) -> PathBuf {
    // Priority 1: Command-line argument
    if let Some(path) = cli_arg {
        return PathBuf::from(path);
    }

    // Priority 2: Environment variable
    if let Ok(path) = std::env::var(DATA_DIR_ENV) {
        return PathBuf::from(path);
    }

    // Priority 3: TOML config file
    if let Some(path) = &toml_config.data_dir {
        return PathBuf::from(path);
    }

    // Priority 4: OS-dependent compiled default
    default_data_dir()
}

/// Ensure the data directory exists, creating it if missing
pub fn ensure_data_dir(dir: &std::path::Path) -> Result<()> {
    if !dir.exists() {
        std::fs::create_dir_all(dir)?;
        tracing::info!("Created data directory: {}", dir.display());
    }
    Ok(())
}

/// Load the optional TOML config file
///
/// Looks for `~/.config/hea/config.toml` first, then `/etc/hea/config.toml`
/// on Linux. Absence of a config file is not an error.
pub fn load_toml_config() -> Result<TomlConfig> {
    let path = find_config_file()?;
    let content = std::fs::read_to_string(&path)?;
    toml::from_str(&content)
        .map_err(|e| Error::Config(format!("Failed to parse {}: {}", path.display(), e)))
}

fn find_config_file() -> Result<PathBuf> {
    if let Some(user_config) = dirs::config_dir().map(|d| d.join("hea").join("config.toml")) {
        if user_config.exists() {
            return Ok(user_config);
        }
    }

    if cfg!(target_os = "linux") {
        let system_config = PathBuf::from("/etc/hea/config.toml");
        if system_config.exists() {
            return Ok(system_config);
        }
    }

    Err(Error::Config("No config file found".to_string()))
}

/// OS-dependent default data directory
fn default_data_dir() -> PathBuf {
    dirs::data_local_dir()
        .map(|d| d.join("hea"))
        .unwrap_or_else(|| PathBuf::from("./hea_data"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_argument_wins() {
        let toml_config = TomlConfig {
            data_dir: Some("/from/toml".to_string()),
            ..Default::default()
        };
        let dir = resolve_data_dir(Some("/from/cli"), &toml_config);
        assert_eq!(dir, PathBuf::from("/from/cli"));
    }

    #[test]
    fn toml_used_when_no_cli_or_env() {
        let toml_config = TomlConfig {
            data_dir: Some("/from/toml".to_string()),
            ..Default::default()
        };
        // Only valid when the env var is not set in the test environment
        if std::env::var(DATA_DIR_ENV).is_err() {
            let dir = resolve_data_dir(None, &toml_config);
            assert_eq!(dir, PathBuf::from("/from/toml"));
        }
    }

    #[test]
    fn database_path_is_inside_data_dir() {
        let config = ServiceConfig {
            data_dir: PathBuf::from("/tmp/hea-test"),
            bind_address: "127.0.0.1:8000".to_string(),
            analysis_delay_ms: 0,
        };
        assert_eq!(config.database_path(), PathBuf::from("/tmp/hea-test/hea.db"));
    }
}
