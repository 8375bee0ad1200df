use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::{MissionError, Result};
use crate::roles::{RoleOverride, RoleTable};

/// Environment variable naming the workspace root.
pub const WORKSPACE_ENV: &str = "AVENGERS_WORKSPACE";
/// Environment variable overriding the config file location.
pub const CONFIG_ENV: &str = "AVENGERS_CONFIG";
/// Directory under the workspace that holds one subdirectory per mission.
pub const MISSIONS_DIR: &str = "avengers-missions";

const DEFAULT_WATCH_INTERVAL_SECS: u64 = 10;

/// Process configuration, built once in `main` and passed to every command.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub workspace: PathBuf,
    pub watch_interval_secs: u64,
    pub roles: RoleTable,
}

/// Raw TOML file structure for `~/.config/avengers/config.toml`.
#[derive(Debug, Deserialize, Default)]
pub struct ConfigFile {
    pub workspace: Option<PathBuf>,
    pub watch_interval_secs: Option<u64>,
    #[serde(default)]
    pub roles: HashMap<String, RoleOverride>,
}

/// Default config file location.
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("avengers").join("config.toml"))
}

fn default_workspace() -> Result<PathBuf> {
    dirs::home_dir()
        .map(|home| home.join(".openclaw").join("workspace"))
        .ok_or_else(|| {
            MissionError::Config(format!(
                "could not determine home directory; set {}",
                WORKSPACE_ENV
            ))
        })
}

impl AppConfig {
    /// Load configuration from the config file and environment.
    ///
    /// Priority: `AVENGERS_WORKSPACE` overrides the file's `workspace`, which
    /// overrides the default `~/.openclaw/workspace`.
    pub fn load() -> Result<Self> {
        let path = std::env::var_os(CONFIG_ENV)
            .map(PathBuf::from)
            .or_else(default_config_path);

        let file = match path {
            Some(p) => read_config_file(&p)?,
            None => ConfigFile::default(),
        };

        let env_workspace = std::env::var_os(WORKSPACE_ENV)
            .filter(|v| !v.is_empty())
            .map(PathBuf::from);

        Self::from_file_and_env(file, env_workspace)
    }

    /// Build config from parsed file values and the workspace env value.
    pub fn from_file_and_env(file: ConfigFile, env_workspace: Option<PathBuf>) -> Result<Self> {
        let workspace = match env_workspace.or(file.workspace) {
            Some(ws) => ws,
            None => default_workspace()?,
        };

        let watch_interval_secs = file
            .watch_interval_secs
            .unwrap_or(DEFAULT_WATCH_INTERVAL_SECS);
        if watch_interval_secs == 0 {
            return Err(MissionError::Config(
                "watch_interval_secs must be at least 1".to_string(),
            ));
        }

        let mut roles = RoleTable::default();
        roles.apply_overrides(&file.roles)?;

        Ok(Self {
            workspace,
            watch_interval_secs,
            roles,
        })
    }

    /// Root directory holding every mission directory.
    pub fn missions_root(&self) -> PathBuf {
        self.workspace.join(MISSIONS_DIR)
    }
}

/// Read and parse a config file. A missing file yields defaults.
pub fn read_config_file(path: &Path) -> Result<ConfigFile> {
    if !path.exists() {
        return Ok(ConfigFile::default());
    }
    let content = std::fs::read_to_string(path).map_err(|e| MissionError::io(path, e))?;
    toml::from_str(&content)
        .map_err(|e| MissionError::Config(format!("failed to parse {}: {}", path.display(), e)))
}
