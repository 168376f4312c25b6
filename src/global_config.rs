use crate::error::{InstallError, Result};
use crate::utils::{log, LogLevel};

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Per-user defaults, stored as `config.toml` in the user's config directory
#[derive(Serialize, Deserialize, Debug, Default, Clone, PartialEq, Eq)]
pub struct GlobalConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    default_prefix: Option<String>,
}

impl GlobalConfig {
    /// Location of the global config file, if the platform has a config directory
    pub fn default_path() -> Option<PathBuf> {
        ProjectDirs::from("", "", "installer_cpp")
            .map(|dirs| dirs.config_dir().join("config.toml"))
    }

    /// Reads the global config. A missing file yields the defaults.
    pub fn from_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(GlobalConfig::default());
        }
        let config = std::fs::read_to_string(path).map_err(|e| InstallError::Io {
            action: "read",
            path: path.to_path_buf(),
            source: e,
        })?;
        toml::from_str(&config).map_err(|e| {
            InstallError::Configuration(format!("invalid global config {}: {}", path.display(), e))
        })
    }

    /// Loads the config from its default location, or the defaults when there is none
    pub fn load() -> Result<Self> {
        match GlobalConfig::default_path() {
            Some(path) => GlobalConfig::from_file(&path),
            None => Ok(GlobalConfig::default()),
        }
    }

    /// Validates and stores `value` for `parameter` in the config file at `path`
    pub fn set_defaults(path: &Path, parameter: &str, value: &str) -> Result<()> {
        let mut global_conf = GlobalConfig::from_file(path)?;
        match parameter {
            "default_prefix" => {
                if !Path::new(value).is_absolute() {
                    return Err(InstallError::Configuration(format!(
                        "default_prefix must be an absolute path, got `{}`",
                        value
                    )));
                }
                global_conf.default_prefix = Some(value.to_string());
            }
            _ => {
                return Err(InstallError::Configuration(format!(
                    "invalid parameter `{}`. See `installer_cpp config --help` for more info",
                    parameter
                )))
            }
        }

        if let Some(dir) = path.parent() {
            std::fs::create_dir_all(dir).map_err(|e| InstallError::Io {
                action: "create",
                path: dir.to_path_buf(),
                source: e,
            })?;
        }
        let contents = toml::to_string(&global_conf)
            .map_err(|e| InstallError::Configuration(e.to_string()))?;
        std::fs::write(path, contents).map_err(|e| InstallError::Io {
            action: "write",
            path: path.to_path_buf(),
            source: e,
        })?;
        log(
            LogLevel::Log,
            &format!("Set {} = {} in {}", parameter, value, path.display()),
        );
        Ok(())
    }

    pub fn get_default_prefix(&self) -> Option<&str> {
        self.default_prefix.as_deref()
    }
}
