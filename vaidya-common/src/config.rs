//! Configuration loading and root folder resolution
//!
//! Root folder priority order:
//! 1. Command-line argument (highest priority)
//! 2. Environment variable (`VAIDYA_ROOT_FOLDER`, then `VAIDYA_ROOT`)
//! 3. TOML config file (`~/.config/vaidya/<module>.toml`)
//! 4. OS-dependent compiled default (fallback)
//!
//! A missing or unparsable TOML file never stops startup: it is logged and
//! defaults are used.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::{Error, Result};

/// Name of the shared database file inside the root folder
pub const DATABASE_FILE_NAME: &str = "vaidya.db";

/// Compiled-in defaults for the current platform
#[derive(Debug, Clone)]
pub struct CompiledDefaults {
    pub root_folder: PathBuf,
    pub log_level: String,
    pub log_file: Option<PathBuf>,
}

impl CompiledDefaults {
    pub fn for_current_platform() -> Self {
        Self {
            root_folder: default_root_folder(),
            log_level: "info".to_string(),
            log_file: None,
        }
    }
}

/// `[logging]` table of the TOML file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            file: None,
        }
    }
}

/// Per-module TOML configuration
///
/// Every field is optional so that partial files keep working across
/// versions.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TomlConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub root_folder: Option<PathBuf>,
    pub logging: LoggingConfig,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,
    /// Key for the hosted generative-language API
    #[serde(skip_serializing_if = "Option::is_none")]
    pub genai_api_key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub genai_base_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub genai_model: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub speech_model: Option<String>,
    /// "local" or "collection"
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remedy_backend: Option<String>,
    /// "required" or "bypass"
    #[serde(skip_serializing_if = "Option::is_none")]
    pub verification: Option<String>,
    /// "exact" or "fuzzy"
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pronunciation_matcher: Option<String>,
}

/// Load and parse a TOML config file
pub fn load_toml_config(path: &Path) -> Result<TomlConfig> {
    let content = std::fs::read_to_string(path)?;
    toml::from_str(&content)
        .map_err(|e| Error::Config(format!("Parse TOML failed for {}: {}", path.display(), e)))
}

/// Write a TOML config file atomically (temp file + rename)
pub fn write_toml_config(config: &TomlConfig, path: &Path) -> Result<()> {
    let content = toml::to_string_pretty(config)
        .map_err(|e| Error::Config(format!("Serialize TOML failed: {}", e)))?;

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let tmp_path = path.with_extension("toml.tmp");
    std::fs::write(&tmp_path, content)?;
    std::fs::rename(&tmp_path, path)?;

    Ok(())
}

/// Resolves the root folder for one module
#[derive(Debug, Clone)]
pub struct RootFolderResolver {
    module_name: String,
    cli_arg: Option<PathBuf>,
}

impl RootFolderResolver {
    pub fn new(module_name: &str) -> Self {
        Self {
            module_name: module_name.to_string(),
            cli_arg: None,
        }
    }

    /// Highest priority override, usually from `--root-folder`
    pub fn with_cli_arg(mut self, cli_arg: Option<PathBuf>) -> Self {
        self.cli_arg = cli_arg;
        self
    }

    /// `~/.config/vaidya/<module>.toml`
    pub fn config_file_path(&self) -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("vaidya").join(format!("{}.toml", self.module_name)))
    }

    /// Load the module TOML, falling back to defaults on any problem
    pub fn load_toml(&self) -> TomlConfig {
        let Some(path) = self.config_file_path() else {
            warn!("Could not determine config directory, using defaults");
            return TomlConfig::default();
        };

        if !path.exists() {
            info!("Config file {} not found, using defaults", path.display());
            return TomlConfig::default();
        }

        match load_toml_config(&path) {
            Ok(config) => {
                debug!("Loaded config from {}", path.display());
                config
            }
            Err(e) => {
                warn!("Ignoring config file: {}", e);
                TomlConfig::default()
            }
        }
    }

    pub fn resolve(&self) -> PathBuf {
        self.resolve_with(&self.load_toml())
    }

    /// Resolve using an already loaded TOML config
    pub fn resolve_with(&self, toml_config: &TomlConfig) -> PathBuf {
        // Priority 1: Command-line argument
        if let Some(path) = &self.cli_arg {
            return path.clone();
        }

        // Priority 2: Environment variables
        for var in ["VAIDYA_ROOT_FOLDER", "VAIDYA_ROOT"] {
            if let Ok(path) = std::env::var(var) {
                if !path.trim().is_empty() {
                    return PathBuf::from(path);
                }
            }
        }

        // Priority 3: TOML config file
        if let Some(path) = &toml_config.root_folder {
            return path.clone();
        }

        // Priority 4: OS-dependent compiled default
        CompiledDefaults::for_current_platform().root_folder
    }
}

/// Creates the root folder and locates the database inside it
#[derive(Debug, Clone)]
pub struct RootFolderInitializer {
    root_folder: PathBuf,
}

impl RootFolderInitializer {
    pub fn new(root_folder: PathBuf) -> Self {
        Self { root_folder }
    }

    pub fn root_folder(&self) -> &Path {
        &self.root_folder
    }

    /// Idempotent
    pub fn ensure_directory_exists(&self) -> Result<()> {
        if !self.root_folder.exists() {
            info!("Creating root folder {}", self.root_folder.display());
        }
        std::fs::create_dir_all(&self.root_folder)?;
        Ok(())
    }

    pub fn database_path(&self) -> PathBuf {
        self.root_folder.join(DATABASE_FILE_NAME)
    }

    pub fn database_exists(&self) -> bool {
        self.database_path().exists()
    }
}

/// Get OS-dependent default root folder path
fn default_root_folder() -> PathBuf {
    if cfg!(target_os = "linux") {
        // ~/.local/share/vaidya (or /var/lib/vaidya for system-wide)
        dirs::data_local_dir()
            .map(|d| d.join("vaidya"))
            .unwrap_or_else(|| PathBuf::from("/var/lib/vaidya"))
    } else if cfg!(target_os = "macos") {
        dirs::data_dir()
            .map(|d| d.join("vaidya"))
            .unwrap_or_else(|| PathBuf::from("/Library/Application Support/vaidya"))
    } else if cfg!(target_os = "windows") {
        dirs::data_local_dir()
            .map(|d| d.join("vaidya"))
            .unwrap_or_else(|| PathBuf::from("C:\\ProgramData\\vaidya"))
    } else {
        PathBuf::from("./vaidya_data")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config: TomlConfig = toml::from_str("genai_model = \"gemini-1.5-flash\"").unwrap();

        assert_eq!(config.genai_model.as_deref(), Some("gemini-1.5-flash"));
        assert_eq!(config.logging.level, "info");
        assert!(config.root_folder.is_none());
        assert!(config.remedy_backend.is_none());
    }

    #[test]
    fn test_cli_arg_wins_over_toml() {
        let toml_config = TomlConfig {
            root_folder: Some(PathBuf::from("/tmp/from-toml")),
            ..Default::default()
        };
        let resolver = RootFolderResolver::new("vaidya-hub")
            .with_cli_arg(Some(PathBuf::from("/tmp/from-cli")));

        assert_eq!(resolver.resolve_with(&toml_config), PathBuf::from("/tmp/from-cli"));
    }

    #[test]
    fn test_config_file_path_contains_module_name() {
        let resolver = RootFolderResolver::new("vaidya-hub");
        if let Some(path) = resolver.config_file_path() {
            assert!(path.ends_with("vaidya/vaidya-hub.toml"));
        }
    }
}
