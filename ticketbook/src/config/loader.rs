//! Configuration file discovery and loading.

use crate::config::schema::Config;
use crate::error::{Error, Result};
use std::fs;
use std::path::{Path, PathBuf};

/// Name of the user configuration file inside the data directory.
pub const USER_CONFIG_FILE: &str = "config.yaml";

/// Configuration source with its precedence level.
///
/// Lower precedence values are overridden by higher ones.
#[derive(Debug, Clone)]
pub struct ConfigSource {
    /// Path to the configuration file.
    pub path: PathBuf,
    /// Precedence level (higher values take priority).
    pub precedence: u8,
    /// Parsed configuration.
    pub config: Config,
}

/// Loads configuration from files.
///
/// # Examples
///
/// ```no_run
/// use ticketbook::config::ConfigLoader;
///
/// let sources = ConfigLoader::load_all(None, None).unwrap();
/// println!("Found {} configuration sources", sources.len());
/// ```
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load every configuration file that exists.
    ///
    /// 1. User config at `<data_dir>/config.yaml` (precedence 1)
    /// 2. An explicitly named file (precedence 2)
    ///
    /// When `data_dir` is `None` the default data directory is used.
    ///
    /// # Errors
    ///
    /// Returns an error if a file exists but cannot be read or parsed, or if
    /// an explicitly named file does not exist.
    pub fn load_all(data_dir: Option<&Path>, explicit: Option<&Path>) -> Result<Vec<ConfigSource>> {
        let mut sources = Vec::new();

        if let Some(user_config) = Self::load_user_config(data_dir)? {
            sources.push(user_config);
        }

        if let Some(path) = explicit {
            sources.push(ConfigSource {
                path: path.to_path_buf(),
                precedence: 2,
                config: Self::load_file(path)?,
            });
        }

        sources.sort_by_key(|s| s.precedence);
        Ok(sources)
    }

    fn load_user_config(data_dir: Option<&Path>) -> Result<Option<ConfigSource>> {
        let config_path = match data_dir {
            Some(dir) => dir.join(USER_CONFIG_FILE),
            None => Self::user_config_path()?,
        };

        if !config_path.exists() {
            log::debug!("no user config at {}", config_path.display());
            return Ok(None);
        }

        let config = Self::load_file(&config_path)?;
        Ok(Some(ConfigSource {
            path: config_path,
            precedence: 1,
            config,
        }))
    }

    /// Load and parse a YAML configuration file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or the YAML is invalid.
    pub fn load_file(path: &Path) -> Result<Config> {
        let contents = fs::read_to_string(path)?;
        if contents.trim().is_empty() {
            return Ok(Config::default());
        }
        serde_yaml::from_str(&contents).map_err(|e| Error::Validation {
            field: format!("{}", path.display()),
            message: format!("Invalid YAML: {e}"),
        })
    }

    fn user_config_path() -> Result<PathBuf> {
        let data_dir = crate::database::resolve_data_dir()?;
        Ok(data_dir.join(USER_CONFIG_FILE))
    }
}
