//! Layered configuration builder.

use std::path::{Path, PathBuf};

use crate::config::environment::EnvironmentConfig;
use crate::config::loader::ConfigLoader;
use crate::config::merger::ConfigMerger;
use crate::config::schema::Config;
use crate::config::validator::ConfigValidator;
use crate::error::Result;

/// Builds a [`Config`] from defaults, files, environment and overrides.
///
/// # Examples
///
/// ```
/// use ticketbook::config::{Config, ConfigBuilder};
///
/// let config = ConfigBuilder::new()
///     .skip_files()
///     .skip_env()
///     .with_config(Config {
///         maximum_lock_wait_seconds: Some(12),
///         ..Default::default()
///     })
///     .build()
///     .unwrap();
///
/// assert_eq!(config.maximum_lock_wait_seconds, Some(12));
/// assert_eq!(config.policy().code_prefix, "RES");
/// ```
#[derive(Debug, Default)]
pub struct ConfigBuilder {
    data_dir: Option<PathBuf>,
    config_file: Option<PathBuf>,
    overrides: Vec<Config>,
    skip_files: bool,
    skip_env: bool,
}

impl ConfigBuilder {
    /// Creates a builder that reads every source.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Reads the user config from `dir` instead of the default data directory.
    #[must_use]
    pub fn with_data_dir(mut self, dir: &Path) -> Self {
        self.data_dir = Some(dir.to_path_buf());
        self
    }

    /// Layers an explicit YAML file above the user config.
    #[must_use]
    pub fn with_config_file(mut self, path: &Path) -> Self {
        self.config_file = Some(path.to_path_buf());
        self
    }

    /// Adds a programmatic override with the highest precedence.
    #[must_use]
    pub fn with_config(mut self, config: Config) -> Self {
        self.overrides.push(config);
        self
    }

    /// Skips configuration files.
    #[must_use]
    pub const fn skip_files(mut self) -> Self {
        self.skip_files = true;
        self
    }

    /// Skips `TICKETBOOK_*` environment variables.
    #[must_use]
    pub const fn skip_env(mut self) -> Self {
        self.skip_env = true;
        self
    }

    /// Merges every source and validates the result.
    ///
    /// # Errors
    ///
    /// Returns an error if a file cannot be read or parsed, an environment
    /// variable is malformed, or the merged configuration is invalid.
    pub fn build(self) -> Result<Config> {
        let mut config = Config::defaults();

        if !self.skip_files {
            let sources =
                ConfigLoader::load_all(self.data_dir.as_deref(), self.config_file.as_deref())?;
            for source in &sources {
                log::debug!("loaded configuration from {}", source.path.display());
                ConfigValidator::validate(&source.config)?;
            }
            ConfigMerger::merge_into(&mut config, &ConfigMerger::merge(sources));
        }

        if !self.skip_env {
            EnvironmentConfig::apply_overrides(&mut config)?;
        }

        for over in &self.overrides {
            ConfigMerger::merge_into(&mut config, over);
        }

        ConfigValidator::validate(&config)?;
        Ok(config)
    }
}
