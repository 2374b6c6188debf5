use super::error::ConfigError;
use super::InstanceDataConfig;
use config::builder::DefaultState;
use config::{Config, ConfigBuilder, Environment, File, FileFormat};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Prefix of the environment variables overriding the configuration file.
pub const CONFIG_ENV_VAR_PREFIX: &str = "INSTANCE_DATA";

pub trait ConfigLoader {
    fn load(&self) -> Result<InstanceDataConfig, ConfigError>;
}

/// Loads the configuration from an optional YAML file overridden by environment variables.
pub struct ConfigLoaderFile {
    config_builder: ConfigBuilder<DefaultState>,
    file_path: Option<PathBuf>,
}

impl ConfigLoader for ConfigLoaderFile {
    fn load(&self) -> Result<InstanceDataConfig, ConfigError> {
        let config = self._load_config()?;
        config.validate()?;
        Ok(config)
    }
}

impl ConfigLoaderFile {
    pub fn new(file_path: Option<&Path>) -> Self {
        Self {
            config_builder: Config::builder(),
            file_path: file_path.map(Path::to_path_buf),
        }
    }

    fn _load_config(&self) -> Result<InstanceDataConfig, ConfigError> {
        let mut builder = self.config_builder.clone();

        if let Some(path) = &self.file_path {
            if !path.is_file() {
                return Err(ConfigError::FileNotFound(path.to_string_lossy().into()));
            }
            debug!(path = %path.display(), "loading configuration file");
            builder = builder.add_source(File::from(path.as_path()).format(FileFormat::Yaml));
        }

        // Add in settings from the environment (with a prefix of `INSTANCE_DATA_` and separator double underscore, `__`)
        // Eg.. `INSTANCE_DATA_USER_DATA__VALUE_SEPARATOR==` would set the `user_data.value_separator` key to `=`.
        // We use double underscore because we already use snake_case for the config keys.
        let config = builder
            .add_source(
                Environment::with_prefix(CONFIG_ENV_VAR_PREFIX)
                    .prefix_separator("_")
                    .separator("__"),
            )
            .build()?
            .try_deserialize::<InstanceDataConfig>()?;

        Ok(config)
    }
}
