use config::{Config, Environment, File};
use std::path::{Path, PathBuf};

pub mod app;
pub mod limits;
pub mod validation;

pub use app::{AppConfig, LoggingConfig, ServicebusConfig, UpdateCheckConfig};
pub use validation::{ConfigError, ConfigValidationError};

const CONFIG_FILE_NAME: &str = "config.toml";

/// Loads and validates the configuration.
///
/// Sources, lowest precedence first: `config.toml` in the user configuration
/// directory, `config.toml` in the working directory, then environment
/// variables (after `.env` is read) with `__` as the section separator, e.g.
/// `SERVICEBUS__CONNECTION_STRING`. An explicit `path` replaces both files and
/// must exist.
pub fn load_config(path: Option<&Path>) -> Result<AppConfig, ConfigError> {
    dotenv::dotenv().ok();
    let env_source = Environment::default().separator("__").try_parsing(true);

    let mut builder = Config::builder();
    match path {
        Some(path) => {
            builder = builder.add_source(File::from(path).required(true));
        }
        None => {
            for candidate in default_config_paths() {
                builder = builder.add_source(File::from(candidate).required(false));
            }
        }
    }

    finish(builder.add_source(env_source))
}

/// Loads and validates a single configuration file, ignoring the environment.
pub fn load_config_file(path: &Path) -> Result<AppConfig, ConfigError> {
    finish(Config::builder().add_source(File::from(path).required(true)))
}

fn finish(
    builder: config::ConfigBuilder<config::builder::DefaultState>,
) -> Result<AppConfig, ConfigError> {
    let config = builder
        .build()
        .map_err(|e| ConfigError::Load(e.to_string()))?;
    let app_config = config
        .try_deserialize::<AppConfig>()
        .map_err(|e| ConfigError::Deserialize(e.to_string()))?;
    app_config.validate().map_err(ConfigError::Invalid)?;
    Ok(app_config)
}

fn default_config_paths() -> Vec<PathBuf> {
    let mut paths = Vec::new();
    if let Some(dir) = dirs::config_dir() {
        paths.push(dir.join("busctl").join(CONFIG_FILE_NAME));
    }
    paths.push(PathBuf::from(CONFIG_FILE_NAME));
    paths
}
