use crate::error::ConfigError;
use config::{Config as Cfg, File};
use serde::de::DeserializeOwned;
use std::path::Path;

/// Load settings from an optional YAML file layered under `APP__` environment
/// variables. A `.env` file in the working directory is honoured first.
pub fn load_layered<T: DeserializeOwned>(file: &Path) -> Result<T, ConfigError> {
    dotenvy::dotenv().ok();

    let config = Cfg::builder()
        .add_source(File::from(file).required(false))
        .add_source(config::Environment::with_prefix("APP").separator("__"))
        .build()?;

    Ok(config.try_deserialize()?)
}
