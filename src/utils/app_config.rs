use std::sync::RwLock;

use config::{Config, Environment};
use lazy_static::lazy_static;
use serde::Deserialize;

use super::error::Result;

// CONFIG static variable. The merged configuration of the whole process,
// inside an RwLock.
lazy_static! {
    static ref CONFIG: RwLock<Config> = RwLock::new(Config::new());
}

pub mod prelude {
    pub use super::{config, AppConfig};
}

/// Cheap handle to the process-wide configuration.
pub fn config() -> AppConfig {
    AppConfig
}

#[derive(Debug, Clone, Copy)]
pub struct AppConfig;

impl AppConfig {
    pub fn init(default_config: Option<&str>) -> Result<()> {
        let mut settings = Config::new();

        // Embed file into executable
        // This will embed the configuration file into the
        // executable. Check include_str! for more info.
        if let Some(config_contents) = default_config {
            settings.merge(config::File::from_str(config_contents, config::FileFormat::Toml))?;
        }

        // Merge settings with env variables
        settings.merge(Environment::with_prefix("APP"))?;

        // Save Config to RwLock
        {
            let mut w = CONFIG.write().unwrap();
            *w = settings;
        }

        Ok(())
    }

    /// Merge settings with config file if there is one
    pub fn merge_config(config_file: Option<&str>) -> Result<()> {
        if let Some(config_file_path) = config_file {
            CONFIG
                .write()
                .unwrap()
                .merge(config::File::with_name(config_file_path))?;
        }
        Ok(())
    }

    // Set a single value
    pub fn set(key: &str, value: &str) -> Result<()> {
        CONFIG.write().unwrap().set(key, value)?;
        Ok(())
    }

    // Get a single value
    pub fn get<'de, T>(&self, key: &'de str) -> Result<T>
    where
        T: Deserialize<'de>,
    {
        Ok(CONFIG.read().unwrap().get::<T>(key)?)
    }

    // Deserialize the whole configuration into T.
    // This clones Config (from RwLock<Config>), so fetch again after any change.
    pub fn fetch<T>(&self) -> Result<T>
    where
        T: serde::de::DeserializeOwned,
    {
        let config_clone = CONFIG.read().unwrap().clone();
        Ok(config_clone.try_into()?)
    }
}
