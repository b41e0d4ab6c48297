use crate::{Error, LibraryError};
use etcetera::{AppStrategy, AppStrategyArgs, choose_app_strategy};
use serde::{Deserialize, Serialize};
use std::fs::{create_dir_all, read_to_string, write};
use std::path::PathBuf;
use toml_edit::DocumentMut;

#[allow(clippy::missing_panics_doc)]
pub fn get_config_dir() -> PathBuf {
    let crate_name = env!("CARGO_PKG_NAME");
    if cfg!(feature = "testing") {
        let mut tmp_dir = PathBuf::from("/tmp");
        tmp_dir.push(crate_name);
        tmp_dir.push("config");
        create_dir_all(&tmp_dir).unwrap();
        return tmp_dir;
    }
    let strategy: etcetera::app_strategy::Xdg = choose_app_strategy(AppStrategyArgs {
        top_level_domain: "org".to_string(),
        author: crate_name.to_string(),
        app_name: crate_name.to_string(),
    })
    .unwrap();
    strategy.config_dir().push(crate_name);
    create_dir_all(strategy.config_dir()).unwrap();
    strategy.config_dir()
}

#[allow(clippy::missing_panics_doc)]
pub fn get_cache_dir() -> PathBuf {
    let crate_name = env!("CARGO_PKG_NAME");
    if cfg!(feature = "testing") {
        let mut tmp_dir = PathBuf::from("/tmp");
        tmp_dir.push(crate_name);
        tmp_dir.push("cache");
        create_dir_all(&tmp_dir).unwrap();
        return tmp_dir;
    }
    let strategy: etcetera::app_strategy::Xdg = choose_app_strategy(AppStrategyArgs {
        top_level_domain: "org".to_string(),
        author: crate_name.to_string(),
        app_name: crate_name.to_string(),
    })
    .unwrap();
    strategy.cache_dir().push(crate_name);
    create_dir_all(strategy.cache_dir()).unwrap();
    strategy.cache_dir()
}

#[allow(clippy::missing_panics_doc)]
pub fn get_data_dir() -> PathBuf {
    let crate_name = env!("CARGO_PKG_NAME");
    if cfg!(feature = "testing") {
        let mut tmp_dir = PathBuf::from("/tmp");
        tmp_dir.push(crate_name);
        tmp_dir.push("data");
        create_dir_all(&tmp_dir).unwrap();
        return tmp_dir;
    }
    let strategy: etcetera::app_strategy::Xdg = choose_app_strategy(AppStrategyArgs {
        top_level_domain: "org".to_string(),
        author: crate_name.to_string(),
        app_name: crate_name.to_string(),
    })
    .unwrap();
    strategy.data_dir().push(crate_name);
    create_dir_all(strategy.data_dir()).unwrap();
    strategy.data_dir()
}

#[derive(Clone, Copy, Debug, strum::EnumString, strum::Display, strum_macros::EnumIter)]
pub enum Environment {
    Production,
    Development,
}

#[derive(Debug, Clone)]
pub struct EnvironmentConfig {
    pub socket_address: String,
    pub database_url: String,
}

pub fn get_env_config(env: Environment) -> EnvironmentConfig {
    let database_url = std::env::var("DATABASE_URL").unwrap_or_else(|_| {
        let mut database_path = get_data_dir();
        database_path.push(match env {
            Environment::Production => "spares-main.sqlite",
            Environment::Development => "spares-dev.sqlite",
        });
        format!("sqlite://{}", database_path.display())
    });
    let socket_address = std::env::var("SPARES_SOCKET_ADDRESS").unwrap_or_else(|_| match env {
        Environment::Production => "127.0.0.1:8080".to_string(),
        Environment::Development => "127.0.0.1:8081".to_string(),
    });

    EnvironmentConfig {
        socket_address,
        database_url,
    }
}

/// Process-local state that should survive restarts but is not part of the
/// collection itself (so it lives outside the SQLite file).
#[derive(Debug, Deserialize, Serialize)]
#[serde(default)]
pub struct SparesInternalConfig {
    /// Last time `unbury_cards` ran for the day rollover.
    pub last_unbury_day: i64,
}

impl Default for SparesInternalConfig {
    fn default() -> Self {
        Self { last_unbury_day: 0 }
    }
}

/// Process-wide knobs that are not collection data (`spec.md` treats the
/// deck/model/collection config as authoritative inside the collection
/// database; this is the small amount that is not).
#[derive(Debug, Deserialize, Serialize)]
#[serde(default)]
pub struct SparesExternalConfig {
    /// Seconds between automatic saves of the collection (§5 "autosave").
    pub autosave_interval_secs: u64,
}

impl Default for SparesExternalConfig {
    fn default() -> Self {
        Self {
            autosave_interval_secs: 300,
        }
    }
}

impl SparesExternalConfig {
    fn validate(&self) -> Result<(), String> {
        if self.autosave_interval_secs == 0 {
            return Err("autosave_interval_secs must be nonzero.".to_string());
        }
        Ok(())
    }
}

fn get_internal_config_file() -> PathBuf {
    // Not stored in config directory, since this file will be changed frequently by spares.
    let mut config_file_path = get_data_dir();
    config_file_path.push("internal_config.toml");
    config_file_path
}

pub fn read_internal_config() -> Result<SparesInternalConfig, Error> {
    let config_file_path = get_internal_config_file();
    if !config_file_path.exists() {
        let config = SparesInternalConfig::default();
        write_internal_config(&config)?;
        return Ok(config);
    }
    let file_contents = read_to_string(&config_file_path).map_err(|e| Error::Io {
        description: format!("Failed to read {}.", &config_file_path.display()),
        source: e,
    })?;
    let doc = file_contents
        .parse::<DocumentMut>()
        .map_err(|e| Error::Library(LibraryError::InvalidConfig(e.to_string())))?;
    let config: SparesInternalConfig = toml_edit::de::from_document(doc)
        .map_err(|e| Error::Library(LibraryError::InvalidConfig(e.to_string())))?;
    Ok(config)
}

pub fn write_internal_config(config: &SparesInternalConfig) -> Result<(), Error> {
    let config_file_path = get_internal_config_file();
    let config_string = toml_edit::ser::to_string_pretty(&config).map_err(|e| {
        Error::Library(LibraryError::InvalidConfig(format!(
            "Failed to serialize config: {}",
            e
        )))
    })?;
    write(&config_file_path, config_string).map_err(|e| Error::Io {
        description: "Failed to write config".to_string(),
        source: e,
    })?;
    Ok(())
}

fn get_external_config_file() -> PathBuf {
    let mut config_file_path = get_config_dir();
    config_file_path.push("config.toml");
    config_file_path
}

// The `toml_edit` package was used in place of `confy` since `confy` does not support default values when serializing. For example, if a user had an existing config file and then `spares` was changed to add a new config key, deserialization would fail since a key was missing and not defaulted.
pub fn read_external_config() -> Result<SparesExternalConfig, Error> {
    let config_file_path = get_external_config_file();
    if !config_file_path.exists() {
        let config = SparesExternalConfig::default();
        write_external_config(&config)?;
        return Ok(config);
    }
    let file_contents = read_to_string(&config_file_path).map_err(|e| Error::Io {
        description: format!("Failed to read {}.", &config_file_path.display()),
        source: e,
    })?;
    let doc = file_contents
        .parse::<DocumentMut>()
        .map_err(|e| Error::Library(LibraryError::InvalidConfig(e.to_string())))?;
    let config: SparesExternalConfig = toml_edit::de::from_document(doc)
        .map_err(|e| Error::Library(LibraryError::InvalidConfig(e.to_string())))?;
    config
        .validate()
        .map_err(|x| Error::Library(LibraryError::InvalidConfig(x)))?;
    Ok(config)
}

pub fn write_external_config(config: &SparesExternalConfig) -> Result<(), Error> {
    let config_file_path = get_external_config_file();
    let config_string = toml_edit::ser::to_string_pretty(&config).map_err(|e| {
        Error::Library(LibraryError::InvalidConfig(format!(
            "Failed to serialize config: {}",
            e
        )))
    })?;
    write(&config_file_path, config_string).map_err(|e| Error::Io {
        description: "Failed to write config".to_string(),
        source: e,
    })?;
    Ok(())
}
