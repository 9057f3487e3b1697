use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use figment_file_provider_adapter::FileAdapter;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use matinee_common::error::Result;

fn default_data_dir() -> PathBuf {
    directories::ProjectDirs::from("tech", "throneless", "matinee")
        .map(|dirs| dirs.data_dir().to_path_buf())
        .unwrap_or_else(|| PathBuf::from("data"))
}

/// Top-level bot configuration. Defaults are overridden by `matinee.toml`
/// and then by `MATINEE_*` environment variables (`*_FILE` variants read
/// the value from a file, for secrets).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HubSettings {
    /// Credential of the top-level bot itself.
    pub api_token: String,
    /// The single privileged identity. Not rotatable at runtime.
    pub admin_id: i64,
    pub data_dir: PathBuf,
    pub card_number: String,
    pub card_holder: String,
}

impl Default for HubSettings {
    fn default() -> Self {
        Self {
            api_token: String::new(),
            admin_id: 0,
            data_dir: default_data_dir(),
            card_number: "6262 5700 9817 0949".to_owned(),
            card_holder: "Xolikov Maxxammadyunus".to_owned(),
        }
    }
}

impl HubSettings {
    pub fn load(config: Option<&Path>) -> Result<Self> {
        load(Serialized::defaults(Self::default()), config)
    }
}

/// Per-instance runner configuration. The credential and username come in
/// as process arguments, not configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunnerSettings {
    pub data_dir: PathBuf,
    pub admin_password: String,
}

impl Default for RunnerSettings {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            admin_password: "admin123".to_owned(),
        }
    }
}

impl RunnerSettings {
    pub fn load(config: Option<&Path>) -> Result<Self> {
        load(Serialized::defaults(Self::default()), config)
    }
}

fn load<T>(defaults: Serialized<T>, config: Option<&Path>) -> Result<T>
where
    T: serde::de::DeserializeOwned + Serialize,
{
    let figment = match config {
        Some(path) => Figment::from(defaults).merge(Toml::file(path)),
        None => Figment::from(defaults).merge(Toml::file("matinee.toml")),
    };
    Ok(figment
        .merge(FileAdapter::wrap(Env::prefixed("MATINEE_")))
        .extract()?)
}
