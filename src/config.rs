use std::env;
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};

const CONFIG_DIR_NAME: &str = "autotriage";
const CONFIG_FILE_NAME: &str = "config.json";
const DEFAULT_BATCH_DELAY_MS: u64 = 1_000;
const DEFAULT_PORT: u16 = 3000;
pub const DEFAULT_DEPLOY_API_URL: &str = "https://backboard.railway.app/graphql/v2";

/// Recognized tracker options.
#[derive(Debug, Clone, Default)]
pub struct TrackerSettings {
    pub api_url: Option<String>,
    pub api_key: Option<String>,
    pub workspace: Option<String>,
    pub project_id: Option<String>,
}

impl TrackerSettings {
    pub fn is_complete(&self) -> bool {
        [&self.api_url, &self.api_key, &self.workspace, &self.project_id]
            .iter()
            .all(|value| value.as_deref().is_some_and(|v| !v.trim().is_empty()))
    }
}

#[derive(Debug, Clone)]
pub struct DeploymentSettings {
    pub api_url: String,
    pub api_token: Option<String>,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub tracker: TrackerSettings,
    pub deployment: DeploymentSettings,
    pub batch_delay: Duration,
    pub port: u16,
}

impl AppConfig {
    pub fn load() -> AppResult<Self> {
        let stored = StoredConfig::load()?;
        Self::resolve(stored, |name| env::var(name).ok())
    }

    /// Environment values take precedence over the stored file.
    pub fn resolve<F>(stored: StoredConfig, lookup: F) -> AppResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let pick = |name: &str, fallback: Option<String>| {
            lookup(name)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
                .or(fallback)
        };

        let batch_delay_ms = match pick("AUTOTRIAGE_BATCH_DELAY_MS", None) {
            Some(raw) => raw.parse::<u64>().map_err(|err| {
                AppError::Configuration(format!("invalid AUTOTRIAGE_BATCH_DELAY_MS '{raw}': {err}"))
            })?,
            None => stored.batch_delay_ms.unwrap_or(DEFAULT_BATCH_DELAY_MS),
        };

        let port = match pick("PORT", None) {
            Some(raw) => raw
                .parse::<u16>()
                .map_err(|err| AppError::Configuration(format!("invalid PORT '{raw}': {err}")))?,
            None => DEFAULT_PORT,
        };

        Ok(Self {
            tracker: TrackerSettings {
                api_url: pick("TRACKER_API_URL", stored.tracker_api_url),
                api_key: pick("TRACKER_API_KEY", stored.tracker_api_key),
                workspace: pick("TRACKER_WORKSPACE", stored.tracker_workspace),
                project_id: pick("TRACKER_PROJECT_ID", stored.tracker_project_id),
            },
            deployment: DeploymentSettings {
                api_url: pick("DEPLOY_API_URL", stored.deploy_api_url)
                    .unwrap_or_else(|| DEFAULT_DEPLOY_API_URL.to_string()),
                api_token: pick("DEPLOY_API_TOKEN", stored.deploy_api_token),
            },
            batch_delay: Duration::from_millis(batch_delay_ms),
            port,
        })
    }
}

/// Values persisted by `config init`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StoredConfig {
    pub tracker_api_url: Option<String>,
    pub tracker_api_key: Option<String>,
    pub tracker_workspace: Option<String>,
    pub tracker_project_id: Option<String>,
    pub deploy_api_url: Option<String>,
    pub deploy_api_token: Option<String>,
    pub batch_delay_ms: Option<u64>,
}

impl StoredConfig {
    pub fn load() -> AppResult<Self> {
        let path = config_file_path()?;
        match fs::read_to_string(&path) {
            Ok(contents) => serde_json::from_str(&contents)
                .map_err(|err| AppError::Configuration(format!("invalid config file: {err}"))),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(err) => Err(AppError::Io(err)),
        }
    }

    pub fn save(&self) -> AppResult<()> {
        let path = config_file_path()?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let data = serde_json::to_string_pretty(self)?;
        fs::write(&path, data)?;
        Ok(())
    }
}

pub fn config_directory() -> AppResult<PathBuf> {
    dirs::config_dir()
        .map(|dir| dir.join(CONFIG_DIR_NAME))
        .ok_or_else(|| AppError::Configuration("could not determine config directory".to_string()))
}

pub fn config_file_path() -> AppResult<PathBuf> {
    Ok(config_directory()?.join(CONFIG_FILE_NAME))
}
