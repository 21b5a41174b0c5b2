use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::path::Path;
use lazy_static::lazy_static;
use crate::error::PhyemError;
use crate::paths::config_path;
use crate::simulation::model::HeatingParams;

/// Top-level application configuration, read from `phyem.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Apps Script style endpoint receiving finished reports. Unset means local only.
    pub cloud_sync_url: Option<String>,
    pub tutor: TutorConfig,
    pub simulation: SimulationConfig,
    pub admin: AdminConfig,
    pub lms: LmsConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            cloud_sync_url: None,
            tutor: TutorConfig::default(),
            simulation: SimulationConfig::default(),
            admin: AdminConfig::default(),
            lms: LmsConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TutorConfig {
    pub text_model: String,
    pub tts_model: String,
    pub voice: String,
    pub timeout_secs: u64,
    /// Name of the environment variable holding the Gemini API key
    pub api_key_env: String,
}

impl Default for TutorConfig {
    fn default() -> Self {
        TutorConfig {
            text_model: "gemini-3-flash-preview".to_string(),
            tts_model: "gemini-2.5-flash-preview-tts".to_string(),
            voice: "Kore".to_string(),
            timeout_secs: 30,
            api_key_env: "API_KEY".to_string(),
        }
    }
}

impl TutorConfig {
    pub fn api_key(&self) -> Option<String> {
        std::env::var(&self.api_key_env)
            .ok()
            .filter(|key| !key.trim().is_empty())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    pub heating: HeatingParams,
    pub frame_rate_hz: u32,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        SimulationConfig {
            heating: HeatingParams::default(),
            frame_rate_hz: 60,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AdminConfig {
    /// Hex SHA-256 of the dashboard passcode
    pub passcode_sha256: String,
}

impl Default for AdminConfig {
    fn default() -> Self {
        AdminConfig {
            passcode_sha256: hash_passcode("123"),
        }
    }
}

impl AdminConfig {
    pub fn accepts(&self, passcode: &str) -> bool {
        hash_passcode(passcode).eq_ignore_ascii_case(self.passcode_sha256.trim())
    }
}

pub fn hash_passcode(passcode: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(passcode.as_bytes());
    format!("{:x}", hasher.finalize())
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LmsConfig {
    pub max_score: u32,
}

impl Default for LmsConfig {
    fn default() -> Self {
        LmsConfig { max_score: 100 }
    }
}

impl AppConfig {
    pub fn from_toml_str(content: &str) -> Result<Self, PhyemError> {
        toml::from_str::<AppConfig>(content).map_err(PhyemError::from)
    }

    /// Load from a file, falling back to defaults when missing or unparsable
    pub fn load_from(path: &Path) -> Self {
        match std::fs::read_to_string(path) {
            Ok(content) => match Self::from_toml_str(&content) {
                Ok(config) => {
                    tracing::info!(path = ?path, "Loaded app config");
                    config
                }
                Err(e) => {
                    tracing::warn!(path = ?path, error = %e, "Failed to parse phyem.toml, using defaults");
                    AppConfig::default()
                }
            },
            Err(e) => {
                tracing::debug!(path = ?path, error = %e, "No phyem.toml, using defaults");
                AppConfig::default()
            }
        }
    }
}

lazy_static! {
    static ref APP_CONFIG: AppConfig = AppConfig::load_from(&config_path());
}

/// Get the cached application configuration (loaded once at startup)
pub fn get_app_config() -> &'static AppConfig {
    &APP_CONFIG
}
