use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub backend: BackendConfig,
    #[serde(default)]
    pub polling: PollingConfig,
}

/// Where the detection backend lives and how its endpoints are shaped.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_status_path")]
    pub status_path: String,
    #[serde(default = "default_frame_path")]
    pub frame_path: String,
    #[serde(default = "default_gallery_path")]
    pub gallery_path: String,
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
}

/// Poll cadences.  The source material hard-coded wildly different figures
/// (100 ms in one page, 3000 ms in another); both are configuration here.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PollingConfig {
    /// Status refresh cadence in milliseconds.  Must be positive; values
    /// below ~1000 ms put needless load on the backend.
    #[serde(default = "default_status_interval_ms")]
    pub status_interval_ms: u64,
    /// Live-frame refresh cadence in milliseconds.  Must be positive.
    #[serde(default = "default_frame_interval_ms")]
    pub frame_interval_ms: u64,
}

impl PollingConfig {
    pub fn status_interval(&self) -> Duration {
        Duration::from_millis(self.status_interval_ms)
    }

    pub fn frame_interval(&self) -> Duration {
        Duration::from_millis(self.frame_interval_ms)
    }
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            status_path: default_status_path(),
            frame_path: default_frame_path(),
            gallery_path: default_gallery_path(),
            request_timeout_ms: default_request_timeout_ms(),
        }
    }
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self {
            status_interval_ms: default_status_interval_ms(),
            frame_interval_ms: default_frame_interval_ms(),
        }
    }
}

fn default_base_url() -> String {
    "http://127.0.0.1:5000".to_string()
}

fn default_status_path() -> String {
    "/api/status".to_string()
}

fn default_frame_path() -> String {
    "/api/latest_detected_image".to_string()
}

fn default_gallery_path() -> String {
    "/api/saved_images".to_string()
}

fn default_request_timeout_ms() -> u64 {
    4000
}

fn default_status_interval_ms() -> u64 {
    3000
}

fn default_frame_interval_ms() -> u64 {
    1000
}

impl Config {
    pub fn load() -> anyhow::Result<Self> {
        let config_path = Self::config_path();

        if !config_path.exists() {
            let config = Self::default();
            config.save()?;
            return Ok(config);
        }

        let content = std::fs::read_to_string(&config_path)?;
        let config: Self = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn save(&self) -> anyhow::Result<()> {
        let config_path = Self::config_path();
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(&config_path, content)?;
        Ok(())
    }

    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("camwatch")
            .join("config.toml")
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if self.polling.status_interval_ms == 0 {
            anyhow::bail!("polling.status_interval_ms must be positive");
        }
        if self.polling.frame_interval_ms == 0 {
            anyhow::bail!("polling.frame_interval_ms must be positive");
        }
        if self.backend.base_url.is_empty() {
            anyhow::bail!("backend.base_url must not be empty");
        }
        Ok(())
    }
}
