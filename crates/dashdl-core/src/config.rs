use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use crate::downloader::{DownloadOptions, DEFAULT_WORKERS};
use crate::fetch::FetchOptions;

/// Global configuration loaded from `~/.config/dashdl/config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DashdlConfig {
    /// Concurrent segment fetches per stream.
    pub workers: usize,
    /// TCP/TLS connect timeout in seconds.
    pub connect_timeout_secs: u64,
    /// Hard limit for one segment or manifest request, in seconds.
    pub segment_timeout_secs: u64,
    /// Default directory for merged output files.
    pub output_dir: PathBuf,
    /// Default target resolution, e.g. "1080p".
    pub resolution: String,
    /// ffmpeg binary (name looked up in PATH, or an absolute path).
    pub ffmpeg: String,
    /// Directory for per-stream temp files (None = system temp dir).
    #[serde(default)]
    pub temp_dir: Option<PathBuf>,
    /// Optional User-Agent header for all requests.
    #[serde(default)]
    pub user_agent: Option<String>,
}

impl Default for DashdlConfig {
    fn default() -> Self {
        Self {
            workers: DEFAULT_WORKERS,
            connect_timeout_secs: 15,
            segment_timeout_secs: 300,
            output_dir: PathBuf::from("data/download"),
            resolution: "1080p".to_string(),
            ffmpeg: "ffmpeg".to_string(),
            temp_dir: None,
            user_agent: None,
        }
    }
}

impl DashdlConfig {
    pub fn fetch_options(&self) -> FetchOptions {
        FetchOptions {
            connect_timeout: Duration::from_secs(self.connect_timeout_secs),
            timeout: Duration::from_secs(self.segment_timeout_secs),
            user_agent: self.user_agent.clone(),
        }
    }

    pub fn download_options(&self) -> DownloadOptions {
        DownloadOptions {
            workers: self.workers.max(1),
            fetch: self.fetch_options(),
            temp_dir: self.temp_dir.clone().unwrap_or_else(std::env::temp_dir),
        }
    }
}

pub fn config_path() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("dashdl")?;
    Ok(xdg_dirs.place_config_file("config.toml")?)
}

/// Load configuration from disk, creating a default file if none exists.
pub fn load_or_init() -> Result<DashdlConfig> {
    let path = config_path()?;
    if !path.exists() {
        let default_cfg = DashdlConfig::default();
        let toml = toml::to_string_pretty(&default_cfg)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, toml)
            .with_context(|| format!("failed to write default config {}", path.display()))?;
        tracing::info!("created default config at {}", path.display());
        return Ok(default_cfg);
    }

    let data = fs::read_to_string(&path)
        .with_context(|| format!("failed to read config {}", path.display()))?;
    let cfg: DashdlConfig =
        toml::from_str(&data).with_context(|| format!("invalid config {}", path.display()))?;
    Ok(cfg)
}
