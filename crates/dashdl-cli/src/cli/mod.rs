//! CLI for the dashdl DASH stream downloader.

mod commands;

use anyhow::Result;
use clap::Parser;
use dashdl_core::config;
use dashdl_core::control::CancelToken;
use dashdl_core::url_model::DEFAULT_OUTPUT_FILENAME;
use std::path::PathBuf;
use std::process::ExitCode;

use commands::{run_check_dependencies, run_download, DownloadRequest};

/// Top-level CLI: download a DASH video and merge the selected video and
/// audio streams into one MP4.
#[derive(Debug, Parser)]
#[command(name = "dashdl")]
#[command(about = "dashdl: ordered concurrent DASH segment downloader", long_about = None)]
pub struct Cli {
    /// Video page URL (".../iframe"), video base URL, or direct ".mpd" URL.
    #[arg(long, required_unless_present = "check_dependencies")]
    pub url: Option<String>,

    /// Directory for the merged file (default: `output_dir` from config).
    #[arg(long, value_name = "DIR")]
    pub output_dir: Option<PathBuf>,

    /// Output filename. With the default, the manifest title is used when present.
    #[arg(long, default_value = DEFAULT_OUTPUT_FILENAME)]
    pub filename: String,

    /// Target video height, e.g. "720p" (default: `resolution` from config).
    #[arg(long)]
    pub resolution: Option<String>,

    /// Only check that ffmpeg is available and exit.
    #[arg(long)]
    pub check_dependencies: bool,
}

impl Cli {
    pub fn run_from_args() -> Result<ExitCode> {
        let cli = Cli::parse();
        let cfg = config::load_or_init()?;
        tracing::debug!("loaded config: {:?}", cfg);

        if cli.check_dependencies {
            return Ok(run_check_dependencies(&cfg));
        }

        let cancel = CancelToken::new();
        {
            let cancel = cancel.clone();
            if let Err(e) = ctrlc::set_handler(move || cancel.cancel()) {
                tracing::warn!("could not install Ctrl-C handler: {}", e);
            }
        }

        let request = cli.into_request(&cfg);
        run_download(&request, &cfg, &cancel)
    }

    /// Fills unset flags from the config.
    fn into_request(self, cfg: &config::DashdlConfig) -> DownloadRequest {
        DownloadRequest {
            url: self.url.unwrap_or_default(),
            output_dir: self.output_dir.unwrap_or_else(|| cfg.output_dir.clone()),
            filename: self.filename,
            resolution: self.resolution.unwrap_or_else(|| cfg.resolution.clone()),
        }
    }
}

#[cfg(test)]
mod tests;
