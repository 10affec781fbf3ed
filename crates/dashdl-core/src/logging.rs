//! tracing setup for the `dashdl` binary.
//!
//! Events go to `$XDG_STATE_HOME/dashdl/dashdl.log` so progress output on
//! stdout stays clean. `RUST_LOG` overrides the default filter.

use anyhow::{Context, Result};
use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::EnvFilter;

const DEFAULT_FILTER: &str = "info,dashdl=debug,dashdl_core=debug";
const LOG_FILE_NAME: &str = "dashdl.log";

/// Shared append handle to the log file.
///
/// Each event gets its own handle; if the handle cannot be duplicated the
/// event is written to stderr instead of being lost.
struct LogFile(File);

impl LogFile {
    fn open(path: &Path) -> io::Result<Self> {
        fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .map(LogFile)
    }
}

enum EventSink {
    File(File),
    Stderr,
}

impl io::Write for EventSink {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self {
            EventSink::File(f) => f.write(buf),
            EventSink::Stderr => io::stderr().lock().write(buf),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self {
            EventSink::File(f) => f.flush(),
            EventSink::Stderr => io::stderr().lock().flush(),
        }
    }
}

impl<'a> MakeWriter<'a> for LogFile {
    type Writer = EventSink;

    fn make_writer(&'a self) -> Self::Writer {
        match self.0.try_clone() {
            Ok(f) => EventSink::File(f),
            Err(_) => EventSink::Stderr,
        }
    }
}

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
}

/// Where the log file lives; creates the state directory.
pub fn log_file_path() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("dashdl")?;
    xdg_dirs
        .place_state_file(LOG_FILE_NAME)
        .context("failed to create dashdl state directory")
}

/// Installs the global subscriber writing to [`log_file_path`].
///
/// Errors leave no subscriber installed, so the caller can still use
/// [`init_logging_stderr`].
pub fn init_logging() -> Result<()> {
    let path = log_file_path()?;
    let file = LogFile::open(&path)
        .with_context(|| format!("failed to open log file {}", path.display()))?;

    tracing_subscriber::fmt()
        .with_env_filter(env_filter())
        .with_writer(file)
        .with_ansi(false)
        .with_thread_names(true)
        .try_init()
        .map_err(|e| anyhow::anyhow!(e))?;

    tracing::info!(path = %path.display(), "logging to file");
    Ok(())
}

/// Stderr-only subscriber. A no-op when one is already installed.
pub fn init_logging_stderr() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter())
        .with_writer(io::stderr)
        .with_ansi(false)
        .with_thread_names(true)
        .try_init();
}
