//! `dashdl --url <URL>`: manifest, video and audio streams, ffmpeg merge.

use anyhow::{Context, Result};
use dashdl_core::config::DashdlConfig;
use dashdl_core::control::{CancelToken, Cancelled};
use dashdl_core::downloader::{download_stream, DownloadError, DownloadOptions};
use dashdl_core::fetch::FetchError;
use dashdl_core::manifest::{fetch_manifest, parse_resolution, SelectedStream};
use dashdl_core::merge::{CommandRunner, Merger};
use dashdl_core::model::StreamDescriptor;
use dashdl_core::url_model::{manifest_url_from_input, output_filename};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use super::progress::ProgressPrinter;

/// Flags after config defaults are applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadRequest {
    pub url: String,
    pub output_dir: PathBuf,
    pub filename: String,
    pub resolution: String,
}

/// Per-stream files removed when the pipeline ends, successful or not.
#[derive(Debug, Default)]
struct StreamFiles(Vec<PathBuf>);

impl StreamFiles {
    fn keep_until_done(&mut self, path: &Path) {
        self.0.push(path.to_path_buf());
    }
}

impl Drop for StreamFiles {
    fn drop(&mut self) {
        for path in &self.0 {
            match fs::remove_file(path) {
                Ok(()) => tracing::debug!(path = %path.display(), "removed stream file"),
                Err(e) if e.kind() == io::ErrorKind::NotFound => {}
                Err(e) => tracing::warn!(path = %path.display(), "could not remove stream file: {}", e),
            }
        }
    }
}

/// Runs the pipeline. Cancellation is reported and is not an error.
pub fn run_download(req: &DownloadRequest, cfg: &DashdlConfig, cancel: &CancelToken) -> Result<ExitCode> {
    let merger = Merger::new(&cfg.ffmpeg);
    report(download_and_merge(req, cfg, &merger, cancel))
}

/// Maps the pipeline outcome to console output and an exit code.
fn report(result: Result<PathBuf>) -> Result<ExitCode> {
    match result {
        Ok(path) => {
            println!("Successfully created {}", path.display());
            Ok(ExitCode::SUCCESS)
        }
        Err(e) if is_cancellation(&e) => {
            tracing::info!("stopped by user: {:#}", e);
            println!("Download cancelled.");
            Ok(ExitCode::SUCCESS)
        }
        Err(e) => Err(e),
    }
}

/// True when the failure itself is a cancellation, not merely concurrent with one.
fn is_cancellation(err: &anyhow::Error) -> bool {
    err.chain().any(|cause| {
        cause.is::<Cancelled>()
            || cause
                .downcast_ref::<DownloadError>()
                .is_some_and(DownloadError::is_cancelled)
            || cause
                .downcast_ref::<FetchError>()
                .is_some_and(FetchError::is_aborted)
    })
}

fn download_and_merge<R: CommandRunner>(
    req: &DownloadRequest,
    cfg: &DashdlConfig,
    merger: &Merger<R>,
    cancel: &CancelToken,
) -> Result<PathBuf> {
    merger.check_dependencies()?;
    cancel.check()?;

    let manifest_url = manifest_url_from_input(&req.url);
    println!("Fetching manifest: {}", manifest_url);
    let mpd = fetch_manifest(&manifest_url, &cfg.fetch_options(), cancel)
        .with_context(|| format!("manifest {}", manifest_url))?;
    let duration = mpd.duration_secs()?;

    let filename = output_filename(&req.filename, mpd.title());
    fs::create_dir_all(&req.output_dir)
        .with_context(|| format!("create output directory {}", req.output_dir.display()))?;
    let output = req.output_dir.join(filename);

    let video = mpd.select_video(parse_resolution(&req.resolution))?;
    let audio = mpd.select_audio()?;
    print_selection("video", &video);
    print_selection("audio", &audio);
    let video = video.descriptor()?;
    let audio = audio.descriptor()?;

    let options = cfg.download_options();
    fs::create_dir_all(&options.temp_dir)
        .with_context(|| format!("create temp directory {}", options.temp_dir.display()))?;

    let mut files = StreamFiles::default();
    let video_path = download_one("video", &manifest_url, &video, duration, &options, cancel)?;
    files.keep_until_done(&video_path);
    let audio_path = download_one("audio", &manifest_url, &audio, duration, &options, cancel)?;
    files.keep_until_done(&audio_path);

    println!("Merging into {}", output.display());
    merger.merge(&video_path, &audio_path, &output)?;
    Ok(output)
}

fn print_selection(label: &str, selected: &SelectedStream<'_>) {
    let rep = selected.representation;
    tracing::info!(
        kind = label,
        id = %rep.id,
        width = rep.width,
        height = rep.height,
        bandwidth = rep.bandwidth,
        codecs = %rep.codecs,
        "selected representation"
    );
    if rep.height > 0 {
        println!("Selected {}: {} ({}x{}, {} bps)", label, rep.id, rep.width, rep.height, rep.bandwidth);
    } else {
        println!("Selected {}: {} ({} bps)", label, rep.id, rep.bandwidth);
    }
}

fn download_one(
    label: &'static str,
    manifest_url: &str,
    stream: &StreamDescriptor,
    duration_secs: f64,
    options: &DownloadOptions,
    cancel: &CancelToken,
) -> Result<PathBuf> {
    println!("Downloading {} stream {}...", label, stream.id);
    let printer = ProgressPrinter::start(label)?;
    let result = download_stream(manifest_url, stream, duration_secs, options, cancel, Some(printer.sender()));
    printer.finish();
    result.with_context(|| format!("{} stream {}", label, stream.id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use dashdl_core::merge::CommandStatus;
    use std::ffi::{OsStr, OsString};
    use std::io::{Read, Write};
    use std::net::TcpListener;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::thread;
    use std::time::{Duration, Instant};
    use tempfile::tempdir;

    const MPD: &str = r#"<MPD mediaPresentationDuration="PT20S">
  <Period>
    <AdaptationSet id="0" mimeType="video/mp4">
      <Representation id="720p" bandwidth="1500000" width="1280" height="720">
        <SegmentTemplate timescale="1" duration="4" startNumber="1"
            initialization="init.mp4" media="$Number$.m4s"/>
      </Representation>
    </AdaptationSet>
    <AdaptationSet id="1" mimeType="audio/mp4">
      <Representation id="aac" bandwidth="128000">
        <SegmentTemplate timescale="1" duration="4" startNumber="1"
            initialization="a-init.mp4" media="a-$Number$.m4s"/>
      </Representation>
    </AdaptationSet>
  </Period>
</MPD>"#;

    /// ffmpeg stand-in: every invocation exits with the configured result.
    struct FakeFfmpeg {
        success: bool,
    }

    impl CommandRunner for FakeFfmpeg {
        fn run(&self, _program: &OsStr, _args: &[OsString]) -> io::Result<CommandStatus> {
            Ok(CommandStatus {
                success: self.success,
                code: Some(if self.success { 0 } else { 1 }),
                stderr_tail: String::new(),
            })
        }
    }

    /// Serves `MPD` for `*.mpd` and never answers anything else. Returns the
    /// base URL and a counter of non-manifest requests.
    fn manifest_then_hang() -> (String, Arc<AtomicUsize>) {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        let segment_requests = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&segment_requests);
        thread::spawn(move || {
            for mut stream in listener.incoming().flatten() {
                let counter = Arc::clone(&counter);
                thread::spawn(move || {
                    let mut buf = [0u8; 4096];
                    let n = stream.read(&mut buf).unwrap_or(0);
                    let request = String::from_utf8_lossy(&buf[..n]);
                    let target = request.split_whitespace().nth(1).unwrap_or("/").to_string();
                    if target.ends_with(".mpd") {
                        let head = format!(
                            "HTTP/1.1 200 OK\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
                            MPD.len()
                        );
                        let _ = stream.write_all(head.as_bytes());
                        let _ = stream.write_all(MPD.as_bytes());
                    } else {
                        counter.fetch_add(1, Ordering::SeqCst);
                        thread::sleep(Duration::from_secs(30));
                    }
                });
            }
        });
        (format!("http://127.0.0.1:{}", port), segment_requests)
    }

    fn request(url: String, output_dir: PathBuf) -> DownloadRequest {
        DownloadRequest {
            url,
            output_dir,
            filename: "output.mp4".into(),
            resolution: "720p".into(),
        }
    }

    #[test]
    fn stream_files_are_removed_on_drop() {
        let dir = tempdir().unwrap();
        let a = dir.path().join("stream-v.mp4");
        let b = dir.path().join("stream-a.mp4");
        fs::write(&a, b"v").unwrap();
        fs::write(&b, b"a").unwrap();
        {
            let mut files = StreamFiles::default();
            files.keep_until_done(&a);
            files.keep_until_done(&b);
            // Already gone: ignored.
            files.keep_until_done(&dir.path().join("missing.mp4"));
        }
        assert!(!a.exists());
        assert!(!b.exists());
    }

    #[test]
    fn cancel_during_stream_download_exits_cleanly() {
        let (base, segment_requests) = manifest_then_hang();
        let dir = tempdir().unwrap();
        let temp_dir = dir.path().join("tmp");
        let cfg = DashdlConfig {
            temp_dir: Some(temp_dir.clone()),
            ..DashdlConfig::default()
        };
        let req = request(format!("{}/videos/7", base), dir.path().join("out"));
        let merger = Merger::with_runner("ffmpeg", FakeFfmpeg { success: true });
        let cancel = CancelToken::new();

        // Cancel once the video init segment request is in flight.
        let trigger = cancel.clone();
        let seen = Arc::clone(&segment_requests);
        thread::spawn(move || {
            let started = Instant::now();
            while seen.load(Ordering::SeqCst) == 0 && started.elapsed() < Duration::from_secs(10) {
                thread::sleep(Duration::from_millis(10));
            }
            trigger.cancel();
        });

        let started = Instant::now();
        let result = download_and_merge(&req, &cfg, &merger, &cancel);
        assert!(started.elapsed() < Duration::from_secs(10));
        assert!(segment_requests.load(Ordering::SeqCst) >= 1);
        let err = result.as_ref().unwrap_err();
        assert!(is_cancellation(err), "got {err:#}");

        assert_eq!(report(result).unwrap(), ExitCode::SUCCESS);
        assert_eq!(fs::read_dir(&temp_dir).unwrap().count(), 0);
        assert!(!dir.path().join("out").join("output.mp4").exists());
    }

    #[test]
    fn cancel_before_start_exits_cleanly() {
        let dir = tempdir().unwrap();
        let cfg = DashdlConfig::default();
        let req = request("http://127.0.0.1:1/video".into(), dir.path().join("out"));
        let merger = Merger::with_runner("ffmpeg", FakeFfmpeg { success: true });
        let cancel = CancelToken::new();
        cancel.cancel();

        let result = download_and_merge(&req, &cfg, &merger, &cancel);
        assert_eq!(report(result).unwrap(), ExitCode::SUCCESS);
        assert!(!dir.path().join("out").exists());
    }

    #[test]
    fn other_failures_stay_errors_after_cancel() {
        let dir = tempdir().unwrap();
        let cfg = DashdlConfig::default();
        let req = request("http://127.0.0.1:1/video".into(), dir.path().join("out"));
        let merger = Merger::with_runner("ffmpeg", FakeFfmpeg { success: false });
        let cancel = CancelToken::new();
        cancel.cancel();

        let result = download_and_merge(&req, &cfg, &merger, &cancel);
        let err = report(result).unwrap_err();
        assert!(format!("{:#}", err).contains("not installed"));
    }

    #[test]
    fn cancellation_is_found_anywhere_in_the_chain() {
        let cancelled = anyhow::Error::from(DownloadError::Cancelled).context("video stream 720p");
        assert!(is_cancellation(&cancelled));

        let aborted = FetchError::Transport {
            url: "http://host/manifest/video.mpd".into(),
            source: curl::Error::new(42), // CURLE_ABORTED_BY_CALLBACK
        };
        let aborted = anyhow::Error::from(dashdl_core::manifest::ManifestError::from(aborted))
            .context("manifest http://host/manifest/video.mpd");
        assert!(is_cancellation(&aborted));

        let failed = anyhow::Error::from(DownloadError::Segment {
            index: 3,
            source: FetchError::Status {
                url: "http://host/3.m4s".into(),
                code: 500,
            },
        });
        assert!(!is_cancellation(&failed));
    }

    #[test]
    fn missing_ffmpeg_fails_before_any_request() {
        let dir = tempdir().unwrap();
        let cfg = DashdlConfig {
            ffmpeg: "dashdl-test-no-such-ffmpeg".into(),
            ..DashdlConfig::default()
        };
        let req = request("http://127.0.0.1:1/video".into(), dir.path().join("out"));
        let err = run_download(&req, &cfg, &CancelToken::new()).unwrap_err();
        assert!(format!("{:#}", err).contains("not installed"));
        assert!(!dir.path().join("out").exists());
    }
}
