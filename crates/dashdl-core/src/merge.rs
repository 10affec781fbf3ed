//! Audio/video merge through an external ffmpeg process.
//!
//! The process launch goes through [`CommandRunner`] so tests can substitute
//! a fake without spawning anything.

use std::ffi::{OsStr, OsString};
use std::io;
use std::path::Path;
use std::process::{Command, Stdio};

/// Lines of stderr kept from a failed command.
const STDERR_TAIL_LINES: usize = 20;

/// Exit state of an external command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandStatus {
    pub success: bool,
    /// `None` when the process was killed by a signal.
    pub code: Option<i32>,
    /// Last lines of stderr in output order; empty on success.
    pub stderr_tail: String,
}

/// Runs an external program to completion.
pub trait CommandRunner {
    fn run(&self, program: &OsStr, args: &[OsString]) -> io::Result<CommandStatus>;
}

/// Runs commands with `std::process::Command`, logging their stderr.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemRunner;

impl CommandRunner for SystemRunner {
    fn run(&self, program: &OsStr, args: &[OsString]) -> io::Result<CommandStatus> {
        let output = Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .output()?;
        let success = output.status.success();
        let stderr_tail = if success {
            String::new()
        } else {
            let tail = tail_lines(&String::from_utf8_lossy(&output.stderr), STDERR_TAIL_LINES);
            for line in tail.lines() {
                tracing::warn!(program = %program.to_string_lossy(), "stderr: {}", line);
            }
            tail
        };
        Ok(CommandStatus {
            success,
            code: output.status.code(),
            stderr_tail,
        })
    }
}

/// The last `n` non-empty lines of `text`, oldest first.
fn tail_lines(text: &str, n: usize) -> String {
    let lines: Vec<&str> = text.lines().filter(|l| !l.trim().is_empty()).collect();
    lines[lines.len().saturating_sub(n)..].join("\n")
}

#[derive(Debug, thiserror::Error)]
pub enum MergeError {
    #[error("{tool} is not installed or not in PATH; it is required to merge audio and video")]
    MissingTool {
        tool: String,
        #[source]
        source: Option<io::Error>,
    },
    #[error("failed to start {tool}")]
    Spawn {
        tool: String,
        #[source]
        source: io::Error,
    },
    #[error("{tool} merge failed (exit code {code:?}): {stderr_tail}")]
    Failed {
        tool: String,
        code: Option<i32>,
        stderr_tail: String,
    },
}

/// Muxes a video-only and an audio-only file into one container without re-encoding.
#[derive(Debug, Clone)]
pub struct Merger<R = SystemRunner> {
    ffmpeg: OsString,
    runner: R,
}

impl Merger<SystemRunner> {
    pub fn new(ffmpeg: impl Into<OsString>) -> Self {
        Self::with_runner(ffmpeg, SystemRunner)
    }
}

impl<R: CommandRunner> Merger<R> {
    pub fn with_runner(ffmpeg: impl Into<OsString>, runner: R) -> Self {
        Self {
            ffmpeg: ffmpeg.into(),
            runner,
        }
    }

    fn tool(&self) -> String {
        self.ffmpeg.to_string_lossy().into_owned()
    }

    /// Verifies the ffmpeg binary can be launched (`ffmpeg -version`).
    pub fn check_dependencies(&self) -> Result<(), MergeError> {
        match self.runner.run(&self.ffmpeg, &[OsString::from("-version")]) {
            Ok(status) if status.success => Ok(()),
            Ok(_) => Err(MergeError::MissingTool {
                tool: self.tool(),
                source: None,
            }),
            Err(e) => Err(MergeError::MissingTool {
                tool: self.tool(),
                source: Some(e),
            }),
        }
    }

    /// `-y -i <video> -i <audio> -c:v copy -c:a copy <output>`
    pub fn merge_args(video: &Path, audio: &Path, output: &Path) -> Vec<OsString> {
        vec![
            "-y".into(),
            "-i".into(),
            video.into(),
            "-i".into(),
            audio.into(),
            "-c:v".into(),
            "copy".into(),
            "-c:a".into(),
            "copy".into(),
            output.into(),
        ]
    }

    pub fn merge(&self, video: &Path, audio: &Path, output: &Path) -> Result<(), MergeError> {
        tracing::info!(
            video = %video.display(),
            audio = %audio.display(),
            output = %output.display(),
            "merging streams"
        );
        let args = Self::merge_args(video, audio, output);
        let status = self
            .runner
            .run(&self.ffmpeg, &args)
            .map_err(|source| MergeError::Spawn {
                tool: self.tool(),
                source,
            })?;
        if !status.success {
            let stderr_tail = if status.stderr_tail.is_empty() {
                "no stderr output".to_string()
            } else {
                status.stderr_tail
            };
            return Err(MergeError::Failed {
                tool: self.tool(),
                code: status.code,
                stderr_tail,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    /// Records invocations and replays a fixed outcome.
    struct FakeRunner {
        calls: Mutex<Vec<(OsString, Vec<OsString>)>>,
        outcome: fn() -> io::Result<CommandStatus>,
    }

    impl FakeRunner {
        fn new(outcome: fn() -> io::Result<CommandStatus>) -> Self {
            Self {
                calls: Mutex::new(Vec::new()),
                outcome,
            }
        }
    }

    impl CommandRunner for &FakeRunner {
        fn run(&self, program: &OsStr, args: &[OsString]) -> io::Result<CommandStatus> {
            self.calls
                .lock()
                .unwrap()
                .push((program.to_os_string(), args.to_vec()));
            (self.outcome)()
        }
    }

    fn succeed() -> io::Result<CommandStatus> {
        Ok(CommandStatus {
            success: true,
            code: Some(0),
            stderr_tail: String::new(),
        })
    }

    fn exit_one() -> io::Result<CommandStatus> {
        Ok(CommandStatus {
            success: false,
            code: Some(1),
            stderr_tail: "video.mp4: Invalid data found when processing input".into(),
        })
    }

    fn killed() -> io::Result<CommandStatus> {
        Ok(CommandStatus {
            success: false,
            code: None,
            stderr_tail: String::new(),
        })
    }

    fn not_found() -> io::Result<CommandStatus> {
        Err(io::Error::new(io::ErrorKind::NotFound, "no such file"))
    }

    #[test]
    fn merge_invokes_ffmpeg_with_copy_codecs() {
        let runner = FakeRunner::new(succeed);
        let merger = Merger::with_runner("ffmpeg", &runner);
        merger
            .merge(Path::new("video.mp4"), Path::new("audio.mp4"), Path::new("out.mp4"))
            .unwrap();

        let calls = runner.calls.lock().unwrap();
        assert_eq!(calls.len(), 1);
        let (program, args) = &calls[0];
        assert_eq!(program, "ffmpeg");
        let args: Vec<_> = args.iter().map(|a| a.to_string_lossy().into_owned()).collect();
        assert_eq!(
            args,
            [
                "-y", "-i", "video.mp4", "-i", "audio.mp4", "-c:v", "copy", "-c:a", "copy",
                "out.mp4"
            ]
        );
    }

    #[test]
    fn merge_reports_non_zero_exit() {
        let runner = FakeRunner::new(exit_one);
        let merger = Merger::with_runner("ffmpeg", &runner);
        let err = merger
            .merge(Path::new("v"), Path::new("a"), Path::new("o"))
            .unwrap_err();
        assert!(matches!(err, MergeError::Failed { code: Some(1), .. }));
        assert!(err.to_string().ends_with("video.mp4: Invalid data found when processing input"));
    }

    #[test]
    fn merge_failure_without_stderr() {
        let runner = FakeRunner::new(killed);
        let err = Merger::with_runner("ffmpeg", &runner)
            .merge(Path::new("v"), Path::new("a"), Path::new("o"))
            .unwrap_err();
        assert_eq!(err.to_string(), "ffmpeg merge failed (exit code None): no stderr output");
    }

    #[test]
    fn stderr_tail_keeps_last_lines_in_order() {
        let stderr: String = (1..=30).map(|i| format!("line {i}\n\n")).collect();
        let tail = tail_lines(&stderr, STDERR_TAIL_LINES);
        let lines: Vec<&str> = tail.lines().collect();
        assert_eq!(lines.len(), 20);
        assert_eq!(lines.first(), Some(&"line 11"));
        assert_eq!(lines.last(), Some(&"line 30"));
        assert_eq!(tail_lines("only\n", 20), "only");
        assert_eq!(tail_lines("", 20), "");
    }

    #[test]
    fn merge_reports_spawn_failure() {
        let runner = FakeRunner::new(not_found);
        let merger = Merger::with_runner("/opt/ffmpeg", &runner);
        let err = merger
            .merge(Path::new("v"), Path::new("a"), Path::new("o"))
            .unwrap_err();
        assert!(matches!(err, MergeError::Spawn { ref tool, .. } if tool == "/opt/ffmpeg"));
    }

    #[test]
    fn check_dependencies_runs_version() {
        let runner = FakeRunner::new(succeed);
        Merger::with_runner("ffmpeg", &runner)
            .check_dependencies()
            .unwrap();
        let calls = runner.calls.lock().unwrap();
        assert_eq!(calls[0].1, vec![OsString::from("-version")]);
    }

    #[test]
    fn check_dependencies_missing_tool() {
        let missing = FakeRunner::new(not_found);
        let err = Merger::with_runner("ffmpeg", &missing)
            .check_dependencies()
            .unwrap_err();
        assert!(matches!(err, MergeError::MissingTool { source: Some(_), .. }));

        let broken = FakeRunner::new(exit_one);
        let err = Merger::with_runner("ffmpeg", &broken)
            .check_dependencies()
            .unwrap_err();
        assert!(matches!(err, MergeError::MissingTool { source: None, .. }));
        assert!(err.to_string().contains("not installed"));
    }
}
