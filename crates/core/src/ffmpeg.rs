//! Video metadata probing via `ffprobe`.
//!
//! Only duration and frame rate are consumed. Probing is best-effort: callers
//! log a failure and store null metadata rather than aborting.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Default wall-clock bound for a single probe.
pub const DEFAULT_PROBE_TIMEOUT: Duration = Duration::from_secs(10);

/// Error type for ffprobe invocations.
#[derive(Debug, thiserror::Error)]
pub enum FfmpegError {
    #[error("ffprobe binary not found: {0}")]
    NotFound(std::io::Error),

    #[error("ffprobe execution failed (exit code {exit_code:?}): {stderr}")]
    ExecutionFailed {
        exit_code: Option<i32>,
        stderr: String,
    },

    #[error("ffprobe timed out after {0:?}")]
    Timeout(Duration),

    #[error("failed to parse ffprobe output: {0}")]
    ParseError(String),

    #[error("video file not found: {0}")]
    VideoNotFound(String),
}

impl From<FfmpegError> for crate::error::CoreError {
    fn from(err: FfmpegError) -> Self {
        crate::error::CoreError::MetadataProbe(err.to_string())
    }
}

/// Metadata extracted from a stored clip. Either field may be missing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct VideoMetadata {
    pub frame_rate: Option<f64>,
    pub duration: Option<f64>,
}

// ---------------------------------------------------------------------------
// Probe collaborator
// ---------------------------------------------------------------------------

/// Extracts [`VideoMetadata`] from a file on disk.
#[async_trait::async_trait]
pub trait VideoProbe: Send + Sync {
    async fn probe(&self, path: &Path) -> Result<VideoMetadata, FfmpegError>;
}

/// [`VideoProbe`] backed by the `ffprobe` binary on `PATH`.
#[derive(Debug, Clone)]
pub struct FfprobeProbe {
    timeout: Duration,
}

impl FfprobeProbe {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }
}

impl Default for FfprobeProbe {
    fn default() -> Self {
        Self::new(DEFAULT_PROBE_TIMEOUT)
    }
}

#[async_trait::async_trait]
impl VideoProbe for FfprobeProbe {
    async fn probe(&self, path: &Path) -> Result<VideoMetadata, FfmpegError> {
        let output = probe_video(path, self.timeout).await?;
        Ok(VideoMetadata {
            frame_rate: parse_framerate(&output),
            duration: parse_duration(&output),
        })
    }
}

// ---------------------------------------------------------------------------
// ffprobe JSON output structures
// ---------------------------------------------------------------------------

/// Top-level ffprobe JSON output (`-print_format json -show_format -show_streams`).
#[derive(Debug, Deserialize)]
pub struct FfprobeOutput {
    #[serde(default)]
    pub streams: Vec<FfprobeStream>,
    #[serde(default)]
    pub format: FfprobeFormat,
}

#[derive(Debug, Deserialize)]
pub struct FfprobeStream {
    pub codec_type: Option<String>,
    /// e.g. "30/1" or "24000/1001"
    pub r_frame_rate: Option<String>,
    pub avg_frame_rate: Option<String>,
    pub duration: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct FfprobeFormat {
    pub duration: Option<String>,
}

/// Run `ffprobe` on `path`, killing it if it outlives `timeout`.
pub async fn probe_video(path: &Path, timeout: Duration) -> Result<FfprobeOutput, FfmpegError> {
    if !path.exists() {
        return Err(FfmpegError::VideoNotFound(
            path.to_string_lossy().to_string(),
        ));
    }

    let mut cmd = tokio::process::Command::new("ffprobe");
    cmd.args([
        "-v",
        "quiet",
        "-print_format",
        "json",
        "-show_format",
        "-show_streams",
    ])
    .arg(path)
    .kill_on_drop(true);

    // On timeout the `output()` future is dropped, which kills the child.
    let output = tokio::time::timeout(timeout, cmd.output())
        .await
        .map_err(|_| FfmpegError::Timeout(timeout))?
        .map_err(FfmpegError::NotFound)?;

    if !output.status.success() {
        return Err(FfmpegError::ExecutionFailed {
            exit_code: output.status.code(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
        });
    }

    parse_probe_output(&output.stdout)
}

/// Parse raw ffprobe stdout.
pub fn parse_probe_output(stdout: &[u8]) -> Result<FfprobeOutput, FfmpegError> {
    serde_json::from_slice::<FfprobeOutput>(stdout).map_err(|e| {
        FfmpegError::ParseError(format!("{e}: {}", String::from_utf8_lossy(stdout)))
    })
}

// ---------------------------------------------------------------------------
// Parsing helpers
// ---------------------------------------------------------------------------

fn first_video_stream(probe: &FfprobeOutput) -> Option<&FfprobeStream> {
    probe
        .streams
        .iter()
        .find(|s| s.codec_type.as_deref() == Some("video"))
}

/// Duration in seconds: format-level first, then the first video stream.
pub fn parse_duration(probe: &FfprobeOutput) -> Option<f64> {
    let from_stream = || first_video_stream(probe).and_then(|s| s.duration.as_deref());
    probe
        .format
        .duration
        .as_deref()
        .and_then(parse_positive)
        .or_else(|| from_stream().and_then(parse_positive))
}

/// Frame rate of the first video stream.
///
/// `avg_frame_rate` is preferred; `r_frame_rate` is the fallback for
/// containers that report `0/0` as the average.
pub fn parse_framerate(probe: &FfprobeOutput) -> Option<f64> {
    let stream = first_video_stream(probe)?;
    [stream.avg_frame_rate.as_deref(), stream.r_frame_rate.as_deref()]
        .into_iter()
        .flatten()
        .filter_map(parse_fraction)
        .find(|fps| *fps > 0.0)
}

/// Parse a fraction string like `"30/1"` (or a plain number) into a float.
fn parse_fraction(s: &str) -> Option<f64> {
    match s.split_once('/') {
        Some((num, den)) => {
            let num = num.trim().parse::<f64>().ok()?;
            let den = den.trim().parse::<f64>().ok()?;
            (den > 0.0).then(|| num / den).filter(|v| v.is_finite())
        }
        None => s.trim().parse::<f64>().ok().filter(|v| v.is_finite()),
    }
}

fn parse_positive(s: &str) -> Option<f64> {
    s.trim()
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite() && *v > 0.0)
}
