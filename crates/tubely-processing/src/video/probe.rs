use async_trait::async_trait;
use serde::Deserialize;
use std::ffi::OsStr;
use std::path::Path;
use std::time::Duration;
use tubely_core::models::AspectCategory;

use crate::command::run_tool;

/// Classifies a staged video's aspect ratio.
///
/// `None` means "unknown": callers proceed without aspect tagging.
#[async_trait]
pub trait Prober: Send + Sync {
    async fn probe(&self, path: &Path) -> Option<AspectCategory>;
}

#[derive(Debug, Deserialize)]
struct ProbeOutput {
    #[serde(default)]
    streams: Vec<ProbeStream>,
}

#[derive(Debug, Deserialize)]
struct ProbeStream {
    width: Option<u32>,
    height: Option<u32>,
}

/// Width and height of the first stream in ffprobe's JSON output.
pub fn parse_dimensions(stdout: &[u8]) -> Option<(u32, u32)> {
    let output: ProbeOutput = serde_json::from_slice(stdout).ok()?;
    let stream = output.streams.into_iter().next()?;
    Some((stream.width?, stream.height?))
}

pub struct FfprobeProber {
    ffprobe_path: String,
    timeout: Duration,
}

impl FfprobeProber {
    pub fn new(ffprobe_path: impl Into<String>, timeout: Duration) -> Self {
        Self {
            ffprobe_path: ffprobe_path.into(),
            timeout,
        }
    }
}

#[async_trait]
impl Prober for FfprobeProber {
    #[tracing::instrument(skip(self), fields(
        process.executable.name = "ffprobe",
        process.executable.path = %self.ffprobe_path,
        ffmpeg.operation = "probe"
    ))]
    async fn probe(&self, path: &Path) -> Option<AspectCategory> {
        let args = [
            OsStr::new("-v"),
            OsStr::new("error"),
            OsStr::new("-select_streams"),
            OsStr::new("v:0"),
            OsStr::new("-show_entries"),
            OsStr::new("stream=width,height"),
            OsStr::new("-of"),
            OsStr::new("json"),
            path.as_os_str(),
        ];

        let output = match run_tool(&self.ffprobe_path, args, self.timeout).await {
            Ok(output) => output,
            Err(e) => {
                tracing::warn!(error = %e, path = %path.display(), "Video probe failed");
                return None;
            }
        };

        let Some((width, height)) = parse_dimensions(&output.stdout) else {
            tracing::warn!(
                path = %path.display(),
                stdout = %String::from_utf8_lossy(&output.stdout),
                "Video probe returned no usable dimensions"
            );
            return None;
        };

        let category = AspectCategory::classify(width, height);
        tracing::info!(width, height, category = %category, "Video probe completed");
        Some(category)
    }
}
