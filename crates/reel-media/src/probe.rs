//! FFprobe media information.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::process::Stdio;
use tokio::process::Command;
use tracing::debug;

use crate::error::{MediaError, MediaResult};

/// Probed media file information.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MediaInfo {
    /// Duration in seconds
    pub duration: f64,
    /// Width in pixels (0 for audio-only files)
    pub width: u32,
    /// Height in pixels (0 for audio-only files)
    pub height: u32,
    /// File size in bytes
    pub size: u64,
    /// Whether the file carries an audio stream
    pub has_audio: bool,
}

/// FFprobe JSON output format.
#[derive(Debug, Deserialize)]
struct FfprobeOutput {
    format: FfprobeFormat,
    streams: Vec<FfprobeStream>,
}

#[derive(Debug, Deserialize)]
struct FfprobeFormat {
    duration: Option<String>,
    size: Option<String>,
}

#[derive(Debug, Deserialize)]
struct FfprobeStream {
    codec_type: String,
    width: Option<u32>,
    height: Option<u32>,
}

/// Probe a media file, optionally forcing the input container format.
async fn run_ffprobe(path: &Path, forced_format: Option<&str>) -> MediaResult<FfprobeOutput> {
    which::which("ffprobe").map_err(|_| MediaError::FfprobeNotFound)?;

    let mut cmd = Command::new("ffprobe");
    cmd.args([
        "-v",
        "quiet",
        "-print_format",
        "json",
        "-show_format",
        "-show_streams",
    ]);
    if let Some(format) = forced_format {
        cmd.args(["-f", format]);
    }
    let output = cmd
        .arg(path)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .output()
        .await?;

    if !output.status.success() {
        return Err(MediaError::ffprobe_failed(
            "FFprobe failed",
            Some(String::from_utf8_lossy(&output.stderr).to_string()),
        ));
    }

    Ok(serde_json::from_slice(&output.stdout)?)
}

fn parse_info(probe: FfprobeOutput) -> MediaInfo {
    let duration = probe
        .format
        .duration
        .as_ref()
        .and_then(|d| d.parse::<f64>().ok())
        .unwrap_or(0.0);

    let size = probe
        .format
        .size
        .as_ref()
        .and_then(|s| s.parse::<u64>().ok())
        .unwrap_or(0);

    let video = probe.streams.iter().find(|s| s.codec_type == "video");
    let has_audio = probe.streams.iter().any(|s| s.codec_type == "audio");

    MediaInfo {
        duration,
        width: video.and_then(|s| s.width).unwrap_or(0),
        height: video.and_then(|s| s.height).unwrap_or(0),
        size,
        has_audio,
    }
}

/// Probe a media file for information.
pub async fn probe_media(path: impl AsRef<Path>) -> MediaResult<MediaInfo> {
    let path = path.as_ref();

    if !path.exists() {
        return Err(MediaError::FileNotFound(path.to_path_buf()));
    }

    let probe = run_ffprobe(path, None).await?;
    Ok(parse_info(probe))
}

/// Probe an audio file's duration, falling back through container guesses.
///
/// Synthesized narration clips occasionally arrive with a misleading
/// extension; the declared container is tried first, then `mp3`, then `wav`.
/// When every guess fails the file is unreadable and the job must fail.
pub async fn probe_audio_duration(path: impl AsRef<Path>) -> MediaResult<f64> {
    let path = path.as_ref();

    if !path.exists() {
        return Err(MediaError::FileNotFound(path.to_path_buf()));
    }

    let guesses: [Option<&str>; 3] = [None, Some("mp3"), Some("wav")];
    for forced in guesses {
        match run_ffprobe(path, forced).await {
            Ok(probe) => {
                let info = parse_info(probe);
                if info.has_audio && info.duration > 0.0 {
                    if let Some(format) = forced {
                        debug!(
                            "Probed {} as forced {} container",
                            path.display(),
                            format
                        );
                    }
                    return Ok(info.duration);
                }
            }
            Err(MediaError::FfprobeNotFound) => return Err(MediaError::FfprobeNotFound),
            Err(e) => {
                debug!(
                    "Probe attempt ({:?}) failed for {}: {}",
                    forced,
                    path.display(),
                    e
                );
            }
        }
    }

    Err(MediaError::UnreadableAudio(path.to_path_buf()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn probe_fixture(streams: &[(&str, Option<u32>)], duration: &str) -> FfprobeOutput {
        FfprobeOutput {
            format: FfprobeFormat {
                duration: Some(duration.to_string()),
                size: Some("2048".to_string()),
            },
            streams: streams
                .iter()
                .map(|(kind, dim)| FfprobeStream {
                    codec_type: kind.to_string(),
                    width: *dim,
                    height: *dim,
                })
                .collect(),
        }
    }

    #[test]
    fn test_parse_info_video_with_audio() {
        let info = parse_info(probe_fixture(
            &[("video", Some(1080)), ("audio", None)],
            "12.5",
        ));
        assert!((info.duration - 12.5).abs() < 1e-9);
        assert_eq!(info.width, 1080);
        assert!(info.has_audio);
        assert_eq!(info.size, 2048);
    }

    #[test]
    fn test_parse_info_audio_only() {
        let info = parse_info(probe_fixture(&[("audio", None)], "3.2"));
        assert_eq!(info.width, 0);
        assert!(info.has_audio);
    }

    #[tokio::test]
    async fn test_probe_missing_file() {
        let err = probe_media("/nonexistent/clip.mp4").await.unwrap_err();
        assert!(matches!(err, MediaError::FileNotFound(_)));
    }
}
