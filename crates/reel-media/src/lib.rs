//! FFmpeg CLI wrapper for the Reelsmith rendering pipeline.
//!
//! This crate provides:
//! - An FFmpeg command builder/runner with progress parsing and timeouts
//! - FFprobe probing, including container-fallback audio probing
//! - Pure filter-string builders for the compositor
//! - Job-scoped workspace directories with guaranteed cleanup
//! - Cover-frame extraction

pub mod command;
pub mod cover;
pub mod error;
pub mod filters;
pub mod probe;
pub mod workspace;

pub use command::{check_ffmpeg, check_ffprobe, FfmpegCommand, FfmpegRunner};
pub use cover::extract_cover;
pub use error::{MediaError, MediaResult};
pub use probe::{probe_audio_duration, probe_media, MediaInfo};
pub use workspace::{move_file, JobWorkspace};
