//! Cover image extraction.

use std::path::Path;

use crate::command::{FfmpegCommand, FfmpegRunner};
use crate::error::MediaResult;

/// Timestamp the cover frame is taken from.
const COVER_TIMESTAMP: &str = "00:00:01";

/// Width the cover is scaled to (height follows the aspect ratio).
const COVER_SCALE_WIDTH: u32 = 720;

/// Extract a still cover image from a rendered video.
pub async fn extract_cover(
    video_path: impl AsRef<Path>,
    output_path: impl AsRef<Path>,
) -> MediaResult<()> {
    let mut cmd = FfmpegCommand::new(output_path.as_ref());
    cmd.input_with_args(video_path.as_ref(), ["-ss", COVER_TIMESTAMP]);
    let cmd = cmd
        .single_frame()
        .output_arg("-vf")
        .output_arg(format!("scale={}:-2", COVER_SCALE_WIDTH))
        .log_level("error");

    FfmpegRunner::new().run(&cmd).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cover_command_args() {
        let mut cmd = FfmpegCommand::new("cover.jpg");
        cmd.input_with_args("video.mp4", ["-ss", COVER_TIMESTAMP]);
        let cmd = cmd.single_frame();

        let args = cmd.build_args();
        assert!(args.contains(&"-vframes".to_string()));
        assert!(args.contains(&"00:00:01".to_string()));
    }
}
