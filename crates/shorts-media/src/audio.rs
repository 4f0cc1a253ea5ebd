//! Audio track extraction for transcription.

use std::path::Path;

use crate::command::{FfmpegCommand, FfmpegRunner};
use crate::error::MediaResult;

/// Sample rate of the extracted track.
pub const AUDIO_SAMPLE_RATE: u32 = 16_000;

/// Bitrate of the extracted track.
pub const AUDIO_BITRATE: &str = "64k";

/// Build the command that writes a mono 16 kHz MP3 of the source's audio.
pub fn audio_extract_command(input: &Path, output: &Path) -> FfmpegCommand {
    FfmpegCommand::new(input, output)
        .no_video()
        .output_args(["-ac", "1", "-ar"])
        .output_arg(AUDIO_SAMPLE_RATE.to_string())
        .audio_codec("libmp3lame")
        .audio_bitrate(AUDIO_BITRATE)
}

/// Extract the audio track of `input` to `output`.
pub async fn extract_audio(
    runner: &FfmpegRunner,
    input: impl AsRef<Path>,
    output: impl AsRef<Path>,
) -> MediaResult<()> {
    let cmd = audio_extract_command(input.as_ref(), output.as_ref());
    runner.run(&cmd).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_audio_extract_args() {
        let args = audio_extract_command(Path::new("in.mp4"), Path::new("out.mp3")).build_args();
        let joined = args.join(" ");
        assert!(joined.contains("-vn -ac 1 -ar 16000 -c:a libmp3lame -b:a 64k"));
        assert!(joined.ends_with("out.mp3"));
    }
}
