//! Rendition transcoding via ffmpeg.

use std::path::Path;
use std::time::Duration;

use tubecast_core::config::TranscodeConfig;
use tubecast_core::Result;

use crate::command::ToolCommand;
use crate::tools::ToolRegistry;

/// Arguments for transcoding `input` down to the configured rendition.
///
/// `-movflags +faststart` places the moov atom at the front of the file so
/// playback can begin before the whole file has transferred.
fn transcode_args(input: &Path, output: &Path, settings: &TranscodeConfig) -> Vec<String> {
    vec![
        "-y".to_string(),
        "-i".to_string(),
        input.to_string_lossy().into_owned(),
        "-vf".to_string(),
        format!("scale={}:{}", settings.width, settings.height),
        "-r".to_string(),
        settings.fps.to_string(),
        "-b:v".to_string(),
        settings.video_bitrate.clone(),
        "-b:a".to_string(),
        settings.audio_bitrate.clone(),
        "-ac".to_string(),
        settings.audio_channels.to_string(),
        "-c:v".to_string(),
        settings.video_codec.clone(),
        "-c:a".to_string(),
        settings.audio_codec.clone(),
        "-movflags".to_string(),
        "+faststart".to_string(),
        output.to_string_lossy().into_owned(),
    ]
}

/// Transcode `input` to the low-bandwidth rendition at `output`.
pub async fn transcode(
    tools: &ToolRegistry,
    input: &Path,
    output: &Path,
    settings: &TranscodeConfig,
    timeout: Duration,
) -> Result<()> {
    let ffmpeg = tools.require("ffmpeg")?;

    tracing::info!("transcode {} -> {}", input.display(), output.display());

    ToolCommand::new("ffmpeg", ffmpeg)
        .args(transcode_args(input, output, settings))
        .timeout(timeout)
        .run()
        .await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn default_args_match_rendition() {
        let settings = TranscodeConfig::default();
        let args = transcode_args(
            &PathBuf::from("/ws/source.webm"),
            &PathBuf::from("/ws/out.mp4"),
            &settings,
        );
        assert_eq!(
            args,
            vec![
                "-y",
                "-i",
                "/ws/source.webm",
                "-vf",
                "scale=320:240",
                "-r",
                "15",
                "-b:v",
                "384k",
                "-b:a",
                "12k",
                "-ac",
                "1",
                "-c:v",
                "libx264",
                "-c:a",
                "aac",
                "-movflags",
                "+faststart",
                "/ws/out.mp4",
            ]
        );
    }

    #[test]
    fn custom_dimensions_flow_into_scale_filter() {
        let settings = TranscodeConfig {
            width: 640,
            height: 480,
            ..Default::default()
        };
        let args = transcode_args(Path::new("in"), Path::new("out"), &settings);
        assert!(args.contains(&"scale=640:480".to_string()));
    }
}
