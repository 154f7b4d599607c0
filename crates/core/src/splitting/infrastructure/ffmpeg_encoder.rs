use std::path::{Path, PathBuf};
use std::process::Command;

use crate::shared::constants::CLIP_SAMPLE_RATE;
use crate::splitting::domain::clip_encoder::{ClipEncoder, EncoderError};

/// Resolve the ffmpeg binary.
///
/// Packaged installs place ffmpeg next to the application executable (the
/// sidecar layout); development and Linux system installs use the binary on
/// PATH. `ffmpeg_sidecar::paths::ffmpeg_path()` returns the sidecar location
/// when it exists and falls back to plain `ffmpeg` otherwise.
pub fn resolve_ffmpeg_path() -> PathBuf {
    ffmpeg_sidecar::paths::ffmpeg_path()
}

/// Shells out to ffmpeg for the one-time transcode and per-segment cuts.
pub struct FfmpegEncoder {
    ffmpeg_path: PathBuf,
}

impl FfmpegEncoder {
    pub fn new(ffmpeg_path: PathBuf) -> Self {
        Self { ffmpeg_path }
    }

    /// Resolve ffmpeg and verify it actually runs. Splitting is disabled
    /// while this fails; callers re-probe on demand.
    pub fn probe() -> Result<Self, EncoderError> {
        let path = resolve_ffmpeg_path();
        let status = Command::new(&path)
            .arg("-version")
            .output()
            .map_err(|e| EncoderError::Unavailable(format!("{}: {e}", path.display())))?;
        if !status.status.success() {
            return Err(EncoderError::Unavailable(format!(
                "{} exited with {}",
                path.display(),
                status.status
            )));
        }
        log::info!("ffmpeg found at {}", path.display());
        Ok(Self::new(path))
    }

    fn run(&self, args: &[&str], output: &Path) -> Result<(), EncoderError> {
        log::debug!("ffmpeg {}", args.join(" "));
        let result = Command::new(&self.ffmpeg_path)
            .args(["-y", "-hide_banner", "-loglevel", "error"])
            .args(args)
            .output()
            .map_err(|source| EncoderError::Spawn {
                path: self.ffmpeg_path.clone(),
                source,
            })?;
        if !result.status.success() {
            return Err(EncoderError::NonZeroExit {
                output: output.to_path_buf(),
                stderr: String::from_utf8_lossy(&result.stderr).trim().to_string(),
            });
        }
        Ok(())
    }
}

impl ClipEncoder for FfmpegEncoder {
    fn transcode_to_wav(&self, input: &Path, output: &Path) -> Result<(), EncoderError> {
        let rate = CLIP_SAMPLE_RATE.to_string();
        self.run(
            &[
                "-i",
                &input.to_string_lossy(),
                "-acodec",
                "pcm_s16le",
                "-ar",
                &rate,
                &output.to_string_lossy(),
            ],
            output,
        )
    }

    fn extract_clip(
        &self,
        wav: &Path,
        start_ms: u64,
        end_ms: u64,
        output: &Path,
    ) -> Result<(), EncoderError> {
        let rate = CLIP_SAMPLE_RATE.to_string();
        self.run(
            &[
                "-ss",
                &format_seconds(start_ms),
                "-to",
                &format_seconds(end_ms),
                "-i",
                &wav.to_string_lossy(),
                "-acodec",
                "pcm_s16le",
                "-ar",
                &rate,
                &output.to_string_lossy(),
            ],
            output,
        )
    }
}

/// Milliseconds as a seconds string with millisecond precision (`1234` →
/// `"1.234"`), the form ffmpeg accepts for `-ss`/`-to`.
fn format_seconds(ms: u64) -> String {
    format!("{}.{:03}", ms / 1000, ms % 1000)
}
