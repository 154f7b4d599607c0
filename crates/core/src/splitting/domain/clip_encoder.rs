use std::path::{Path, PathBuf};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum EncoderError {
    #[error("encoder binary unavailable: {0}")]
    Unavailable(String),
    #[error("failed to launch encoder at {path}: {source}")]
    Spawn {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("encoder failed on {output}: {stderr}")]
    NonZeroExit { output: PathBuf, stderr: String },
}

/// Domain interface over the external audio encoder.
///
/// Both operations are blocking external-process calls producing PCM s16le
/// WAV at the project sample rate; a non-zero exit status is a hard failure
/// for that invocation.
pub trait ClipEncoder: Send {
    /// Transcode an arbitrary input container/codec to a full-length WAV.
    /// Run once per split so segment cuts never re-decode the original.
    fn transcode_to_wav(&self, input: &Path, output: &Path) -> Result<(), EncoderError>;

    /// Cut `[start_ms, end_ms]` out of an already-transcoded WAV.
    fn extract_clip(
        &self,
        wav: &Path,
        start_ms: u64,
        end_ms: u64,
        output: &Path,
    ) -> Result<(), EncoderError>;
}
