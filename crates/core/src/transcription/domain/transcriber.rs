use std::path::{Path, PathBuf};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum TranscribeError {
    #[error("missing or invalid credentials: {0}")]
    Credentials(String),
    #[error(
        "missing Google Cloud project ID; set GOOGLE_CLOUD_PROJECT or provide a \
         service account key"
    )]
    ProjectId,
    #[error("recognizer error: {0}")]
    Recognizer(String),
    #[error("permission denied: {0}")]
    PermissionDenied(String),
    #[error("transcription service error: {0}")]
    Service(String),
    #[error("failed to read clip {path}: {source}")]
    Audio {
        path: PathBuf,
        #[source]
        source: hound::Error,
    },
}

/// Domain interface for remote speech-to-text.
///
/// One at-most-once call per clip; no retries. Batch orchestration lives in
/// the use case, not here.
pub trait ClipTranscriber: Send {
    fn transcribe(&self, clip: &Path) -> Result<String, TranscribeError>;
}
