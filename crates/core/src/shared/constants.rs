/// Sample rate of the intermediate WAV and every extracted clip.
pub const CLIP_SAMPLE_RATE: u32 = 44100;

/// Sample rate the transcription provider expects clips to carry.
pub const ASR_SAMPLE_RATE: u32 = 16000;

/// Fixed name of the project file inside the output directory.
pub const PROJECT_FILENAME: &str = "textgrid_project.json";

pub const PROJECT_VERSION: u32 = 1;

pub const DEFAULT_ASR_MODEL: &str = "chirp_3";
pub const DEFAULT_ASR_LOCATION: &str = "us";
pub const DEFAULT_RECOGNIZER_ID: &str = "default";
pub const DEFAULT_LANGUAGE: &str = "en-US";

/// Directory name used when a tier name sanitizes to nothing.
pub const FALLBACK_TIER_DIR: &str = "tier";
