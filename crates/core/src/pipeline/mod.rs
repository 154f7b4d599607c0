pub mod batch_logger;
pub mod infrastructure;
pub mod split_audio_use_case;
pub mod transcribe_batch_use_case;
