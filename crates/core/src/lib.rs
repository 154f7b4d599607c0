pub mod annotation;
pub mod pipeline;
pub mod project;
pub mod shared;
pub mod splitting;
pub mod transcription;
