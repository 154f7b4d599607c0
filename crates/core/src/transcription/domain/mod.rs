pub mod decoding;
pub mod transcriber;
