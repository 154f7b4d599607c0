pub mod annotation_reader;
pub mod interval;
