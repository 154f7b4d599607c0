pub mod project;
pub mod segment;
