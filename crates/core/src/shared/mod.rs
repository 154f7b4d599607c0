pub mod constants;
pub mod paths;
