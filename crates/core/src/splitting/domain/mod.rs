pub mod clip_encoder;
pub mod planner;
