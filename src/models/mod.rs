pub mod common;
pub mod exercise;
pub mod profile;
pub mod progress;
pub mod routine;
pub mod session;
