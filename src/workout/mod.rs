pub mod progress;
pub mod rest_timer;
pub mod session;
