pub mod progress_handler;
pub mod session_handler;
