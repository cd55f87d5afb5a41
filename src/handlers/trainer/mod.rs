pub mod exercise_handler;
pub mod routine_handler;
pub mod trainee_handler;
