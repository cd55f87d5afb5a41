pub mod progress;
pub mod training_sessions;

pub use training_sessions::{TrainingError, TrainingSessions};
