//! Store boundary.
//!
//! Every screen of the application reads or writes through [`GymStore`].
//! Two implementations exist:
//! - [`postgres::PgStore`] backs production deployments
//! - [`memory::InMemoryStore`] backs local runs and the test-suite
//!
//! Rows are parsed into typed models at this boundary (see [`records`]);
//! a row that violates the model fails with [`StoreError::MalformedRecord`]
//! instead of leaking half-valid data upwards.

use async_trait::async_trait;
use uuid::Uuid;

use crate::models::exercise::{ExerciseDefinition, ExerciseInput};
use crate::models::profile::Profile;
use crate::models::progress::{NewProgressLog, ProgressLogEntry};
use crate::models::routine::{NewRoutine, NewSlot, Routine, SlotUpdate, SlotWithExercise};

pub mod memory;
pub mod postgres;
pub mod records;

pub use memory::InMemoryStore;
pub use postgres::PgStore;

pub(crate) const DUPLICATE_POSITIONS: &str = "Slot positions must be unique within a routine";

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Invalid input: {0}")]
    Validation(String),

    #[error("Malformed {table} record: {reason}")]
    MalformedRecord { table: &'static str, reason: String },

    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

impl StoreError {
    pub fn malformed(table: &'static str, reason: impl Into<String>) -> Self {
        StoreError::MalformedRecord {
            table,
            reason: reason.into(),
        }
    }
}

#[async_trait]
pub trait GymStore: Send + Sync {
    // Identity records
    async fn get_profile(&self, id: Uuid) -> Result<Option<Profile>, StoreError>;
    /// Trainee profiles ordered by name
    async fn list_trainees(&self) -> Result<Vec<Profile>, StoreError>;

    // Exercise catalog
    /// Whole catalog ordered by name
    async fn list_exercises(&self) -> Result<Vec<ExerciseDefinition>, StoreError>;
    /// Definitions for the given ids ordered by name; unknown ids are skipped
    async fn list_exercise_definitions(&self, ids: &[Uuid]) -> Result<Vec<ExerciseDefinition>, StoreError>;
    async fn create_exercise(&self, input: ExerciseInput) -> Result<ExerciseDefinition, StoreError>;
    async fn update_exercise(&self, id: Uuid, input: ExerciseInput) -> Result<ExerciseDefinition, StoreError>;
    /// Refused with `Conflict` while a slot or a log entry references the exercise
    async fn delete_exercise(&self, id: Uuid) -> Result<(), StoreError>;

    // Routines
    /// All routines of a trainee ordered by creation
    async fn list_routines(&self, trainee_id: Uuid) -> Result<Vec<Routine>, StoreError>;
    /// Active routines of a trainee ordered by creation
    async fn list_active_routines(&self, trainee_id: Uuid) -> Result<Vec<Routine>, StoreError>;
    async fn get_routine(&self, id: Uuid) -> Result<Option<Routine>, StoreError>;
    async fn create_routine(&self, routine: NewRoutine) -> Result<Routine, StoreError>;
    /// Removes the routine with its slots; log entries keep their row with the slot detached
    async fn delete_routine(&self, id: Uuid) -> Result<(), StoreError>;

    // Routine slots
    /// Slots of a routine ordered by position, joined with their exercise
    async fn list_slots(&self, routine_id: Uuid) -> Result<Vec<SlotWithExercise>, StoreError>;
    /// Appends a slot after the highest position of the routine (0 when empty)
    async fn add_slot(&self, slot: NewSlot) -> Result<SlotWithExercise, StoreError>;
    /// Applies every update atomically; all ids must belong to `routine_id` and
    /// the resulting positions must stay unique, otherwise nothing is written
    async fn update_slots(&self, routine_id: Uuid, updates: Vec<SlotUpdate>) -> Result<Vec<SlotWithExercise>, StoreError>;
    async fn remove_slot(&self, id: Uuid) -> Result<(), StoreError>;

    // Progress log
    /// `NotFound("Slot")` when the entry references a slot that no longer exists
    async fn insert_progress_log(&self, entry: NewProgressLog) -> Result<Uuid, StoreError>;
    /// Distinct exercise ids the trainee has logged at least once
    async fn list_logged_exercise_ids(&self, trainee_id: Uuid) -> Result<Vec<Uuid>, StoreError>;
    /// Entries ordered by date, then creation
    async fn list_progress_logs(&self, trainee_id: Uuid, exercise_id: Uuid) -> Result<Vec<ProgressLogEntry>, StoreError>;
}
