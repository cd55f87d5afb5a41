use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::exercise::ExerciseDefinition;

pub const DEFAULT_TARGET_SETS: u32 = 3;
pub const DEFAULT_TARGET_REPS: u32 = 10;
pub const DEFAULT_REST_SECS: u32 = 60;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Routine {
    pub id: Uuid,
    pub trainee_id: Uuid,
    pub name: String,
    pub active: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
pub struct CreateRoutineRequest {
    pub name: String,
}

#[derive(Debug, Clone)]
pub struct NewRoutine {
    pub trainee_id: Uuid,
    pub name: String,
}

/// One exercise's configuration inside a routine.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RoutineSlot {
    pub id: Uuid,
    pub routine_id: Uuid,
    pub exercise_id: Uuid,
    pub target_sets: u32,
    pub target_reps: u32,
    pub rest_secs: u32,
    pub position: u32,
}

/// A slot joined with its catalog entry. `exercise` is `None` only when the
/// referenced definition could not be resolved.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SlotWithExercise {
    #[serde(flatten)]
    pub slot: RoutineSlot,
    pub exercise: Option<ExerciseDefinition>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AddSlotRequest {
    pub exercise_id: Uuid,
    pub target_sets: Option<u32>,
    pub target_reps: Option<u32>,
    pub rest_secs: Option<u32>,
}

#[derive(Debug, Clone)]
pub struct NewSlot {
    pub routine_id: Uuid,
    pub exercise_id: Uuid,
    pub target_sets: u32,
    pub target_reps: u32,
    pub rest_secs: u32,
}

impl NewSlot {
    pub fn from_request(routine_id: Uuid, request: AddSlotRequest) -> Self {
        Self {
            routine_id,
            exercise_id: request.exercise_id,
            target_sets: request.target_sets.unwrap_or(DEFAULT_TARGET_SETS),
            target_reps: request.target_reps.unwrap_or(DEFAULT_TARGET_REPS),
            rest_secs: request.rest_secs.unwrap_or(DEFAULT_REST_SECS),
        }
    }
}

/// Batch-save item for the trainer's routine editor
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SlotUpdate {
    pub id: Uuid,
    pub target_sets: u32,
    pub target_reps: u32,
    pub rest_secs: u32,
    pub position: u32,
}

pub fn validate_targets(target_sets: u32, target_reps: u32) -> Result<(), String> {
    if target_sets < 1 {
        return Err("A slot needs at least one set".to_string());
    }
    if target_reps < 1 {
        return Err("A slot needs at least one repetition".to_string());
    }
    Ok(())
}
