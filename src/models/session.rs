use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::exercise::ExerciseDefinition;

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum SessionPhase {
    Idle,
    Loaded,
    SlotExpanded { slot_id: Uuid },
    Resting { expanded_slot: Option<Uuid> },
}

#[derive(Debug, Clone, Serialize)]
pub struct SlotView {
    pub slot_id: Uuid,
    pub exercise_id: Uuid,
    pub exercise: Option<ExerciseDefinition>,
    pub target_sets: u32,
    pub target_reps: u32,
    pub rest_secs: u32,
    pub position: u32,
    pub weight_input: String,
    pub reps_input: String,
    pub done: Vec<bool>,
    pub completed_sets: usize,
    pub fully_done: bool,
    pub expanded: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct RestView {
    pub slot_id: Uuid,
    pub target_secs: u32,
    pub remaining_secs: u32,
    /// remaining / target, drives the radial indicator
    pub fraction: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct SessionView {
    pub phase: SessionPhase,
    pub routine_id: Option<Uuid>,
    pub slots: Vec<SlotView>,
    pub rest: Option<RestView>,
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SetOutcome {
    Logged,
    AlreadyCompleted,
    /// The store rejected the log entry and the done mark was rolled back
    WriteFailed,
}

#[derive(Debug, Clone, Serialize)]
pub struct CompleteSetResponse {
    pub outcome: SetOutcome,
    /// "Set N completed", only for `Logged`
    pub acknowledgement: Option<String>,
    pub session: SessionView,
}

#[derive(Debug, Deserialize)]
pub struct LoadRoutineRequest {
    pub routine_id: Uuid,
}

#[derive(Debug, Deserialize)]
pub struct EditInputsRequest {
    pub weight: Option<String>,
    pub reps: Option<String>,
}
