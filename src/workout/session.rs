use std::collections::HashMap;

use chrono::NaiveDate;
use uuid::Uuid;

use crate::models::progress::NewProgressLog;
use crate::models::routine::SlotWithExercise;
use crate::models::session::{RestView, SessionPhase, SessionView, SlotView};
use crate::workout::rest_timer::RestCountdown;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum SessionError {
    #[error("No routine is loaded")]
    NoRoutineLoaded,

    #[error("Slot {0} is not part of the loaded routine")]
    UnknownSlot(Uuid),

    #[error("Set {index} is out of range for a slot with {total} sets")]
    SetOutOfRange { index: usize, total: usize },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputField {
    Weight,
    Reps,
}

/// Per-slot state. `done.len()` always equals the slot's target set count.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionSetState {
    pub weight_input: String,
    pub reps_input: String,
    pub done: Vec<bool>,
}

impl SessionSetState {
    fn fresh(slot: &SlotWithExercise) -> Self {
        Self {
            weight_input: String::new(),
            reps_input: slot.slot.target_reps.to_string(),
            done: vec![false; slot.slot.target_sets as usize],
        }
    }

    pub fn completed(&self) -> usize {
        self.done.iter().filter(|done| **done).count()
    }

    pub fn fully_done(&self) -> bool {
        self.done.iter().all(|done| *done)
    }
}

/// Identifies one rest. The generation changes every time a rest starts so
/// late signals from a replaced timer are ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RestMarker {
    pub generation: u64,
    pub slot_id: Uuid,
    pub target_secs: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SessionState {
    Idle,
    Active {
        routine_id: Uuid,
        expanded: Option<Uuid>,
        rest: Option<RestMarker>,
    },
}

/// Outcome of marking a set done; the caller persists `log` and drives the rest.
#[derive(Debug, Clone, PartialEq)]
pub struct SetCompletion {
    pub load_generation: u64,
    pub log: NewProgressLog,
    pub rest: Option<RestMarker>,
    pub acknowledgement: String,
}

/// Weight is optional: blank, unparsable, non-finite or non-positive input records no weight.
pub fn parse_weight(input: &str) -> Option<f64> {
    input
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|weight| weight.is_finite() && *weight > 0.0)
}

/// Reps fall back to the slot target when blank, unparsable or below one.
pub fn parse_reps(input: &str, target_reps: u32) -> u32 {
    input
        .trim()
        .parse::<u32>()
        .ok()
        .filter(|reps| *reps >= 1)
        .unwrap_or(target_reps)
}

/// One trainee's live execution of a routine.
///
/// Pure state: no I/O and no clock. The owning service persists log entries,
/// runs the rest timer and feeds their outcomes back in.
#[derive(Debug)]
pub struct WorkoutSession {
    trainee_id: Uuid,
    state: SessionState,
    slots: Vec<SlotWithExercise>,
    sets: HashMap<Uuid, SessionSetState>,
    load_generation: u64,
    rest_generation: u64,
}

impl WorkoutSession {
    pub fn new(trainee_id: Uuid) -> Self {
        Self {
            trainee_id,
            state: SessionState::Idle,
            slots: Vec::new(),
            sets: HashMap::new(),
            load_generation: 0,
            rest_generation: 0,
        }
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn load_generation(&self) -> u64 {
        self.load_generation
    }

    pub fn set_state(&self, slot_id: Uuid) -> Option<&SessionSetState> {
        self.sets.get(&slot_id)
    }

    pub fn rest(&self) -> Option<RestMarker> {
        match self.state {
            SessionState::Active { rest, .. } => rest,
            SessionState::Idle => None,
        }
    }

    /// Replaces whatever was loaded. The caller cancels any running timer.
    pub fn load(&mut self, routine_id: Uuid, mut slots: Vec<SlotWithExercise>) {
        slots.sort_by_key(|s| s.slot.position);
        self.sets = slots
            .iter()
            .map(|slot| (slot.slot.id, SessionSetState::fresh(slot)))
            .collect();
        self.slots = slots;
        self.load_generation += 1;
        self.state = SessionState::Active {
            routine_id,
            expanded: None,
            rest: None,
        };
    }

    /// Back to `Idle`; pending reverts from the discarded load become no-ops.
    pub fn clear(&mut self) {
        self.slots.clear();
        self.sets.clear();
        self.load_generation += 1;
        self.state = SessionState::Idle;
    }

    pub fn toggle_slot(&mut self, slot_id: Uuid) -> Result<(), SessionError> {
        self.ensure_slot(slot_id)?;
        if let SessionState::Active { expanded, .. } = &mut self.state {
            *expanded = if *expanded == Some(slot_id) { None } else { Some(slot_id) };
        }
        Ok(())
    }

    pub fn edit_input(&mut self, slot_id: Uuid, field: InputField, value: String) -> Result<(), SessionError> {
        self.ensure_slot(slot_id)?;
        let set_state = self
            .sets
            .get_mut(&slot_id)
            .ok_or(SessionError::UnknownSlot(slot_id))?;
        match field {
            InputField::Weight => set_state.weight_input = value,
            InputField::Reps => set_state.reps_input = value,
        }
        Ok(())
    }

    /// Marks `(slot, set_index)` done and describes the log entry and rest it
    /// triggers. `Ok(None)` when the set was already done.
    pub fn complete_set(
        &mut self,
        slot_id: Uuid,
        set_index: usize,
        today: NaiveDate,
    ) -> Result<Option<SetCompletion>, SessionError> {
        self.ensure_slot(slot_id)?;
        let slot = self
            .slots
            .iter()
            .find(|s| s.slot.id == slot_id)
            .ok_or(SessionError::UnknownSlot(slot_id))?;
        let set_state = self
            .sets
            .get_mut(&slot_id)
            .ok_or(SessionError::UnknownSlot(slot_id))?;

        let total = set_state.done.len();
        let already_done = set_state
            .done
            .get(set_index)
            .copied()
            .ok_or(SessionError::SetOutOfRange { index: set_index, total })?;
        if already_done {
            return Ok(None);
        }
        set_state.done[set_index] = true;

        let log = NewProgressLog {
            trainee_id: self.trainee_id,
            exercise_id: slot.slot.exercise_id,
            slot_id: Some(slot_id),
            weight: parse_weight(&set_state.weight_input),
            reps: Some(parse_reps(&set_state.reps_input, slot.slot.target_reps)),
            date: today,
        };

        // A new rest always replaces the running one; a zero-length rest just ends it
        let rest = if slot.slot.rest_secs > 0 {
            self.rest_generation += 1;
            Some(RestMarker {
                generation: self.rest_generation,
                slot_id,
                target_secs: slot.slot.rest_secs,
            })
        } else {
            None
        };
        if let SessionState::Active { rest: current, .. } = &mut self.state {
            *current = rest;
        }

        Ok(Some(SetCompletion {
            load_generation: self.load_generation,
            log,
            rest,
            acknowledgement: format!("Set {} completed", set_index + 1),
        }))
    }

    /// Undoes a done mark after a failed write. Ignored once a different
    /// routine load has replaced the one the set belonged to.
    pub fn revert_set(&mut self, load_generation: u64, slot_id: Uuid, set_index: usize) -> bool {
        if load_generation != self.load_generation {
            return false;
        }
        match self.sets.get_mut(&slot_id).and_then(|s| s.done.get_mut(set_index)) {
            Some(done) => {
                *done = false;
                true
            }
            None => false,
        }
    }

    /// Clears the rest overlay if `generation` still names the active rest.
    pub fn finish_rest(&mut self, generation: u64) -> bool {
        match &mut self.state {
            SessionState::Active { rest, .. } if rest.map(|r| r.generation) == Some(generation) => {
                *rest = None;
                true
            }
            _ => false,
        }
    }

    pub fn phase(&self) -> SessionPhase {
        match self.state {
            SessionState::Idle => SessionPhase::Idle,
            SessionState::Active { rest: Some(_), expanded, .. } => SessionPhase::Resting {
                expanded_slot: expanded,
            },
            SessionState::Active { expanded: Some(slot_id), .. } => SessionPhase::SlotExpanded { slot_id },
            SessionState::Active { .. } => SessionPhase::Loaded,
        }
    }

    /// Snapshot for the client. `countdown` supplies the live remaining time of the active rest.
    pub fn view(&self, countdown: Option<&RestCountdown>) -> SessionView {
        let (routine_id, expanded, rest) = match self.state {
            SessionState::Idle => (None, None, None),
            SessionState::Active { routine_id, expanded, rest } => (Some(routine_id), expanded, rest),
        };

        let slots = self
            .slots
            .iter()
            .filter_map(|slot| {
                let set_state = self.sets.get(&slot.slot.id)?;
                Some(SlotView {
                    slot_id: slot.slot.id,
                    exercise_id: slot.slot.exercise_id,
                    exercise: slot.exercise.clone(),
                    target_sets: slot.slot.target_sets,
                    target_reps: slot.slot.target_reps,
                    rest_secs: slot.slot.rest_secs,
                    position: slot.slot.position,
                    weight_input: set_state.weight_input.clone(),
                    reps_input: set_state.reps_input.clone(),
                    done: set_state.done.clone(),
                    completed_sets: set_state.completed(),
                    fully_done: set_state.fully_done(),
                    expanded: expanded == Some(slot.slot.id),
                })
            })
            .collect();

        let rest = rest.map(|marker| {
            let countdown = countdown
                .copied()
                .unwrap_or_else(|| RestCountdown::new(marker.target_secs));
            RestView {
                slot_id: marker.slot_id,
                target_secs: countdown.target_secs,
                remaining_secs: countdown.remaining_secs,
                fraction: countdown.fraction(),
            }
        });

        SessionView {
            phase: self.phase(),
            routine_id,
            slots,
            rest,
        }
    }

    fn ensure_slot(&self, slot_id: Uuid) -> Result<(), SessionError> {
        if self.state == SessionState::Idle {
            return Err(SessionError::NoRoutineLoaded);
        }
        if !self.sets.contains_key(&slot_id) {
            return Err(SessionError::UnknownSlot(slot_id));
        }
        Ok(())
    }
}
