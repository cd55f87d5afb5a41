use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::db::{GymStore, StoreError, DUPLICATE_POSITIONS};
use crate::models::exercise::{ExerciseDefinition, ExerciseInput};
use crate::models::profile::{Profile, Role};
use crate::models::progress::{NewProgressLog, ProgressLogEntry};
use crate::models::routine::{
    validate_targets, NewRoutine, NewSlot, Routine, RoutineSlot, SlotUpdate, SlotWithExercise,
};

#[derive(Default)]
struct MemoryState {
    profiles: HashMap<Uuid, Profile>,
    exercises: HashMap<Uuid, ExerciseDefinition>,
    routines: HashMap<Uuid, Routine>,
    slots: HashMap<Uuid, RoutineSlot>,
    logs: Vec<ProgressLogEntry>,
}

impl MemoryState {
    fn join(&self, slot: &RoutineSlot) -> SlotWithExercise {
        SlotWithExercise {
            slot: slot.clone(),
            exercise: self.exercises.get(&slot.exercise_id).cloned(),
        }
    }

    fn slots_of(&self, routine_id: Uuid) -> Vec<SlotWithExercise> {
        let mut slots: Vec<&RoutineSlot> = self
            .slots
            .values()
            .filter(|s| s.routine_id == routine_id)
            .collect();
        slots.sort_by_key(|s| (s.position, s.id));
        slots.into_iter().map(|s| self.join(s)).collect()
    }

    fn routines_of(&self, trainee_id: Uuid, active_only: bool) -> Vec<Routine> {
        let mut routines: Vec<Routine> = self
            .routines
            .values()
            .filter(|r| r.trainee_id == trainee_id && (!active_only || r.active))
            .cloned()
            .collect();
        routines.sort_by_key(|r| (r.created_at, r.id));
        routines
    }
}

/// Process-local store used for local runs and the test-suite.
///
/// Fault toggles make list reads or progress writes fail with
/// [`StoreError::Unavailable`] so failure paths can be exercised.
#[derive(Default)]
pub struct InMemoryStore {
    state: RwLock<MemoryState>,
    fail_reads: AtomicBool,
    fail_progress_writes: AtomicBool,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Profiles come from the identity provider; there is no signup path.
    pub async fn insert_profile(&self, profile: Profile) {
        self.state.write().await.profiles.insert(profile.id, profile);
    }

    pub async fn set_routine_active(&self, routine_id: Uuid, active: bool) -> Result<(), StoreError> {
        let mut state = self.state.write().await;
        let routine = state
            .routines
            .get_mut(&routine_id)
            .ok_or(StoreError::NotFound("Routine"))?;
        routine.active = active;
        Ok(())
    }

    /// Affects every `list_*` read.
    pub fn set_fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    pub fn set_fail_progress_writes(&self, fail: bool) {
        self.fail_progress_writes.store(fail, Ordering::SeqCst);
    }

    pub async fn progress_logs(&self) -> Vec<ProgressLogEntry> {
        self.state.read().await.logs.clone()
    }

    fn check_reads(&self) -> Result<(), StoreError> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("reads disabled".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl GymStore for InMemoryStore {
    async fn get_profile(&self, id: Uuid) -> Result<Option<Profile>, StoreError> {
        Ok(self.state.read().await.profiles.get(&id).cloned())
    }

    async fn list_trainees(&self) -> Result<Vec<Profile>, StoreError> {
        self.check_reads()?;
        let state = self.state.read().await;
        let mut trainees: Vec<Profile> = state
            .profiles
            .values()
            .filter(|p| p.role == Role::Trainee)
            .cloned()
            .collect();
        trainees.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));
        Ok(trainees)
    }

    async fn list_exercises(&self) -> Result<Vec<ExerciseDefinition>, StoreError> {
        self.check_reads()?;
        let state = self.state.read().await;
        let mut exercises: Vec<ExerciseDefinition> = state.exercises.values().cloned().collect();
        exercises.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));
        Ok(exercises)
    }

    async fn list_exercise_definitions(&self, ids: &[Uuid]) -> Result<Vec<ExerciseDefinition>, StoreError> {
        self.check_reads()?;
        let wanted: HashSet<&Uuid> = ids.iter().collect();
        let state = self.state.read().await;
        let mut exercises: Vec<ExerciseDefinition> = state
            .exercises
            .values()
            .filter(|e| wanted.contains(&e.id))
            .cloned()
            .collect();
        exercises.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));
        Ok(exercises)
    }

    async fn create_exercise(&self, input: ExerciseInput) -> Result<ExerciseDefinition, StoreError> {
        let input = input.normalized().map_err(StoreError::Validation)?;
        let exercise = ExerciseDefinition {
            id: Uuid::new_v4(),
            name: input.name,
            muscle_group: input.muscle_group,
            media_url: input.media_url,
            description: input.description,
            created_at: Utc::now(),
        };
        self.state
            .write()
            .await
            .exercises
            .insert(exercise.id, exercise.clone());
        Ok(exercise)
    }

    async fn update_exercise(&self, id: Uuid, input: ExerciseInput) -> Result<ExerciseDefinition, StoreError> {
        let input = input.normalized().map_err(StoreError::Validation)?;
        let mut state = self.state.write().await;
        let exercise = state
            .exercises
            .get_mut(&id)
            .ok_or(StoreError::NotFound("Exercise"))?;
        exercise.name = input.name;
        exercise.muscle_group = input.muscle_group;
        exercise.media_url = input.media_url;
        exercise.description = input.description;
        Ok(exercise.clone())
    }

    async fn delete_exercise(&self, id: Uuid) -> Result<(), StoreError> {
        let mut state = self.state.write().await;
        if !state.exercises.contains_key(&id) {
            return Err(StoreError::NotFound("Exercise"));
        }
        let in_use = state.slots.values().any(|s| s.exercise_id == id)
            || state.logs.iter().any(|l| l.exercise_id == id);
        if in_use {
            return Err(StoreError::Conflict(
                "Exercise is used by a routine or has logged progress".to_string(),
            ));
        }
        state.exercises.remove(&id);
        Ok(())
    }

    async fn list_routines(&self, trainee_id: Uuid) -> Result<Vec<Routine>, StoreError> {
        self.check_reads()?;
        Ok(self.state.read().await.routines_of(trainee_id, false))
    }

    async fn list_active_routines(&self, trainee_id: Uuid) -> Result<Vec<Routine>, StoreError> {
        self.check_reads()?;
        Ok(self.state.read().await.routines_of(trainee_id, true))
    }

    async fn get_routine(&self, id: Uuid) -> Result<Option<Routine>, StoreError> {
        Ok(self.state.read().await.routines.get(&id).cloned())
    }

    async fn create_routine(&self, routine: NewRoutine) -> Result<Routine, StoreError> {
        let name = routine.name.trim();
        if name.is_empty() {
            return Err(StoreError::Validation("Routine name is required".to_string()));
        }
        let mut state = self.state.write().await;
        match state.profiles.get(&routine.trainee_id) {
            Some(profile) if profile.role == Role::Trainee => {}
            _ => return Err(StoreError::NotFound("Trainee")),
        }

        let created = Routine {
            id: Uuid::new_v4(),
            trainee_id: routine.trainee_id,
            name: name.to_string(),
            active: true,
            created_at: Utc::now(),
        };
        state.routines.insert(created.id, created.clone());
        Ok(created)
    }

    async fn delete_routine(&self, id: Uuid) -> Result<(), StoreError> {
        let mut state = self.state.write().await;
        if state.routines.remove(&id).is_none() {
            return Err(StoreError::NotFound("Routine"));
        }
        let removed: HashSet<Uuid> = state
            .slots
            .values()
            .filter(|s| s.routine_id == id)
            .map(|s| s.id)
            .collect();
        state.slots.retain(|slot_id, _| !removed.contains(slot_id));
        for log in state.logs.iter_mut() {
            if log.slot_id.is_some_and(|slot_id| removed.contains(&slot_id)) {
                log.slot_id = None;
            }
        }
        Ok(())
    }

    async fn list_slots(&self, routine_id: Uuid) -> Result<Vec<SlotWithExercise>, StoreError> {
        self.check_reads()?;
        Ok(self.state.read().await.slots_of(routine_id))
    }

    async fn add_slot(&self, slot: NewSlot) -> Result<SlotWithExercise, StoreError> {
        validate_targets(slot.target_sets, slot.target_reps).map_err(StoreError::Validation)?;
        let mut state = self.state.write().await;
        if !state.routines.contains_key(&slot.routine_id) {
            return Err(StoreError::NotFound("Routine"));
        }
        if !state.exercises.contains_key(&slot.exercise_id) {
            return Err(StoreError::NotFound("Exercise"));
        }

        // After the highest position; removals leave gaps
        let last = state
            .slots
            .values()
            .filter(|s| s.routine_id == slot.routine_id)
            .map(|s| s.position)
            .max();
        let position = match last {
            Some(last) => last
                .checked_add(1)
                .ok_or_else(|| StoreError::Validation("Routine has no position left for another slot".to_string()))?,
            None => 0,
        };
        let created = RoutineSlot {
            id: Uuid::new_v4(),
            routine_id: slot.routine_id,
            exercise_id: slot.exercise_id,
            target_sets: slot.target_sets,
            target_reps: slot.target_reps,
            rest_secs: slot.rest_secs,
            position,
        };
        state.slots.insert(created.id, created.clone());
        Ok(state.join(&created))
    }

    async fn update_slots(&self, routine_id: Uuid, updates: Vec<SlotUpdate>) -> Result<Vec<SlotWithExercise>, StoreError> {
        for update in &updates {
            validate_targets(update.target_sets, update.target_reps).map_err(StoreError::Validation)?;
        }
        let mut state = self.state.write().await;
        let all_owned = updates.iter().all(|u| {
            state
                .slots
                .get(&u.id)
                .is_some_and(|s| s.routine_id == routine_id)
        });
        if !all_owned {
            return Err(StoreError::NotFound("Slot"));
        }

        let mut final_positions: HashMap<Uuid, u32> = state
            .slots
            .values()
            .filter(|s| s.routine_id == routine_id)
            .map(|s| (s.id, s.position))
            .collect();
        for update in &updates {
            final_positions.insert(update.id, update.position);
        }
        let mut taken = HashSet::new();
        if !final_positions.values().all(|position| taken.insert(*position)) {
            return Err(StoreError::Validation(DUPLICATE_POSITIONS.to_string()));
        }

        for update in updates {
            if let Some(slot) = state.slots.get_mut(&update.id) {
                slot.target_sets = update.target_sets;
                slot.target_reps = update.target_reps;
                slot.rest_secs = update.rest_secs;
                slot.position = update.position;
            }
        }
        Ok(state.slots_of(routine_id))
    }

    async fn remove_slot(&self, id: Uuid) -> Result<(), StoreError> {
        let mut state = self.state.write().await;
        if state.slots.remove(&id).is_none() {
            return Err(StoreError::NotFound("Slot"));
        }
        for log in state.logs.iter_mut() {
            if log.slot_id == Some(id) {
                log.slot_id = None;
            }
        }
        Ok(())
    }

    async fn insert_progress_log(&self, entry: NewProgressLog) -> Result<Uuid, StoreError> {
        if self.fail_progress_writes.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("progress writes disabled".to_string()));
        }
        let mut state = self.state.write().await;
        if !state.profiles.contains_key(&entry.trainee_id) {
            return Err(StoreError::NotFound("Trainee"));
        }
        if !state.exercises.contains_key(&entry.exercise_id) {
            return Err(StoreError::NotFound("Exercise"));
        }
        if entry.slot_id.is_some_and(|slot_id| !state.slots.contains_key(&slot_id)) {
            return Err(StoreError::NotFound("Slot"));
        }

        let id = Uuid::new_v4();
        state.logs.push(ProgressLogEntry {
            id,
            trainee_id: entry.trainee_id,
            exercise_id: entry.exercise_id,
            slot_id: entry.slot_id,
            weight: entry.weight,
            reps: entry.reps,
            date: entry.date,
            created_at: Utc::now(),
        });
        Ok(id)
    }

    async fn list_logged_exercise_ids(&self, trainee_id: Uuid) -> Result<Vec<Uuid>, StoreError> {
        self.check_reads()?;
        let state = self.state.read().await;
        let mut seen = HashSet::new();
        Ok(state
            .logs
            .iter()
            .filter(|l| l.trainee_id == trainee_id)
            .filter_map(|l| seen.insert(l.exercise_id).then_some(l.exercise_id))
            .collect())
    }

    async fn list_progress_logs(&self, trainee_id: Uuid, exercise_id: Uuid) -> Result<Vec<ProgressLogEntry>, StoreError> {
        self.check_reads()?;
        let state = self.state.read().await;
        let mut logs: Vec<ProgressLogEntry> = state
            .logs
            .iter()
            .filter(|l| l.trainee_id == trainee_id && l.exercise_id == exercise_id)
            .cloned()
            .collect();
        // Stable sort keeps insertion order for identical timestamps
        logs.sort_by_key(|l| (l.date, l.created_at));
        Ok(logs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn trainee(name: &str) -> Profile {
        Profile {
            id: Uuid::new_v4(),
            name: name.to_string(),
            email: format!("{}@example.com", name.to_lowercase()),
            role: Role::Trainee,
            paid_on: None,
            due_on: None,
            trainer_id: None,
            created_at: Utc::now(),
        }
    }

    fn exercise_input(name: &str) -> ExerciseInput {
        ExerciseInput {
            name: name.to_string(),
            muscle_group: "Legs".to_string(),
            media_url: None,
            description: None,
        }
    }

    fn slot(routine_id: Uuid, exercise_id: Uuid) -> NewSlot {
        NewSlot {
            routine_id,
            exercise_id,
            target_sets: 3,
            target_reps: 10,
            rest_secs: 60,
        }
    }

    async fn positions(store: &InMemoryStore, routine_id: Uuid) -> Vec<u32> {
        store
            .list_slots(routine_id)
            .await
            .unwrap()
            .iter()
            .map(|s| s.slot.position)
            .collect()
    }

    #[tokio::test]
    async fn add_slot_appends_in_order() {
        let store = InMemoryStore::new();
        let ana = trainee("Ana");
        store.insert_profile(ana.clone()).await;
        let squat = store.create_exercise(exercise_input("Squat")).await.unwrap();
        let routine = store
            .create_routine(NewRoutine { trainee_id: ana.id, name: "Legs".into() })
            .await
            .unwrap();

        for _ in 0..3 {
            store
                .add_slot(NewSlot {
                    routine_id: routine.id,
                    exercise_id: squat.id,
                    target_sets: 3,
                    target_reps: 10,
                    rest_secs: 60,
                })
                .await
                .unwrap();
        }

        let positions: Vec<u32> = store
            .list_slots(routine.id)
            .await
            .unwrap()
            .iter()
            .map(|s| s.slot.position)
            .collect();
        assert_eq!(positions, vec![0, 1, 2]);
    }

    #[tokio::test]
    async fn add_after_remove_takes_a_fresh_position() {
        let store = InMemoryStore::new();
        let ana = trainee("Ana");
        store.insert_profile(ana.clone()).await;
        let squat = store.create_exercise(exercise_input("Squat")).await.unwrap();
        let routine = store
            .create_routine(NewRoutine { trainee_id: ana.id, name: "Legs".into() })
            .await
            .unwrap();
        let mut added = Vec::new();
        for _ in 0..3 {
            added.push(store.add_slot(slot(routine.id, squat.id)).await.unwrap());
        }

        store.remove_slot(added[0].slot.id).await.unwrap();
        let appended = store.add_slot(slot(routine.id, squat.id)).await.unwrap();

        assert_eq!(appended.slot.position, 3);
        assert_eq!(positions(&store, routine.id).await, vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn update_slots_rejects_duplicate_positions_without_partial_write() {
        let store = InMemoryStore::new();
        let ana = trainee("Ana");
        store.insert_profile(ana.clone()).await;
        let squat = store.create_exercise(exercise_input("Squat")).await.unwrap();
        let routine = store
            .create_routine(NewRoutine { trainee_id: ana.id, name: "Legs".into() })
            .await
            .unwrap();
        let first = store.add_slot(slot(routine.id, squat.id)).await.unwrap();
        let second = store.add_slot(slot(routine.id, squat.id)).await.unwrap();

        // Moving the first slot onto the second one's position
        let result = store
            .update_slots(
                routine.id,
                vec![SlotUpdate { id: first.slot.id, target_sets: 5, target_reps: 5, rest_secs: 90, position: 1 }],
            )
            .await;
        assert!(matches!(result, Err(StoreError::Validation(_))));
        assert_eq!(positions(&store, routine.id).await, vec![0, 1]);
        assert_eq!(store.list_slots(routine.id).await.unwrap()[0].slot.target_sets, 3);

        // Swapping both in one batch is fine
        let swapped = store
            .update_slots(
                routine.id,
                vec![
                    SlotUpdate { id: first.slot.id, target_sets: 3, target_reps: 10, rest_secs: 60, position: 1 },
                    SlotUpdate { id: second.slot.id, target_sets: 3, target_reps: 10, rest_secs: 60, position: 0 },
                ],
            )
            .await
            .unwrap();
        assert_eq!(swapped[0].slot.id, second.slot.id);
        assert_eq!(swapped[1].slot.id, first.slot.id);
    }

    #[tokio::test]
    async fn progress_log_rejects_removed_slot() {
        let store = InMemoryStore::new();
        let ana = trainee("Ana");
        store.insert_profile(ana.clone()).await;
        let squat = store.create_exercise(exercise_input("Squat")).await.unwrap();
        let routine = store
            .create_routine(NewRoutine { trainee_id: ana.id, name: "Legs".into() })
            .await
            .unwrap();
        let removed = store.add_slot(slot(routine.id, squat.id)).await.unwrap();
        store.remove_slot(removed.slot.id).await.unwrap();

        let result = store
            .insert_progress_log(NewProgressLog {
                trainee_id: ana.id,
                exercise_id: squat.id,
                slot_id: Some(removed.slot.id),
                weight: Some(60.0),
                reps: Some(8),
                date: NaiveDate::from_ymd_opt(2025, 5, 1).unwrap(),
            })
            .await;

        assert!(matches!(result, Err(StoreError::NotFound("Slot"))));
        assert!(store.progress_logs().await.is_empty());
    }

    #[tokio::test]
    async fn deleting_routine_detaches_logged_slots() {
        let store = InMemoryStore::new();
        let ana = trainee("Ana");
        store.insert_profile(ana.clone()).await;
        let squat = store.create_exercise(exercise_input("Squat")).await.unwrap();
        let routine = store
            .create_routine(NewRoutine { trainee_id: ana.id, name: "Legs".into() })
            .await
            .unwrap();
        let slot = store
            .add_slot(NewSlot {
                routine_id: routine.id,
                exercise_id: squat.id,
                target_sets: 3,
                target_reps: 10,
                rest_secs: 60,
            })
            .await
            .unwrap();
        store
            .insert_progress_log(NewProgressLog {
                trainee_id: ana.id,
                exercise_id: squat.id,
                slot_id: Some(slot.slot.id),
                weight: Some(80.0),
                reps: Some(5),
                date: NaiveDate::from_ymd_opt(2025, 5, 1).unwrap(),
            })
            .await
            .unwrap();

        store.delete_routine(routine.id).await.unwrap();

        let logs = store.list_progress_logs(ana.id, squat.id).await.unwrap();
        assert_eq!(logs.len(), 1);
        assert_eq!(logs[0].slot_id, None);
        assert!(store.list_slots(routine.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn update_slots_rejects_foreign_slot_without_partial_write() {
        let store = InMemoryStore::new();
        let ana = trainee("Ana");
        store.insert_profile(ana.clone()).await;
        let squat = store.create_exercise(exercise_input("Squat")).await.unwrap();
        let first = store
            .create_routine(NewRoutine { trainee_id: ana.id, name: "A".into() })
            .await
            .unwrap();
        let second = store
            .create_routine(NewRoutine { trainee_id: ana.id, name: "B".into() })
            .await
            .unwrap();
        let own = store
            .add_slot(NewSlot { routine_id: first.id, exercise_id: squat.id, target_sets: 3, target_reps: 10, rest_secs: 60 })
            .await
            .unwrap();
        let foreign = store
            .add_slot(NewSlot { routine_id: second.id, exercise_id: squat.id, target_sets: 3, target_reps: 10, rest_secs: 60 })
            .await
            .unwrap();

        let result = store
            .update_slots(
                first.id,
                vec![
                    SlotUpdate { id: own.slot.id, target_sets: 5, target_reps: 5, rest_secs: 90, position: 0 },
                    SlotUpdate { id: foreign.slot.id, target_sets: 5, target_reps: 5, rest_secs: 90, position: 1 },
                ],
            )
            .await;

        assert!(matches!(result, Err(StoreError::NotFound("Slot"))));
        let slots = store.list_slots(first.id).await.unwrap();
        assert_eq!(slots[0].slot.target_sets, 3);
    }
}
