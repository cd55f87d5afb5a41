use std::sync::Arc;
use std::time::Duration;

use uuid::Uuid;

use gymtrack_backend::db::{GymStore, InMemoryStore};
use gymtrack_backend::models::profile::Role;
use gymtrack_backend::models::routine::{NewRoutine, NewSlot, Routine, SlotWithExercise};
use gymtrack_backend::models::session::{SessionPhase, SetOutcome};
use gymtrack_backend::services::{TrainingError, TrainingSessions};
use gymtrack_backend::workout::session::SessionError;

mod common;
use common::utils::{exercise_input, profile};

const IDLE_TIMEOUT: Duration = Duration::from_secs(30 * 60);

struct Fixture {
    store: Arc<InMemoryStore>,
    sessions: TrainingSessions,
    trainee_id: Uuid,
    routine: Routine,
    slots: Vec<SlotWithExercise>,
}

/// One trainee with a routine of two slots resting 60 s and 90 s.
async fn fixture() -> Fixture {
    let store = Arc::new(InMemoryStore::new());
    let trainee = profile("Ana", Role::Trainee, None);
    store.insert_profile(trainee.clone()).await;

    let squat = store
        .create_exercise(exercise_input("Back Squat", "Legs"))
        .await
        .expect("Failed to create exercise");
    let row = store
        .create_exercise(exercise_input("Barbell Row", "Back"))
        .await
        .expect("Failed to create exercise");
    let routine = store
        .create_routine(NewRoutine {
            trainee_id: trainee.id,
            name: "Full Body".to_string(),
        })
        .await
        .expect("Failed to create routine");

    let mut slots = Vec::new();
    for (exercise_id, rest_secs) in [(squat.id, 60), (row.id, 90)] {
        let slot = store
            .add_slot(NewSlot {
                routine_id: routine.id,
                exercise_id,
                target_sets: 3,
                target_reps: 10,
                rest_secs,
            })
            .await
            .expect("Failed to add slot");
        slots.push(slot);
    }

    let dyn_store: Arc<dyn GymStore> = store.clone();
    let sessions = TrainingSessions::new(dyn_store, Duration::from_secs(1), IDLE_TIMEOUT);

    Fixture {
        store,
        sessions,
        trainee_id: trainee.id,
        routine,
        slots,
    }
}

async fn sleep_secs(secs: f64) {
    tokio::time::sleep(Duration::from_secs_f64(secs)).await;
}

#[tokio::test(start_paused = true)]
async fn completing_a_set_twice_logs_once() {
    let f = fixture().await;
    let slot_id = f.slots[0].slot.id;
    f.sessions
        .load_routine(f.trainee_id, f.routine.id)
        .await
        .expect("Failed to load routine");

    let first = f
        .sessions
        .complete_set(f.trainee_id, slot_id, 0)
        .await
        .expect("Failed to complete set");
    assert_eq!(first.outcome, SetOutcome::Logged);
    assert_eq!(first.acknowledgement.as_deref(), Some("Set 1 completed"));

    let second = f
        .sessions
        .complete_set(f.trainee_id, slot_id, 0)
        .await
        .expect("Failed to complete set");
    assert_eq!(second.outcome, SetOutcome::AlreadyCompleted);
    assert_eq!(second.acknowledgement, None);
    assert_eq!(f.store.progress_logs().await.len(), 1);
}

#[tokio::test(start_paused = true)]
async fn failed_write_reverts_the_mark() {
    let f = fixture().await;
    let slot_id = f.slots[0].slot.id;
    f.sessions
        .load_routine(f.trainee_id, f.routine.id)
        .await
        .expect("Failed to load routine");

    f.store.set_fail_progress_writes(true);
    let failed = f
        .sessions
        .complete_set(f.trainee_id, slot_id, 1)
        .await
        .expect("Failed to complete set");
    assert_eq!(failed.outcome, SetOutcome::WriteFailed);
    assert_eq!(failed.session.slots[0].done, vec![false, false, false]);
    assert!(f.store.progress_logs().await.is_empty());

    f.store.set_fail_progress_writes(false);
    let retried = f
        .sessions
        .complete_set(f.trainee_id, slot_id, 1)
        .await
        .expect("Failed to complete set");
    assert_eq!(retried.outcome, SetOutcome::Logged);
    assert_eq!(retried.session.slots[0].done, vec![false, true, false]);
    assert_eq!(f.store.progress_logs().await.len(), 1);
}

#[tokio::test(start_paused = true)]
async fn rest_expires_and_clears_itself() {
    let f = fixture().await;
    let slot_id = f.slots[0].slot.id;
    f.sessions
        .load_routine(f.trainee_id, f.routine.id)
        .await
        .expect("Failed to load routine");
    f.sessions
        .toggle_slot(f.trainee_id, slot_id)
        .await
        .expect("Failed to toggle slot");

    let response = f
        .sessions
        .complete_set(f.trainee_id, slot_id, 0)
        .await
        .expect("Failed to complete set");
    assert_eq!(
        response.session.phase,
        SessionPhase::Resting {
            expanded_slot: Some(slot_id)
        }
    );

    sleep_secs(20.5).await;
    let view = f.sessions.snapshot(f.trainee_id).await;
    let rest = view.rest.expect("Rest should still be running");
    assert_eq!(rest.remaining_secs, 40);

    sleep_secs(40.0).await;
    let view = f.sessions.snapshot(f.trainee_id).await;
    assert!(view.rest.is_none());
    assert_eq!(view.phase, SessionPhase::SlotExpanded { slot_id });
}

#[tokio::test(start_paused = true)]
async fn new_rest_replaces_the_running_one() {
    let f = fixture().await;
    let (squat_slot, row_slot) = (f.slots[0].slot.id, f.slots[1].slot.id);
    f.sessions
        .load_routine(f.trainee_id, f.routine.id)
        .await
        .expect("Failed to load routine");

    f.sessions
        .complete_set(f.trainee_id, squat_slot, 0)
        .await
        .expect("Failed to complete set");
    sleep_secs(10.5).await;

    let response = f
        .sessions
        .complete_set(f.trainee_id, row_slot, 0)
        .await
        .expect("Failed to complete set");
    let rest = response.session.rest.expect("Rest should be running");
    assert_eq!(rest.slot_id, row_slot);
    assert_eq!(rest.target_secs, 90);
    assert_eq!(rest.remaining_secs, 90);

    // Past the point where the replaced 60 s rest would have ended
    sleep_secs(60.25).await;
    let rest = f
        .sessions
        .snapshot(f.trainee_id)
        .await
        .rest
        .expect("Replacement rest should still be running");
    assert_eq!(rest.slot_id, row_slot);
    assert_eq!(rest.remaining_secs, 30);

    sleep_secs(30.0).await;
    assert!(f.sessions.snapshot(f.trainee_id).await.rest.is_none());
}

#[tokio::test(start_paused = true)]
async fn skip_ends_the_rest_immediately() {
    let f = fixture().await;
    let slot_id = f.slots[1].slot.id;
    f.sessions
        .load_routine(f.trainee_id, f.routine.id)
        .await
        .expect("Failed to load routine");
    f.sessions
        .complete_set(f.trainee_id, slot_id, 0)
        .await
        .expect("Failed to complete set");

    sleep_secs(5.5).await;
    let view = f
        .sessions
        .skip_rest(f.trainee_id)
        .await
        .expect("Failed to skip rest");
    assert!(view.rest.is_none());
    assert_eq!(view.phase, SessionPhase::Loaded);

    // Skipping with nothing running is harmless
    let view = f
        .sessions
        .skip_rest(f.trainee_id)
        .await
        .expect("Failed to skip rest");
    assert!(view.rest.is_none());
}

#[tokio::test(start_paused = true)]
async fn reloading_resets_progress_and_rest() {
    let f = fixture().await;
    let slot_id = f.slots[0].slot.id;
    f.sessions
        .load_routine(f.trainee_id, f.routine.id)
        .await
        .expect("Failed to load routine");
    f.sessions
        .edit_inputs(f.trainee_id, slot_id, Some("80".to_string()), Some("6".to_string()))
        .await
        .expect("Failed to edit inputs");
    f.sessions
        .complete_set(f.trainee_id, slot_id, 0)
        .await
        .expect("Failed to complete set");

    let view = f
        .sessions
        .load_routine(f.trainee_id, f.routine.id)
        .await
        .expect("Failed to reload routine");
    assert_eq!(view.phase, SessionPhase::Loaded);
    assert!(view.rest.is_none());
    assert_eq!(view.slots[0].done, vec![false, false, false]);
    assert_eq!(view.slots[0].weight_input, "");
    assert_eq!(view.slots[0].reps_input, "10");

    let logs = f.store.progress_logs().await;
    assert_eq!(logs.len(), 1);
    assert_eq!(logs[0].weight, Some(80.0));
    assert_eq!(logs[0].reps, Some(6));
}

#[tokio::test(start_paused = true)]
async fn slot_read_failure_loads_an_empty_routine() {
    let f = fixture().await;
    f.store.set_fail_reads(true);

    assert!(f.sessions.list_active_routines(f.trainee_id).await.is_empty());

    let view = f
        .sessions
        .load_routine(f.trainee_id, f.routine.id)
        .await
        .expect("Failed to load routine");
    assert_eq!(view.routine_id, Some(f.routine.id));
    assert!(view.slots.is_empty());
}

#[tokio::test(start_paused = true)]
async fn foreign_or_missing_routines_are_rejected() {
    let f = fixture().await;
    let stranger = profile("Ben", Role::Trainee, None);
    f.store.insert_profile(stranger.clone()).await;

    let result = f.sessions.load_routine(stranger.id, f.routine.id).await;
    assert!(matches!(result, Err(TrainingError::RoutineNotFound)));

    let result = f.sessions.load_routine(f.trainee_id, Uuid::new_v4()).await;
    assert!(matches!(result, Err(TrainingError::RoutineNotFound)));
}

#[tokio::test(start_paused = true)]
async fn ended_session_rejects_commands() {
    let f = fixture().await;
    let slot_id = f.slots[0].slot.id;
    f.sessions
        .load_routine(f.trainee_id, f.routine.id)
        .await
        .expect("Failed to load routine");
    f.sessions
        .complete_set(f.trainee_id, slot_id, 0)
        .await
        .expect("Failed to complete set");

    f.sessions.end_session(f.trainee_id).await;

    let view = f.sessions.snapshot(f.trainee_id).await;
    assert_eq!(view.phase, SessionPhase::Idle);
    assert!(view.rest.is_none());

    let result = f.sessions.complete_set(f.trainee_id, slot_id, 1).await;
    assert!(matches!(
        result,
        Err(TrainingError::Session(SessionError::NoRoutineLoaded))
    ));
}

#[tokio::test(start_paused = true)]
async fn set_on_a_removed_slot_is_logged_without_the_slot() {
    let f = fixture().await;
    let (slot_id, exercise_id) = (f.slots[0].slot.id, f.slots[0].slot.exercise_id);
    f.sessions
        .load_routine(f.trainee_id, f.routine.id)
        .await
        .expect("Failed to load routine");

    // The trainer edits the routine while the trainee is mid-workout
    f.store.remove_slot(slot_id).await.expect("Failed to remove slot");

    let response = f
        .sessions
        .complete_set(f.trainee_id, slot_id, 0)
        .await
        .expect("Failed to complete set");
    assert_eq!(response.outcome, SetOutcome::Logged);
    assert_eq!(response.session.slots[0].done, vec![true, false, false]);

    let logs = f.store.progress_logs().await;
    assert_eq!(logs.len(), 1);
    assert_eq!(logs[0].exercise_id, exercise_id);
    assert_eq!(logs[0].slot_id, None);
}

#[tokio::test(start_paused = true)]
async fn idle_sessions_are_dropped_on_the_next_load() {
    let f = fixture().await;
    let slot_id = f.slots[0].slot.id;
    let other = profile("Ben", Role::Trainee, None);
    f.store.insert_profile(other.clone()).await;
    let other_routine = f
        .store
        .create_routine(NewRoutine {
            trainee_id: other.id,
            name: "Upper".to_string(),
        })
        .await
        .expect("Failed to create routine");

    f.sessions
        .load_routine(f.trainee_id, f.routine.id)
        .await
        .expect("Failed to load routine");

    // Activity inside the window keeps the session
    tokio::time::sleep(IDLE_TIMEOUT / 2).await;
    f.sessions
        .toggle_slot(f.trainee_id, slot_id)
        .await
        .expect("Failed to toggle slot");
    tokio::time::sleep(IDLE_TIMEOUT / 2 + Duration::from_secs(60)).await;
    f.sessions
        .load_routine(other.id, other_routine.id)
        .await
        .expect("Failed to load routine");
    let view = f.sessions.snapshot(f.trainee_id).await;
    assert_eq!(view.phase, SessionPhase::SlotExpanded { slot_id });

    tokio::time::sleep(IDLE_TIMEOUT).await;
    f.sessions
        .load_routine(other.id, other_routine.id)
        .await
        .expect("Failed to load routine");

    let view = f.sessions.snapshot(f.trainee_id).await;
    assert_eq!(view.phase, SessionPhase::Idle);
    assert!(view.slots.is_empty());
    let result = f.sessions.toggle_slot(f.trainee_id, slot_id).await;
    assert!(matches!(
        result,
        Err(TrainingError::Session(SessionError::NoRoutineLoaded))
    ));

    // The trainee that just loaded is untouched
    let view = f.sessions.snapshot(other.id).await;
    assert_eq!(view.routine_id, Some(other_routine.id));
}
