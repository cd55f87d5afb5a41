use std::collections::HashMap;
use std::sync::{Arc, Weak};
use std::time::Duration;

use chrono::Local;
use tokio::sync::{watch, Mutex};
use tokio::time::Instant;
use uuid::Uuid;

use crate::db::{GymStore, StoreError};
use crate::models::progress::NewProgressLog;
use crate::models::routine::Routine;
use crate::models::session::{CompleteSetResponse, SessionView, SetOutcome};
use crate::workout::rest_timer::{RestCountdown, RestTimer};
use crate::workout::session::{InputField, SessionError, WorkoutSession};

#[derive(Debug, thiserror::Error)]
pub enum TrainingError {
    #[error(transparent)]
    Session(#[from] SessionError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("Routine not found")]
    RoutineNotFound,
}

struct ActiveSession {
    machine: WorkoutSession,
    timer: Option<RestTimer>,
    last_activity: Instant,
}

impl ActiveSession {
    fn touch(&mut self) {
        self.last_activity = Instant::now();
    }

    fn is_idle(&self, idle_timeout: Duration) -> bool {
        self.machine.rest().is_none() && self.last_activity.elapsed() >= idle_timeout
    }

    fn view(&self) -> SessionView {
        let countdown = self.timer.as_ref().map(RestTimer::snapshot);
        self.machine.view(countdown.as_ref())
    }

    fn cancel_timer(&mut self) {
        if let Some(timer) = self.timer.take() {
            timer.cancel();
        }
    }
}

/// Registry of live workout sessions, one per trainee.
///
/// Each session sits behind its own mutex so commands from one trainee run
/// one at a time while different trainees never contend. Built once at
/// startup and torn down with [`TrainingSessions::shutdown`].
///
/// Sessions left alone for `idle_timeout` are dropped the next time any
/// trainee loads a routine. A running rest or a command in flight keeps a
/// session alive.
pub struct TrainingSessions {
    store: Arc<dyn GymStore>,
    sessions: Mutex<HashMap<Uuid, Arc<Mutex<ActiveSession>>>>,
    tick_interval: Duration,
    idle_timeout: Duration,
}

impl TrainingSessions {
    pub fn new(store: Arc<dyn GymStore>, tick_interval: Duration, idle_timeout: Duration) -> Self {
        Self {
            store,
            sessions: Mutex::new(HashMap::new()),
            tick_interval,
            idle_timeout,
        }
    }

    async fn session_for(&self, trainee_id: Uuid) -> Arc<Mutex<ActiveSession>> {
        let mut sessions = self.sessions.lock().await;
        evict_idle(&mut sessions, self.idle_timeout);
        sessions
            .entry(trainee_id)
            .or_insert_with(|| {
                Arc::new(Mutex::new(ActiveSession {
                    machine: WorkoutSession::new(trainee_id),
                    timer: None,
                    last_activity: Instant::now(),
                }))
            })
            .clone()
    }

    async fn existing_session(&self, trainee_id: Uuid) -> Option<Arc<Mutex<ActiveSession>>> {
        self.sessions.lock().await.get(&trainee_id).cloned()
    }

    /// Empty on store failure.
    #[tracing::instrument(name = "List active routines for session", skip(self))]
    pub async fn list_active_routines(&self, trainee_id: Uuid) -> Vec<Routine> {
        match self.store.list_active_routines(trainee_id).await {
            Ok(routines) => routines,
            Err(e) => {
                tracing::warn!("Failed to load active routines: {}", e);
                Vec::new()
            }
        }
    }

    #[tracing::instrument(name = "Load routine into session", skip(self))]
    pub async fn load_routine(&self, trainee_id: Uuid, routine_id: Uuid) -> Result<SessionView, TrainingError> {
        match self.store.get_routine(routine_id).await? {
            Some(routine) if routine.trainee_id == trainee_id => {}
            _ => return Err(TrainingError::RoutineNotFound),
        }

        let slots = match self.store.list_slots(routine_id).await {
            Ok(slots) => slots,
            Err(e) => {
                tracing::warn!("Failed to load slots of routine {}, starting empty: {}", routine_id, e);
                Vec::new()
            }
        };

        let session = self.session_for(trainee_id).await;
        let mut active = session.lock().await;
        active.touch();
        active.cancel_timer();
        active.machine.load(routine_id, slots);

        tracing::info!("✅ Routine {} loaded", routine_id);
        Ok(active.view())
    }

    /// Idle view when the trainee has no session yet.
    pub async fn snapshot(&self, trainee_id: Uuid) -> SessionView {
        match self.existing_session(trainee_id).await {
            Some(session) => session.lock().await.view(),
            None => WorkoutSession::new(trainee_id).view(None),
        }
    }

    pub async fn toggle_slot(&self, trainee_id: Uuid, slot_id: Uuid) -> Result<SessionView, TrainingError> {
        let session = self
            .existing_session(trainee_id)
            .await
            .ok_or(SessionError::NoRoutineLoaded)?;
        let mut active = session.lock().await;
        active.touch();
        active.machine.toggle_slot(slot_id)?;
        Ok(active.view())
    }

    pub async fn edit_inputs(
        &self,
        trainee_id: Uuid,
        slot_id: Uuid,
        weight: Option<String>,
        reps: Option<String>,
    ) -> Result<SessionView, TrainingError> {
        let session = self
            .existing_session(trainee_id)
            .await
            .ok_or(SessionError::NoRoutineLoaded)?;
        let mut active = session.lock().await;
        active.touch();
        if let Some(weight) = weight {
            active.machine.edit_input(slot_id, InputField::Weight, weight)?;
        }
        if let Some(reps) = reps {
            active.machine.edit_input(slot_id, InputField::Reps, reps)?;
        }
        Ok(active.view())
    }

    /// Marks the set done, restarts the rest and then persists the log entry.
    /// A rejected write reverts the mark so the set can be completed again.
    #[tracing::instrument(name = "Complete set", skip(self))]
    pub async fn complete_set(
        &self,
        trainee_id: Uuid,
        slot_id: Uuid,
        set_index: usize,
    ) -> Result<CompleteSetResponse, TrainingError> {
        let session = self
            .existing_session(trainee_id)
            .await
            .ok_or(SessionError::NoRoutineLoaded)?;
        let mut active = session.lock().await;
        active.touch();

        let today = Local::now().date_naive();
        let Some(completion) = active.machine.complete_set(slot_id, set_index, today)? else {
            tracing::debug!("Set {} of slot {} already completed", set_index, slot_id);
            return Ok(CompleteSetResponse {
                outcome: SetOutcome::AlreadyCompleted,
                acknowledgement: None,
                session: active.view(),
            });
        };

        active.cancel_timer();
        if let Some(rest) = completion.rest {
            let timer = RestTimer::start(rest.target_secs, self.tick_interval);
            spawn_rest_watcher(Arc::downgrade(&session), rest.generation, timer.subscribe());
            active.timer = Some(timer);
        }

        let outcome = match self.write_log(completion.log).await {
            Ok(log_id) => {
                tracing::info!("Progress log {} written for slot {}", log_id, slot_id);
                SetOutcome::Logged
            }
            Err(e) => {
                tracing::error!("Failed to write progress log for slot {}: {}", slot_id, e);
                active
                    .machine
                    .revert_set(completion.load_generation, slot_id, set_index);
                SetOutcome::WriteFailed
            }
        };

        Ok(CompleteSetResponse {
            outcome,
            acknowledgement: (outcome == SetOutcome::Logged).then_some(completion.acknowledgement),
            session: active.view(),
        })
    }

    /// A slot the trainer removed after the routine was loaded no longer
    /// exists; the set is still logged against the exercise, without the slot.
    async fn write_log(&self, log: NewProgressLog) -> Result<Uuid, StoreError> {
        match self.store.insert_progress_log(log.clone()).await {
            Err(StoreError::NotFound("Slot")) if log.slot_id.is_some() => {
                tracing::warn!("Slot {:?} was removed from the routine, logging without it", log.slot_id);
                self.store
                    .insert_progress_log(NewProgressLog { slot_id: None, ..log })
                    .await
            }
            written => written,
        }
    }

    pub async fn skip_rest(&self, trainee_id: Uuid) -> Result<SessionView, TrainingError> {
        let session = self
            .existing_session(trainee_id)
            .await
            .ok_or(SessionError::NoRoutineLoaded)?;
        let mut active = session.lock().await;
        active.touch();

        if let Some(rest) = active.machine.rest() {
            if let Some(timer) = active.timer.take() {
                timer.skip();
            }
            active.machine.finish_rest(rest.generation);
            tracing::debug!("Rest for slot {} skipped", rest.slot_id);
        }
        Ok(active.view())
    }

    /// Discards the trainee's session. Unlogged input is lost.
    pub async fn end_session(&self, trainee_id: Uuid) {
        let removed = self.sessions.lock().await.remove(&trainee_id);
        if let Some(session) = removed {
            let mut active = session.lock().await;
            active.cancel_timer();
            active.machine.clear();
        }
    }

    pub async fn shutdown(&self) {
        let drained: Vec<_> = self.sessions.lock().await.drain().collect();
        let count = drained.len();
        for (_, session) in drained {
            let mut active = session.lock().await;
            active.cancel_timer();
            active.machine.clear();
        }
        tracing::info!("🛑 Training sessions stopped ({} discarded)", count);
    }
}

/// Drops idle sessions from the registry. A session whose lock is held is
/// busy and stays.
fn evict_idle(sessions: &mut HashMap<Uuid, Arc<Mutex<ActiveSession>>>, idle_timeout: Duration) {
    let before = sessions.len();
    sessions.retain(|_, session| match session.try_lock() {
        Ok(mut active) if active.is_idle(idle_timeout) => {
            // A caller still holding the handle sees an idle session
            active.cancel_timer();
            active.machine.clear();
            false
        }
        _ => true,
    });
    let evicted = before - sessions.len();
    if evicted > 0 {
        tracing::debug!("Evicted {} idle training sessions", evicted);
    }
}

/// Clears the rest overlay once the countdown ends on its own. Exits quietly
/// when the timer is cancelled or the session is gone.
fn spawn_rest_watcher(session: Weak<Mutex<ActiveSession>>, generation: u64, mut updates: watch::Receiver<RestCountdown>) {
    tokio::spawn(async move {
        let ended = match updates.wait_for(RestCountdown::is_finished).await {
            Ok(countdown) => countdown.ended,
            Err(_) => return,
        };

        let Some(session) = session.upgrade() else {
            return;
        };
        let mut active = session.lock().await;
        if active.machine.finish_rest(generation) {
            active.timer = None;
            tracing::debug!(?ended, "Rest finished");
        }
    });
}
