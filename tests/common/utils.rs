#![allow(dead_code)]

use std::net::TcpListener;
use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use once_cell::sync::Lazy;
use reqwest::Client;
use uuid::Uuid;

use gymtrack_backend::auth::jwt::generate_token;
use gymtrack_backend::config::jwt::JwtSettings;
use gymtrack_backend::config::workout::WorkoutSettings;
use gymtrack_backend::db::{GymStore, InMemoryStore};
use gymtrack_backend::models::exercise::{ExerciseDefinition, ExerciseInput};
use gymtrack_backend::models::profile::{Profile, Role};
use gymtrack_backend::models::routine::{NewRoutine, NewSlot, Routine, SlotWithExercise};
use gymtrack_backend::run;
use gymtrack_backend::services::TrainingSessions;
use gymtrack_backend::telemetry::{get_subscriber, init_subscriber};

// Ensure that the `tracing` stack is only initialised once using `once_cell`
static TRACING: Lazy<()> = Lazy::new(|| {
    let default_filter_level = "info".to_string();
    let subscriber_name = "test".to_string();

    if std::env::var("TEST_LOG").is_ok() {
        let subscriber = get_subscriber(subscriber_name, default_filter_level, std::io::stdout);
        init_subscriber(subscriber);
    } else {
        let subscriber = get_subscriber(subscriber_name, default_filter_level, std::io::sink);
        init_subscriber(subscriber);
    }
});

pub struct TestApp {
    pub address: String,
    pub store: Arc<InMemoryStore>,
    pub sessions: Arc<TrainingSessions>,
    pub jwt_settings: JwtSettings,
    pub client: Client,
}

pub async fn spawn_app() -> TestApp {
    spawn_app_with(WorkoutSettings::default()).await
}

pub async fn spawn_app_with(workout_settings: WorkoutSettings) -> TestApp {
    // The first time `initialize` is invoked the code in `TRACING` is executed.
    // All other invocations will instead skip execution.
    Lazy::force(&TRACING);

    let listener = TcpListener::bind("127.0.0.1:0").expect("Failed to bind random port");
    // Get port assigned by the OS
    let port = listener.local_addr().unwrap().port();
    let address = format!("http://127.0.0.1:{}", port);

    let store = Arc::new(InMemoryStore::new());
    let dyn_store: Arc<dyn GymStore> = store.clone();
    let sessions = Arc::new(TrainingSessions::new(
        dyn_store.clone(),
        workout_settings.rest_tick_interval(),
        workout_settings.session_idle_timeout(),
    ));
    let jwt_settings = JwtSettings::new(format!("test-secret-{}", Uuid::new_v4()), 1);

    let server = run(
        listener,
        dyn_store,
        sessions.clone(),
        jwt_settings.clone(),
        workout_settings,
        vec!["http://localhost:3000".to_string()],
    )
    .expect("Failed to bind address");
    // Launch the server as a background task
    let _ = tokio::spawn(server);

    TestApp {
        address,
        store,
        sessions,
        jwt_settings,
        client: Client::new(),
    }
}

pub fn profile(name: &str, role: Role, due_on: Option<NaiveDate>) -> Profile {
    Profile {
        id: Uuid::new_v4(),
        name: name.to_string(),
        email: format!("{}.{}@gym.test", name.to_lowercase(), Uuid::new_v4().simple()),
        role,
        paid_on: None,
        due_on,
        trainer_id: None,
        created_at: Utc::now(),
    }
}

pub fn exercise_input(name: &str, muscle_group: &str) -> ExerciseInput {
    ExerciseInput {
        name: name.to_string(),
        muscle_group: muscle_group.to_string(),
        media_url: None,
        description: None,
    }
}

impl TestApp {
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.address, path)
    }

    pub fn token_for(&self, profile_id: Uuid) -> String {
        generate_token(&self.jwt_settings, profile_id).expect("Failed to mint token")
    }

    /// Stores the profile and returns it with a bearer token.
    pub async fn add_profile(&self, name: &str, role: Role, due_on: Option<NaiveDate>) -> (Profile, String) {
        let profile = profile(name, role, due_on);
        self.store.insert_profile(profile.clone()).await;
        let token = self.token_for(profile.id);
        (profile, token)
    }

    pub async fn add_trainer(&self) -> (Profile, String) {
        self.add_profile("Coach", Role::Trainer, None).await
    }

    pub async fn add_trainee(&self, name: &str) -> (Profile, String) {
        self.add_profile(name, Role::Trainee, None).await
    }

    /// Routine with a single slot for `trainee_id`.
    pub async fn seed_routine(
        &self,
        trainee_id: Uuid,
        target_sets: u32,
        target_reps: u32,
        rest_secs: u32,
    ) -> (Routine, SlotWithExercise, ExerciseDefinition) {
        let exercise = self
            .store
            .create_exercise(exercise_input("Back Squat", "Legs"))
            .await
            .expect("Failed to create exercise");
        let routine = self
            .store
            .create_routine(NewRoutine {
                trainee_id,
                name: "Leg Day".to_string(),
            })
            .await
            .expect("Failed to create routine");
        let slot = self
            .store
            .add_slot(NewSlot {
                routine_id: routine.id,
                exercise_id: exercise.id,
                target_sets,
                target_reps,
                rest_secs,
            })
            .await
            .expect("Failed to add slot");
        (routine, slot, exercise)
    }
}
