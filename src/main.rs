use std::net::TcpListener;
use std::sync::Arc;
use std::time::Duration;

use secrecy::ExposeSecret;
use sqlx::postgres::PgPoolOptions;

use gymtrack_backend::config::settings::{get_config, get_jwt_settings, StoreBackend};
use gymtrack_backend::db::{GymStore, InMemoryStore, PgStore};
use gymtrack_backend::run;
use gymtrack_backend::services::TrainingSessions;
use gymtrack_backend::telemetry::{get_subscriber, init_subscriber};

#[tokio::main]
async fn main() -> std::io::Result<()> {
    // Panic if we can't read the config
    let config = get_config().expect("Failed to read the config.");

    let subscriber = get_subscriber(
        "gymtrack-backend".into(),
        config.application.log_level.clone(),
        std::io::stdout,
    );
    init_subscriber(subscriber);

    let jwt_settings = get_jwt_settings(&config);

    let store: Arc<dyn GymStore> = match config.database.backend {
        StoreBackend::Postgres => {
            // Only try to establish connection when actually used
            let connection_pool = PgPoolOptions::new()
                .max_connections(32)
                .acquire_timeout(Duration::from_secs(10))
                .idle_timeout(Duration::from_secs(600))
                .max_lifetime(Duration::from_secs(1800))
                .connect_lazy(config.database.connection_string().expose_secret())
                .expect("Failed to create Postgres connection pool");

            if config.database.run_migrations {
                if let Err(e) = sqlx::migrate!("./migrations").run(&connection_pool).await {
                    tracing::error!("❌ Failed to run database migrations: {}", e);
                    std::process::exit(1);
                }
                tracing::info!("✅ Database migrations applied");
            }
            Arc::new(PgStore::new(connection_pool))
        }
        StoreBackend::Memory => {
            tracing::warn!("Using the in-memory store, data is lost on restart");
            Arc::new(InMemoryStore::new())
        }
    };

    let sessions = Arc::new(TrainingSessions::new(
        store.clone(),
        config.workout.rest_tick_interval(),
        config.workout.session_idle_timeout(),
    ));

    let address = format!("{}:{}", config.application.host, config.application.port);
    let listener = TcpListener::bind(&address)?;
    tracing::info!("Listening on {}", address);

    let result = run(
        listener,
        store,
        sessions.clone(),
        jwt_settings,
        config.workout.clone(),
        config.application.allowed_origins.clone(),
    )?
    .await;

    sessions.shutdown().await;
    result
}
