use actix_cors::Cors;
use actix_web::dev::Server;
use actix_web::{http, web, App, HttpServer};
use std::net::TcpListener;
use std::sync::Arc;
use tracing_actix_web::TracingLogger;

pub mod auth;
pub mod config;
pub mod db;
mod handlers;
pub mod middleware;
pub mod models;
mod routes;
pub mod services;
pub mod telemetry;
pub mod utils;
pub mod workout;

use crate::config::jwt::JwtSettings;
use crate::config::workout::WorkoutSettings;
use crate::db::GymStore;
use crate::routes::init_routes;
use crate::services::TrainingSessions;

pub fn run(
    listener: TcpListener,
    store: Arc<dyn GymStore>,
    sessions: Arc<TrainingSessions>,
    jwt_settings: JwtSettings,
    workout_settings: WorkoutSettings,
    allowed_origins: Vec<String>,
) -> Result<Server, std::io::Error> {
    // Wrap using web::Data, which boils down to an Arc smart pointer
    let store_data: web::Data<dyn GymStore> = web::Data::from(store);
    let sessions_data = web::Data::from(sessions);
    let jwt_settings = web::Data::new(jwt_settings);
    let workout_settings = web::Data::new(workout_settings);

    let server = HttpServer::new(move || {
        let cors = allowed_origins
            .iter()
            .fold(Cors::default(), |cors, origin| cors.allowed_origin(origin))
            .allowed_methods(vec!["GET", "POST", "PUT", "DELETE"])
            .allowed_headers(vec![
                http::header::AUTHORIZATION,
                http::header::ACCEPT,
                http::header::CONTENT_TYPE,
            ])
            .supports_credentials()
            .max_age(3600);

        App::new()
            .wrap(TracingLogger::default())
            .wrap(cors)
            .app_data(store_data.clone())
            .app_data(sessions_data.clone())
            .app_data(jwt_settings.clone())
            .app_data(workout_settings.clone())
            .configure(init_routes)
    })
    .listen(listener)?
    .run();

    Ok(server)
}
