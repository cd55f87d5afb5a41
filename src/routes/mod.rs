use actix_web::web;

pub mod backend_health;
pub mod profile;
pub mod trainer;
pub mod training;

use crate::middleware::{AuthMiddleware, RequireRole};
use crate::models::profile::Role;

pub fn init_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(backend_health::backend_health);

    // Own profile (any role)
    cfg.service(
        web::scope("/me")
            .wrap(AuthMiddleware)
            .service(profile::me)
    );
    // Trainer routes
    cfg.configure(trainer::init_trainer_routes);
    // Trainee routes
    cfg.service(
        web::scope("/training")
            .wrap(RequireRole(Role::Trainee))
            .wrap(AuthMiddleware)
            .service(training::get_routines)
            .service(training::start_session)
            .service(training::get_session)
            .service(training::end_session)
            .service(training::toggle_slot)
            .service(training::edit_inputs)
            .service(training::complete_set)
            .service(training::skip_rest)
            .service(training::get_logged_exercises)
            .service(training::get_exercise_progress)
    );
}
