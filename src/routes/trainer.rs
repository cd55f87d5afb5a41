use actix_web::web;

use crate::handlers::trainer::{exercise_handler, routine_handler, trainee_handler};
use crate::middleware::{AuthMiddleware, RequireRole};
use crate::models::profile::Role;

pub fn init_trainer_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/trainer")
            .wrap(RequireRole(Role::Trainer))
            .wrap(AuthMiddleware)
            // Roster
            .service(
                web::resource("/trainees")
                    .route(web::get().to(trainee_handler::list_trainees))
            )
            .service(
                web::resource("/trainees/{id}/routines")
                    .route(web::get().to(routine_handler::list_trainee_routines))
                    .route(web::post().to(routine_handler::create_routine))
            )

            // Exercise catalog
            .service(
                web::resource("/muscle-groups")
                    .route(web::get().to(exercise_handler::list_muscle_groups))
            )
            .service(
                web::resource("/exercises")
                    .route(web::get().to(exercise_handler::list_exercises))
                    .route(web::post().to(exercise_handler::create_exercise))
            )
            .service(
                web::resource("/exercises/{id}")
                    .route(web::put().to(exercise_handler::update_exercise))
                    .route(web::delete().to(exercise_handler::delete_exercise))
            )

            // Routine authoring
            .service(
                web::resource("/routines/{id}")
                    .route(web::delete().to(routine_handler::delete_routine))
            )
            .service(
                web::resource("/routines/{id}/slots")
                    .route(web::get().to(routine_handler::list_slots))
                    .route(web::post().to(routine_handler::add_slot))
                    .route(web::put().to(routine_handler::save_slots))
            )
            .service(
                web::resource("/slots/{id}")
                    .route(web::delete().to(routine_handler::remove_slot))
            )
    );
}
