use actix_web::HttpResponse;

use crate::db::StoreError;
use crate::models::common::ApiResponse;
use crate::services::TrainingError;
use crate::workout::session::SessionError;

pub mod backend_health_handler;
pub mod profile_handler;
pub mod trainer;
pub mod training;

/// Maps a store failure on a trainer path onto the response the client sees.
pub fn store_error_response(error: &StoreError, context: &str) -> HttpResponse {
    match error {
        StoreError::Validation(reason) => {
            HttpResponse::BadRequest().json(ApiResponse::<()>::error_with_message(context, reason.as_str()))
        }
        StoreError::NotFound(what) => {
            HttpResponse::NotFound().json(ApiResponse::<()>::error(format!("{} not found", what)))
        }
        StoreError::Conflict(reason) => {
            HttpResponse::Conflict().json(ApiResponse::<()>::error_with_message(context, reason.as_str()))
        }
        other => {
            tracing::error!("{}: {}", context, other);
            HttpResponse::InternalServerError().json(ApiResponse::<()>::error(context))
        }
    }
}

pub fn training_error_response(error: &TrainingError, context: &str) -> HttpResponse {
    match error {
        TrainingError::RoutineNotFound => {
            HttpResponse::NotFound().json(ApiResponse::<()>::error("Routine not found"))
        }
        TrainingError::Session(SessionError::NoRoutineLoaded) => {
            HttpResponse::Conflict().json(ApiResponse::<()>::error("No routine is loaded"))
        }
        TrainingError::Session(e @ SessionError::UnknownSlot(_)) => {
            HttpResponse::NotFound().json(ApiResponse::<()>::error(e.to_string()))
        }
        TrainingError::Session(e @ SessionError::SetOutOfRange { .. }) => {
            HttpResponse::BadRequest().json(ApiResponse::<()>::error(e.to_string()))
        }
        TrainingError::Store(e) => store_error_response(e, context),
    }
}
