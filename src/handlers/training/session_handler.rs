use actix_web::{web, HttpResponse};
use uuid::Uuid;

use crate::handlers::training_error_response;
use crate::middleware::auth::Identity;
use crate::models::common::ApiResponse;
use crate::models::session::{EditInputsRequest, LoadRoutineRequest, SetOutcome};
use crate::services::TrainingSessions;

#[tracing::instrument(
    name = "List assigned routines",
    skip(sessions, identity),
    fields(trainee_id = %identity.profile_id)
)]
pub async fn list_routines(sessions: web::Data<TrainingSessions>, identity: web::ReqData<Identity>) -> HttpResponse {
    let routines = sessions.list_active_routines(identity.profile_id).await;
    HttpResponse::Ok().json(ApiResponse::success("Routines retrieved successfully", routines))
}

#[tracing::instrument(
    name = "Start session",
    skip(sessions, identity, body),
    fields(trainee_id = %identity.profile_id, routine_id = %body.routine_id)
)]
pub async fn load_routine(
    sessions: web::Data<TrainingSessions>,
    identity: web::ReqData<Identity>,
    body: web::Json<LoadRoutineRequest>,
) -> HttpResponse {
    match sessions.load_routine(identity.profile_id, body.routine_id).await {
        Ok(view) => HttpResponse::Ok().json(ApiResponse::success("Routine loaded", view)),
        Err(e) => training_error_response(&e, "Failed to load routine"),
    }
}

pub async fn get_session(sessions: web::Data<TrainingSessions>, identity: web::ReqData<Identity>) -> HttpResponse {
    let view = sessions.snapshot(identity.profile_id).await;
    HttpResponse::Ok().json(ApiResponse::success("Session retrieved", view))
}

pub async fn end_session(sessions: web::Data<TrainingSessions>, identity: web::ReqData<Identity>) -> HttpResponse {
    sessions.end_session(identity.profile_id).await;
    HttpResponse::Ok().json(ApiResponse::<()>::success_message("Session ended"))
}

pub async fn toggle_slot(
    sessions: web::Data<TrainingSessions>,
    identity: web::ReqData<Identity>,
    path: web::Path<Uuid>,
) -> HttpResponse {
    match sessions.toggle_slot(identity.profile_id, path.into_inner()).await {
        Ok(view) => HttpResponse::Ok().json(ApiResponse::success("Slot toggled", view)),
        Err(e) => training_error_response(&e, "Failed to toggle slot"),
    }
}

pub async fn edit_inputs(
    sessions: web::Data<TrainingSessions>,
    identity: web::ReqData<Identity>,
    path: web::Path<Uuid>,
    body: web::Json<EditInputsRequest>,
) -> HttpResponse {
    let EditInputsRequest { weight, reps } = body.into_inner();
    match sessions
        .edit_inputs(identity.profile_id, path.into_inner(), weight, reps)
        .await
    {
        Ok(view) => HttpResponse::Ok().json(ApiResponse::success("Inputs updated", view)),
        Err(e) => training_error_response(&e, "Failed to update inputs"),
    }
}

/// 200 for every outcome of an existing set; `write_failed` tells the client
/// the mark was rolled back and the set can be completed again.
#[tracing::instrument(
    name = "Complete set request",
    skip(sessions, identity, path),
    fields(trainee_id = %identity.profile_id)
)]
pub async fn complete_set(
    sessions: web::Data<TrainingSessions>,
    identity: web::ReqData<Identity>,
    path: web::Path<(Uuid, usize)>,
) -> HttpResponse {
    let (slot_id, set_index) = path.into_inner();
    match sessions.complete_set(identity.profile_id, slot_id, set_index).await {
        Ok(response) => {
            let message = match (response.outcome, &response.acknowledgement) {
                (SetOutcome::Logged, Some(ack)) => ack.clone(),
                (SetOutcome::WriteFailed, _) => "Set could not be saved, try again".to_string(),
                _ => "Set already completed".to_string(),
            };
            HttpResponse::Ok().json(ApiResponse::success(message, response))
        }
        Err(e) => training_error_response(&e, "Failed to complete set"),
    }
}

pub async fn skip_rest(sessions: web::Data<TrainingSessions>, identity: web::ReqData<Identity>) -> HttpResponse {
    match sessions.skip_rest(identity.profile_id).await {
        Ok(view) => HttpResponse::Ok().json(ApiResponse::success("Rest skipped", view)),
        Err(e) => training_error_response(&e, "Failed to skip rest"),
    }
}
