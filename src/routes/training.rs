use actix_web::{delete, get, post, put, web, HttpResponse};
use uuid::Uuid;

use crate::config::workout::WorkoutSettings;
use crate::db::GymStore;
use crate::handlers::training::{progress_handler, session_handler};
use crate::middleware::auth::Identity;
use crate::models::session::{EditInputsRequest, LoadRoutineRequest};
use crate::services::TrainingSessions;

#[get("/routines")]
pub async fn get_routines(
    sessions: web::Data<TrainingSessions>,
    identity: web::ReqData<Identity>,
) -> HttpResponse {
    session_handler::list_routines(sessions, identity).await
}

#[post("/session")]
pub async fn start_session(
    sessions: web::Data<TrainingSessions>,
    identity: web::ReqData<Identity>,
    body: web::Json<LoadRoutineRequest>,
) -> HttpResponse {
    session_handler::load_routine(sessions, identity, body).await
}

#[get("/session")]
pub async fn get_session(
    sessions: web::Data<TrainingSessions>,
    identity: web::ReqData<Identity>,
) -> HttpResponse {
    session_handler::get_session(sessions, identity).await
}

#[delete("/session")]
pub async fn end_session(
    sessions: web::Data<TrainingSessions>,
    identity: web::ReqData<Identity>,
) -> HttpResponse {
    session_handler::end_session(sessions, identity).await
}

#[post("/session/slots/{slot_id}/toggle")]
pub async fn toggle_slot(
    sessions: web::Data<TrainingSessions>,
    identity: web::ReqData<Identity>,
    path: web::Path<Uuid>,
) -> HttpResponse {
    session_handler::toggle_slot(sessions, identity, path).await
}

#[put("/session/slots/{slot_id}/inputs")]
pub async fn edit_inputs(
    sessions: web::Data<TrainingSessions>,
    identity: web::ReqData<Identity>,
    path: web::Path<Uuid>,
    body: web::Json<EditInputsRequest>,
) -> HttpResponse {
    session_handler::edit_inputs(sessions, identity, path, body).await
}

#[post("/session/slots/{slot_id}/sets/{index}/complete")]
pub async fn complete_set(
    sessions: web::Data<TrainingSessions>,
    identity: web::ReqData<Identity>,
    path: web::Path<(Uuid, usize)>,
) -> HttpResponse {
    session_handler::complete_set(sessions, identity, path).await
}

#[post("/session/rest/skip")]
pub async fn skip_rest(
    sessions: web::Data<TrainingSessions>,
    identity: web::ReqData<Identity>,
) -> HttpResponse {
    session_handler::skip_rest(sessions, identity).await
}

#[get("/progress/exercises")]
pub async fn get_logged_exercises(
    store: web::Data<dyn GymStore>,
    identity: web::ReqData<Identity>,
) -> HttpResponse {
    progress_handler::list_logged_exercises(store, identity).await
}

#[get("/progress/exercises/{exercise_id}")]
pub async fn get_exercise_progress(
    store: web::Data<dyn GymStore>,
    settings: web::Data<WorkoutSettings>,
    identity: web::ReqData<Identity>,
    path: web::Path<Uuid>,
) -> HttpResponse {
    progress_handler::get_exercise_progress(store, settings, identity, path).await
}
