use actix_web::{web, HttpResponse};
use uuid::Uuid;

use crate::config::workout::WorkoutSettings;
use crate::db::GymStore;
use crate::middleware::auth::Identity;
use crate::models::common::ApiResponse;
use crate::services::progress::{exercise_progress, logged_exercises};

#[tracing::instrument(
    name = "List logged exercises",
    skip(store, identity),
    fields(trainee_id = %identity.profile_id)
)]
pub async fn list_logged_exercises(store: web::Data<dyn GymStore>, identity: web::ReqData<Identity>) -> HttpResponse {
    let exercises = logged_exercises(store.get_ref(), identity.profile_id).await;
    HttpResponse::Ok().json(ApiResponse::success("Logged exercises retrieved successfully", exercises))
}

#[tracing::instrument(
    name = "Get exercise progress",
    skip(store, settings, identity),
    fields(trainee_id = %identity.profile_id)
)]
pub async fn get_exercise_progress(
    store: web::Data<dyn GymStore>,
    settings: web::Data<WorkoutSettings>,
    identity: web::ReqData<Identity>,
    path: web::Path<Uuid>,
) -> HttpResponse {
    let summary = exercise_progress(
        store.get_ref(),
        identity.profile_id,
        path.into_inner(),
        settings.recent_log_limit,
    )
    .await;
    HttpResponse::Ok().json(ApiResponse::success("Progress retrieved successfully", summary))
}
