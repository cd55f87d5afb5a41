use actix_web::{web, HttpResponse};
use chrono::Local;

use crate::config::workout::WorkoutSettings;
use crate::db::GymStore;
use crate::middleware::auth::Identity;
use crate::models::common::ApiResponse;
use crate::models::profile::ProfileResponse;
use crate::utils::payment_status::payment_status;

#[tracing::instrument(
    name = "Get own profile",
    skip(store, settings, identity),
    fields(profile_id = %identity.profile_id)
)]
pub async fn get_own_profile(
    store: web::Data<dyn GymStore>,
    settings: web::Data<WorkoutSettings>,
    identity: web::ReqData<Identity>,
) -> HttpResponse {
    let profile = match store.get_profile(identity.profile_id).await {
        Ok(Some(profile)) => profile,
        Ok(None) => {
            return HttpResponse::NotFound().json(ApiResponse::<()>::error("Profile not found"));
        }
        Err(e) => {
            tracing::error!("Failed to fetch profile: {}", e);
            return HttpResponse::InternalServerError()
                .json(ApiResponse::<()>::error("Failed to fetch profile"));
        }
    };

    let today = Local::now().date_naive();
    let payment_status = payment_status(profile.due_on, today, settings.due_soon_days);
    HttpResponse::Ok().json(ApiResponse::success(
        "Profile retrieved successfully",
        ProfileResponse {
            profile,
            payment_status,
        },
    ))
}
