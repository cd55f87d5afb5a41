use actix_web::{get, web, HttpResponse};

use crate::config::workout::WorkoutSettings;
use crate::db::GymStore;
use crate::handlers::profile_handler::get_own_profile;
use crate::middleware::auth::Identity;

#[get("")]
pub async fn me(
    store: web::Data<dyn GymStore>,
    settings: web::Data<WorkoutSettings>,
    identity: web::ReqData<Identity>,
) -> HttpResponse {
    get_own_profile(store, settings, identity).await
}
