use actix_web::{web, HttpResponse};
use chrono::Local;

use crate::config::workout::WorkoutSettings;
use crate::db::GymStore;
use crate::handlers::store_error_response;
use crate::models::common::ApiResponse;
use crate::models::profile::{RosterResponse, SearchQuery};
use crate::utils::payment_status::{matches_search, roster_entry, roster_stats};

/// Roster of every trainee. Stats cover the whole roster, the list honours the search.
#[tracing::instrument(name = "List trainees", skip(store, settings, query))]
pub async fn list_trainees(
    store: web::Data<dyn GymStore>,
    settings: web::Data<WorkoutSettings>,
    query: web::Query<SearchQuery>,
) -> HttpResponse {
    let trainees = match store.list_trainees().await {
        Ok(trainees) => trainees,
        Err(e) => return store_error_response(&e, "Failed to fetch trainees"),
    };

    let today = Local::now().date_naive();
    let stats = roster_stats(&trainees, today);
    let entries = trainees
        .iter()
        .filter(|trainee| matches_search(trainee, query.search.as_deref()))
        .map(|trainee| roster_entry(trainee, today, settings.due_soon_days))
        .collect();

    HttpResponse::Ok().json(ApiResponse::success(
        "Trainees retrieved successfully",
        RosterResponse {
            stats,
            trainees: entries,
        },
    ))
}
