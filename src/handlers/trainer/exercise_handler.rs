use actix_web::{web, HttpResponse};
use uuid::Uuid;

use crate::db::GymStore;
use crate::handlers::store_error_response;
use crate::models::common::ApiResponse;
use crate::models::exercise::{ExerciseDefinition, ExerciseInput, MUSCLE_GROUPS};
use crate::models::profile::SearchQuery;

pub async fn list_muscle_groups() -> HttpResponse {
    HttpResponse::Ok().json(ApiResponse::success(
        "Muscle groups retrieved successfully",
        MUSCLE_GROUPS.to_vec(),
    ))
}

#[tracing::instrument(name = "List exercises", skip(store, query))]
pub async fn list_exercises(store: web::Data<dyn GymStore>, query: web::Query<SearchQuery>) -> HttpResponse {
    match store.list_exercises().await {
        Ok(exercises) => {
            let needle = query.search.as_deref().unwrap_or_default();
            let exercises: Vec<ExerciseDefinition> = exercises
                .into_iter()
                .filter(|exercise| exercise.matches(needle))
                .collect();
            HttpResponse::Ok().json(ApiResponse::success("Exercises retrieved successfully", exercises))
        }
        Err(e) => store_error_response(&e, "Failed to fetch exercises"),
    }
}

#[tracing::instrument(name = "Create exercise", skip(store, body), fields(name = %body.name))]
pub async fn create_exercise(store: web::Data<dyn GymStore>, body: web::Json<ExerciseInput>) -> HttpResponse {
    match store.create_exercise(body.into_inner()).await {
        Ok(exercise) => {
            tracing::info!("✅ Exercise {} created", exercise.id);
            HttpResponse::Created().json(ApiResponse::success("Exercise created successfully", exercise))
        }
        Err(e) => store_error_response(&e, "Failed to create exercise"),
    }
}

#[tracing::instrument(name = "Update exercise", skip(store, body))]
pub async fn update_exercise(
    store: web::Data<dyn GymStore>,
    path: web::Path<Uuid>,
    body: web::Json<ExerciseInput>,
) -> HttpResponse {
    match store.update_exercise(path.into_inner(), body.into_inner()).await {
        Ok(exercise) => HttpResponse::Ok().json(ApiResponse::success("Exercise updated successfully", exercise)),
        Err(e) => store_error_response(&e, "Failed to update exercise"),
    }
}

#[tracing::instrument(name = "Delete exercise", skip(store))]
pub async fn delete_exercise(store: web::Data<dyn GymStore>, path: web::Path<Uuid>) -> HttpResponse {
    match store.delete_exercise(path.into_inner()).await {
        Ok(()) => HttpResponse::Ok().json(ApiResponse::<()>::success_message("Exercise deleted successfully")),
        Err(e) => store_error_response(&e, "Failed to delete exercise"),
    }
}
