use actix_web::{web, HttpResponse};
use uuid::Uuid;

use crate::db::GymStore;
use crate::handlers::store_error_response;
use crate::models::common::ApiResponse;
use crate::models::routine::{AddSlotRequest, CreateRoutineRequest, NewRoutine, NewSlot, SlotUpdate};

#[tracing::instrument(name = "List trainee routines", skip(store))]
pub async fn list_trainee_routines(store: web::Data<dyn GymStore>, path: web::Path<Uuid>) -> HttpResponse {
    match store.list_routines(path.into_inner()).await {
        Ok(routines) => HttpResponse::Ok().json(ApiResponse::success("Routines retrieved successfully", routines)),
        Err(e) => store_error_response(&e, "Failed to fetch routines"),
    }
}

#[tracing::instrument(name = "Create routine", skip(store, body))]
pub async fn create_routine(
    store: web::Data<dyn GymStore>,
    path: web::Path<Uuid>,
    body: web::Json<CreateRoutineRequest>,
) -> HttpResponse {
    let routine = NewRoutine {
        trainee_id: path.into_inner(),
        name: body.into_inner().name,
    };
    match store.create_routine(routine).await {
        Ok(routine) => {
            tracing::info!("✅ Routine {} created for trainee {}", routine.id, routine.trainee_id);
            HttpResponse::Created().json(ApiResponse::success("Routine created successfully", routine))
        }
        Err(e) => store_error_response(&e, "Failed to create routine"),
    }
}

#[tracing::instrument(name = "Delete routine", skip(store))]
pub async fn delete_routine(store: web::Data<dyn GymStore>, path: web::Path<Uuid>) -> HttpResponse {
    match store.delete_routine(path.into_inner()).await {
        Ok(()) => HttpResponse::Ok().json(ApiResponse::<()>::success_message("Routine deleted successfully")),
        Err(e) => store_error_response(&e, "Failed to delete routine"),
    }
}

#[tracing::instrument(name = "List routine slots", skip(store))]
pub async fn list_slots(store: web::Data<dyn GymStore>, path: web::Path<Uuid>) -> HttpResponse {
    let routine_id = path.into_inner();
    match store.get_routine(routine_id).await {
        Ok(Some(_)) => {}
        Ok(None) => return HttpResponse::NotFound().json(ApiResponse::<()>::error("Routine not found")),
        Err(e) => return store_error_response(&e, "Failed to fetch routine"),
    }

    match store.list_slots(routine_id).await {
        Ok(slots) => HttpResponse::Ok().json(ApiResponse::success("Slots retrieved successfully", slots)),
        Err(e) => store_error_response(&e, "Failed to fetch slots"),
    }
}

/// Missing targets default to 3 × 10 with 60 s rest.
#[tracing::instrument(name = "Add routine slot", skip(store, body))]
pub async fn add_slot(
    store: web::Data<dyn GymStore>,
    path: web::Path<Uuid>,
    body: web::Json<AddSlotRequest>,
) -> HttpResponse {
    let slot = NewSlot::from_request(path.into_inner(), body.into_inner());
    match store.add_slot(slot).await {
        Ok(slot) => HttpResponse::Created().json(ApiResponse::success("Slot added successfully", slot)),
        Err(e) => store_error_response(&e, "Failed to add slot"),
    }
}

#[tracing::instrument(name = "Save routine slots", skip(store, body), fields(count = body.len()))]
pub async fn save_slots(
    store: web::Data<dyn GymStore>,
    path: web::Path<Uuid>,
    body: web::Json<Vec<SlotUpdate>>,
) -> HttpResponse {
    match store.update_slots(path.into_inner(), body.into_inner()).await {
        Ok(slots) => HttpResponse::Ok().json(ApiResponse::success("Slots saved successfully", slots)),
        Err(e) => store_error_response(&e, "Failed to save slots"),
    }
}

#[tracing::instrument(name = "Remove routine slot", skip(store))]
pub async fn remove_slot(store: web::Data<dyn GymStore>, path: web::Path<Uuid>) -> HttpResponse {
    match store.remove_slot(path.into_inner()).await {
        Ok(()) => HttpResponse::Ok().json(ApiResponse::<()>::success_message("Slot removed successfully")),
        Err(e) => store_error_response(&e, "Failed to remove slot"),
    }
}
