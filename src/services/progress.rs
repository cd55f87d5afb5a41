use uuid::Uuid;

use crate::db::GymStore;
use crate::models::exercise::ExerciseDefinition;
use crate::models::progress::ProgressSummary;
use crate::workout::progress::summarize;

/// Exercises the trainee has logged, ordered by name. Empty on store failure.
#[tracing::instrument(name = "Load logged exercises", skip(store))]
pub async fn logged_exercises(store: &dyn GymStore, trainee_id: Uuid) -> Vec<ExerciseDefinition> {
    let ids = match store.list_logged_exercise_ids(trainee_id).await {
        Ok(ids) => ids,
        Err(e) => {
            tracing::warn!("Failed to load logged exercise ids: {}", e);
            return Vec::new();
        }
    };
    if ids.is_empty() {
        return Vec::new();
    }

    store
        .list_exercise_definitions(&ids)
        .await
        .unwrap_or_else(|e| {
            tracing::warn!("Failed to load exercise definitions: {}", e);
            Vec::new()
        })
}

/// Progress of one exercise. A failed read yields the summary of an empty log.
#[tracing::instrument(name = "Summarize exercise progress", skip(store))]
pub async fn exercise_progress(
    store: &dyn GymStore,
    trainee_id: Uuid,
    exercise_id: Uuid,
    recent_limit: usize,
) -> ProgressSummary {
    let entries = store
        .list_progress_logs(trainee_id, exercise_id)
        .await
        .unwrap_or_else(|e| {
            tracing::warn!("Failed to load progress logs: {}", e);
            Vec::new()
        });
    summarize(exercise_id, &entries, recent_limit)
}
