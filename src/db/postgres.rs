use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::db::records::{
    convert_all, to_i32, ExerciseRecord, ProfileRecord, ProgressLogRecord, RoutineRecord, SlotRecord,
};
use crate::db::{GymStore, StoreError, DUPLICATE_POSITIONS};
use crate::models::exercise::{ExerciseDefinition, ExerciseInput};
use crate::models::profile::{Profile, Role};
use crate::models::progress::{NewProgressLog, ProgressLogEntry};
use crate::models::routine::{validate_targets, NewRoutine, NewSlot, Routine, SlotUpdate, SlotWithExercise};

const PROFILE_COLUMNS: &str = "id, name, email, role, paid_on, due_on, trainer_id, created_at";
const EXERCISE_COLUMNS: &str = "id, name, muscle_group, media_url, description, created_at";
const ROUTINE_COLUMNS: &str = "id, trainee_id, name, active, created_at";

const SLOT_SELECT: &str = r#"
    SELECT s.id, s.routine_id, s.exercise_id, s.target_sets, s.target_reps, s.rest_secs, s.position,
           e.name AS exercise_name,
           e.muscle_group AS exercise_muscle_group,
           e.media_url AS exercise_media_url,
           e.description AS exercise_description,
           e.created_at AS exercise_created_at
    FROM routine_slots s
    LEFT JOIN exercises e ON e.id = s.exercise_id
"#;

/// PostgreSQL-backed store. Queries are built at runtime so the crate
/// compiles without a live database.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn fetch_slot(&self, slot_id: Uuid) -> Result<SlotWithExercise, StoreError> {
        let sql = format!("{SLOT_SELECT} WHERE s.id = $1");
        let record = sqlx::query_as::<_, SlotRecord>(&sql)
            .bind(slot_id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or(StoreError::NotFound("Slot"))?;
        SlotWithExercise::try_from(record)
    }
}

fn is_foreign_key_violation(error: &sqlx::Error) -> bool {
    matches!(error, sqlx::Error::Database(db_err) if db_err.is_foreign_key_violation())
}

/// Names the missing parent when a log insert loses a race with a delete.
fn progress_log_reference_error(error: sqlx::Error) -> StoreError {
    let constraint = match &error {
        sqlx::Error::Database(db_err) if db_err.is_foreign_key_violation() => db_err.constraint().map(str::to_owned),
        _ => None,
    };
    match constraint.as_deref() {
        Some("progress_logs_slot_id_fkey") => StoreError::NotFound("Slot"),
        Some("progress_logs_exercise_id_fkey") => StoreError::NotFound("Exercise"),
        Some("progress_logs_trainee_id_fkey") => StoreError::NotFound("Trainee"),
        _ => StoreError::Database(error),
    }
}

#[async_trait]
impl GymStore for PgStore {
    #[tracing::instrument(name = "Fetch profile", skip(self))]
    async fn get_profile(&self, id: Uuid) -> Result<Option<Profile>, StoreError> {
        let sql = format!("SELECT {PROFILE_COLUMNS} FROM profiles WHERE id = $1");
        let record = sqlx::query_as::<_, ProfileRecord>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        record.map(Profile::try_from).transpose()
    }

    #[tracing::instrument(name = "List trainees", skip(self))]
    async fn list_trainees(&self) -> Result<Vec<Profile>, StoreError> {
        let sql = format!("SELECT {PROFILE_COLUMNS} FROM profiles WHERE role = $1 ORDER BY name, id");
        let records = sqlx::query_as::<_, ProfileRecord>(&sql)
            .bind(Role::Trainee.as_str())
            .fetch_all(&self.pool)
            .await?;
        convert_all(records)
    }

    #[tracing::instrument(name = "List exercise catalog", skip(self))]
    async fn list_exercises(&self) -> Result<Vec<ExerciseDefinition>, StoreError> {
        let sql = format!("SELECT {EXERCISE_COLUMNS} FROM exercises ORDER BY name, id");
        let records = sqlx::query_as::<_, ExerciseRecord>(&sql)
            .fetch_all(&self.pool)
            .await?;
        Ok(records.into_iter().map(ExerciseDefinition::from).collect())
    }

    #[tracing::instrument(name = "List exercise definitions", skip(self, ids), fields(count = ids.len()))]
    async fn list_exercise_definitions(&self, ids: &[Uuid]) -> Result<Vec<ExerciseDefinition>, StoreError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let sql = format!("SELECT {EXERCISE_COLUMNS} FROM exercises WHERE id = ANY($1) ORDER BY name, id");
        let records = sqlx::query_as::<_, ExerciseRecord>(&sql)
            .bind(ids)
            .fetch_all(&self.pool)
            .await?;
        Ok(records.into_iter().map(ExerciseDefinition::from).collect())
    }

    #[tracing::instrument(name = "Create exercise", skip(self, input), fields(name = %input.name))]
    async fn create_exercise(&self, input: ExerciseInput) -> Result<ExerciseDefinition, StoreError> {
        let input = input.normalized().map_err(StoreError::Validation)?;
        let sql = format!(
            "INSERT INTO exercises (id, name, muscle_group, media_url, description) \
             VALUES ($1, $2, $3, $4, $5) RETURNING {EXERCISE_COLUMNS}"
        );
        let record = sqlx::query_as::<_, ExerciseRecord>(&sql)
            .bind(Uuid::new_v4())
            .bind(&input.name)
            .bind(&input.muscle_group)
            .bind(&input.media_url)
            .bind(&input.description)
            .fetch_one(&self.pool)
            .await?;
        Ok(record.into())
    }

    #[tracing::instrument(name = "Update exercise", skip(self, input))]
    async fn update_exercise(&self, id: Uuid, input: ExerciseInput) -> Result<ExerciseDefinition, StoreError> {
        let input = input.normalized().map_err(StoreError::Validation)?;
        let sql = format!(
            "UPDATE exercises SET name = $2, muscle_group = $3, media_url = $4, description = $5 \
             WHERE id = $1 RETURNING {EXERCISE_COLUMNS}"
        );
        let record = sqlx::query_as::<_, ExerciseRecord>(&sql)
            .bind(id)
            .bind(&input.name)
            .bind(&input.muscle_group)
            .bind(&input.media_url)
            .bind(&input.description)
            .fetch_optional(&self.pool)
            .await?
            .ok_or(StoreError::NotFound("Exercise"))?;
        Ok(record.into())
    }

    #[tracing::instrument(name = "Delete exercise", skip(self))]
    async fn delete_exercise(&self, id: Uuid) -> Result<(), StoreError> {
        let in_use: bool = sqlx::query_scalar(
            r#"
            SELECT EXISTS (SELECT 1 FROM routine_slots WHERE exercise_id = $1)
                OR EXISTS (SELECT 1 FROM progress_logs WHERE exercise_id = $1)
            "#,
        )
        .bind(id)
        .fetch_one(&self.pool)
        .await?;
        if in_use {
            return Err(StoreError::Conflict(
                "Exercise is used by a routine or has logged progress".to_string(),
            ));
        }

        let result = sqlx::query("DELETE FROM exercises WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                if is_foreign_key_violation(&e) {
                    StoreError::Conflict("Exercise is still referenced".to_string())
                } else {
                    StoreError::Database(e)
                }
            })?;
        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound("Exercise"));
        }
        Ok(())
    }

    #[tracing::instrument(name = "List routines", skip(self))]
    async fn list_routines(&self, trainee_id: Uuid) -> Result<Vec<Routine>, StoreError> {
        let sql = format!("SELECT {ROUTINE_COLUMNS} FROM routines WHERE trainee_id = $1 ORDER BY created_at, id");
        let records = sqlx::query_as::<_, RoutineRecord>(&sql)
            .bind(trainee_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(records.into_iter().map(Routine::from).collect())
    }

    #[tracing::instrument(name = "List active routines", skip(self))]
    async fn list_active_routines(&self, trainee_id: Uuid) -> Result<Vec<Routine>, StoreError> {
        let sql = format!(
            "SELECT {ROUTINE_COLUMNS} FROM routines WHERE trainee_id = $1 AND active ORDER BY created_at, id"
        );
        let records = sqlx::query_as::<_, RoutineRecord>(&sql)
            .bind(trainee_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(records.into_iter().map(Routine::from).collect())
    }

    #[tracing::instrument(name = "Fetch routine", skip(self))]
    async fn get_routine(&self, id: Uuid) -> Result<Option<Routine>, StoreError> {
        let sql = format!("SELECT {ROUTINE_COLUMNS} FROM routines WHERE id = $1");
        let record = sqlx::query_as::<_, RoutineRecord>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(record.map(Routine::from))
    }

    #[tracing::instrument(name = "Create routine", skip(self, routine), fields(trainee_id = %routine.trainee_id))]
    async fn create_routine(&self, routine: NewRoutine) -> Result<Routine, StoreError> {
        let name = routine.name.trim();
        if name.is_empty() {
            return Err(StoreError::Validation("Routine name is required".to_string()));
        }
        match self.get_profile(routine.trainee_id).await? {
            Some(profile) if profile.role == Role::Trainee => {}
            _ => return Err(StoreError::NotFound("Trainee")),
        }

        let sql = format!(
            "INSERT INTO routines (id, trainee_id, name) VALUES ($1, $2, $3) RETURNING {ROUTINE_COLUMNS}"
        );
        let record = sqlx::query_as::<_, RoutineRecord>(&sql)
            .bind(Uuid::new_v4())
            .bind(routine.trainee_id)
            .bind(name)
            .fetch_one(&self.pool)
            .await?;
        Ok(record.into())
    }

    #[tracing::instrument(name = "Delete routine", skip(self))]
    async fn delete_routine(&self, id: Uuid) -> Result<(), StoreError> {
        let result = sqlx::query("DELETE FROM routines WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound("Routine"));
        }
        Ok(())
    }

    #[tracing::instrument(name = "List routine slots", skip(self))]
    async fn list_slots(&self, routine_id: Uuid) -> Result<Vec<SlotWithExercise>, StoreError> {
        let sql = format!("{SLOT_SELECT} WHERE s.routine_id = $1 ORDER BY s.position, s.id");
        let records = sqlx::query_as::<_, SlotRecord>(&sql)
            .bind(routine_id)
            .fetch_all(&self.pool)
            .await?;
        convert_all(records)
    }

    #[tracing::instrument(
        name = "Add routine slot",
        skip(self, slot),
        fields(routine_id = %slot.routine_id, exercise_id = %slot.exercise_id)
    )]
    async fn add_slot(&self, slot: NewSlot) -> Result<SlotWithExercise, StoreError> {
        validate_targets(slot.target_sets, slot.target_reps).map_err(StoreError::Validation)?;

        let mut tx = self.pool.begin().await?;

        // Row lock keeps concurrent appends from picking the same position
        let locked: Option<Uuid> = sqlx::query_scalar("SELECT id FROM routines WHERE id = $1 FOR UPDATE")
            .bind(slot.routine_id)
            .fetch_optional(&mut *tx)
            .await?;
        if locked.is_none() {
            return Err(StoreError::NotFound("Routine"));
        }

        let exercise_exists: bool = sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM exercises WHERE id = $1)")
            .bind(slot.exercise_id)
            .fetch_one(&mut *tx)
            .await?;
        if !exercise_exists {
            return Err(StoreError::NotFound("Exercise"));
        }

        let position: i32 =
            sqlx::query_scalar("SELECT COALESCE(MAX(position) + 1, 0) FROM routine_slots WHERE routine_id = $1")
                .bind(slot.routine_id)
                .fetch_one(&mut *tx)
                .await?;

        let slot_id = Uuid::new_v4();
        sqlx::query(
            r#"
            INSERT INTO routine_slots (id, routine_id, exercise_id, target_sets, target_reps, rest_secs, position)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(slot_id)
        .bind(slot.routine_id)
        .bind(slot.exercise_id)
        .bind(to_i32(slot.target_sets, "target_sets")?)
        .bind(to_i32(slot.target_reps, "target_reps")?)
        .bind(to_i32(slot.rest_secs, "rest_secs")?)
        .bind(position)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        self.fetch_slot(slot_id).await
    }

    #[tracing::instrument(name = "Save routine slots", skip(self, updates), fields(count = updates.len()))]
    async fn update_slots(&self, routine_id: Uuid, updates: Vec<SlotUpdate>) -> Result<Vec<SlotWithExercise>, StoreError> {
        for update in &updates {
            validate_targets(update.target_sets, update.target_reps).map_err(StoreError::Validation)?;
        }

        let mut tx = self.pool.begin().await?;
        sqlx::query("SELECT id FROM routines WHERE id = $1 FOR UPDATE")
            .bind(routine_id)
            .execute(&mut *tx)
            .await?;
        for update in &updates {
            let result = sqlx::query(
                r#"
                UPDATE routine_slots
                SET target_sets = $3, target_reps = $4, rest_secs = $5, position = $6
                WHERE id = $1 AND routine_id = $2
                "#,
            )
            .bind(update.id)
            .bind(routine_id)
            .bind(to_i32(update.target_sets, "target_sets")?)
            .bind(to_i32(update.target_reps, "target_reps")?)
            .bind(to_i32(update.rest_secs, "rest_secs")?)
            .bind(to_i32(update.position, "position")?)
            .execute(&mut *tx)
            .await?;

            // Dropping the transaction rolls back the partial batch
            if result.rows_affected() == 0 {
                return Err(StoreError::NotFound("Slot"));
            }
        }

        let duplicated: bool = sqlx::query_scalar(
            r#"
            SELECT EXISTS (
                SELECT 1 FROM routine_slots WHERE routine_id = $1
                GROUP BY position HAVING COUNT(*) > 1
            )
            "#,
        )
        .bind(routine_id)
        .fetch_one(&mut *tx)
        .await?;
        if duplicated {
            return Err(StoreError::Validation(DUPLICATE_POSITIONS.to_string()));
        }
        tx.commit().await?;

        self.list_slots(routine_id).await
    }

    #[tracing::instrument(name = "Remove routine slot", skip(self))]
    async fn remove_slot(&self, id: Uuid) -> Result<(), StoreError> {
        let result = sqlx::query("DELETE FROM routine_slots WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound("Slot"));
        }
        Ok(())
    }

    #[tracing::instrument(
        name = "Insert progress log",
        skip(self, entry),
        fields(trainee_id = %entry.trainee_id, exercise_id = %entry.exercise_id, date = %entry.date)
    )]
    async fn insert_progress_log(&self, entry: NewProgressLog) -> Result<Uuid, StoreError> {
        let reps = entry.reps.map(|reps| to_i32(reps, "reps")).transpose()?;
        if let Some(slot_id) = entry.slot_id {
            let slot_exists: bool = sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM routine_slots WHERE id = $1)")
                .bind(slot_id)
                .fetch_one(&self.pool)
                .await?;
            if !slot_exists {
                return Err(StoreError::NotFound("Slot"));
            }
        }

        let id: Uuid = sqlx::query_scalar(
            r#"
            INSERT INTO progress_logs (id, trainee_id, exercise_id, slot_id, weight, reps, logged_on)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING id
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(entry.trainee_id)
        .bind(entry.exercise_id)
        .bind(entry.slot_id)
        .bind(entry.weight)
        .bind(reps)
        .bind(entry.date)
        .fetch_one(&self.pool)
        .await
        .map_err(progress_log_reference_error)?;

        tracing::info!("Progress log {} stored", id);
        Ok(id)
    }

    #[tracing::instrument(name = "List logged exercises", skip(self))]
    async fn list_logged_exercise_ids(&self, trainee_id: Uuid) -> Result<Vec<Uuid>, StoreError> {
        let ids = sqlx::query_scalar::<_, Uuid>(
            "SELECT DISTINCT exercise_id FROM progress_logs WHERE trainee_id = $1",
        )
        .bind(trainee_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(ids)
    }

    #[tracing::instrument(name = "List progress logs", skip(self))]
    async fn list_progress_logs(&self, trainee_id: Uuid, exercise_id: Uuid) -> Result<Vec<ProgressLogEntry>, StoreError> {
        let records = sqlx::query_as::<_, ProgressLogRecord>(
            r#"
            SELECT id, trainee_id, exercise_id, slot_id, weight, reps, logged_on, created_at
            FROM progress_logs
            WHERE trainee_id = $1 AND exercise_id = $2
            ORDER BY logged_on, created_at
            "#,
        )
        .bind(trainee_id)
        .bind(exercise_id)
        .fetch_all(&self.pool)
        .await?;
        convert_all(records)
    }
}
