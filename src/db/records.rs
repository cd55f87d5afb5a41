//! Raw row shapes as returned by PostgreSQL and their checked conversion
//! into domain models.

use std::convert::TryFrom;

use chrono::{DateTime, NaiveDate, Utc};
use sqlx::FromRow;
use uuid::Uuid;

use crate::db::StoreError;
use crate::models::exercise::ExerciseDefinition;
use crate::models::profile::{Profile, Role};
use crate::models::progress::ProgressLogEntry;
use crate::models::routine::{Routine, RoutineSlot, SlotWithExercise};

pub fn to_i32(value: u32, field: &str) -> Result<i32, StoreError> {
    i32::try_from(value)
        .map_err(|_| StoreError::Validation(format!("{field} value {value} is out of range")))
}

fn to_u32(value: i32, table: &'static str, field: &str) -> Result<u32, StoreError> {
    u32::try_from(value)
        .map_err(|_| StoreError::malformed(table, format!("{field} contains negative value {value}")))
}

#[derive(Debug, FromRow)]
pub struct ProfileRecord {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub role: String,
    pub paid_on: Option<NaiveDate>,
    pub due_on: Option<NaiveDate>,
    pub trainer_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

impl TryFrom<ProfileRecord> for Profile {
    type Error = StoreError;

    fn try_from(record: ProfileRecord) -> Result<Self, Self::Error> {
        let role = Role::parse(&record.role)
            .ok_or_else(|| StoreError::malformed("profiles", format!("unknown role '{}'", record.role)))?;

        Ok(Profile {
            id: record.id,
            name: record.name,
            email: record.email,
            role,
            paid_on: record.paid_on,
            due_on: record.due_on,
            trainer_id: record.trainer_id,
            created_at: record.created_at,
        })
    }
}

#[derive(Debug, FromRow)]
pub struct ExerciseRecord {
    pub id: Uuid,
    pub name: String,
    pub muscle_group: String,
    pub media_url: Option<String>,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<ExerciseRecord> for ExerciseDefinition {
    fn from(record: ExerciseRecord) -> Self {
        ExerciseDefinition {
            id: record.id,
            name: record.name,
            muscle_group: record.muscle_group,
            media_url: record.media_url,
            description: record.description,
            created_at: record.created_at,
        }
    }
}

#[derive(Debug, FromRow)]
pub struct RoutineRecord {
    pub id: Uuid,
    pub trainee_id: Uuid,
    pub name: String,
    pub active: bool,
    pub created_at: DateTime<Utc>,
}

impl From<RoutineRecord> for Routine {
    fn from(record: RoutineRecord) -> Self {
        Routine {
            id: record.id,
            trainee_id: record.trainee_id,
            name: record.name,
            active: record.active,
            created_at: record.created_at,
        }
    }
}

/// A slot row left-joined with its exercise (`exercise_*` columns are null
/// when the definition is gone).
#[derive(Debug, FromRow)]
pub struct SlotRecord {
    pub id: Uuid,
    pub routine_id: Uuid,
    pub exercise_id: Uuid,
    pub target_sets: i32,
    pub target_reps: i32,
    pub rest_secs: i32,
    pub position: i32,
    pub exercise_name: Option<String>,
    pub exercise_muscle_group: Option<String>,
    pub exercise_media_url: Option<String>,
    pub exercise_description: Option<String>,
    pub exercise_created_at: Option<DateTime<Utc>>,
}

impl TryFrom<SlotRecord> for SlotWithExercise {
    type Error = StoreError;

    fn try_from(record: SlotRecord) -> Result<Self, Self::Error> {
        let target_sets = to_u32(record.target_sets, "routine_slots", "target_sets")?;
        let target_reps = to_u32(record.target_reps, "routine_slots", "target_reps")?;
        if target_sets < 1 {
            return Err(StoreError::malformed("routine_slots", "target_sets must be at least 1"));
        }
        if target_reps < 1 {
            return Err(StoreError::malformed("routine_slots", "target_reps must be at least 1"));
        }

        let slot = RoutineSlot {
            id: record.id,
            routine_id: record.routine_id,
            exercise_id: record.exercise_id,
            target_sets,
            target_reps,
            rest_secs: to_u32(record.rest_secs, "routine_slots", "rest_secs")?,
            position: to_u32(record.position, "routine_slots", "position")?,
        };

        let exercise = match (record.exercise_name, record.exercise_muscle_group, record.exercise_created_at) {
            (Some(name), Some(muscle_group), Some(created_at)) => Some(ExerciseDefinition {
                id: record.exercise_id,
                name,
                muscle_group,
                media_url: record.exercise_media_url,
                description: record.exercise_description,
                created_at,
            }),
            _ => None,
        };

        Ok(SlotWithExercise { slot, exercise })
    }
}

#[derive(Debug, FromRow)]
pub struct ProgressLogRecord {
    pub id: Uuid,
    pub trainee_id: Uuid,
    pub exercise_id: Uuid,
    pub slot_id: Option<Uuid>,
    pub weight: Option<f64>,
    pub reps: Option<i32>,
    pub logged_on: NaiveDate,
    pub created_at: DateTime<Utc>,
}

impl TryFrom<ProgressLogRecord> for ProgressLogEntry {
    type Error = StoreError;

    fn try_from(record: ProgressLogRecord) -> Result<Self, Self::Error> {
        if let Some(weight) = record.weight {
            if !weight.is_finite() {
                return Err(StoreError::malformed("progress_logs", "weight is not a finite number"));
            }
        }
        let reps = record
            .reps
            .map(|reps| to_u32(reps, "progress_logs", "reps"))
            .transpose()?;

        Ok(ProgressLogEntry {
            id: record.id,
            trainee_id: record.trainee_id,
            exercise_id: record.exercise_id,
            slot_id: record.slot_id,
            weight: record.weight,
            reps,
            date: record.logged_on,
            created_at: record.created_at,
        })
    }
}

/// Converts every record, failing on the first malformed one.
pub fn convert_all<R, T>(records: Vec<R>) -> Result<Vec<T>, StoreError>
where
    T: TryFrom<R, Error = StoreError>,
{
    records.into_iter().map(T::try_from).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn slot_record(target_sets: i32, rest_secs: i32) -> SlotRecord {
        SlotRecord {
            id: Uuid::new_v4(),
            routine_id: Uuid::new_v4(),
            exercise_id: Uuid::new_v4(),
            target_sets,
            target_reps: 10,
            rest_secs,
            position: 0,
            exercise_name: Some("Squat".into()),
            exercise_muscle_group: Some("Legs".into()),
            exercise_media_url: None,
            exercise_description: None,
            exercise_created_at: Some(Utc::now()),
        }
    }

    #[test]
    fn slot_with_zero_sets_is_malformed() {
        let result = SlotWithExercise::try_from(slot_record(0, 60));
        assert!(matches!(result, Err(StoreError::MalformedRecord { table: "routine_slots", .. })));
    }

    #[test]
    fn slot_with_negative_rest_is_malformed() {
        let result = SlotWithExercise::try_from(slot_record(3, -5));
        assert!(matches!(result, Err(StoreError::MalformedRecord { .. })));
    }

    #[test]
    fn slot_joins_exercise_when_columns_present() {
        let slot = SlotWithExercise::try_from(slot_record(3, 60)).unwrap();
        assert_eq!(slot.slot.target_sets, 3);
        assert_eq!(slot.exercise.map(|e| e.name), Some("Squat".to_string()));
    }

    #[test]
    fn unknown_role_is_malformed() {
        let record = ProfileRecord {
            id: Uuid::new_v4(),
            name: "Ana".into(),
            email: "ana@example.com".into(),
            role: "coach".into(),
            paid_on: None,
            due_on: None,
            trainer_id: None,
            created_at: Utc::now(),
        };
        assert!(matches!(Profile::try_from(record), Err(StoreError::MalformedRecord { table: "profiles", .. })));
    }

    #[test]
    fn negative_reps_in_log_is_malformed() {
        let record = ProgressLogRecord {
            id: Uuid::new_v4(),
            trainee_id: Uuid::new_v4(),
            exercise_id: Uuid::new_v4(),
            slot_id: None,
            weight: Some(40.0),
            reps: Some(-1),
            logged_on: NaiveDate::from_ymd_opt(2025, 3, 1).unwrap(),
            created_at: Utc::now(),
        };
        assert!(ProgressLogEntry::try_from(record).is_err());
    }
}
