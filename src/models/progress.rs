use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One completed set. Never updated or deleted once written.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProgressLogEntry {
    pub id: Uuid,
    pub trainee_id: Uuid,
    pub exercise_id: Uuid,
    pub slot_id: Option<Uuid>,
    pub weight: Option<f64>,
    pub reps: Option<u32>,
    pub date: NaiveDate,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct NewProgressLog {
    pub trainee_id: Uuid,
    pub exercise_id: Uuid,
    pub slot_id: Option<Uuid>,
    pub weight: Option<f64>,
    pub reps: Option<u32>,
    pub date: NaiveDate,
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq)]
pub struct DailyMax {
    pub date: NaiveDate,
    pub weight: f64,
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TrendDirection {
    Up,
    Down,
    Flat,
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq)]
pub struct Trend {
    pub delta: f64,
    pub direction: TrendDirection,
}

/// Row of the recent-entries table; labels carry the placeholder for absent values.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct RecentLogRow {
    pub id: Uuid,
    pub date: NaiveDate,
    pub weight: Option<f64>,
    pub reps: Option<u32>,
    pub weight_label: String,
    pub reps_label: String,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ProgressSummary {
    pub exercise_id: Uuid,
    pub series: Vec<DailyMax>,
    pub overall_max: Option<f64>,
    pub trend: Option<Trend>,
    pub chart_visible: bool,
    pub recent: Vec<RecentLogRow>,
}
