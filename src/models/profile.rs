use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Role stored on the profile record. Trainers author catalogs and routines,
/// trainees execute them.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Trainer,
    Trainee,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Trainer => "trainer",
            Role::Trainee => "trainee",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "trainer" => Some(Role::Trainer),
            "trainee" => Some(Role::Trainee),
            _ => None,
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Profile {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub role: Role,
    pub paid_on: Option<NaiveDate>,
    pub due_on: Option<NaiveDate>,
    pub trainer_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

/// Membership payment state derived from the due date.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum PaymentStatus {
    NoData,
    Overdue { days_overdue: i64 },
    DueSoon { days_left: i64 },
    Current { days_left: i64 },
}

#[derive(Debug, Serialize)]
pub struct ProfileResponse {
    #[serde(flatten)]
    pub profile: Profile,
    pub payment_status: PaymentStatus,
}

#[derive(Debug, Serialize)]
pub struct RosterEntry {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub due_on: Option<NaiveDate>,
    pub payment_status: PaymentStatus,
}

#[derive(Debug, Serialize, Default, PartialEq, Eq)]
pub struct RosterStats {
    pub total: usize,
    pub active: usize,
    pub expired: usize,
}

#[derive(Debug, Serialize)]
pub struct RosterResponse {
    pub stats: RosterStats,
    pub trainees: Vec<RosterEntry>,
}

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    pub search: Option<String>,
}
