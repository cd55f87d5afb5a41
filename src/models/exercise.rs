use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Suggested muscle groups offered by the catalog form. Not enforced.
pub const MUSCLE_GROUPS: [&str; 10] = [
    "Chest",
    "Back",
    "Shoulders",
    "Biceps",
    "Triceps",
    "Legs",
    "Glutes",
    "Core",
    "Cardio",
    "Full Body",
];

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ExerciseDefinition {
    pub id: Uuid,
    pub name: String,
    pub muscle_group: String,
    pub media_url: Option<String>,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl ExerciseDefinition {
    /// Case-insensitive substring match over name and muscle group.
    pub fn matches(&self, needle: &str) -> bool {
        let needle = needle.trim().to_lowercase();
        needle.is_empty()
            || self.name.to_lowercase().contains(&needle)
            || self.muscle_group.to_lowercase().contains(&needle)
    }
}

/// Create/update payload for a catalog entry
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ExerciseInput {
    pub name: String,
    pub muscle_group: String,
    #[serde(default)]
    pub media_url: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

impl ExerciseInput {
    /// Trims every field and turns blank optionals into `None`.
    /// Name and muscle group are required.
    pub fn normalized(self) -> Result<Self, String> {
        let name = self.name.trim().to_string();
        let muscle_group = self.muscle_group.trim().to_string();
        if name.is_empty() || muscle_group.is_empty() {
            return Err("Name and muscle group are required".to_string());
        }

        Ok(Self {
            name,
            muscle_group,
            media_url: blank_to_none(self.media_url),
            description: blank_to_none(self.description),
        })
    }
}

fn blank_to_none(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
