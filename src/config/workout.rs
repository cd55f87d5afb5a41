use serde::Deserialize;
use std::time::Duration;

fn default_rest_tick_ms() -> u64 {
    1000
}

fn default_recent_log_limit() -> usize {
    20
}

fn default_due_soon_days() -> i64 {
    7
}

fn default_session_idle_minutes() -> u64 {
    120
}

#[derive(Debug, Deserialize, Clone)]
pub struct WorkoutSettings {
    /// Interval between two rest countdown ticks. One tick removes one second.
    #[serde(default = "default_rest_tick_ms")]
    pub rest_tick_ms: u64,
    /// Rows shown in the recent-entries table of the progress view
    #[serde(default = "default_recent_log_limit")]
    pub recent_log_limit: usize,
    /// A payment due within this many days is reported as due soon
    #[serde(default = "default_due_soon_days")]
    pub due_soon_days: i64,
    /// Sessions untouched this long, with no rest running, are dropped
    #[serde(default = "default_session_idle_minutes")]
    pub session_idle_minutes: u64,
}

impl WorkoutSettings {
    pub fn rest_tick_interval(&self) -> Duration {
        Duration::from_millis(self.rest_tick_ms.max(1))
    }

    pub fn session_idle_timeout(&self) -> Duration {
        Duration::from_secs(self.session_idle_minutes.max(1).saturating_mul(60))
    }
}

impl Default for WorkoutSettings {
    fn default() -> Self {
        Self {
            rest_tick_ms: default_rest_tick_ms(),
            recent_log_limit: default_recent_log_limit(),
            due_soon_days: default_due_soon_days(),
            session_idle_minutes: default_session_idle_minutes(),
        }
    }
}
