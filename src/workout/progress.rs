use std::collections::BTreeMap;

use chrono::NaiveDate;
use uuid::Uuid;

use crate::models::progress::{DailyMax, ProgressLogEntry, ProgressSummary, RecentLogRow, Trend, TrendDirection};

pub const MISSING_VALUE: &str = "—";

/// Builds the progress view of one exercise from the trainee's log entries.
///
/// Weightless entries only show up in the recent table. The chart needs at
/// least two dated points; so does the trend.
pub fn summarize(exercise_id: Uuid, entries: &[ProgressLogEntry], recent_limit: usize) -> ProgressSummary {
    let mut ordered: Vec<&ProgressLogEntry> = entries.iter().collect();
    ordered.sort_by_key(|entry| (entry.date, entry.created_at));

    let series = daily_max_series(&ordered);
    let overall_max = ordered
        .iter()
        .filter_map(|entry| entry.weight)
        .reduce(f64::max);
    let trend = trend_of(&series);

    let recent = ordered
        .iter()
        .rev()
        .take(recent_limit)
        .map(|entry| RecentLogRow {
            id: entry.id,
            date: entry.date,
            weight: entry.weight,
            reps: entry.reps,
            weight_label: entry
                .weight
                .map(|w| w.to_string())
                .unwrap_or_else(|| MISSING_VALUE.to_string()),
            reps_label: entry
                .reps
                .map(|r| r.to_string())
                .unwrap_or_else(|| MISSING_VALUE.to_string()),
        })
        .collect();

    ProgressSummary {
        exercise_id,
        chart_visible: series.len() >= 2,
        series,
        overall_max,
        trend,
        recent,
    }
}

fn daily_max_series(entries: &[&ProgressLogEntry]) -> Vec<DailyMax> {
    let mut per_day: BTreeMap<NaiveDate, f64> = BTreeMap::new();
    for entry in entries {
        let Some(weight) = entry.weight else { continue };
        per_day
            .entry(entry.date)
            .and_modify(|max| *max = max.max(weight))
            .or_insert(weight);
    }
    per_day
        .into_iter()
        .map(|(date, weight)| DailyMax { date, weight })
        .collect()
}

fn trend_of(series: &[DailyMax]) -> Option<Trend> {
    let [.., previous, last] = series else {
        return None;
    };
    let delta = last.weight - previous.weight;
    let direction = if delta > 0.0 {
        TrendDirection::Up
    } else if delta < 0.0 {
        TrendDirection::Down
    } else {
        TrendDirection::Flat
    };
    Some(Trend { delta, direction })
}
