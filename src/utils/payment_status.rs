use chrono::NaiveDate;

use crate::models::profile::{PaymentStatus, Profile, RosterEntry, RosterStats};

/// Payment status from the due date by whole calendar days.
pub fn payment_status(due_on: Option<NaiveDate>, today: NaiveDate, due_soon_days: i64) -> PaymentStatus {
    let Some(due_on) = due_on else {
        return PaymentStatus::NoData;
    };
    let days_left = (due_on - today).num_days();
    if days_left < 0 {
        PaymentStatus::Overdue {
            days_overdue: -days_left,
        }
    } else if days_left <= due_soon_days {
        PaymentStatus::DueSoon { days_left }
    } else {
        PaymentStatus::Current { days_left }
    }
}

/// Case-insensitive substring match on name or email; blank search keeps everyone.
pub fn matches_search(profile: &Profile, search: Option<&str>) -> bool {
    let needle = match search.map(str::trim) {
        Some(needle) if !needle.is_empty() => needle.to_lowercase(),
        _ => return true,
    };
    profile.name.to_lowercase().contains(&needle) || profile.email.to_lowercase().contains(&needle)
}

/// Counts over the whole roster. Trainees without a due date count as neither active nor expired.
pub fn roster_stats(trainees: &[Profile], today: NaiveDate) -> RosterStats {
    trainees.iter().fold(
        RosterStats {
            total: trainees.len(),
            ..RosterStats::default()
        },
        |mut stats, trainee| {
            match trainee.due_on {
                Some(due_on) if due_on >= today => stats.active += 1,
                Some(_) => stats.expired += 1,
                None => {}
            }
            stats
        },
    )
}

pub fn roster_entry(trainee: &Profile, today: NaiveDate, due_soon_days: i64) -> RosterEntry {
    RosterEntry {
        id: trainee.id,
        name: trainee.name.clone(),
        email: trainee.email.clone(),
        due_on: trainee.due_on,
        payment_status: payment_status(trainee.due_on, today, due_soon_days),
    }
}
