use std::collections::HashSet;

use chrono::{DateTime, Datelike, Duration, NaiveDate, TimeZone, Utc};

use crate::models::{CheckIn, CheckInAverages};

/// Check-ins older than this are ignored for averages and streaks.
pub const STATS_WINDOW_DAYS: i64 = 30;

pub fn averages(checkins: &[CheckIn]) -> CheckInAverages {
    if checkins.is_empty() {
        return CheckInAverages::default();
    }

    let count = checkins.len() as f64;
    let (mood, energy, focus) = checkins.iter().fold((0i64, 0i64, 0i64), |acc, c| {
        (
            acc.0 + c.mood as i64,
            acc.1 + c.energy as i64,
            acc.2 + c.focus as i64,
        )
    });

    CheckInAverages {
        mood: mood as f64 / count,
        energy: energy as f64 / count,
        focus: focus as f64 / count,
    }
}

/// Consecutive calendar days (UTC) with at least one check-in, counted
/// backward from `today`. A day without a check-in ends the streak, so
/// no check-in today means a streak of zero.
pub fn checkin_streak(checkins: &[CheckIn], today: NaiveDate) -> u32 {
    let days: HashSet<NaiveDate> = checkins
        .iter()
        .map(|checkin| checkin.created_at.date_naive())
        .collect();

    let mut streak = 0;
    let mut day = today;
    while days.contains(&day) {
        streak += 1;
        match day.pred_opt() {
            Some(previous) => day = previous,
            None => break,
        }
    }
    streak
}

pub fn window_start(now: DateTime<Utc>) -> DateTime<Utc> {
    now - Duration::days(STATS_WINDOW_DAYS)
}

pub fn month_start(now: DateTime<Utc>) -> DateTime<Utc> {
    let first = now.date_naive().with_day(1).unwrap_or(now.date_naive());
    Utc.from_utc_datetime(&first.and_time(chrono::NaiveTime::MIN))
}

pub fn growth_message(total_actions: i64) -> &'static str {
    match total_actions {
        i64::MIN..=0 => "Your growth journey starts here",
        1..=9 => "Building momentum - you're creating positive habits",
        10..=29 => "Great progress! Consistency is key to growth",
        _ => "Amazing dedication! You're truly investing in yourself",
    }
}

pub fn last_checkin_message(last: Option<DateTime<Utc>>, now: DateTime<Utc>) -> String {
    let Some(last) = last else {
        return "Welcome! Ready for your first check-in?".to_string();
    };

    let elapsed = now - last;
    let minutes = elapsed.num_minutes();
    let hours = elapsed.num_hours();

    if minutes < 1 {
        "You just checked in".to_string()
    } else if minutes < 60 {
        format!("Last check-in: {minutes}m ago")
    } else if hours < 24 {
        format!("Last check-in: {hours}h ago")
    } else if hours / 24 == 1 {
        "Last check-in: yesterday".to_string()
    } else {
        format!("Last check-in: {} days ago", hours / 24)
    }
}
