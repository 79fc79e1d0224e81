use super::activity::fetch_public_events;
use super::ScanOptions;
use crate::error::{Result, ScouterError};
use crate::github::GitHubApi;
use crate::models::{ContributionDetails, ContributionSource};
use crate::types::{CalendarResponse, ContributionCalendar, GitHubEvent};
use chrono::{DateTime, Datelike, Duration, NaiveDate, Utc};
use serde_json::json;
use std::collections::BTreeSet;
use tracing::{info, warn};

const CALENDAR_QUERY: &str = r#"
query($username: String!) {
  user(login: $username) {
    contributionsCollection {
      contributionCalendar {
        totalContributions
        weeks {
          contributionDays {
            contributionCount
            date
            weekday
          }
        }
      }
    }
  }
}
"#;

const DAY_NAMES: [&str; 7] = [
    "Sunday",
    "Monday",
    "Tuesday",
    "Wednesday",
    "Thursday",
    "Friday",
    "Saturday",
];

/// Longest days walked back from today when estimating from events.
const EVENT_STREAK_WINDOW: usize = 30;

/// Contribution figures for `handle`.
///
/// Authenticated clients read the GraphQL contribution calendar; anonymous
/// clients never issue that query. When the calendar is unavailable the
/// figures are estimated from the public event stream. If that fails too
/// the error is returned and the caller substitutes
/// [`ContributionDetails::placeholder`].
pub async fn collect_contributions<A: GitHubApi>(
    api: &A,
    handle: &str,
    options: &ScanOptions,
    now: DateTime<Utc>,
) -> Result<ContributionDetails> {
    let today = now.date_naive();

    if api.is_authenticated() {
        match fetch_calendar(api, handle).await {
            Ok(calendar) => {
                let details = summarize_calendar(&calendar, today);
                info!(
                    handle,
                    total = details.total_contributions,
                    longest = details.longest_streak,
                    "contribution calendar read"
                );
                return Ok(details);
            }
            Err(e) => warn!(handle, error = %e, "contribution calendar unavailable, estimating from events"),
        }
    }

    let events = fetch_public_events(api, handle, options).await?;
    let details = summarize_event_days(&events, today);
    info!(handle, active_days = details.total_contributions, "contributions estimated from events");
    Ok(details)
}

pub async fn fetch_calendar<A: GitHubApi>(api: &A, handle: &str) -> Result<ContributionCalendar> {
    let body = api
        .graphql(CALENDAR_QUERY, json!({ "username": handle }))
        .await?;
    let response: CalendarResponse = serde_json::from_value(body)?;

    response
        .data
        .and_then(|data| data.user)
        .map(|user| user.contributions_collection.contribution_calendar)
        .ok_or_else(|| ScouterError::GraphQl(format!("no contribution calendar for {}", handle)))
}

fn most_active_day(day_totals: &[u64; 7]) -> String {
    let max = day_totals.iter().copied().max().unwrap_or(0);
    if max == 0 {
        return "Unknown".to_string();
    }
    let index = day_totals.iter().position(|&total| total == max).unwrap_or(0);
    DAY_NAMES[index].to_string()
}

/// Streaks and weekday profile of a calendar, scanned in chronological
/// order. The current streak only counts if the latest active day is today
/// or yesterday.
pub fn summarize_calendar(calendar: &ContributionCalendar, today: NaiveDate) -> ContributionDetails {
    let mut day_totals = [0u64; 7];
    let mut longest = 0u32;
    let mut running = 0u32;
    let mut last_active: Option<NaiveDate> = None;

    for day in calendar.weeks.iter().flat_map(|w| w.contribution_days.iter()) {
        let weekday = day.date.weekday().num_days_from_sunday() as usize;
        day_totals[weekday] += u64::from(day.contribution_count);

        if day.contribution_count > 0 {
            running += 1;
            last_active = Some(day.date);
        } else {
            longest = longest.max(running);
            running = 0;
        }
    }
    longest = longest.max(running);

    let current = match last_active {
        Some(last) if (today - last).num_days() <= 1 => running,
        _ => 0,
    };

    ContributionDetails {
        total_contributions: calendar.total_contributions,
        weeks: calendar.weeks.clone(),
        most_active_day: most_active_day(&day_totals),
        longest_streak: longest,
        current_streak: current,
        source: ContributionSource::Calendar,
    }
}

/// Rough figures from the event stream: distinct active dates, and a streak
/// walked backward from today.
pub fn summarize_event_days(events: &[GitHubEvent], today: NaiveDate) -> ContributionDetails {
    let mut active_days = BTreeSet::new();
    let mut day_totals = [0u64; 7];

    for event in events {
        let date = event.created_at.date_naive();
        active_days.insert(date);
        day_totals[date.weekday().num_days_from_sunday() as usize] += 1;
    }

    let mut streak = 0u32;
    for offset in 0..active_days.len().min(EVENT_STREAK_WINDOW) {
        let day = today - Duration::days(offset as i64);
        if active_days.contains(&day) {
            streak += 1;
        } else {
            break;
        }
    }

    ContributionDetails {
        total_contributions: active_days.len() as u32,
        weeks: Vec::new(),
        most_active_day: most_active_day(&day_totals),
        longest_streak: streak,
        current_streak: streak,
        source: ContributionSource::Events,
    }
}
