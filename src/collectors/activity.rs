use super::ScanOptions;
use crate::error::Result;
use crate::github::GitHubApi;
use crate::models::ActivityData;
use crate::types::GitHubEvent;
use chrono::{DateTime, Duration, Utc};
use tracing::info;

/// Most recent public events, newest first.
pub async fn fetch_public_events<A: GitHubApi>(
    api: &A,
    handle: &str,
    options: &ScanOptions,
) -> Result<Vec<GitHubEvent>> {
    let path = format!(
        "/users/{}/events/public?per_page={}",
        handle, options.events_page_size
    );
    api.get(&path).await
}

pub async fn collect_activity<A: GitHubApi>(
    api: &A,
    handle: &str,
    options: &ScanOptions,
    now: DateTime<Utc>,
) -> Result<ActivityData> {
    let events = fetch_public_events(api, handle, options).await?;
    let activity = summarize_activity(&events, now, options.activity_window_days);
    info!(
        handle,
        events = events.len(),
        recent = activity.recent_contributions,
        "activity sampled"
    );
    Ok(activity)
}

/// Classifies the events newer than `window_days` before `now`.
pub fn summarize_activity(
    events: &[GitHubEvent],
    now: DateTime<Utc>,
    window_days: i64,
) -> ActivityData {
    let cutoff = now - Duration::days(window_days);
    let mut activity = ActivityData::default();

    for event in events.iter().filter(|e| e.created_at > cutoff) {
        activity.recent_contributions += 1;
        match event.kind.as_str() {
            "PushEvent" => {
                let commits = event
                    .payload
                    .commits
                    .as_ref()
                    .map(|c| c.len() as u32)
                    .or(event.payload.size)
                    .unwrap_or(0);
                activity.commits += commits;
            }
            "PullRequestEvent" => activity.pull_requests += 1,
            "IssuesEvent" => activity.issues += 1,
            _ => {}
        }
    }

    activity
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{EventPayload, PushCommit};

    fn event(kind: &str, days_ago: i64, commits: Option<usize>, now: DateTime<Utc>) -> GitHubEvent {
        GitHubEvent {
            kind: kind.to_string(),
            payload: EventPayload {
                commits: commits.map(|n| vec![PushCommit::default(); n]),
                size: None,
            },
            created_at: now - Duration::days(days_ago),
        }
    }

    #[test]
    fn test_only_window_events_counted() {
        let now = Utc::now();
        let events = vec![
            event("PushEvent", 1, Some(3), now),
            event("PullRequestEvent", 2, None, now),
            event("IssuesEvent", 5, None, now),
            event("WatchEvent", 6, None, now),
            event("PushEvent", 45, Some(10), now),
        ];

        let activity = summarize_activity(&events, now, 30);
        assert_eq!(activity.commits, 3);
        assert_eq!(activity.pull_requests, 1);
        assert_eq!(activity.issues, 1);
        assert_eq!(activity.recent_contributions, 4);
    }

    #[test]
    fn test_push_size_used_when_commit_list_missing() {
        let now = Utc::now();
        let mut push = event("PushEvent", 0, None, now);
        push.payload.size = Some(7);
        assert_eq!(summarize_activity(&[push], now, 30).commits, 7);
    }
}
