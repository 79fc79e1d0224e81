#![allow(dead_code)]

use chrono::{DateTime, TimeZone, Utc};
use power_scouter::error::{Result, ScouterError};
use power_scouter::github::GitHubApi;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::Mutex;

pub const GRAPHQL_CALL: &str = "POST /graphql";

enum Canned {
    Json(Value),
    Raw(String),
    Status(u16),
}

fn status_error(path: &str, status: u16) -> ScouterError {
    match status {
        404 => ScouterError::NotFound(path.to_string()),
        403 => ScouterError::Forbidden(path.to_string()),
        429 => ScouterError::RateLimitExceeded(path.to_string()),
        other => ScouterError::ApiError(format!("{} returned {}", path, other)),
    }
}

/// In-memory stand-in for the GitHub API. Unknown paths answer 404.
pub struct FakeApi {
    authenticated: bool,
    responses: HashMap<String, Canned>,
    graphql: Option<Canned>,
    calls: Mutex<Vec<String>>,
}

impl FakeApi {
    pub fn anonymous() -> Self {
        Self {
            authenticated: false,
            responses: HashMap::new(),
            graphql: None,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn authenticated() -> Self {
        Self {
            authenticated: true,
            ..Self::anonymous()
        }
    }

    pub fn json(mut self, path: &str, body: Value) -> Self {
        self.responses.insert(path.to_string(), Canned::Json(body));
        self
    }

    pub fn raw(mut self, path: &str, body: &str) -> Self {
        self.responses.insert(path.to_string(), Canned::Raw(body.to_string()));
        self
    }

    pub fn status(mut self, path: &str, status: u16) -> Self {
        self.responses.insert(path.to_string(), Canned::Status(status));
        self
    }

    pub fn graphql_body(mut self, body: Value) -> Self {
        self.graphql = Some(Canned::Json(body));
        self
    }

    pub fn graphql_status(mut self, status: u16) -> Self {
        self.graphql = Some(Canned::Status(status));
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn calls_matching(&self, needle: &str) -> usize {
        self.calls().iter().filter(|c| c.contains(needle)).count()
    }

    fn record(&self, call: String) {
        self.calls.lock().unwrap().push(call);
    }
}

impl GitHubApi for FakeApi {
    fn is_authenticated(&self) -> bool {
        self.authenticated
    }

    async fn get_json(&self, path: &str) -> Result<Value> {
        self.record(path.to_string());
        match self.responses.get(path) {
            Some(Canned::Json(body)) => Ok(body.clone()),
            Some(Canned::Raw(body)) => Ok(serde_json::from_str(body)?),
            Some(Canned::Status(status)) => Err(status_error(path, *status)),
            None => Err(ScouterError::NotFound(path.to_string())),
        }
    }

    async fn get_raw(&self, path: &str) -> Result<String> {
        self.record(path.to_string());
        match self.responses.get(path) {
            Some(Canned::Raw(body)) => Ok(body.clone()),
            Some(Canned::Json(body)) => Ok(body.to_string()),
            Some(Canned::Status(status)) => Err(status_error(path, *status)),
            None => Err(ScouterError::NotFound(path.to_string())),
        }
    }

    async fn graphql(&self, _query: &str, _variables: Value) -> Result<Value> {
        self.record(GRAPHQL_CALL.to_string());
        if !self.authenticated {
            return Err(ScouterError::InvalidToken("no token".to_string()));
        }
        match &self.graphql {
            Some(Canned::Json(body)) => {
                if let Some(message) = power_scouter::github::graphql_errors(body) {
                    return Err(ScouterError::GraphQl(message));
                }
                Ok(body.clone())
            }
            Some(Canned::Raw(body)) => Ok(serde_json::from_str(body)?),
            Some(Canned::Status(status)) => Err(status_error("/graphql", *status)),
            None => Err(ScouterError::GraphQl("no canned calendar".to_string())),
        }
    }
}

/// Fixed scan clock.
pub fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap()
}

pub fn profile_path(handle: &str) -> String {
    format!("/users/{}", handle)
}

pub fn repos_path(handle: &str, page: u32) -> String {
    format!("/users/{}/repos?per_page=100&page={}&sort=updated", handle, page)
}

pub fn events_path(handle: &str) -> String {
    format!("/users/{}/events/public?per_page=100", handle)
}

pub fn starred_path(handle: &str) -> String {
    format!("/users/{}/starred?per_page=100", handle)
}

pub fn user_json(login: &str, public_repos: u32, followers: u32) -> Value {
    json!({
        "login": login,
        "id": 1,
        "avatar_url": "",
        "html_url": format!("https://github.com/{}", login),
        "name": null,
        "company": null,
        "blog": "",
        "location": null,
        "email": null,
        "hireable": null,
        "bio": null,
        "twitter_username": null,
        "public_repos": public_repos,
        "public_gists": 0,
        "followers": followers,
        "following": 0,
        "created_at": "2015-03-01T00:00:00Z",
        "updated_at": "2024-05-01T00:00:00Z"
    })
}

pub fn repo_json(owner: &str, name: &str, stars: u32, language: Option<&str>) -> Value {
    json!({
        "name": name,
        "full_name": format!("{}/{}", owner, name),
        "owner": { "login": owner },
        "html_url": format!("https://github.com/{}/{}", owner, name),
        "description": null,
        "fork": false,
        "stargazers_count": stars,
        "watchers_count": stars,
        "forks_count": 0,
        "language": language,
        "created_at": "2020-01-01T00:00:00Z",
        "updated_at": "2024-05-20T00:00:00Z"
    })
}

/// `count` repositories named `repo-000`, `repo-001`, ...
pub fn repo_page(owner: &str, start: usize, count: usize) -> Value {
    Value::Array(
        (start..start + count)
            .map(|i| repo_json(owner, &format!("repo-{:03}", i), 1, Some("Rust")))
            .collect(),
    )
}

pub fn push_event(created_at: &str, commits: usize) -> Value {
    let commits: Vec<Value> = (0..commits).map(|i| json!({ "sha": format!("{:040}", i) })).collect();
    json!({ "type": "PushEvent", "payload": { "commits": commits }, "created_at": created_at })
}

pub fn event(kind: &str, created_at: &str) -> Value {
    json!({ "type": kind, "payload": {}, "created_at": created_at })
}

pub fn calendar_json(days: &[(&str, u32)]) -> Value {
    let days: Vec<Value> = days
        .iter()
        .map(|(date, count)| json!({ "contributionCount": count, "date": date, "weekday": 0 }))
        .collect();
    let total: u32 = days
        .iter()
        .map(|d| d["contributionCount"].as_u64().unwrap_or(0) as u32)
        .sum();
    json!({
        "data": {
            "user": {
                "contributionsCollection": {
                    "contributionCalendar": {
                        "totalContributions": total,
                        "weeks": [{ "contributionDays": days }]
                    }
                }
            }
        }
    })
}

/// An account with two repositories and a little recent activity.
pub fn small_account(api: FakeApi, handle: &str) -> FakeApi {
    api.json(&profile_path(handle), user_json(handle, 2, 10))
        .json(
            &repos_path(handle, 1),
            json!([
                repo_json(handle, "alpha", 5, Some("Rust")),
                repo_json(handle, "beta", 50, Some("TypeScript")),
            ]),
        )
        .json(&format!("/repos/{}/alpha/languages", handle), json!({ "Rust": 3000, "Shell": 100 }))
        .json(&format!("/repos/{}/beta/languages", handle), json!({ "TypeScript": 1000 }))
        .json(
            &events_path(handle),
            json!([
                push_event("2024-06-01T08:00:00Z", 3),
                event("PullRequestEvent", "2024-05-31T08:00:00Z"),
                event("IssuesEvent", "2024-05-20T08:00:00Z"),
                push_event("2024-03-01T08:00:00Z", 9),
            ]),
        )
        .json(&starred_path(handle), json!([{ "full_name": "rust-lang/rust", "language": "Rust" }]))
        .json(&format!("/users/{}/orgs", handle), json!([]))
        .json(&format!("/repos/{}/beta/topics", handle), json!({ "names": ["react", "web"] }))
        .json(
            &format!("/repos/{}/beta/contents", handle),
            json!([{ "name": "package.json", "type": "file" }, { "name": "Dockerfile", "type": "file" }]),
        )
        .raw(
            &format!("/repos/{}/beta/contents/package.json", handle),
            r#"{"dependencies":{"react":"^18.2.0","express":"4"},"devDependencies":{"jest":"29"}}"#,
        )
        .raw(&format!("/repos/{}/{}/readme", handle, handle), "# About me\nI work on projects.")
}
