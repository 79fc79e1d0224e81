use crate::auth::Credential;
use crate::error::{Result, ScouterError};
use crate::models::RateLimitState;
use crate::types::RateLimitResponse;
use chrono::{DateTime, Utc};
use reqwest::header::HeaderMap;
use reqwest::{Client, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use std::sync::Mutex;
use std::time::Duration;
use tracing::{debug, warn};
use url::Url;

pub const DEFAULT_API_URL: &str = "https://api.github.com";
const USER_AGENT: &str = concat!("power-scouter/", env!("CARGO_PKG_VERSION"));
const JSON_MEDIA_TYPE: &str = "application/vnd.github+json";
const RAW_MEDIA_TYPE: &str = "application/vnd.github.raw+json";

/// Network boundary to the source-hosting platform.
///
/// Collectors only ever talk to this trait, so tests can hand them an
/// in-memory implementation. Paths are relative to the API root and start
/// with `/`.
#[allow(async_fn_in_trait)]
pub trait GitHubApi {
    /// Whether requests carry a personal access token.
    fn is_authenticated(&self) -> bool;

    async fn get_json(&self, path: &str) -> Result<Value>;

    /// File contents served with the raw media type.
    async fn get_raw(&self, path: &str) -> Result<String>;

    /// Runs one GraphQL query. A response carrying `errors` is a failure.
    async fn graphql(&self, query: &str, variables: Value) -> Result<Value>;

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let value = self.get_json(path).await?;
        Ok(serde_json::from_value(value)?)
    }
}

pub struct GitHubClient {
    client: Client,
    base_url: String,
    credential: Option<Credential>,
    last_rate_limit: Mutex<Option<RateLimitState>>,
}

impl GitHubClient {
    pub fn new(credential: Option<Credential>) -> Result<Self> {
        Self::with_base_url(DEFAULT_API_URL, credential)
    }

    pub fn with_base_url(base_url: &str, credential: Option<Credential>) -> Result<Self> {
        let parsed = Url::parse(base_url)
            .map_err(|e| ScouterError::InvalidInput(format!("API URL '{}': {}", base_url, e)))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(ScouterError::InvalidInput(format!(
                "API URL must be http(s), got '{}'",
                parsed.scheme()
            )));
        }

        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(30))
            .build()?;

        Ok(GitHubClient {
            client,
            base_url: parsed.as_str().trim_end_matches('/').to_string(),
            credential,
            last_rate_limit: Mutex::new(None),
        })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn make_request(&self, path: &str, accept: &str) -> Result<Response> {
        let url = self.endpoint(path);
        debug!(%url, "GET");

        let mut request = self.client.get(&url).header("Accept", accept);
        if let Some(credential) = &self.credential {
            request = request.header("Authorization", credential.rest_header());
        }

        let response = request.send().await?;
        self.check_status(response, &url).await
    }

    async fn check_status(&self, response: Response, url: &str) -> Result<Response> {
        let rate_limit = rate_limit_from_headers(response.headers());
        let remaining = rate_limit.as_ref().map(|r| r.remaining);
        if let Some(state) = rate_limit {
            if let Ok(mut last) = self.last_rate_limit.lock() {
                *last = Some(state);
            }
        }

        match response.status() {
            status if status.is_success() => Ok(response),
            StatusCode::NOT_FOUND => Err(ScouterError::NotFound(url.to_string())),
            StatusCode::FORBIDDEN if remaining == Some(0) => {
                warn!(%url, "rate limit exhausted");
                Err(ScouterError::RateLimitExceeded(format!(
                    "API rate limit exceeded while requesting {}",
                    url
                )))
            }
            StatusCode::FORBIDDEN => {
                let error_text = response.text().await.unwrap_or_default();
                Err(ScouterError::Forbidden(format!("{}: {}", url, error_text)))
            }
            status => {
                let error_text = response.text().await.unwrap_or_default();
                Err(ScouterError::ApiError(format!(
                    "request to {} failed with status {}: {}",
                    url, status, error_text
                )))
            }
        }
    }

    /// Rate limit figures from the most recent response, if any.
    pub fn last_rate_limit(&self) -> Option<RateLimitState> {
        self.last_rate_limit.lock().ok().and_then(|last| last.clone())
    }

    /// Queries the rate limit endpoint directly. Does not count against
    /// the quota.
    pub async fn rate_limit(&self) -> Result<RateLimitState> {
        let response: RateLimitResponse = self.get("/rate_limit").await?;
        let window = response.rate;
        Ok(RateLimitState {
            remaining: window.remaining,
            limit: window.limit,
            used: window.used,
            reset_time: DateTime::from_timestamp(window.reset, 0).unwrap_or_else(Utc::now),
            is_limited: window.remaining == 0,
        })
    }
}

impl GitHubApi for GitHubClient {
    fn is_authenticated(&self) -> bool {
        self.credential.is_some()
    }

    async fn get_json(&self, path: &str) -> Result<Value> {
        let response = self.make_request(path, JSON_MEDIA_TYPE).await?;
        Ok(response.json().await?)
    }

    async fn get_raw(&self, path: &str) -> Result<String> {
        let response = self.make_request(path, RAW_MEDIA_TYPE).await?;
        Ok(response.text().await?)
    }

    async fn graphql(&self, query: &str, variables: Value) -> Result<Value> {
        let credential = self.credential.as_ref().ok_or_else(|| {
            ScouterError::InvalidToken("the GraphQL endpoint requires a token".to_string())
        })?;
        let url = self.endpoint("/graphql");
        debug!(%url, "POST");

        let response = self
            .client
            .post(&url)
            .header("Authorization", credential.graphql_header())
            .json(&json!({ "query": query, "variables": variables }))
            .send()
            .await?;
        let response = self.check_status(response, &url).await?;
        let body: Value = response.json().await?;

        if let Some(message) = graphql_errors(&body) {
            return Err(ScouterError::GraphQl(message));
        }
        Ok(body)
    }
}

/// Joined `errors[].message` of a GraphQL response, if the array is non-empty.
pub fn graphql_errors(body: &Value) -> Option<String> {
    let errors = body.get("errors")?.as_array()?;
    if errors.is_empty() {
        return None;
    }
    let messages: Vec<&str> = errors
        .iter()
        .map(|e| e.get("message").and_then(Value::as_str).unwrap_or("unknown error"))
        .collect();
    Some(messages.join("; "))
}

/// Rate limit state carried on every REST response.
pub fn rate_limit_from_headers(headers: &HeaderMap) -> Option<RateLimitState> {
    let header = |name: &str| headers.get(name).and_then(|h| h.to_str().ok());

    let remaining = header("X-RateLimit-Remaining")?.parse::<u32>().ok()?;
    let limit = header("X-RateLimit-Limit")
        .and_then(|s| s.parse::<u32>().ok())
        .unwrap_or(60);
    let used = header("X-RateLimit-Used")
        .and_then(|s| s.parse::<u32>().ok())
        .unwrap_or_else(|| limit.saturating_sub(remaining));
    let reset_time = header("X-RateLimit-Reset")
        .and_then(|s| s.parse::<i64>().ok())
        .and_then(|timestamp| DateTime::from_timestamp(timestamp, 0))
        .unwrap_or_else(|| Utc::now() + chrono::Duration::hours(1));

    Some(RateLimitState {
        remaining,
        limit,
        used,
        reset_time,
        is_limited: remaining == 0,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::header::HeaderValue;

    #[test]
    fn test_rate_limit_headers_parsed() {
        let mut headers = HeaderMap::new();
        headers.insert("X-RateLimit-Remaining", HeaderValue::from_static("0"));
        headers.insert("X-RateLimit-Limit", HeaderValue::from_static("5000"));
        headers.insert("X-RateLimit-Reset", HeaderValue::from_static("1700000000"));

        let state = rate_limit_from_headers(&headers).unwrap();
        assert_eq!(state.remaining, 0);
        assert_eq!(state.limit, 5000);
        assert_eq!(state.used, 5000);
        assert!(state.is_limited);
        assert_eq!(state.reset_time.timestamp(), 1_700_000_000);
    }

    #[test]
    fn test_missing_rate_limit_headers() {
        assert!(rate_limit_from_headers(&HeaderMap::new()).is_none());
    }

    #[test]
    fn test_graphql_errors_detected() {
        let body = json!({ "errors": [{ "message": "Could not resolve to a User" }] });
        assert_eq!(graphql_errors(&body).unwrap(), "Could not resolve to a User");
        assert!(graphql_errors(&json!({ "data": {}, "errors": [] })).is_none());
        assert!(graphql_errors(&json!({ "data": {} })).is_none());
    }

    #[test]
    fn test_base_url_validation() {
        assert!(GitHubClient::with_base_url("ftp://example.com", None).is_err());
        assert!(GitHubClient::with_base_url("not a url", None).is_err());
        let client = GitHubClient::with_base_url("https://ghe.example.com/api/v3/", None).unwrap();
        assert_eq!(
            client.endpoint("/users/octocat"),
            "https://ghe.example.com/api/v3/users/octocat"
        );
        assert!(!client.is_authenticated());
    }
}
