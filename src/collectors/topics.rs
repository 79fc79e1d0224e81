use super::{log_item_failure, ScanOptions};
use crate::error::Result;
use crate::github::GitHubApi;
use crate::models::TopicCounts;
use crate::types::{GitHubRepo, TopicList};
use tracing::info;

/// Counts how many of the sampled repositories carry each topic.
pub async fn analyze_topics<A: GitHubApi>(
    api: &A,
    repos: &[GitHubRepo],
    options: &ScanOptions,
) -> Result<TopicCounts> {
    let mut topics = TopicCounts::new();

    for repo in repos.iter().take(options.topic_sample) {
        let path = format!("/repos/{}/topics", repo.full_name);
        match api.get::<TopicList>(&path).await {
            Ok(list) => {
                for name in list.names {
                    *topics.entry(name).or_insert(0) += 1;
                }
            }
            Err(e) => log_item_failure("topics", &repo.full_name, &e),
        }
    }

    info!(topics = topics.len(), "topics tallied");
    Ok(topics)
}
