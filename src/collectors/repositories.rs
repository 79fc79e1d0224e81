use super::ScanOptions;
use crate::error::Result;
use crate::github::GitHubApi;
use crate::types::GitHubRepo;
use tracing::{debug, info, warn};

/// Lists the account's repositories, most recently updated first, then
/// re-sorts them by star count.
///
/// Stops after `max_repo_pages` pages or as soon as a page comes back
/// short. A failure on the first page is an error; a failure on a later
/// page keeps what was already fetched.
pub async fn list_repositories<A: GitHubApi>(
    api: &A,
    handle: &str,
    options: &ScanOptions,
) -> Result<Vec<GitHubRepo>> {
    let mut all_repos: Vec<GitHubRepo> = Vec::new();

    for page in 1..=options.max_repo_pages {
        let path = format!(
            "/users/{}/repos?per_page={}&page={}&sort=updated",
            handle, options.repos_per_page, page
        );

        let repos: Vec<GitHubRepo> = match api.get(&path).await {
            Ok(repos) => repos,
            Err(e) if page == 1 => return Err(e),
            Err(e) => {
                warn!(handle, page, error = %e, "failed to fetch repository page, keeping earlier pages");
                break;
            }
        };

        let has_more = repos.len() == options.repos_per_page;
        debug!(handle, page, count = repos.len(), "fetched repository page");
        all_repos.extend(repos);

        if !has_more {
            break;
        }
    }

    all_repos.sort_by(|a, b| b.stargazers_count.cmp(&a.stargazers_count));
    info!(handle, count = all_repos.len(), "repositories listed");
    Ok(all_repos)
}
