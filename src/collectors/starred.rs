use super::ScanOptions;
use crate::error::Result;
use crate::github::GitHubApi;
use crate::models::StarredSummary;
use crate::types::StarredRepo;
use tracing::info;

pub async fn analyze_starred<A: GitHubApi>(
    api: &A,
    handle: &str,
    options: &ScanOptions,
) -> Result<StarredSummary> {
    let path = format!("/users/{}/starred?per_page={}", handle, options.starred_page_size);
    let starred: Vec<StarredRepo> = api.get(&path).await?;
    let summary = summarize_starred(&starred);
    info!(
        handle,
        starred = summary.total_starred,
        languages = summary.categories.len(),
        "starred repositories tallied"
    );
    Ok(summary)
}

/// Counts starred repositories by primary language. Repositories without a
/// language still count towards the total.
pub fn summarize_starred(starred: &[StarredRepo]) -> StarredSummary {
    let mut summary = StarredSummary {
        total_starred: starred.len() as u32,
        ..Default::default()
    };
    for language in starred.iter().filter_map(|repo| repo.language.as_ref()) {
        *summary.categories.entry(language.clone()).or_insert(0) += 1;
    }
    summary
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tally_by_language() {
        let repo = |lang: Option<&str>| StarredRepo {
            full_name: "a/b".to_string(),
            language: lang.map(String::from),
        };
        let summary = summarize_starred(&[repo(Some("Rust")), repo(Some("Rust")), repo(None), repo(Some("Go"))]);
        assert_eq!(summary.total_starred, 4);
        assert_eq!(summary.categories["Rust"], 2);
        assert_eq!(summary.categories["Go"], 1);
        assert_eq!(summary.categories.len(), 2);
    }
}
