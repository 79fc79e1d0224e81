use crate::error::{Result, ScouterError};
use crate::github::GitHubApi;
use crate::models::{ProfileReadme, ReadmeSections};
use crate::types::{GitHubOrganization, GitHubUser};
use tracing::{info, warn};

/// Fetches the account itself. Every other collector depends on this
/// succeeding; a failure here ends the scan.
pub async fn fetch_profile<A: GitHubApi>(api: &A, handle: &str) -> Result<GitHubUser> {
    let user: GitHubUser = api
        .get(&format!("/users/{}", handle))
        .await
        .map_err(|e| match e {
            ScouterError::NotFound(_) => ScouterError::NotFound(format!("user '{}'", handle)),
            other => other,
        })?;
    info!(
        handle,
        repos = user.public_repos,
        followers = user.followers,
        "profile fetched"
    );
    Ok(user)
}

/// Public organization memberships. 403 and 404 read as "none".
pub async fn fetch_organizations<A: GitHubApi>(
    api: &A,
    handle: &str,
) -> Result<Vec<GitHubOrganization>> {
    match api.get(&format!("/users/{}/orgs", handle)).await {
        Ok(orgs) => Ok(orgs),
        Err(e) if e.is_soft_failure() => {
            warn!(handle, error = %e, "organizations unavailable");
            Ok(Vec::new())
        }
        Err(e) => Err(e),
    }
}

/// The readme of the `{handle}/{handle}` profile repository. A missing or
/// forbidden readme is not an error.
pub async fn fetch_profile_readme<A: GitHubApi>(api: &A, handle: &str) -> Result<ProfileReadme> {
    let path = format!("/repos/{}/{}/readme", handle, handle);
    match api.get_raw(&path).await {
        Ok(content) => Ok(analyze_readme(content)),
        Err(e) if e.is_soft_failure() => {
            warn!(handle, error = %e, "profile readme unavailable");
            Ok(ProfileReadme::default())
        }
        Err(e) => Err(e),
    }
}

pub fn analyze_readme(content: String) -> ProfileReadme {
    if content.trim().is_empty() {
        return ProfileReadme::default();
    }

    let lower = content.to_lowercase();
    let mentions = |keywords: &[&str]| keywords.iter().any(|k| lower.contains(k));
    let sections = ReadmeSections {
        introduction: mentions(&["about", "introduction"]),
        skills: mentions(&["skill", "tech"]),
        projects: mentions(&["project", "work"]),
        contact: mentions(&["contact", "reach"]),
    };

    ProfileReadme {
        content: Some(content),
        has_readme: true,
        sections,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_readme_sections_case_insensitive() {
        let readme = analyze_readme("# ABOUT me\n## Tech I use\nReach me on Mastodon".to_string());
        assert!(readme.has_readme);
        assert!(readme.sections.introduction);
        assert!(readme.sections.skills);
        assert!(readme.sections.contact);
        assert!(!readme.sections.projects);
    }

    #[test]
    fn test_blank_readme_is_absent() {
        let readme = analyze_readme("  \n".to_string());
        assert!(!readme.has_readme);
        assert!(readme.content.is_none());
    }
}
