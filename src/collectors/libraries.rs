use super::{log_item_failure, ScanOptions};
use crate::error::Result;
use crate::github::GitHubApi;
use crate::manifest::{categorize, Dependencies, Ecosystem};
use crate::models::{LanguageLibraries, LibraryAnalysis, LibraryInfo};
use crate::types::GitHubRepo;
use std::collections::{BTreeMap, BTreeSet};
use tracing::{debug, info};

const TOP_PER_LANGUAGE: usize = 10;
const TOP_OVERALL: usize = 20;

#[derive(Debug, Clone, Default)]
struct Usage {
    count: u32,
    versions: BTreeSet<String>,
}

impl Usage {
    fn add(&mut self, count: u32, versions: impl IntoIterator<Item = String>) {
        self.count += count;
        self.versions.extend(versions);
    }
}

/// Raw library counts before ranking. Kept separate from
/// [`LibraryAnalysis`] so tallies from several accounts can be merged
/// before the top-N cut.
#[derive(Debug, Clone, Default)]
pub struct LibraryTally {
    by_language: BTreeMap<String, BTreeMap<String, Usage>>,
    overall: BTreeMap<String, Usage>,
}

impl LibraryTally {
    pub fn is_empty(&self) -> bool {
        self.overall.is_empty()
    }

    /// Records one repository's dependencies. Each library counts once per
    /// repository.
    pub fn record(&mut self, language: &str, deps: &Dependencies) {
        let per_language = self.by_language.entry(language.to_string()).or_default();
        for (name, version) in deps {
            per_language
                .entry(name.clone())
                .or_default()
                .add(1, [version.clone()]);
            self.overall
                .entry(name.clone())
                .or_default()
                .add(1, [version.clone()]);
        }
    }

    pub fn merge(&mut self, other: LibraryTally) {
        for (language, libraries) in other.by_language {
            let per_language = self.by_language.entry(language).or_default();
            for (name, usage) in libraries {
                per_language.entry(name).or_default().add(usage.count, usage.versions);
            }
        }
        for (name, usage) in other.overall {
            self.overall.entry(name).or_default().add(usage.count, usage.versions);
        }
    }

    pub fn finish(&self) -> LibraryAnalysis {
        let languages = self
            .by_language
            .iter()
            .map(|(language, libraries)| LanguageLibraries {
                language: language.clone(),
                libraries: ranked(libraries, TOP_PER_LANGUAGE),
                total_libraries: libraries.len(),
            })
            .collect();

        LibraryAnalysis {
            languages,
            top_libraries: ranked(&self.overall, TOP_OVERALL),
            total_unique_libraries: self.overall.len(),
        }
    }
}

fn ranked(libraries: &BTreeMap<String, Usage>, limit: usize) -> Vec<LibraryInfo> {
    let mut infos: Vec<LibraryInfo> = libraries
        .iter()
        .map(|(name, usage)| LibraryInfo {
            name: name.clone(),
            category: categorize(name).to_string(),
            usage: usage.count,
            versions: usage.versions.iter().cloned().collect(),
        })
        .collect();
    infos.sort_by(|a, b| b.usage.cmp(&a.usage).then_with(|| a.name.cmp(&b.name)));
    infos.truncate(limit);
    infos
}

/// Reads the dependency manifests of the sampled repositories. Only runs
/// for authenticated clients; anonymous scans get `Ok(None)` without any
/// request being made.
pub async fn analyze_libraries<A: GitHubApi>(
    api: &A,
    repos: &[GitHubRepo],
    options: &ScanOptions,
) -> Result<Option<LibraryTally>> {
    if !api.is_authenticated() {
        debug!("library analysis skipped without a token");
        return Ok(None);
    }

    let mut tally = LibraryTally::default();

    for repo in repos.iter().take(options.library_sample) {
        let Some(language) = repo.language.as_deref() else {
            continue;
        };
        let Some(ecosystem) = Ecosystem::for_language(language) else {
            continue;
        };

        let mut repo_deps = Dependencies::new();
        for parser in ecosystem.parsers() {
            let path = format!("/repos/{}/contents/{}", repo.full_name, parser.file_name());
            match api.get_raw(&path).await {
                Ok(content) => {
                    if let Some(deps) = parser.parse(&content) {
                        repo_deps.extend(deps);
                    }
                }
                Err(e) => log_item_failure("libraries", &repo.full_name, &e),
            }
        }

        if !repo_deps.is_empty() {
            tally.record(language, &repo_deps);
        }
    }

    info!(unique = tally.overall.len(), "libraries analyzed");
    Ok(Some(tally))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn deps(entries: &[(&str, &str)]) -> Dependencies {
        entries
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_tally_counts_repositories() {
        let mut tally = LibraryTally::default();
        tally.record("TypeScript", &deps(&[("react", "^18"), ("lodash", "4")]));
        tally.record("JavaScript", &deps(&[("react", "^17")]));
        tally.record("Python", &deps(&[("django", "4.2")]));

        let analysis = tally.finish();
        assert_eq!(analysis.total_unique_libraries, 3);
        assert_eq!(analysis.top_libraries[0].name, "react");
        assert_eq!(analysis.top_libraries[0].usage, 2);
        assert_eq!(analysis.top_libraries[0].category, "UI Framework");
        assert_eq!(analysis.top_libraries[0].versions, vec!["^17", "^18"]);
        assert_eq!(analysis.languages.len(), 3);

        let python = analysis
            .languages
            .iter()
            .find(|l| l.language == "Python")
            .unwrap();
        assert_eq!(python.libraries[0].category, "Web Framework");
    }

    #[test]
    fn test_top_cuts() {
        let mut tally = LibraryTally::default();
        for i in 0..25 {
            let name = format!("lib{:02}", i);
            tally.record("Rust", &deps(&[(name.as_str(), "1")]));
        }
        let analysis = tally.finish();
        assert_eq!(analysis.top_libraries.len(), 20);
        assert_eq!(analysis.languages[0].libraries.len(), 10);
        assert_eq!(analysis.languages[0].total_libraries, 25);
        assert_eq!(analysis.total_unique_libraries, 25);
        assert_eq!(analysis.top_libraries[0].category, "Other");
    }

    #[test]
    fn test_merge_sums_usage() {
        let mut a = LibraryTally::default();
        a.record("Rust", &deps(&[("tokio", "1")]));
        let mut b = LibraryTally::default();
        b.record("Rust", &deps(&[("tokio", "1.35"), ("serde", "1")]));

        a.merge(b);
        let analysis = a.finish();
        let tokio = &analysis.top_libraries[0];
        assert_eq!(tokio.name, "tokio");
        assert_eq!(tokio.usage, 2);
        assert_eq!(tokio.category, "Rust Async");
        assert_eq!(analysis.total_unique_libraries, 2);
    }
}
