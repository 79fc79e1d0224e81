use super::{log_item_failure, ScanOptions};
use crate::error::Result;
use crate::github::GitHubApi;
use crate::models::ProcessedLanguage;
use crate::types::{GitHubRepo, LanguageBytes};
use tracing::info;

const TOP_LANGUAGES: usize = 5;

/// Summed bytes per language over the sampled repositories.
pub type LanguageTotals = LanguageBytes;

/// Number of repositories whose language breakdown gets fetched.
pub fn language_sample_size<A: GitHubApi>(api: &A, options: &ScanOptions) -> usize {
    if api.is_authenticated() {
        options.language_sample_authenticated
    } else {
        options.language_sample_anonymous
    }
}

/// Fetches per-repository language bytes for a prefix of `repos` and sums
/// them. Repositories whose breakdown cannot be read are skipped.
pub async fn sample_languages<A: GitHubApi>(
    api: &A,
    repos: &[GitHubRepo],
    options: &ScanOptions,
) -> Result<LanguageTotals> {
    let mut totals = LanguageTotals::new();
    let sample = language_sample_size(api, options);

    for repo in repos.iter().take(sample) {
        let path = format!("/repos/{}/languages", repo.full_name);
        match api.get::<LanguageBytes>(&path).await {
            Ok(languages) => add_language_bytes(&mut totals, &languages),
            Err(e) => log_item_failure("languages", &repo.full_name, &e),
        }
    }

    info!(
        sampled = repos.len().min(sample),
        languages = totals.len(),
        "language bytes sampled"
    );
    Ok(totals)
}

pub fn add_language_bytes(totals: &mut LanguageTotals, languages: &LanguageBytes) {
    for (language, bytes) in languages {
        *totals.entry(language.clone()).or_insert(0) += bytes;
    }
}

/// Top languages by bytes, with each share of the total sampled bytes.
/// An empty sample yields 0 % rather than dividing by zero.
pub fn process_languages(totals: &LanguageTotals) -> Vec<ProcessedLanguage> {
    let total_bytes: u64 = totals.values().sum();

    let mut ranked: Vec<(&String, &u64)> = totals.iter().collect();
    ranked.sort_by(|a, b| b.1.cmp(a.1).then_with(|| a.0.cmp(b.0)));

    ranked
        .into_iter()
        .take(TOP_LANGUAGES)
        .map(|(name, &bytes)| ProcessedLanguage {
            name: name.clone(),
            percentage: percentage(bytes, total_bytes),
            bytes,
        })
        .collect()
}

fn percentage(bytes: u64, total: u64) -> u32 {
    if total == 0 {
        return 0;
    }
    ((bytes as f64 / total as f64) * 100.0).round() as u32
}

#[cfg(test)]
mod tests {
    use super::*;

    fn totals(entries: &[(&str, u64)]) -> LanguageTotals {
        entries.iter().map(|(k, v)| (k.to_string(), *v)).collect()
    }

    #[test]
    fn test_top_five_by_bytes() {
        let processed = process_languages(&totals(&[
            ("Rust", 600),
            ("Go", 100),
            ("C", 100),
            ("Shell", 50),
            ("Python", 100),
            ("Makefile", 25),
            ("Dockerfile", 25),
        ]));
        assert_eq!(processed.len(), 5);
        assert_eq!(processed[0].name, "Rust");
        assert_eq!(processed[0].percentage, 60);
        // ties broken by name
        assert_eq!(processed[1].name, "C");
        assert_eq!(processed[2].name, "Go");
        assert_eq!(processed[4].name, "Shell");
        assert_eq!(processed[4].percentage, 5);
    }

    #[test]
    fn test_zero_bytes_is_zero_percent() {
        let processed = process_languages(&totals(&[("Rust", 0), ("Go", 0)]));
        assert_eq!(processed.len(), 2);
        assert!(processed.iter().all(|l| l.percentage == 0));
        assert!(process_languages(&LanguageTotals::new()).is_empty());
    }

    #[test]
    fn test_percentage_rounds_to_nearest() {
        let processed = process_languages(&totals(&[("A", 2), ("B", 1)]));
        assert_eq!(processed[0].percentage, 67);
        assert_eq!(processed[1].percentage, 33);
    }

    #[test]
    fn test_add_language_bytes_sums() {
        let mut acc = LanguageTotals::new();
        add_language_bytes(&mut acc, &totals(&[("Rust", 10)]));
        add_language_bytes(&mut acc, &totals(&[("Rust", 5), ("Go", 1)]));
        assert_eq!(acc["Rust"], 15);
        assert_eq!(acc["Go"], 1);
    }
}
