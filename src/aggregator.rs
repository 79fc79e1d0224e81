//! Concurrent scan of one or more accounts.
//!
//! The profile lookup runs first and is the only step whose failure ends a
//! scan. Everything else is fanned out with `futures::join!`; each branch
//! settles into an [`Outcome`] and a rejected branch folds into that
//! collector's default.

use crate::collectors::activity::collect_activity;
use crate::collectors::contributions::collect_contributions;
use crate::collectors::languages::{process_languages, sample_languages, LanguageTotals};
use crate::collectors::libraries::{analyze_libraries, LibraryTally};
use crate::collectors::profile::{fetch_organizations, fetch_profile, fetch_profile_readme};
use crate::collectors::repositories::list_repositories;
use crate::collectors::starred::analyze_starred;
use crate::collectors::tech_stack::analyze_tech_stack;
use crate::collectors::topics::analyze_topics;
use crate::collectors::ScanOptions;
use crate::error::{Result, ScouterError};
use crate::github::GitHubApi;
use crate::models::{
    ActivityData, ContributionDetails, ContributionSource, LibraryAnalysis, ProcessedLanguage,
    ProfileReadme, StarredSummary, TechStack, TopicCounts,
};
use crate::scorer::{
    calculate_power_level, determine_special_abilities, PowerStats, Rank, ScoreBreakdown,
    ScoreInput,
};
use crate::types::{GitHubOrganization, GitHubRepo, GitHubUser};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use tracing::{error, info, warn};

const TOP_REPOSITORIES: usize = 5;
const MAX_HANDLE_LEN: usize = 39;

/// Settled result of one collector.
#[derive(Debug)]
pub enum Outcome<T> {
    Fulfilled(T),
    Rejected { collector: &'static str, reason: String },
}

impl<T> Outcome<T> {
    pub fn settle(collector: &'static str, result: Result<T>) -> Self {
        match result {
            Ok(value) => Outcome::Fulfilled(value),
            Err(e) => {
                warn!(collector, error = %e, "collector failed, using default");
                Outcome::Rejected {
                    collector,
                    reason: e.to_string(),
                }
            }
        }
    }

    pub fn is_fulfilled(&self) -> bool {
        matches!(self, Outcome::Fulfilled(_))
    }

    /// The value, or `default()` with the failure recorded.
    pub fn fold(self, failures: &mut Vec<CollectorFailure>, default: impl FnOnce() -> T) -> T {
        match self {
            Outcome::Fulfilled(value) => value,
            Outcome::Rejected { collector, reason } => {
                failures.push(CollectorFailure {
                    collector: collector.to_string(),
                    reason,
                });
                default()
            }
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CollectorFailure {
    pub collector: String,
    pub reason: String,
}

/// Progress points reported while a scan runs. Branches run concurrently,
/// so the middle stages can arrive in any order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanStage {
    Started,
    Profile,
    Repositories,
    Languages,
    Activity,
    TechStack,
    Details,
    Complete,
}

impl ScanStage {
    pub fn percent(self) -> u8 {
        match self {
            ScanStage::Started => 10,
            ScanStage::Profile => 20,
            ScanStage::Repositories => 35,
            ScanStage::Languages => 50,
            ScanStage::Activity => 65,
            ScanStage::TechStack => 80,
            ScanStage::Details => 90,
            ScanStage::Complete => 100,
        }
    }

    pub fn message(self) -> &'static str {
        match self {
            ScanStage::Started => "initializing scanner",
            ScanStage::Profile => "profile located",
            ScanStage::Repositories => "repositories analyzed",
            ScanStage::Languages => "language power measured",
            ScanStage::Activity => "recent activity measured",
            ScanStage::TechStack => "tech stack analyzed",
            ScanStage::Details => "profile details collected",
            ScanStage::Complete => "analysis complete",
        }
    }
}

/// How several handles are scored.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum MultiHandleMode {
    /// One report per handle.
    #[default]
    Independent,
    /// Raw data of every handle merged, then scored once.
    Combined,
}

/// Everything collected for one account (or a merged group), before
/// scoring.
#[derive(Debug, Clone)]
pub struct ScanInputs {
    pub handles: Vec<String>,
    pub authenticated: bool,
    pub profile: GitHubUser,
    pub repos: Vec<GitHubRepo>,
    pub language_totals: LanguageTotals,
    pub activity: ActivityData,
    pub tech_stack: TechStack,
    pub contributions: ContributionDetails,
    pub starred: StarredSummary,
    pub topics: TopicCounts,
    pub libraries: Option<LibraryTally>,
    pub readme: ProfileReadme,
    pub organizations: Vec<GitHubOrganization>,
    pub failures: Vec<CollectorFailure>,
}

fn first_present(a: Option<String>, b: Option<String>) -> Option<String> {
    if a.as_deref().is_some_and(|value| !value.trim().is_empty()) {
        a
    } else {
        b.or(a)
    }
}

fn merge_profiles(mut acc: GitHubUser, other: GitHubUser) -> GitHubUser {
    acc.login = format!("{}+{}", acc.login, other.login);
    acc.public_repos += other.public_repos;
    acc.public_gists += other.public_gists;
    acc.followers += other.followers;
    acc.following += other.following;
    acc.created_at = acc.created_at.min(other.created_at);
    acc.updated_at = acc.updated_at.max(other.updated_at);
    acc.name = first_present(acc.name, other.name);
    acc.company = first_present(acc.company, other.company);
    acc.blog = first_present(acc.blog, other.blog);
    acc.location = first_present(acc.location, other.location);
    acc.email = first_present(acc.email, other.email);
    acc.bio = first_present(acc.bio, other.bio);
    acc.twitter_username = first_present(acc.twitter_username, other.twitter_username);
    acc.hireable = match (acc.hireable, other.hireable) {
        (Some(true), _) | (_, Some(true)) => Some(true),
        (a, b) => a.or(b),
    };
    acc
}

fn source_weakness(source: ContributionSource) -> u8 {
    match source {
        ContributionSource::Calendar => 0,
        ContributionSource::Events => 1,
        ContributionSource::Placeholder => 2,
    }
}

fn merge_contributions(mut acc: ContributionDetails, other: ContributionDetails) -> ContributionDetails {
    acc.total_contributions += other.total_contributions;
    acc.longest_streak = acc.longest_streak.max(other.longest_streak);
    acc.current_streak = acc.current_streak.max(other.current_streak);
    // daily calendars of different accounts are not summed
    acc.weeks.clear();
    if acc.most_active_day.starts_with("Unknown") {
        acc.most_active_day = other.most_active_day;
    }
    if source_weakness(other.source) > source_weakness(acc.source) {
        acc.source = other.source;
    }
    acc
}

impl ScanInputs {
    /// Label used for reports: the handle, or handles joined with `+`.
    pub fn label(&self) -> String {
        self.handles.join("+")
    }

    /// Merges several accounts into one input set. Counts are summed,
    /// streaks take the best account, and libraries are merged before
    /// ranking. Returns `None` for an empty list.
    pub fn combine(inputs: Vec<ScanInputs>) -> Option<ScanInputs> {
        let mut iter = inputs.into_iter();
        let mut acc = iter.next()?;

        for other in iter {
            acc.handles.extend(other.handles);
            acc.authenticated &= other.authenticated;
            acc.profile = merge_profiles(acc.profile, other.profile);
            acc.repos.extend(other.repos);
            for (language, bytes) in other.language_totals {
                *acc.language_totals.entry(language).or_insert(0) += bytes;
            }
            acc.activity.commits += other.activity.commits;
            acc.activity.pull_requests += other.activity.pull_requests;
            acc.activity.issues += other.activity.issues;
            acc.activity.recent_contributions += other.activity.recent_contributions;
            acc.tech_stack.merge(other.tech_stack);
            acc.contributions = merge_contributions(acc.contributions, other.contributions);
            acc.starred.merge(other.starred);
            for (topic, count) in other.topics {
                *acc.topics.entry(topic).or_insert(0) += count;
            }
            acc.libraries = match (acc.libraries, other.libraries) {
                (Some(mut a), Some(b)) => {
                    a.merge(b);
                    Some(a)
                }
                (a, b) => a.or(b),
            };
            if !acc.readme.has_readme {
                acc.readme = other.readme;
            }
            let known: BTreeSet<String> =
                acc.organizations.iter().map(|o| o.login.clone()).collect();
            acc.organizations.extend(
                other
                    .organizations
                    .into_iter()
                    .filter(|o| !known.contains(&o.login)),
            );
            acc.failures.extend(other.failures);
        }

        acc.repos
            .sort_by(|a, b| b.stargazers_count.cmp(&a.stargazers_count));
        Some(acc)
    }
}

/// Scored result of a scan, ready for display or JSON output.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanReport {
    pub handle: String,
    pub power_level: u64,
    pub rank: Rank,
    pub abilities: Vec<String>,
    pub stats: PowerStats,
    pub breakdown: ScoreBreakdown,
    pub profile: GitHubUser,
    pub languages: Vec<ProcessedLanguage>,
    pub activity: ActivityData,
    pub tech_stack: TechStack,
    pub contributions: ContributionDetails,
    pub starred: StarredSummary,
    pub topics: TopicCounts,
    pub library_analysis: Option<LibraryAnalysis>,
    pub readme: ProfileReadme,
    pub organizations: Vec<GitHubOrganization>,
    pub top_repositories: Vec<GitHubRepo>,
    pub failures: Vec<CollectorFailure>,
    pub scanned_at: DateTime<Utc>,
}

impl ScanReport {
    pub fn from_inputs(inputs: ScanInputs, now: DateTime<Utc>) -> Self {
        let languages = process_languages(&inputs.language_totals);
        let total_language_bytes = if inputs.authenticated {
            languages.iter().map(|l| l.bytes).sum()
        } else {
            0
        };

        let result = calculate_power_level(&ScoreInput {
            profile: &inputs.profile,
            repos: &inputs.repos,
            languages: &languages,
            activity: &inputs.activity,
            starred: Some(&inputs.starred),
            topics: Some(&inputs.topics),
            contributions: Some(&inputs.contributions),
            total_language_bytes,
            now,
        });
        let abilities = determine_special_abilities(&result.stats, Some(&inputs.contributions));
        let handle = inputs.label();

        ScanReport {
            handle,
            power_level: result.power,
            rank: Rank::for_power(result.power),
            abilities,
            stats: result.stats,
            breakdown: result.breakdown,
            top_repositories: inputs.repos.iter().take(TOP_REPOSITORIES).cloned().collect(),
            library_analysis: inputs.libraries.as_ref().map(LibraryTally::finish),
            profile: inputs.profile,
            languages,
            activity: inputs.activity,
            tech_stack: inputs.tech_stack,
            contributions: inputs.contributions,
            starred: inputs.starred,
            topics: inputs.topics,
            readme: inputs.readme,
            organizations: inputs.organizations,
            failures: inputs.failures,
            scanned_at: now,
        }
    }
}

/// Checks a handle against the platform's login rules.
pub fn validate_handle(handle: &str) -> Result<&str> {
    let handle = handle.trim();
    let valid = !handle.is_empty()
        && handle.len() <= MAX_HANDLE_LEN
        && handle.chars().all(|c| c.is_ascii_alphanumeric() || c == '-');
    if valid {
        Ok(handle)
    } else {
        Err(ScouterError::InvalidInput(format!(
            "'{}' is not a valid account handle",
            handle
        )))
    }
}

pub struct Scanner<A> {
    api: A,
    options: ScanOptions,
    clock: Option<DateTime<Utc>>,
}

impl<A: GitHubApi> Scanner<A> {
    pub fn new(api: A) -> Self {
        Self {
            api,
            options: ScanOptions::default(),
            clock: None,
        }
    }

    pub fn with_options(mut self, options: ScanOptions) -> Self {
        self.options = options;
        self
    }

    /// Pins "now" for every time-relative computation.
    pub fn at(mut self, now: DateTime<Utc>) -> Self {
        self.clock = Some(now);
        self
    }

    pub fn api(&self) -> &A {
        &self.api
    }

    fn now(&self) -> DateTime<Utc> {
        self.clock.unwrap_or_else(Utc::now)
    }

    /// Runs every collector for `handle`. Only a profile failure is
    /// returned as an error.
    pub async fn collect(&self, handle: &str, progress: &dyn Fn(ScanStage)) -> Result<ScanInputs> {
        let handle = validate_handle(handle)?;
        let api = &self.api;
        let options = &self.options;
        let now = self.now();

        progress(ScanStage::Started);
        let profile = fetch_profile(api, handle).await.map_err(|e| {
            error!(handle, error = %e, "profile lookup failed, aborting scan");
            e
        })?;
        progress(ScanStage::Profile);

        let repo_branch = async {
            let repos = Outcome::settle(
                "repositories",
                list_repositories(api, handle, options).await,
            );
            progress(ScanStage::Repositories);
            let sample: &[GitHubRepo] = match &repos {
                Outcome::Fulfilled(repos) => repos,
                Outcome::Rejected { .. } => &[],
            };

            let languages = async {
                let totals = sample_languages(api, sample, options).await;
                progress(ScanStage::Languages);
                totals
            };
            let tech_stack = async {
                let stack = analyze_tech_stack(api, sample, options).await;
                progress(ScanStage::TechStack);
                stack
            };
            let (languages, tech_stack, topics, libraries) = futures::join!(
                languages,
                tech_stack,
                analyze_topics(api, sample, options),
                analyze_libraries(api, sample, options),
            );

            (
                Outcome::settle("languages", languages),
                Outcome::settle("tech_stack", tech_stack),
                Outcome::settle("topics", topics),
                Outcome::settle("libraries", libraries),
                repos,
            )
        };

        let activity = async {
            let activity = collect_activity(api, handle, options, now).await;
            progress(ScanStage::Activity);
            activity
        };

        let ((languages, tech_stack, topics, libraries, repos), activity, contributions, starred, readme, organizations) = futures::join!(
            repo_branch,
            activity,
            collect_contributions(api, handle, options, now),
            analyze_starred(api, handle, options),
            fetch_profile_readme(api, handle),
            fetch_organizations(api, handle),
        );
        progress(ScanStage::Details);

        let mut failures = Vec::new();
        let inputs = ScanInputs {
            handles: vec![handle.to_string()],
            authenticated: api.is_authenticated(),
            profile,
            repos: repos.fold(&mut failures, Vec::new),
            language_totals: languages.fold(&mut failures, LanguageTotals::new),
            activity: Outcome::settle("activity", activity).fold(&mut failures, ActivityData::default),
            tech_stack: tech_stack.fold(&mut failures, TechStack::default),
            contributions: Outcome::settle("contributions", contributions)
                .fold(&mut failures, ContributionDetails::placeholder),
            starred: Outcome::settle("starred", starred).fold(&mut failures, StarredSummary::default),
            topics: topics.fold(&mut failures, TopicCounts::new),
            libraries: libraries.fold(&mut failures, || None),
            readme: Outcome::settle("readme", readme).fold(&mut failures, ProfileReadme::default),
            organizations: Outcome::settle("organizations", organizations)
                .fold(&mut failures, Vec::new),
            failures: Vec::new(),
        };

        info!(
            handle,
            repos = inputs.repos.len(),
            failed_collectors = failures.len(),
            "scan data collected"
        );
        Ok(ScanInputs { failures, ..inputs })
    }

    pub async fn scan(&self, handle: &str, progress: &dyn Fn(ScanStage)) -> Result<ScanReport> {
        let inputs = self.collect(handle, progress).await?;
        let report = ScanReport::from_inputs(inputs, self.now());
        progress(ScanStage::Complete);
        info!(handle = %report.handle, power = report.power_level, rank = %report.rank, "scan complete");
        Ok(report)
    }

    /// Scans several handles one after another. Any profile failure aborts
    /// the whole batch.
    pub async fn scan_many(
        &self,
        handles: &[String],
        mode: MultiHandleMode,
        progress: &dyn Fn(ScanStage),
    ) -> Result<Vec<ScanReport>> {
        if handles.is_empty() {
            return Err(ScouterError::InvalidInput("no handles given".to_string()));
        }

        let mut seen = BTreeSet::new();
        let mut collected = Vec::new();
        for handle in handles {
            let handle = validate_handle(handle)?;
            if !seen.insert(handle.to_lowercase()) {
                continue;
            }
            collected.push(self.collect(handle, progress).await?);
        }

        let now = self.now();
        let reports = match mode {
            MultiHandleMode::Independent => collected
                .into_iter()
                .map(|inputs| ScanReport::from_inputs(inputs, now))
                .collect(),
            MultiHandleMode::Combined => ScanInputs::combine(collected)
                .map(|inputs| ScanReport::from_inputs(inputs, now))
                .into_iter()
                .collect(),
        };
        progress(ScanStage::Complete);
        Ok(reports)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_handle_validation() {
        assert_eq!(validate_handle(" octocat ").unwrap(), "octocat");
        assert!(validate_handle("my-handle-42").is_ok());
        assert!(validate_handle("").is_err());
        assert!(validate_handle("bad/handle").is_err());
        assert!(validate_handle(&"a".repeat(40)).is_err());
    }

    #[test]
    fn test_outcome_fold_records_failure() {
        let mut failures = Vec::new();
        let ok: Outcome<u32> = Outcome::settle("ok", Ok(7));
        assert!(ok.is_fulfilled());
        assert_eq!(ok.fold(&mut failures, || 0), 7);

        let rejected: Outcome<u32> =
            Outcome::settle("starred", Err(ScouterError::Forbidden("nope".to_string())));
        assert_eq!(rejected.fold(&mut failures, || 42), 42);
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].collector, "starred");
        assert_eq!(failures[0].reason, "Forbidden: nope");
    }

    #[test]
    fn test_contribution_merge_keeps_weakest_source() {
        let mut calendar = ContributionDetails::placeholder();
        calendar.source = ContributionSource::Calendar;
        calendar.total_contributions = 400;
        calendar.longest_streak = 20;
        calendar.most_active_day = "Monday".to_string();

        let merged = merge_contributions(calendar, ContributionDetails::placeholder());
        assert_eq!(merged.total_contributions, 450);
        assert_eq!(merged.longest_streak, 20);
        assert_eq!(merged.most_active_day, "Monday");
        assert_eq!(merged.source, ContributionSource::Placeholder);
    }
}
