use crate::types::ContributionWeek;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// A language with its share of the sampled bytes.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProcessedLanguage {
    pub name: String,
    /// Rounded to the nearest integer; 0 when nothing was sampled.
    pub percentage: u32,
    pub bytes: u64,
}

/// Public activity over the trailing window.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ActivityData {
    pub commits: u32,
    pub pull_requests: u32,
    pub issues: u32,
    /// Every event inside the window, whatever its kind.
    pub recent_contributions: u32,
}

/// Tags detected from root-level manifests and CI files.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct TechStack {
    pub frameworks: BTreeSet<String>,
    pub devops: BTreeSet<String>,
    pub testing: BTreeSet<String>,
    pub databases: BTreeSet<String>,
}

impl TechStack {
    pub fn is_empty(&self) -> bool {
        self.frameworks.is_empty()
            && self.devops.is_empty()
            && self.testing.is_empty()
            && self.databases.is_empty()
    }

    pub fn merge(&mut self, other: TechStack) {
        self.frameworks.extend(other.frameworks);
        self.devops.extend(other.devops);
        self.testing.extend(other.testing);
        self.databases.extend(other.databases);
    }
}

/// Where the contribution figures came from.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ContributionSource {
    Calendar,
    Events,
    Placeholder,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ContributionDetails {
    pub total_contributions: u32,
    pub weeks: Vec<ContributionWeek>,
    pub most_active_day: String,
    pub longest_streak: u32,
    pub current_streak: u32,
    pub source: ContributionSource,
}

impl ContributionDetails {
    /// Stopgap figures used when neither the calendar nor the event
    /// stream could be read. Not an estimate of anything.
    pub fn placeholder() -> Self {
        Self {
            total_contributions: 50,
            weeks: Vec::new(),
            most_active_day: "Unknown (token required)".to_string(),
            longest_streak: 5,
            current_streak: 1,
            source: ContributionSource::Placeholder,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ReadmeSections {
    pub introduction: bool,
    pub skills: bool,
    pub projects: bool,
    pub contact: bool,
}

/// The `{handle}/{handle}` profile document.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ProfileReadme {
    pub content: Option<String>,
    pub has_readme: bool,
    pub sections: ReadmeSections,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct StarredSummary {
    pub total_starred: u32,
    /// Starred repository count per primary language.
    pub categories: BTreeMap<String, u32>,
}

impl StarredSummary {
    pub fn merge(&mut self, other: StarredSummary) {
        self.total_starred += other.total_starred;
        for (language, count) in other.categories {
            *self.categories.entry(language).or_insert(0) += count;
        }
    }
}

/// Topic name to number of sampled repositories carrying it.
pub type TopicCounts = BTreeMap<String, u32>;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LibraryInfo {
    pub name: String,
    pub category: String,
    /// Number of repositories declaring the library.
    pub usage: u32,
    pub versions: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LanguageLibraries {
    pub language: String,
    pub libraries: Vec<LibraryInfo>,
    pub total_libraries: usize,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct LibraryAnalysis {
    pub languages: Vec<LanguageLibraries>,
    pub top_libraries: Vec<LibraryInfo>,
    pub total_unique_libraries: usize,
}

/// Rate limit state as last observed
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RateLimitState {
    pub remaining: u32,
    pub limit: u32,
    pub used: u32,
    pub reset_time: DateTime<Utc>,
    pub is_limited: bool,
}

impl Default for RateLimitState {
    fn default() -> Self {
        Self {
            remaining: 60,
            limit: 60,
            used: 0,
            reset_time: Utc::now() + chrono::Duration::hours(1),
            is_limited: false,
        }
    }
}
