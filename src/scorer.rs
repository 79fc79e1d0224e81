//! Power level computation.
//!
//! [`calculate_power_level`] is a pure function of its [`ScoreInput`]: the
//! clock is part of the input, so identical inputs always give identical
//! results. Display jitter belongs to the reveal, not here.

use crate::models::{ActivityData, ContributionDetails, ProcessedLanguage, StarredSummary, TopicCounts};
use crate::types::{GitHubRepo, GitHubUser};
use chrono::{DateTime, Datelike, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Multiplier applied to the summed score before flooring.
pub const POWER_SCALE: f64 = 1.5;

const SECONDS_PER_DAY: f64 = 86_400.0;
const SECONDS_PER_YEAR: f64 = SECONDS_PER_DAY * 365.0;

const POPULAR_TOPICS: &[&str] = &[
    "machine-learning",
    "artificial-intelligence",
    "blockchain",
    "web3",
    "kubernetes",
    "docker",
    "react",
    "vue",
    "angular",
    "typescript",
];

const DEFAULT_ABILITY: &str = "RISING TALENT";
const MAX_ABILITIES: usize = 3;

pub struct ScoreInput<'a> {
    pub profile: &'a GitHubUser,
    pub repos: &'a [GitHubRepo],
    /// Top languages, largest share first.
    pub languages: &'a [ProcessedLanguage],
    pub activity: &'a ActivityData,
    pub starred: Option<&'a StarredSummary>,
    pub topics: Option<&'a TopicCounts>,
    pub contributions: Option<&'a ContributionDetails>,
    /// Sampled implementation bytes; 0 disables the volume bonus.
    pub total_language_bytes: u64,
    pub now: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PowerStats {
    pub repos: u32,
    pub original_repos: u32,
    pub stars: u64,
    pub forks: u64,
    pub watchers: u64,
    pub followers: u32,
    pub following: u32,
    /// Calendar years since the account was created.
    pub account_age: u32,
    pub languages: Vec<ProcessedLanguage>,
    pub activity: ActivityData,
    pub gists: u32,
}

/// Extreme-total bonuses. Several can apply at once.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum EliteBand {
    StarCollector,
    MegaStar,
    Prolific,
    Veteran,
    Influencer,
    MegaInfluencer,
}

impl EliteBand {
    pub fn bonus(self) -> u64 {
        match self {
            EliteBand::StarCollector => 50_000,
            EliteBand::MegaStar => 100_000,
            EliteBand::Prolific => 30_000,
            EliteBand::Veteran => 20_000,
            EliteBand::Influencer => 40_000,
            EliteBand::MegaInfluencer => 80_000,
        }
    }
}

/// Band of the top language's share.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum LanguageMastery {
    Adept,
    Expert,
    Master,
    Grandmaster,
}

impl LanguageMastery {
    pub fn for_share(percentage: u32) -> Option<Self> {
        match percentage {
            p if p > 90 => Some(LanguageMastery::Grandmaster),
            p if p > 80 => Some(LanguageMastery::Master),
            p if p > 60 => Some(LanguageMastery::Expert),
            p if p > 40 => Some(LanguageMastery::Adept),
            _ => None,
        }
    }

    pub fn bonus(self) -> u64 {
        match self {
            LanguageMastery::Grandmaster | LanguageMastery::Master => 3_000,
            LanguageMastery::Expert => 2_000,
            LanguageMastery::Adept => 1_000,
        }
    }
}

/// Every component of the summed score, before scaling.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ScoreBreakdown {
    /// Weighted raw counts, profile completeness and account age.
    pub base: u64,
    pub repo_quality: u64,
    pub language_diversity: u64,
    pub language_mastery: u64,
    pub mastery_band: Option<LanguageMastery>,
    pub consistency: u64,
    pub collaboration: u64,
    pub activity_quality: u64,
    pub contribution: u64,
    pub elite: u64,
    pub elite_bands: Vec<EliteBand>,
    pub starred: u64,
    pub topic: u64,
    pub language_volume: u64,
}

impl ScoreBreakdown {
    pub fn total(&self) -> u64 {
        self.base
            + self.repo_quality
            + self.language_diversity
            + self.language_mastery
            + self.consistency
            + self.collaboration
            + self.activity_quality
            + self.contribution
            + self.elite
            + self.starred
            + self.topic
            + self.language_volume
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PowerLevelResult {
    pub power: u64,
    pub stats: PowerStats,
    pub breakdown: ScoreBreakdown,
}

pub fn calculate_power_level(input: &ScoreInput<'_>) -> PowerLevelResult {
    let profile = input.profile;
    let activity = input.activity;

    let mut stars = 0u64;
    let mut forks = 0u64;
    let mut watchers = 0u64;
    let mut original_repos = 0u32;
    let mut repo_quality = 0u64;

    for repo in input.repos {
        stars += u64::from(repo.stargazers_count);
        forks += u64::from(repo.forks_count);
        watchers += u64::from(repo.watchers_count);
        if !repo.fork {
            original_repos += 1;
            repo_quality += repository_quality(repo, input.now);
        }
    }

    let account_age = (input.now.year() - profile.created_at.year()).max(0) as u32;

    let mastery_band = input
        .languages
        .first()
        .and_then(|top| LanguageMastery::for_share(top.percentage));
    let consistency = consistency_score(profile.public_repos, account_age, activity);

    let mut elite_bands = Vec::new();
    if stars > 10_000 {
        elite_bands.push(EliteBand::StarCollector);
    }
    if stars > 50_000 {
        elite_bands.push(EliteBand::MegaStar);
    }
    if original_repos > 100 {
        elite_bands.push(EliteBand::Prolific);
    }
    if account_age > 10 && consistency >= 3_000 {
        elite_bands.push(EliteBand::Veteran);
    }
    if profile.followers > 1_000 {
        elite_bands.push(EliteBand::Influencer);
    }
    if profile.followers > 5_000 {
        elite_bands.push(EliteBand::MegaInfluencer);
    }

    let breakdown = ScoreBreakdown {
        base: base_score(input, original_repos, stars, forks, watchers, account_age),
        repo_quality,
        language_diversity: language_diversity_score(input.languages.len()),
        language_mastery: mastery_band.map_or(0, LanguageMastery::bonus),
        mastery_band,
        consistency,
        collaboration: collaboration_score(profile.followers, profile.following),
        activity_quality: activity_quality_score(activity),
        contribution: input
            .contributions
            .map_or(0, |c| contribution_score(c, activity)),
        elite: elite_bands.iter().map(|band| band.bonus()).sum(),
        elite_bands,
        starred: input.starred.map_or(0, starred_bonus),
        topic: input.topics.map_or(0, topic_bonus),
        language_volume: language_volume_bonus(input.total_language_bytes, input.languages.len()),
    };

    let power = (breakdown.total() as f64 * POWER_SCALE).floor() as u64;

    PowerLevelResult {
        power,
        stats: PowerStats {
            repos: profile.public_repos,
            original_repos,
            stars,
            forks,
            watchers,
            followers: profile.followers,
            following: profile.following,
            account_age,
            languages: input.languages.to_vec(),
            activity: *activity,
            gists: profile.public_gists,
        },
        breakdown,
    }
}

fn present(field: &Option<String>) -> bool {
    field.as_deref().is_some_and(|value| !value.trim().is_empty())
}

fn base_score(
    input: &ScoreInput<'_>,
    original_repos: u32,
    stars: u64,
    forks: u64,
    watchers: u64,
    account_age: u32,
) -> u64 {
    let profile = input.profile;
    let activity = input.activity;

    let commit_term = match input.contributions {
        Some(c) if c.total_contributions > 0 => u64::from(c.total_contributions) * 50,
        _ => u64::from(activity.commits) * 20,
    };

    let mut completeness = 0u64;
    if present(&profile.bio) {
        completeness += 1_000;
    }
    if present(&profile.blog) {
        completeness += 1_000;
    }
    if present(&profile.company) {
        completeness += 2_000;
    }
    if present(&profile.location) {
        completeness += 500;
    }
    if profile.hireable == Some(true) {
        completeness += 3_000;
    }
    if present(&profile.twitter_username) {
        completeness += 1_500;
    }

    u64::from(profile.public_repos) * 150
        + u64::from(original_repos) * 300
        + stars * 100
        + u64::from(profile.followers) * 50
        + u64::from(profile.following) * 10
        + forks * 80
        + watchers * 40
        + commit_term
        + u64::from(activity.pull_requests) * 200
        + u64::from(activity.issues) * 100
        + u64::from(activity.recent_contributions) * 50
        + u64::from(profile.public_gists) * 100
        + completeness
        + u64::from(account_age) * 2_000
}

/// Stars-per-year and fork-ratio band of one original repository, plus its
/// maintenance recency.
fn repository_quality(repo: &GitHubRepo, now: DateTime<Utc>) -> u64 {
    let age_years = ((now - repo.created_at).num_seconds() as f64 / SECONDS_PER_YEAR).max(1.0);
    let stars = f64::from(repo.stargazers_count);
    let stars_per_year = stars / age_years;
    let fork_ratio = f64::from(repo.forks_count) / stars.max(1.0);

    let mut score = if stars_per_year > 10.0 && fork_ratio > 0.1 && fork_ratio < 2.0 {
        1_000
    } else if stars_per_year > 5.0 {
        500
    } else if stars_per_year > 1.0 {
        200
    } else {
        0
    };

    let days_since_update = (now - repo.updated_at).num_seconds() as f64 / SECONDS_PER_DAY;
    if days_since_update < 30.0 {
        score += 300;
    } else if days_since_update < 90.0 {
        score += 100;
    }
    score
}

fn language_diversity_score(language_count: usize) -> u64 {
    match language_count {
        n if n >= 5 => 5_000,
        n if n >= 3 => 3_000,
        2 => 1_500,
        1 => 500,
        _ => 0,
    }
}

fn consistency_score(public_repos: u32, account_age: u32, activity: &ActivityData) -> u64 {
    let repos_per_year = f64::from(public_repos) / f64::from(account_age.max(1));
    let recent = activity.recent_contributions;

    if repos_per_year > 10.0 && recent > 30 {
        5_000
    } else if repos_per_year > 5.0 && recent > 15 {
        3_000
    } else if repos_per_year > 2.0 && recent > 5 {
        1_500
    } else if recent > 0 {
        500
    } else {
        0
    }
}

fn collaboration_score(followers: u32, following: u32) -> u64 {
    let ratio = f64::from(followers) / f64::from(following.max(1));

    if ratio > 2.0 && followers > 100 {
        5_000
    } else if ratio > 1.0 && followers > 50 {
        3_000
    } else if followers > 20 {
        1_500
    } else if followers > 5 {
        500
    } else {
        0
    }
}

fn activity_quality_score(activity: &ActivityData) -> u64 {
    let mut score = 0;
    if activity.pull_requests > 0 {
        let pr_ratio = f64::from(activity.pull_requests) / f64::from(activity.commits.max(1));
        if pr_ratio > 0.3 {
            score += 2_000;
        } else if pr_ratio > 0.1 {
            score += 1_000;
        }
    }
    score + u64::from(activity.issues) * 100
}

fn contribution_score(contributions: &ContributionDetails, activity: &ActivityData) -> u64 {
    let total = contributions.total_contributions;
    let volume = match total {
        t if t > 1_000 => 100_000,
        t if t > 500 => 50_000,
        t if t > 365 => 30_000,
        t if t > 200 => 15_000,
        t if t > 100 => 8_000,
        t if t > 50 => 4_000,
        _ => 0,
    };

    let longest = match contributions.longest_streak {
        s if s > 365 => 50_000,
        s if s > 180 => 30_000,
        s if s > 90 => 20_000,
        s if s > 30 => 10_000,
        s if s > 7 => 5_000,
        _ => 0,
    };

    let current = match contributions.current_streak {
        s if s > 30 => 20_000,
        s if s > 14 => 10_000,
        s if s > 7 => 5_000,
        s if s > 0 => 2_000,
        _ => 0,
    };

    let recent = match activity.recent_contributions {
        r if r > 25 => 15_000,
        r if r > 20 => 10_000,
        r if r > 15 => 7_000,
        r if r > 10 => 4_000,
        _ => 0,
    };

    volume + longest + current + recent
}

fn starred_bonus(starred: &StarredSummary) -> u64 {
    let mut bonus = 0;
    if starred.total_starred > 1_000 {
        bonus += 10_000;
    }
    if starred.total_starred > 5_000 {
        bonus += 30_000;
    }
    let languages = starred.categories.len();
    if languages > 10 {
        bonus += 15_000;
    }
    if languages > 20 {
        bonus += 30_000;
    }
    bonus
}

fn topic_bonus(topics: &TopicCounts) -> u64 {
    let mut bonus = 0;
    if topics.len() > 10 {
        bonus += 5_000;
    }
    if topics.len() > 20 {
        bonus += 15_000;
    }
    let trending = topics
        .keys()
        .any(|topic| POPULAR_TOPICS.contains(&topic.to_lowercase().as_str()));
    if trending {
        bonus += 10_000;
    }
    bonus
}

fn language_volume_bonus(total_bytes: u64, language_count: usize) -> u64 {
    if total_bytes == 0 {
        return 0;
    }
    let mut bonus = match total_bytes {
        b if b > 100_000_000 => 50_000,
        b if b > 50_000_000 => 30_000,
        b if b > 10_000_000 => 20_000,
        b if b > 5_000_000 => 10_000,
        b if b > 1_000_000 => 5_000,
        _ => 0,
    };
    if total_bytes > 10_000_000 && language_count >= 3 {
        bonus += 15_000;
    }
    bonus
}

/// Title ladder, lowest first.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Rank {
    #[serde(rename = "BEGINNER")]
    Beginner,
    #[serde(rename = "NOVICE DEVELOPER")]
    Novice,
    #[serde(rename = "APPRENTICE DEVELOPER")]
    Apprentice,
    #[serde(rename = "JUNIOR DEVELOPER")]
    Junior,
    #[serde(rename = "MID-LEVEL DEVELOPER")]
    MidLevel,
    #[serde(rename = "SENIOR DEVELOPER")]
    Senior,
    #[serde(rename = "EXPERT DEVELOPER")]
    Expert,
    #[serde(rename = "ELITE DEVELOPER")]
    Elite,
    #[serde(rename = "SUPER ELITE")]
    SuperElite,
    #[serde(rename = "MYTHICAL DEVELOPER")]
    Mythical,
    #[serde(rename = "LEGENDARY DEVELOPER")]
    Legendary,
    #[serde(rename = "GOD TIER DEVELOPER")]
    GodTier,
}

impl Rank {
    /// Lower bound of each tier, highest first.
    const LADDER: [(u64, Rank); 11] = [
        (5_000_000, Rank::GodTier),
        (2_000_000, Rank::Legendary),
        (1_000_000, Rank::Mythical),
        (500_000, Rank::SuperElite),
        (250_000, Rank::Elite),
        (100_000, Rank::Expert),
        (50_000, Rank::Senior),
        (25_000, Rank::MidLevel),
        (10_000, Rank::Junior),
        (5_000, Rank::Apprentice),
        (1_000, Rank::Novice),
    ];

    pub fn for_power(power: u64) -> Self {
        Self::LADDER
            .iter()
            .find(|(threshold, _)| power >= *threshold)
            .map(|(_, rank)| *rank)
            .unwrap_or(Rank::Beginner)
    }

    pub fn label(self) -> &'static str {
        match self {
            Rank::Beginner => "BEGINNER",
            Rank::Novice => "NOVICE DEVELOPER",
            Rank::Apprentice => "APPRENTICE DEVELOPER",
            Rank::Junior => "JUNIOR DEVELOPER",
            Rank::MidLevel => "MID-LEVEL DEVELOPER",
            Rank::Senior => "SENIOR DEVELOPER",
            Rank::Expert => "EXPERT DEVELOPER",
            Rank::Elite => "ELITE DEVELOPER",
            Rank::SuperElite => "SUPER ELITE",
            Rank::Mythical => "MYTHICAL DEVELOPER",
            Rank::Legendary => "LEGENDARY DEVELOPER",
            Rank::GodTier => "GOD TIER DEVELOPER",
        }
    }
}

impl fmt::Display for Rank {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Up to three ability tags, in rule order. Falls back to a single
/// default tag when nothing triggers.
pub fn determine_special_abilities(
    stats: &PowerStats,
    contributions: Option<&ContributionDetails>,
) -> Vec<String> {
    let mut abilities: Vec<String> = Vec::new();
    let mut push = |tag: &str| abilities.push(tag.to_string());

    match stats.stars {
        s if s > 100_000 => push("MEGASTAR OVERLORD"),
        s if s > 50_000 => push("SUPERSTAR DEVELOPER"),
        s if s > 10_000 => push("STAR COLLECTOR"),
        s if s > 5_000 => push("RISING STAR"),
        _ => {}
    }

    match stats.followers {
        f if f > 10_000 => push("TECH CELEBRITY"),
        f if f > 5_000 => push("MEGA INFLUENCER"),
        f if f > 1_000 => push("INFLUENCER"),
        f if f > 500 => push("COMMUNITY LEADER"),
        _ => {}
    }

    if let Some(top) = stats.languages.first() {
        let title = match top.percentage {
            p if p > 90 => Some("GRANDMASTER"),
            p if p > 80 => Some("MASTER"),
            p if p > 60 => Some("EXPERT"),
            _ => None,
        };
        if let Some(title) = title {
            push(&format!("{} {}", top.name, title));
        }

        if stats.languages.len() >= 5 {
            push("POLYGLOT PROGRAMMER");
        } else if stats.languages.len() >= 3 {
            push("MULTILINGUAL CODER");
        }
    }

    match stats.activity.recent_contributions {
        r if r > 100 => push("UNSTOPPABLE FORCE"),
        r if r > 50 => push("HYPER ACTIVE"),
        r if r > 25 => push("HIGHLY ACTIVE"),
        _ => {}
    }

    match stats.original_repos {
        r if r > 100 => push("REPOSITORY FACTORY"),
        r if r > 50 => push("PROLIFIC CREATOR"),
        r if r > 25 => push("PROJECT ARCHITECT"),
        _ => {}
    }

    match stats.account_age {
        a if a > 15 => push("ANCIENT DEVELOPER"),
        a if a > 10 => push("VETERAN WARRIOR"),
        a if a > 7 => push("EXPERIENCED"),
        a if a > 5 => push("SEASONED"),
        _ => {}
    }

    match stats.gists {
        g if g > 500 => push("GIST OVERLORD"),
        g if g > 100 => push("GIST WIZARD"),
        g if g > 50 => push("SNIPPET MASTER"),
        _ => {}
    }

    match stats.activity.pull_requests {
        p if p > 100 => push("PR CHAMPION"),
        p if p > 50 => push("COLLABORATION EXPERT"),
        _ => {}
    }

    match stats.activity.issues {
        i if i > 100 => push("ISSUE RESOLVER"),
        i if i > 50 => push("BUG HUNTER"),
        _ => {}
    }

    match stats.forks {
        f if f > 10_000 => push("FORK MAGNET"),
        f if f > 5_000 => push("HIGHLY FORKABLE"),
        _ => {}
    }

    if let Some(c) = contributions {
        match c.total_contributions {
            t if t > 1_000 => push("CODING MACHINE"),
            t if t > 500 => push("DAILY COMMITTER"),
            t if t > 365 => push("CONSISTENT CODER"),
            _ => {}
        }
        match c.longest_streak {
            s if s > 365 => push("UNSTOPPABLE STREAK"),
            s if s > 180 => push("MARATHON CODER"),
            s if s > 90 => push("PERSISTENT DEVELOPER"),
            _ => {}
        }
        match c.current_streak {
            s if s > 30 => push("CURRENTLY ON FIRE"),
            s if s > 14 => push("ACTIVE CONTRIBUTOR"),
            _ => {}
        }
    }

    if abilities.is_empty() {
        return vec![DEFAULT_ABILITY.to_string()];
    }
    abilities.truncate(MAX_ABILITIES);
    abilities
}

pub fn format_abilities(abilities: &[String]) -> String {
    abilities.join(" + ")
}
