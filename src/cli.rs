use clap::{Args, Parser, Subcommand};
use power_scouter::collectors::ScanOptions;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "power-scouter")]
#[command(about = "GitHub Power Scouter - Measures a developer's power level from their public GitHub footprint")]
#[command(version)]
pub struct Cli {
    /// GitHub personal access token (ghp_... or github_pat_...)
    #[arg(long, env = "GITHUB_TOKEN", global = true, hide_env_values = true)]
    pub token: Option<String>,

    /// GitHub API base URL
    #[arg(long, env = "GITHUB_API_URL", global = true, default_value = power_scouter::github::DEFAULT_API_URL)]
    pub api_url: String,

    /// Local store for the saved token and resumes
    #[arg(long, env = "SCOUTER_STORE", global = true)]
    pub store: Option<PathBuf>,

    /// Log collector activity to stderr
    #[arg(long, short = 'v', global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Scan one or more accounts and reveal their power level
    Scan {
        /// Account handles
        #[arg(required = true)]
        handles: Vec<String>,
        /// Merge every handle into a single combined score
        #[arg(long)]
        combined: bool,
        /// Print the full report as JSON
        #[arg(long)]
        json: bool,
        /// Skip the count-up animation
        #[arg(long)]
        no_animate: bool,
        #[command(flatten)]
        sampling: SamplingArgs,
    },
    /// Manage the saved access token
    Token {
        #[command(subcommand)]
        action: TokenAction,
    },
    /// View and edit the generated resume
    Resume {
        #[command(subcommand)]
        action: ResumeAction,
    },
}

/// Bounds on how much of each account a scan reads.
#[derive(Args, Debug, Clone)]
pub struct SamplingArgs {
    /// Repository list pages to fetch (100 repositories each)
    #[arg(long, default_value_t = 3, value_parser = clap::value_parser!(u32).range(1..=10))]
    pub max_pages: u32,

    /// Repositories inspected for tech stack, topics and libraries
    #[arg(long)]
    pub repo_sample: Option<usize>,
}

impl SamplingArgs {
    pub fn options(&self) -> ScanOptions {
        let mut options = ScanOptions {
            max_repo_pages: self.max_pages,
            ..ScanOptions::default()
        };
        if let Some(sample) = self.repo_sample {
            options.tech_stack_sample = sample;
            options.topic_sample = sample;
            options.library_sample = sample;
        }
        options
    }
}

#[derive(Subcommand)]
pub enum TokenAction {
    /// Validate and save a token
    Save { token: String },
    /// Remove the saved token
    Clear,
    /// Show the token in use and the current rate limit
    Status,
}

#[derive(Subcommand)]
pub enum ResumeAction {
    /// Print the saved resume, seeding it from a scan if none exists
    Show {
        handle: String,
        /// ja or en
        #[arg(long, default_value = "ja")]
        locale: String,
    },
    /// Scan the account and save a freshly seeded resume
    Init {
        handle: String,
        #[arg(long, default_value = "ja")]
        locale: String,
        /// Overwrite an existing resume
        #[arg(long)]
        force: bool,
    },
    /// Set a single field (e.g. name, birth-year, contact-email)
    Set {
        handle: String,
        field: String,
        value: String,
    },
    /// Append a row, or replace one with --index
    Add {
        handle: String,
        /// experience, qualification, github or skill
        section: String,
        /// YEAR MONTH CONTENT | CONTENT | CATEGORY CONTENT
        #[arg(required = true)]
        values: Vec<String>,
        #[arg(long)]
        index: Option<usize>,
    },
    /// Remove a row by index
    Remove {
        handle: String,
        section: String,
        index: usize,
    },
    /// Attach a photo from a file holding an image data URL, or remove it
    Photo {
        handle: String,
        #[arg(required_unless_present = "remove")]
        file: Option<PathBuf>,
        #[arg(long, conflicts_with = "file")]
        remove: bool,
    },
    /// Delete the saved resume
    Discard { handle: String },
}
