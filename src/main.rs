mod cli;

use anyhow::{bail, Context, Result};
use chrono::Utc;
use clap::Parser;
use cli::{Cli, Commands, ResumeAction, TokenAction};
use colored::*;
use power_scouter::auth::Credential;
use power_scouter::collectors::ScanOptions;
use power_scouter::resume::{render_text, Locale, ResumeBook, ResumeDocument, ResumeField, ResumeSection};
use power_scouter::reveal::{frames, jitter};
use power_scouter::scorer::format_abilities;
use power_scouter::store::{clear_token, load_token, save_token, FileStore};
use power_scouter::{GitHubClient, MultiHandleMode, ScanReport, ScanStage, Scanner, ScouterError};
use rand::Rng;
use std::io::Write;
use std::time::Duration;
use tracing::warn;
use tracing_subscriber::EnvFilter;

const REVEAL_FRAMES: usize = 60;
const REVEAL_FRAME_DELAY: Duration = Duration::from_millis(50);
const JITTER: i64 = 5;

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if it exists
    dotenv::dotenv().ok();

    let cli = Cli::parse();

    // Logs go to stderr so --json output stays clean
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match &cli.command {
        Commands::Scan {
            handles,
            combined,
            json,
            no_animate,
            sampling,
        } => {
            let client = build_client(&cli)?;
            let mode = if *combined {
                MultiHandleMode::Combined
            } else {
                MultiHandleMode::Independent
            };
            let reports = run_scan(client, sampling.options(), handles, mode, !*json).await?;

            if *json {
                println!("{}", serde_json::to_string_pretty(&reports)?);
            } else {
                for report in &reports {
                    display_report(report, !*no_animate).await?;
                }
            }
        }
        Commands::Token { action } => match action {
            TokenAction::Save { token } => {
                let store = open_store(&cli)?;
                let credential = save_token(&store, token)?;
                println!("✅ Saved {} token to {}", credential.kind(), store.path().display());
            }
            TokenAction::Clear => {
                clear_token(&open_store(&cli)?)?;
                println!("🗑  Token removed");
            }
            TokenAction::Status => {
                let credential = resolve_credential(&cli)?;
                match &credential {
                    Some(c) => println!("Token: {}", c.to_string().green()),
                    None => println!("Token: {}", "none (anonymous, 60 requests/hour)".yellow()),
                }
                let client = GitHubClient::with_base_url(&cli.api_url, credential)?;
                let rate = client.rate_limit().await.context("Failed to query rate limit")?;
                println!(
                    "Rate limit: {}/{} remaining, resets at {}",
                    rate.remaining,
                    rate.limit,
                    rate.reset_time.format("%H:%M:%S UTC")
                );
            }
        },
        Commands::Resume { action } => {
            let store = open_store(&cli)?;
            let book = ResumeBook::new(&store);
            match action {
                ResumeAction::Show { handle, locale } => {
                    let locale: Locale = locale.parse()?;
                    let doc = match book.load(handle)? {
                        Some(doc) => doc,
                        None => {
                            let doc = seed_resume(&cli, handle, locale).await?;
                            book.save(handle, &doc)?;
                            doc
                        }
                    };
                    print!("{}", render_text(&doc, locale));
                }
                ResumeAction::Init { handle, locale, force } => {
                    let locale: Locale = locale.parse()?;
                    if !force && book.load(handle)?.is_some() {
                        bail!("A resume for '{}' already exists; pass --force to replace it", handle);
                    }
                    let doc = seed_resume(&cli, handle, locale).await?;
                    book.save(handle, &doc)?;
                    println!("✅ Resume for {} seeded from scan", handle.bold());
                }
                ResumeAction::Set { handle, field, value } => {
                    let field: ResumeField = field.parse()?;
                    let mut doc = load_existing(&book, handle)?;
                    doc.set(field, value.as_str());
                    book.save(handle, &doc)?;
                    println!("✅ {} updated", field.key());
                }
                ResumeAction::Add {
                    handle,
                    section,
                    values,
                    index,
                } => {
                    let section: ResumeSection = section.parse()?;
                    let row = section.row_from_values(values)?;
                    let mut doc = load_existing(&book, handle)?;
                    doc.put_row(section, *index, row)?;
                    book.save(handle, &doc)?;
                    println!("✅ {:?} now has {} row(s)", section, doc.row_count(section));
                }
                ResumeAction::Remove { handle, section, index } => {
                    let section: ResumeSection = section.parse()?;
                    let mut doc = load_existing(&book, handle)?;
                    doc.remove_row(section, *index)?;
                    book.save(handle, &doc)?;
                    println!("✅ Removed row {} from {:?}", index, section);
                }
                ResumeAction::Photo { handle, file, remove } => {
                    let mut doc = load_existing(&book, handle)?;
                    if *remove {
                        doc.remove_photo();
                    } else if let Some(path) = file {
                        let data_url = std::fs::read_to_string(path)
                            .with_context(|| format!("Failed to read {}", path.display()))?;
                        doc.set_photo(&data_url)?;
                    }
                    book.save(handle, &doc)?;
                    println!("✅ Photo {}", if *remove { "removed" } else { "attached" });
                }
                ResumeAction::Discard { handle } => {
                    book.discard(handle)?;
                    println!("🗑  Resume for {} discarded", handle);
                }
            }
        }
    }

    Ok(())
}

/// Opened only by commands that persist something.
fn open_store(cli: &Cli) -> Result<FileStore> {
    let path = match &cli.store {
        Some(path) => path.clone(),
        None => FileStore::default_path()?,
    };
    FileStore::open(&path).with_context(|| format!("Failed to open store at {}", path.display()))
}

/// `--token` wins over the saved token. An unreadable store only costs the
/// saved token.
fn resolve_credential(cli: &Cli) -> Result<Option<Credential>> {
    if let Some(raw) = &cli.token {
        return Ok(Some(Credential::parse(raw)?));
    }
    match open_store(cli) {
        Ok(store) => Ok(load_token(&store)?),
        Err(e) => {
            warn!(error = %e, "saved token unavailable");
            Ok(None)
        }
    }
}

fn build_client(cli: &Cli) -> Result<GitHubClient> {
    let credential = resolve_credential(cli)?;
    if credential.is_none() {
        eprintln!(
            "{}",
            "No token configured: anonymous scans sample fewer repositories and skip the contribution calendar."
                .yellow()
        );
    }
    Ok(GitHubClient::with_base_url(&cli.api_url, credential)?)
}

async fn run_scan(
    client: GitHubClient,
    options: ScanOptions,
    handles: &[String],
    mode: MultiHandleMode,
    show_progress: bool,
) -> Result<Vec<ScanReport>> {
    let scanner = Scanner::new(client).with_options(options);
    let progress = |stage: ScanStage| {
        if show_progress {
            eprintln!("{} {}", format!("[{:>3}%]", stage.percent()).dimmed(), stage.message());
        }
    };

    match scanner.scan_many(handles, mode, &progress).await {
        Ok(reports) => Ok(reports),
        Err(e) => {
            eprintln!("{}", failure_banner(&e).red().bold());
            eprintln!("{}", e);
            if let Some(rate) = scanner.api().last_rate_limit() {
                if rate.is_limited {
                    eprintln!("Rate limit exhausted until {}", rate.reset_time.format("%H:%M:%S UTC"));
                }
            }
            Err(e.into())
        }
    }
}

async fn seed_resume(cli: &Cli, handle: &str, locale: Locale) -> Result<ResumeDocument> {
    let client = build_client(cli)?;
    let reports = run_scan(
        client,
        ScanOptions::default(),
        &[handle.to_string()],
        MultiHandleMode::Independent,
        true,
    )
    .await?;
    let report = reports.first().context("Scan produced no report")?;
    Ok(ResumeDocument::seed(report, locale, Utc::now().date_naive()))
}

fn load_existing(book: &ResumeBook<&FileStore>, handle: &str) -> Result<ResumeDocument> {
    book.load(handle)?
        .with_context(|| format!("No resume saved for '{}'; run `resume init {}` first", handle, handle))
}

fn failure_banner(error: &ScouterError) -> &'static str {
    match error {
        ScouterError::NotFound(_) => "SCAN FAILED: TARGET NOT FOUND",
        ScouterError::RateLimitExceeded(_) => "SCAN FAILED: RATE LIMIT EXCEEDED",
        ScouterError::InvalidInput(_) => "SCAN FAILED: INVALID HANDLE",
        ScouterError::InvalidToken(_) | ScouterError::Forbidden(_) => "SCAN FAILED: ACCESS DENIED",
        ScouterError::NetworkError(_) => "SCAN FAILED: NETWORK ERROR",
        _ => "SCAN FAILED",
    }
}

async fn animate_power_level(target: u64) -> Result<()> {
    let values = frames(target, REVEAL_FRAMES);
    let last = values.len().saturating_sub(1);
    let mut stdout = std::io::stdout();

    for (i, value) in values.into_iter().enumerate() {
        let shown = if i == last {
            value
        } else {
            jitter(value, rand::rng().random_range(-JITTER..JITTER))
        };
        write!(stdout, "\r  {:>12}", shown.to_string().bold().yellow())?;
        stdout.flush()?;
        tokio::time::sleep(REVEAL_FRAME_DELAY).await;
    }
    writeln!(stdout)?;
    Ok(())
}

async fn display_report(report: &ScanReport, animate: bool) -> Result<()> {
    println!();
    println!("{}", "=".repeat(50).green());
    println!("{} {}", "TARGET:".green(), report.handle.to_uppercase().bold());
    println!("{}", "POWER LEVEL:".green());

    if animate {
        animate_power_level(report.power_level).await?;
    } else {
        println!("  {:>12}", report.power_level.to_string().bold().yellow());
    }

    println!("{} {}", "RANK:".green(), report.rank.to_string().bold().cyan());
    println!("{} {}", "SPECIAL:".green(), format_abilities(&report.abilities).magenta());
    println!("{}", "-".repeat(50).dimmed());

    let stats = &report.stats;
    println!(
        "Repos {:>6}  Stars {:>8}  Followers {:>7}  Age {}y",
        stats.repos, stats.stars, stats.followers, stats.account_age
    );
    println!(
        "Commits {:>4}  PRs {:>10}  Issues {:>10}  Recent {}",
        stats.activity.commits,
        stats.activity.pull_requests,
        stats.activity.issues,
        stats.activity.recent_contributions
    );
    if !report.languages.is_empty() {
        let languages: Vec<String> = report
            .languages
            .iter()
            .map(|l| format!("{} {}%", l.name, l.percentage))
            .collect();
        println!("Languages: {}", languages.join(", "));
    }
    let c = &report.contributions;
    println!(
        "Contributions {} (longest streak {}, current {}, most active {})",
        c.total_contributions, c.longest_streak, c.current_streak, c.most_active_day
    );
    if !report.failures.is_empty() {
        let failed: Vec<&str> = report.failures.iter().map(|f| f.collector.as_str()).collect();
        println!("{} {}", "Partial data, unavailable:".yellow(), failed.join(", "));
    }
    println!("{}", "=".repeat(50).green());
    Ok(())
}
