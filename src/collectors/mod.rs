//! One async collector per data facet. Each returns its own `Result`; the
//! aggregator decides what a failure falls back to.

pub mod activity;
pub mod contributions;
pub mod languages;
pub mod libraries;
pub mod profile;
pub mod repositories;
pub mod starred;
pub mod tech_stack;
pub mod topics;

use crate::error::ScouterError;
use tracing::{debug, warn};

/// Bounds on how much of an account a scan samples.
#[derive(Debug, Clone)]
pub struct ScanOptions {
    pub max_repo_pages: u32,
    pub repos_per_page: usize,
    pub language_sample_anonymous: usize,
    pub language_sample_authenticated: usize,
    pub tech_stack_sample: usize,
    pub topic_sample: usize,
    pub library_sample: usize,
    pub events_page_size: usize,
    pub starred_page_size: usize,
    pub activity_window_days: i64,
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self {
            max_repo_pages: 3,
            repos_per_page: 100,
            language_sample_anonymous: 10,
            language_sample_authenticated: 30,
            tech_stack_sample: 20,
            topic_sample: 20,
            library_sample: 20,
            events_page_size: 100,
            starred_page_size: 100,
            activity_window_days: 30,
        }
    }
}

/// Logs a per-item failure inside a collector loop. Soft failures (403,
/// 404, rate limit) are expected for some repositories and stay quieter.
pub(crate) fn log_item_failure(collector: &str, item: &str, error: &ScouterError) {
    if error.is_soft_failure() {
        debug!(collector, item, %error, "skipping item");
    } else {
        warn!(collector, item, %error, "item fetch failed");
    }
}
