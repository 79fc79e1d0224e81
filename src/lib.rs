pub mod aggregator;
pub mod auth;
pub mod collectors;
pub mod error;
pub mod github;
pub mod manifest;
pub mod models;
pub mod resume;
pub mod reveal;
pub mod scorer;
pub mod store;
pub mod types;

pub use aggregator::{MultiHandleMode, ScanReport, ScanStage, Scanner};
pub use error::{Result, ScouterError};
pub use github::{GitHubApi, GitHubClient};
