//! Core types, configuration, and error handling for the Heimdall platform.
//!
//! This crate provides the shared foundation used by all other Heimdall
//! crates:
//! - [`HeimdallError`] — unified error type using `thiserror`
//! - [`HeimdallConfig`] — process configuration loaded from `heimdall.toml`
//! - [`PullRequestSnapshot`] / [`SnapshotFile`] — the immutable per-review
//!   view of a pull request
//! - [`Metrics`] — explicitly-passed in-process metrics handle

mod config;
mod error;
mod metrics;
mod types;

pub use config::{AiConfig, GithubConfig, HeimdallConfig, ProviderSettings, ServerConfig};
pub use error::HeimdallError;
pub use metrics::{Metrics, MetricsSnapshot};
pub use types::{PullRequestSnapshot, SnapshotFile};

/// A convenience `Result` type for Heimdall operations.
pub type Result<T> = std::result::Result<T, HeimdallError>;
