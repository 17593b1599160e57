//! GitHub source-control client for Heimdall.
//!
//! Provides the [`SourceControl`] trait — the narrow contract the review
//! pipeline consumes — and [`GitHubClient`], its REST implementation.

mod client;

pub use client::{ChangedFile, GitHubClient, PullRequestDetails, RateLimit, SourceControl};
