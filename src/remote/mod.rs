//! Remote "latest version" lookups.
//!
//! The reconciler never talks to the network itself. Callers ask a
//! [`VersionSource`] for the latest published version of a paper and pass
//! the answer (or `None`) into reconciliation. Rate limiting between calls
//! is the caller's job.

mod arxiv;

pub use arxiv::{ArxivVersionSource, DEFAULT_API_URL, parse_latest_paper, parse_latest_version};

use async_trait::async_trait;
use thiserror::Error;

use crate::identifier::PaperKey;

/// Errors from remote version lookups.
#[derive(Debug, Clone, Error)]
pub enum RemoteError {
    /// The HTTP client could not be built.
    #[error("HTTP client construction failed: {message}")]
    ClientBuild {
        /// Builder error text.
        message: String,
    },

    /// The configured API URL is not a valid URL.
    #[error("invalid API URL '{url}': {message}\n  Suggestion: Check api_base_url in the config file")]
    InvalidBaseUrl {
        /// Offending URL.
        url: String,
        /// Parse error text.
        message: String,
    },

    /// The request could not be sent or its body not read.
    #[error("request for {key} failed: {message}\n  Suggestion: Check your network connection")]
    Request {
        /// Paper key being looked up.
        key: String,
        /// Transport error text.
        message: String,
    },

    /// The API answered with a non-success status.
    #[error("API returned HTTP {status} for {key}: {reason}")]
    HttpStatus {
        /// Paper key being looked up.
        key: String,
        /// HTTP status code.
        status: u16,
        /// Human-readable reason.
        reason: String,
    },
}

/// Newest remote record of a paper.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemotePaper {
    /// Highest published version.
    pub version: u32,
    /// Title with whitespace collapsed; empty when the feed has none.
    pub title: String,
    /// Author names joined with `", "`.
    pub authors: String,
}

/// Source of "latest published version" answers.
#[async_trait]
pub trait VersionSource: Send + Sync {
    /// Returns the newest record the remote has for `key`, or `None` if the
    /// remote has no record of it.
    async fn latest_paper(&self, key: &PaperKey) -> Result<Option<RemotePaper>, RemoteError>;

    /// Returns the highest version the remote knows for `key`.
    async fn latest_version(&self, key: &PaperKey) -> Result<Option<u32>, RemoteError> {
        Ok(self.latest_paper(key).await?.map(|paper| paper.version))
    }
}
