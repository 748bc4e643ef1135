//! arXiv Atom API version source.

use std::sync::LazyLock;
use std::time::Duration;

use async_trait::async_trait;
use regex::Regex;
use reqwest::Client;
use tracing::{debug, instrument, warn};
use url::Url;

use super::{RemoteError, RemotePaper, VersionSource};
use crate::identifier::{PaperKey, compile_static_regex, parse_identifier};
use crate::user_agent;

/// Default arXiv API query endpoint.
pub const DEFAULT_API_URL: &str = "http://export.arxiv.org/api/query";

const CONNECT_TIMEOUT_SECS: u64 = 10;
const READ_TIMEOUT_SECS: u64 = 30;
const MAX_RESULTS: &str = "5";

static ENTRY_RE: LazyLock<Regex> =
    LazyLock::new(|| compile_static_regex(r"(?s)<entry\b[^>]*>(.*?)</entry>"));

static ENTRY_ID_RE: LazyLock<Regex> =
    LazyLock::new(|| compile_static_regex(r"(?s)<id>\s*([^<]+?)\s*</id>"));

static ENTRY_TITLE_RE: LazyLock<Regex> =
    LazyLock::new(|| compile_static_regex(r"(?s)<title\b[^>]*>(.*?)</title>"));

static AUTHOR_NAME_RE: LazyLock<Regex> =
    LazyLock::new(|| compile_static_regex(r"(?s)<author\b[^>]*>\s*<name>(.*?)</name>"));

/// Looks up the latest version of a paper through the arXiv query API.
#[derive(Clone)]
pub struct ArxivVersionSource {
    client: Client,
    base_url: Url,
}

impl ArxivVersionSource {
    /// Creates a source against [`DEFAULT_API_URL`].
    ///
    /// # Errors
    ///
    /// Returns [`RemoteError::ClientBuild`] if the HTTP client cannot be built.
    pub fn new() -> Result<Self, RemoteError> {
        Self::with_base_url(DEFAULT_API_URL)
    }

    /// Creates a source against a custom endpoint (config override, wiremock).
    ///
    /// # Errors
    ///
    /// Returns [`RemoteError::InvalidBaseUrl`] for an unparsable URL and
    /// [`RemoteError::ClientBuild`] if the HTTP client cannot be built.
    #[tracing::instrument(skip_all, fields(base_url = %base_url.as_ref()))]
    pub fn with_base_url(base_url: impl AsRef<str>) -> Result<Self, RemoteError> {
        let raw = base_url.as_ref();
        let base_url = Url::parse(raw).map_err(|e| RemoteError::InvalidBaseUrl {
            url: raw.to_string(),
            message: e.to_string(),
        })?;

        let client = Client::builder()
            .connect_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS))
            .timeout(Duration::from_secs(READ_TIMEOUT_SECS))
            .gzip(true)
            .user_agent(user_agent::default_user_agent())
            .build()
            .map_err(|e| RemoteError::ClientBuild {
                message: e.to_string(),
            })?;

        Ok(Self { client, base_url })
    }

    fn query_url(&self, key: &PaperKey) -> Url {
        let mut url = self.base_url.clone();
        url.query_pairs_mut()
            .append_pair("id_list", &key.to_string())
            .append_pair("max_results", MAX_RESULTS);
        url
    }
}

impl std::fmt::Debug for ArxivVersionSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ArxivVersionSource")
            .field("base_url", &self.base_url.as_str())
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl VersionSource for ArxivVersionSource {
    #[instrument(skip(self), fields(key = %key))]
    async fn latest_paper(&self, key: &PaperKey) -> Result<Option<RemotePaper>, RemoteError> {
        let url = self.query_url(key);
        debug!(api_url = %url, "Calling arXiv API");

        let request_error = |e: reqwest::Error| RemoteError::Request {
            key: key.to_string(),
            message: e.to_string(),
        };

        let response = self.client.get(url).send().await.map_err(|e| {
            warn!(error = %e, "arXiv API request failed");
            request_error(e)
        })?;

        let status = response.status();
        if !status.is_success() {
            let reason = match status.as_u16() {
                429 | 503 => "arXiv API is throttling requests; raise request_delay_ms".to_string(),
                s if s >= 500 => "arXiv API unavailable. Try again later.".to_string(),
                s => format!("unexpected HTTP {s}"),
            };
            return Err(RemoteError::HttpStatus {
                key: key.to_string(),
                status: status.as_u16(),
                reason,
            });
        }

        let body = response.text().await.map_err(request_error)?;
        let latest = parse_latest_paper(&body, key);
        debug!(latest = ?latest.as_ref().map(|paper| paper.version), "arXiv lookup complete");
        Ok(latest)
    }
}

/// Extracts the highest version of `key` from an Atom feed.
///
/// Each entry's `<id>` (an `/abs/` URL) is run through the identifier parser;
/// entries for other papers, and the feed's own `<id>`, are ignored.
#[must_use]
pub fn parse_latest_version(feed: &str, key: &PaperKey) -> Option<u32> {
    parse_latest_paper(feed, key).map(|paper| paper.version)
}

/// Like [`parse_latest_version`], with the title and authors of the entry
/// carrying that version.
#[must_use]
pub fn parse_latest_paper(feed: &str, key: &PaperKey) -> Option<RemotePaper> {
    ENTRY_RE
        .captures_iter(feed)
        .filter_map(|entry| {
            let body = entry.get(1)?.as_str();
            let id = ENTRY_ID_RE.captures(body)?.get(1)?.as_str();
            let parsed = parse_identifier(id);
            (parsed.identity.key() == *key).then(|| RemotePaper {
                version: parsed.identity.version,
                title: ENTRY_TITLE_RE
                    .captures(body)
                    .and_then(|title| title.get(1))
                    .map(|title| clean_text(title.as_str()))
                    .unwrap_or_default(),
                authors: AUTHOR_NAME_RE
                    .captures_iter(body)
                    .filter_map(|author| author.get(1))
                    .map(|name| clean_text(name.as_str()))
                    .filter(|name| !name.is_empty())
                    .collect::<Vec<_>>()
                    .join(", "),
            })
        })
        .max_by_key(|paper| paper.version)
}

/// Collapses whitespace runs and decodes the predefined XML entities.
fn clean_text(raw: &str) -> String {
    raw.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&apos;", "'")
        .replace("&amp;", "&")
}
