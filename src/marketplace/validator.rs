// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Marketplace link validation
//!
//! Fetches every candidate link in parallel and drops the ones whose result
//! page shows no results. Validation fails open: a link whose page cannot be
//! fetched or judged is kept. At least one link always survives.

use async_trait::async_trait;
use futures::future::join_all;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE};
use reqwest::Client;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info, warn};

use super::detection::{evaluate_page, rules_for, PageVerdict};
use super::types::MarketplaceLink;

const USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36";
const ACCEPT_HTML: &str = "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8";
const ACCEPT_LANGUAGE_FR: &str = "fr-FR,fr;q=0.9,en;q=0.8";

/// Default per-link validation timeout
pub const DEFAULT_VALIDATION_TIMEOUT: Duration = Duration::from_secs(3);

/// Page fetch error types
#[derive(Debug, Clone, Error)]
pub enum FetchError {
    #[error("Timeout fetching: {0}")]
    Timeout(String),

    #[error("HTTP error: {0}")]
    Http(String),

    #[error("HTTP {0} for: {1}")]
    Status(u16, String),

    #[error("Failed to read body of {0}: {1}")]
    Body(String, String),
}

/// Fetches the text of a web page
#[async_trait]
pub trait PageFetcher: Send + Sync {
    /// GET `url` and return the response body, failing on non-2xx statuses
    async fn fetch(&self, url: &str, timeout: Duration) -> Result<String, FetchError>;
}

/// [`PageFetcher`] backed by reqwest with browser-like headers
pub struct HttpPageFetcher {
    client: Client,
}

impl HttpPageFetcher {
    pub fn new() -> anyhow::Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static(ACCEPT_HTML));
        headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static(ACCEPT_LANGUAGE_FR));

        let client = Client::builder()
            .user_agent(USER_AGENT)
            .default_headers(headers)
            .redirect(reqwest::redirect::Policy::limited(5))
            .build()?;

        Ok(Self { client })
    }
}

#[async_trait]
impl PageFetcher for HttpPageFetcher {
    async fn fetch(&self, url: &str, timeout: Duration) -> Result<String, FetchError> {
        debug!("Fetching result page: {}", url);

        let response = self
            .client
            .get(url)
            .timeout(timeout)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    FetchError::Timeout(url.to_string())
                } else {
                    FetchError::Http(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status(status.as_u16(), url.to_string()));
        }

        response.text().await.map_err(|e| {
            if e.is_timeout() {
                FetchError::Timeout(url.to_string())
            } else {
                FetchError::Body(url.to_string(), e.to_string())
            }
        })
    }
}

/// How a single link check ended
#[derive(Debug, Clone)]
pub enum LinkOutcome {
    /// Page fetched and classified
    Checked(PageVerdict),
    /// Fetch failed; link kept
    FetchFailed(FetchError),
}

/// Result of checking one link
#[derive(Debug, Clone)]
pub struct LinkCheck {
    pub link: MarketplaceLink,
    pub has_results: bool,
    pub outcome: LinkOutcome,
}

/// Filters marketplace links down to those whose searches return results
#[derive(Clone)]
pub struct LinkValidator {
    fetcher: Arc<dyn PageFetcher>,
    timeout: Duration,
}

impl LinkValidator {
    pub fn new(fetcher: Arc<dyn PageFetcher>, timeout: Duration) -> Self {
        Self { fetcher, timeout }
    }

    /// Validator using a real HTTP fetcher
    pub fn http(timeout: Duration) -> anyhow::Result<Self> {
        Ok(Self::new(Arc::new(HttpPageFetcher::new()?), timeout))
    }

    /// Fetch and classify a single link. Never fails: errors count as results.
    pub async fn check_link(&self, link: &MarketplaceLink) -> LinkCheck {
        let fetched = match tokio::time::timeout(
            self.timeout,
            self.fetcher.fetch(&link.url, self.timeout),
        )
        .await
        {
            Ok(result) => result,
            Err(_) => Err(FetchError::Timeout(link.url.clone())),
        };

        match fetched {
            Ok(html) => {
                let verdict = evaluate_page(&html, rules_for(link.marketplace));
                let has_results = verdict.has_results();
                info!(
                    "Validated {}: has_results={}",
                    link.marketplace, has_results
                );
                LinkCheck {
                    link: link.clone(),
                    has_results,
                    outcome: LinkOutcome::Checked(verdict),
                }
            }
            Err(e) => {
                match &e {
                    FetchError::Timeout(_) => warn!("Timeout validating {}", link.url),
                    _ => warn!("Error validating {}: {}", link.url, e),
                }
                LinkCheck {
                    link: link.clone(),
                    has_results: true,
                    outcome: LinkOutcome::FetchFailed(e),
                }
            }
        }
    }

    /// Validate links in parallel, keeping those with results in their original order
    ///
    /// Returns an empty list only for empty input. If every link is filtered
    /// out, the first input link is returned alone.
    pub async fn validate(&self, links: &[MarketplaceLink]) -> Vec<MarketplaceLink> {
        if links.is_empty() {
            return Vec::new();
        }

        info!("Validating {} marketplace links...", links.len());

        let checks = join_all(links.iter().map(|link| self.check_link(link))).await;

        let mut valid: Vec<MarketplaceLink> = checks
            .into_iter()
            .filter(|check| check.has_results)
            .map(|check| check.link)
            .collect();

        if valid.is_empty() {
            warn!("No valid links found, returning first link as fallback");
            valid.push(links[0].clone());
        }

        info!(
            "Validation complete: {}/{} links valid",
            valid.len(),
            links.len()
        );
        valid
    }
}
