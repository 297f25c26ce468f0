// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Marketplace routing and link validation
//!
//! ```text
//! ClassificationResult → build_links → [MarketplaceLink] → LinkValidator → [MarketplaceLink]
//!                                                              ↓
//!                                                 PageFetcher (one GET per link)
//! ```

pub mod detection;
pub mod routing;
pub mod types;
pub mod validator;

pub use detection::{evaluate_page, page_has_results, rules_for, DetectionRules, PageVerdict};
pub use routing::{build_link, build_links, encode_query, route, MarketplaceRoute, DEFAULT_MAX_LINKS};
pub use types::{Category, ClassificationResult, MarketplaceId, MarketplaceLink, SearchPhrase};
pub use validator::{
    FetchError, HttpPageFetcher, LinkCheck, LinkOutcome, LinkValidator, PageFetcher,
    DEFAULT_VALIDATION_TIMEOUT,
};
