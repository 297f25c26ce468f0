// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Analyze endpoint response types

use serde::{Deserialize, Serialize};

use crate::marketplace::{ClassificationResult, MarketplaceLink};
use crate::service::MarketplaceSearchResult;

/// Response from POST /api/analyze
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarketplaceSearchResponse {
    /// Request ID for log correlation
    pub request_id: String,
    /// Vision API analysis results
    pub analysis: ClassificationResult,
    /// Marketplace search links (at least one)
    pub marketplace_links: Vec<MarketplaceLink>,
    /// Total processing time in seconds
    pub processing_time_seconds: f64,
}

impl MarketplaceSearchResponse {
    pub fn new(request_id: String, result: MarketplaceSearchResult) -> Self {
        Self {
            request_id,
            analysis: result.analysis,
            marketplace_links: result.marketplace_links,
            processing_time_seconds: result.processing_time_seconds,
        }
    }
}
