// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Photo to marketplace search orchestration
//!
//! Classify the image, route the category to a marketplace, build one link per
//! search phrase, then optionally drop links whose searches come back empty.

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;
use tracing::info;

use crate::config::Settings;
use crate::marketplace::{build_links, ClassificationResult, LinkValidator, MarketplaceLink};
use crate::vision::{ClassificationError, ImageMediaType, VisionClassifier};

/// Outcome of a photo search
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarketplaceSearchResult {
    /// Vision analysis of the photo
    pub analysis: ClassificationResult,
    /// Surviving marketplace links, in phrase order
    pub marketplace_links: Vec<MarketplaceLink>,
    /// Wall time of the whole search, rounded to 2 decimals
    pub processing_time_seconds: f64,
}

/// Main search service tying the classifier, link builder and validator together
#[derive(Clone)]
pub struct MarketplaceSearchService {
    classifier: Arc<dyn VisionClassifier>,
    validator: Option<LinkValidator>,
    max_links: usize,
}

impl MarketplaceSearchService {
    /// Create a service; `validator` of `None` disables link validation
    pub fn new(
        classifier: Arc<dyn VisionClassifier>,
        validator: Option<LinkValidator>,
        max_links: usize,
    ) -> Self {
        Self {
            classifier,
            validator,
            max_links: max_links.max(1),
        }
    }

    /// Create a service from settings with the HTTP link validator
    pub fn from_settings(
        classifier: Arc<dyn VisionClassifier>,
        settings: &Settings,
    ) -> anyhow::Result<Self> {
        let validator = if settings.link_validation_enabled {
            Some(LinkValidator::http(settings.link_validation_timeout())?)
        } else {
            None
        };
        Ok(Self::new(classifier, validator, settings.max_links))
    }

    pub fn validation_enabled(&self) -> bool {
        self.validator.is_some()
    }

    /// Run a full search for one image
    ///
    /// Fails only when classification fails; link validation never errors.
    pub async fn search(
        &self,
        image: &[u8],
        media_type: ImageMediaType,
    ) -> Result<MarketplaceSearchResult, ClassificationError> {
        let start = Instant::now();

        let analysis = self.classifier.classify(image, media_type).await?;

        let mut links = build_links(&analysis, self.max_links);

        if let Some(validator) = &self.validator {
            links = validator.validate(&links).await;
        }

        let elapsed = start.elapsed().as_secs_f64();
        info!(
            "Analysis complete in {:.2}s via {}: {} links",
            elapsed,
            self.classifier.name(),
            links.len()
        );

        Ok(MarketplaceSearchResult {
            analysis,
            marketplace_links: links,
            processing_time_seconds: (elapsed * 100.0).round() / 100.0,
        })
    }
}
