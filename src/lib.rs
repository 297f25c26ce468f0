// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
pub mod api;
pub mod config;
pub mod marketplace;
pub mod service;
pub mod version;
pub mod vision;

// Re-export main types
pub use config::{ConfigError, Settings};
pub use marketplace::{
    build_links, Category, ClassificationResult, LinkValidator, MarketplaceId, MarketplaceLink,
    PageFetcher, SearchPhrase,
};
pub use service::{MarketplaceSearchResult, MarketplaceSearchService};
pub use vision::{ClassificationError, ClaudeVisionClient, ImageMediaType, VisionClassifier};
