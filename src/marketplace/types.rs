// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Core types shared by link building, link validation and the vision classifier

use serde::{Deserialize, Serialize};
use std::fmt;

/// Maximum length of a single search phrase, in characters
pub const MAX_QUERY_CHARS: usize = 200;

/// Maximum number of search phrases a classification may carry
pub const MAX_SEARCH_QUERIES: usize = 3;

fn default_query_confidence() -> f32 {
    0.8
}

/// Object category detected by the vision classifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Book,
    Clothing,
    Electronics,
    Furniture,
    Tools,
    General,
}

impl Category {
    pub const ALL: [Category; 6] = [
        Category::Book,
        Category::Clothing,
        Category::Electronics,
        Category::Furniture,
        Category::Tools,
        Category::General,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Book => "book",
            Category::Clothing => "clothing",
            Category::Electronics => "electronics",
            Category::Furniture => "furniture",
            Category::Tools => "tools",
            Category::General => "general",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Target marketplace for generated search links
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MarketplaceId {
    /// Abebooks.fr (books)
    Abebooks,
    /// Vinted (clothing)
    Vinted,
    /// Leboncoin (everything else)
    Leboncoin,
}

impl MarketplaceId {
    pub fn as_str(&self) -> &'static str {
        match self {
            MarketplaceId::Abebooks => "abebooks",
            MarketplaceId::Vinted => "vinted",
            MarketplaceId::Leboncoin => "leboncoin",
        }
    }
}

impl fmt::Display for MarketplaceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A search phrase generated from the image, ranked by relevance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchPhrase {
    /// Search query text (French)
    pub query: String,
    /// Confidence for this phrase (0.0-1.0)
    #[serde(default = "default_query_confidence")]
    pub confidence: f32,
}

impl SearchPhrase {
    pub fn new(query: impl Into<String>, confidence: f32) -> Self {
        Self {
            query: query.into(),
            confidence,
        }
    }
}

/// Structured output of the vision classifier
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassificationResult {
    /// Detected category, drives marketplace routing
    pub object_type: Category,
    /// Short description of the detected object
    pub description: String,
    /// 1-3 search phrases, most relevant first
    pub search_queries: Vec<SearchPhrase>,
    /// Overall confidence (0.0-1.0)
    pub confidence: f32,
}

impl ClassificationResult {
    /// Check the bounds the classifier contract promises
    pub fn validate(&self) -> Result<(), String> {
        if self.description.trim().is_empty() {
            return Err("description must not be empty".to_string());
        }
        if self.search_queries.is_empty() || self.search_queries.len() > MAX_SEARCH_QUERIES {
            return Err(format!(
                "expected 1-{} search queries, got {}",
                MAX_SEARCH_QUERIES,
                self.search_queries.len()
            ));
        }
        if !(0.0..=1.0).contains(&self.confidence) {
            return Err(format!("confidence out of range: {}", self.confidence));
        }
        for phrase in &self.search_queries {
            let chars = phrase.query.chars().count();
            if chars == 0 || chars > MAX_QUERY_CHARS {
                return Err(format!(
                    "search query must be 1-{} characters, got {}",
                    MAX_QUERY_CHARS, chars
                ));
            }
            if !(0.0..=1.0).contains(&phrase.confidence) {
                return Err(format!(
                    "query confidence out of range: {}",
                    phrase.confidence
                ));
            }
        }
        Ok(())
    }
}

/// A marketplace search link built from one search phrase
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarketplaceLink {
    /// Target marketplace
    pub marketplace: MarketplaceId,
    /// Original (unencoded) search phrase
    pub query: String,
    /// Full search URL
    pub url: String,
}
