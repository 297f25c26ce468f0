// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Search result detection on marketplace result pages
//!
//! Decides from a page's HTML whether a marketplace search returned anything:
//! 1. a marketplace-specific "no results" phrase in the visible text means no results
//! 2. an element matching the marketplace's result item selector means results
//! 3. anything else is treated as results

use scraper::{Html, Node, Selector};
use tracing::debug;

use super::types::MarketplaceId;

/// Result detection rules for one marketplace
#[derive(Debug, Clone, Copy)]
pub struct DetectionRules {
    /// Lower-case phrases shown on an empty result page
    pub no_results_phrases: &'static [&'static str],
    /// CSS selector list matching individual result items
    pub results_selector: &'static str,
}

static RULES: &[(MarketplaceId, DetectionRules)] = &[
    (
        MarketplaceId::Abebooks,
        DetectionRules {
            // Substring match: "0 résultat" also hits "10 résultats"
            no_results_phrases: &["aucun résultat", "no results found", "0 résultat"],
            results_selector: ".result-item, .cf-search-results-content, #srp-results",
        },
    ),
    (
        MarketplaceId::Vinted,
        DetectionRules {
            no_results_phrases: &["aucun article", "aucun résultat"],
            results_selector: ".feed-grid__item, .ItemBox_container, [data-testid='item-box']",
        },
    ),
    (
        MarketplaceId::Leboncoin,
        DetectionRules {
            no_results_phrases: &["aucune annonce", "0 annonce trouvée", "pas de résultat"],
            results_selector:
                "[data-qa-id='aditem_container'], .styles_adCard, [data-test-id='ad']",
        },
    ),
];

/// Look up the detection rules of a marketplace
pub fn rules_for(marketplace: MarketplaceId) -> Option<&'static DetectionRules> {
    RULES
        .iter()
        .find(|(m, _)| *m == marketplace)
        .map(|(_, rules)| rules)
}

/// Why a page was classified the way it was
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageVerdict {
    /// Visible text contains a "no results" phrase
    NoResultsText(&'static str),
    /// Page contains this many result items
    ResultItems(usize),
    /// Neither signal present; assumed to have results
    NoEvidence,
}

impl PageVerdict {
    pub fn has_results(&self) -> bool {
        !matches!(self, PageVerdict::NoResultsText(_))
    }
}

/// Classify a page against a set of rules (`None` for an unknown marketplace)
pub fn evaluate_page(html: &str, rules: Option<&DetectionRules>) -> PageVerdict {
    let Some(rules) = rules else {
        return PageVerdict::NoEvidence;
    };

    let document = Html::parse_document(html);

    let page_text = visible_text(&document).to_lowercase();
    for phrase in rules.no_results_phrases {
        if page_text.contains(&phrase.to_lowercase()) {
            debug!("Found no-results indicator: '{}'", phrase);
            return PageVerdict::NoResultsText(*phrase);
        }
    }

    if let Ok(selector) = Selector::parse(rules.results_selector) {
        let count = document.select(&selector).count();
        if count > 0 {
            debug!("Found {} result items", count);
            return PageVerdict::ResultItems(count);
        }
    }

    PageVerdict::NoEvidence
}

/// Check whether a marketplace result page shows any results
pub fn page_has_results(html: &str, marketplace: MarketplaceId) -> bool {
    evaluate_page(html, rules_for(marketplace)).has_results()
}

/// Concatenated text nodes of the document, outside script/style, whitespace collapsed
fn visible_text(document: &Html) -> String {
    let mut text = String::new();
    for node in document.tree.nodes() {
        if let Node::Text(t) = node.value() {
            let hidden = node
                .parent()
                .and_then(|p| p.value().as_element())
                .map(|e| matches!(e.name(), "script" | "style" | "noscript" | "template"))
                .unwrap_or(false);
            if !hidden {
                text.push_str(t);
            }
        }
    }
    clean_text(&text)
}

/// Normalize whitespace
fn clean_text(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
