// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Category to marketplace routing and search URL construction
//!
//! Routing is a fixed table: books go to Abebooks.fr, clothing to Vinted,
//! every other category to Leboncoin. The lookup is total.

use tracing::{debug, info};

use super::types::{Category, ClassificationResult, MarketplaceId, MarketplaceLink};

/// Default number of links generated per classification
pub const DEFAULT_MAX_LINKS: usize = 5;

/// Placeholder replaced by the encoded query in URL templates
const QUERY_PLACEHOLDER: &str = "{query}";

/// A marketplace and its search URL template
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MarketplaceRoute {
    pub marketplace: MarketplaceId,
    pub url_template: &'static str,
}

static ROUTES: &[(Category, MarketplaceRoute)] = &[
    (
        Category::Book,
        MarketplaceRoute {
            marketplace: MarketplaceId::Abebooks,
            url_template: "https://www.abebooks.fr/servlet/SearchResults?kn={query}&sts=t",
        },
    ),
    (
        Category::Clothing,
        MarketplaceRoute {
            marketplace: MarketplaceId::Vinted,
            url_template: "https://www.vinted.fr/catalog?search_text={query}",
        },
    ),
];

/// Marketplace for categories without a dedicated route
pub static DEFAULT_ROUTE: MarketplaceRoute = MarketplaceRoute {
    marketplace: MarketplaceId::Leboncoin,
    url_template: "https://www.leboncoin.fr/recherche?text={query}",
};

/// Resolve the marketplace for a category, falling back to [`DEFAULT_ROUTE`]
pub fn route(category: Category) -> &'static MarketplaceRoute {
    ROUTES
        .iter()
        .find(|(c, _)| *c == category)
        .map(|(_, r)| r)
        .unwrap_or(&DEFAULT_ROUTE)
}

/// Percent-encode a search phrase for use inside a URL query value
///
/// Everything outside the unreserved set (`A-Z a-z 0-9 - _ . ~`) is encoded,
/// byte by byte over the UTF-8 representation. Space becomes `%20`.
pub fn encode_query(query: &str) -> String {
    urlencoding::encode(query).into_owned()
}

/// Build a single marketplace link
pub fn build_link(route: &MarketplaceRoute, query: &str) -> MarketplaceLink {
    let url = route
        .url_template
        .replacen(QUERY_PLACEHOLDER, &encode_query(query), 1);

    MarketplaceLink {
        marketplace: route.marketplace,
        query: query.to_string(),
        url,
    }
}

/// Build marketplace search links for a classification
///
/// All links share the marketplace of the classification's category. One link
/// per search phrase, in phrase order, truncated to `max_links` (at least 1).
pub fn build_links(classification: &ClassificationResult, max_links: usize) -> Vec<MarketplaceLink> {
    let route = route(classification.object_type);
    info!(
        "Building links for object type: {} -> {}",
        classification.object_type, route.marketplace
    );

    let links: Vec<MarketplaceLink> = classification
        .search_queries
        .iter()
        .take(max_links.max(1))
        .map(|phrase| {
            let link = build_link(route, &phrase.query);
            debug!("Generated link: {}", link.url);
            link
        })
        .collect();

    info!(
        "Generated {} marketplace links for {}",
        links.len(),
        route.marketplace
    );
    links
}
