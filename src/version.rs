// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
// Version information for the Photo to Marketplace Search service

/// Full version string with feature description
pub const VERSION: &str = "v1.0.0-link-validation-2026-10-17";

/// Semantic version number
pub const VERSION_NUMBER: &str = "1.0.0";

/// Build date
pub const BUILD_DATE: &str = "2026-10-17";

/// Supported features in this version
pub const FEATURES: &[&str] = &[
    "claude-vision",
    "abebooks",
    "vinted",
    "leboncoin",
    "link-validation",
    "image-downscaling",
];

/// Get formatted version string for logging
pub fn get_version_string() -> String {
    format!(
        "Photo to Marketplace Search {} ({})",
        VERSION_NUMBER, BUILD_DATE
    )
}
