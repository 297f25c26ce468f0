// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Analyze API endpoint module
//!
//! Provides POST /api/analyze for photo to marketplace search.

pub mod handler;
pub mod response;
pub mod upload;

pub use handler::analyze_handler;
pub use response::MarketplaceSearchResponse;
pub use upload::validate_upload;
