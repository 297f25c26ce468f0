// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Vision classification of product photos
//!
//! This module provides:
//! - The `VisionClassifier` seam used by the search service
//! - A Claude Messages API implementation
//! - Image sniffing and downscaling to stay under the API payload cap

pub mod claude_client;
pub mod classifier;
pub mod image_utils;
pub mod prompt;

pub use claude_client::ClaudeVisionClient;
pub use classifier::{ClassificationError, VisionClassifier};
pub use image_utils::{detect_media_type, prepare_for_upload, ImageError, ImageMediaType};
