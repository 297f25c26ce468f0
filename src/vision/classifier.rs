// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Vision classifier trait definition

use async_trait::async_trait;
use thiserror::Error;

use super::image_utils::{ImageError, ImageMediaType};
use crate::marketplace::ClassificationResult;

/// Errors that can occur while classifying an image
#[derive(Debug, Error)]
pub enum ClassificationError {
    /// Vision API request timed out
    #[error("Vision API request timed out")]
    Timeout,

    /// Vision API answered with a non-success status
    #[error("Vision API error: {status} - {message}")]
    Api {
        /// HTTP status code
        status: u16,
        /// Error message
        message: String,
    },

    /// Request could not be sent or the response could not be read
    #[error("Vision API transport error: {0}")]
    Transport(String),

    /// Response carried no text block
    #[error("Unexpected response format from API")]
    EmptyResponse,

    /// Response text is not valid classification JSON
    #[error("Invalid JSON response from API: {0}")]
    MalformedJson(String),

    /// Parsed classification violates the result bounds
    #[error("Invalid classification: {0}")]
    InvalidResult(String),

    /// Image could not be prepared for upload
    #[error("Failed to prepare image: {0}")]
    Image(#[from] ImageError),
}

/// Classifies a product photo into a category with search phrases
///
/// Any error is fatal to the current request; implementations do not retry.
#[async_trait]
pub trait VisionClassifier: Send + Sync {
    /// Classify an image
    ///
    /// # Arguments
    /// * `image` - Raw image bytes
    /// * `media_type` - Declared media type of `image`
    async fn classify(
        &self,
        image: &[u8],
        media_type: ImageMediaType,
    ) -> Result<ClassificationResult, ClassificationError>;

    /// Classifier name for logging
    fn name(&self) -> &'static str;
}
