// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{error, warn};

use crate::vision::ClassificationError;

/// Message shown to clients when the vision API fails
pub const VISION_FAILURE_MESSAGE: &str = "Image analysis failed. Please try again later.";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ErrorResponse {
    pub detail: String,
    pub error_type: String,
}

#[derive(Debug, Clone)]
pub enum ApiError {
    /// Uploaded image rejected
    ValidationError(String),
    /// Vision classifier failed; the cause is logged, not returned
    VisionApiError(String),
    /// Marketplace links could not be produced
    RoutingError(String),
    InternalError(String),
}

impl ApiError {
    pub fn to_response(&self) -> ErrorResponse {
        let (error_type, detail) = match self {
            ApiError::ValidationError(msg) => ("validation_error", msg.clone()),
            ApiError::VisionApiError(_) => ("api_error", VISION_FAILURE_MESSAGE.to_string()),
            ApiError::RoutingError(_) => (
                "routing_error",
                "Failed to generate marketplace links.".to_string(),
            ),
            ApiError::InternalError(_) => (
                "internal_error",
                "An unexpected error occurred.".to_string(),
            ),
        };

        ErrorResponse {
            error_type: error_type.to_string(),
            detail,
        }
    }

    pub fn status_code(&self) -> u16 {
        match self {
            ApiError::ValidationError(_) => 400,
            ApiError::VisionApiError(_) => 503,
            ApiError::RoutingError(_) | ApiError::InternalError(_) => 500,
        }
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::ValidationError(msg) => write!(f, "Image validation error: {}", msg),
            ApiError::VisionApiError(msg) => write!(f, "Vision API error: {}", msg),
            ApiError::RoutingError(msg) => write!(f, "Marketplace routing error: {}", msg),
            ApiError::InternalError(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl std::error::Error for ApiError {}

impl From<ClassificationError> for ApiError {
    fn from(e: ClassificationError) -> Self {
        ApiError::VisionApiError(e.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match &self {
            ApiError::ValidationError(_) => warn!("{}", self),
            _ => error!("{}", self),
        }

        let status =
            StatusCode::from_u16(self.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, Json(self.to_response())).into_response()
    }
}
