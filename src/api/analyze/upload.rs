// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Uploaded image validation

use std::path::Path;

use crate::api::errors::ApiError;
use crate::config::Settings;
use crate::vision::{detect_media_type, ImageMediaType};

const BYTES_PER_MB: f64 = 1024.0 * 1024.0;

/// Lower-case extension of a file name, with leading dot (empty if none)
pub fn file_extension(filename: &str) -> String {
    Path::new(filename)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| format!(".{}", e.to_lowercase()))
        .unwrap_or_default()
}

/// "File too large" rejection; `size` is unknown when the body limit cut the upload short
pub fn file_too_large(size: Option<u64>, settings: &Settings) -> ApiError {
    let detail = match size {
        Some(size) => format!(
            "File too large: {:.1}MB (max {}MB)",
            size as f64 / BYTES_PER_MB,
            settings.max_upload_size_mb
        ),
        None => format!(
            "File too large: over {}MB (max {}MB)",
            settings.max_upload_size_mb, settings.max_upload_size_mb
        ),
    };
    ApiError::ValidationError(detail)
}

/// Validate an uploaded image and return its sniffed media type
///
/// Checks, in order: size limit, non-empty, filename present, extension allowed,
/// file signature is a supported image.
pub fn validate_upload(
    filename: Option<&str>,
    bytes: &[u8],
    settings: &Settings,
) -> Result<ImageMediaType, ApiError> {
    let size = bytes.len();

    if size > settings.max_upload_bytes() {
        return Err(file_too_large(Some(size as u64), settings));
    }

    if size == 0 {
        return Err(ApiError::ValidationError("Empty file uploaded".to_string()));
    }

    let filename = filename
        .filter(|f| !f.is_empty())
        .ok_or_else(|| ApiError::ValidationError("No filename provided".to_string()))?;

    let ext = file_extension(filename);
    if !settings.allowed_extensions.iter().any(|allowed| *allowed == ext) {
        return Err(ApiError::ValidationError(format!(
            "Invalid file type: {}. Allowed: {}",
            ext,
            settings.allowed_extensions.join(", ")
        )));
    }

    detect_media_type(bytes).map_err(|_| {
        ApiError::ValidationError("File is not a valid image (invalid magic numbers)".to_string())
    })
}
