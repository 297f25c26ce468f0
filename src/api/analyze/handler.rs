// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Analyze endpoint handler

use axum::body::Bytes;
use axum::http::{header::CONTENT_LENGTH, HeaderMap, StatusCode};
use axum::{extract::State, Json};
use axum_extra::extract::multipart::MultipartError;
use axum_extra::extract::Multipart;
use tracing::{debug, info};
use uuid::Uuid;

use super::response::MarketplaceSearchResponse;
use super::upload::{file_too_large, validate_upload};
use crate::api::errors::ApiError;
use crate::api::http_server::AppState;
use crate::config::Settings;

/// Multipart field carrying the image
const FILE_FIELD: &str = "file";

/// POST /api/analyze - Turn a product photo into marketplace search links
///
/// # Request
/// `multipart/form-data` with a `file` field (JPG, JPEG, PNG or WebP)
///
/// # Response
/// - `analysis`: category, description, search phrases, confidence
/// - `marketplace_links`: at least one marketplace search link
/// - `processing_time_seconds`: total time taken
///
/// # Errors
/// - 400 Bad Request: missing, empty, oversized or non-image upload
/// - 503 Service Unavailable: image analysis failed
/// - 500 Internal Server Error: no link could be produced
pub async fn analyze_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    multipart: Multipart,
) -> Result<Json<MarketplaceSearchResponse>, ApiError> {
    let request_id = Uuid::new_v4().to_string();

    let content_length = headers
        .get(CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse::<u64>().ok());

    let (filename, bytes) = read_file_field(multipart, content_length, &state.settings).await?;
    debug!(
        "[{}] Upload received: {:?} ({} bytes)",
        request_id,
        filename,
        bytes.len()
    );

    let media_type = validate_upload(filename.as_deref(), &bytes, &state.settings)?;

    let result = state.search_service.search(&bytes, media_type).await?;

    if result.marketplace_links.is_empty() {
        return Err(ApiError::RoutingError(
            "no marketplace links produced".to_string(),
        ));
    }

    info!(
        "[{}] Analysis complete in {:.2}s: {} -> {} links",
        request_id,
        result.processing_time_seconds,
        result.analysis.object_type,
        result.marketplace_links.len()
    );

    Ok(Json(MarketplaceSearchResponse::new(request_id, result)))
}

/// Map a multipart read error; hitting the body limit counts as an oversized file
fn multipart_error(
    e: MultipartError,
    context: &str,
    content_length: Option<u64>,
    settings: &Settings,
) -> ApiError {
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        return file_too_large(content_length, settings);
    }
    ApiError::ValidationError(format!("{}: {}", context, e))
}

/// Pull the `file` field out of the form
async fn read_file_field(
    mut multipart: Multipart,
    content_length: Option<u64>,
    settings: &Settings,
) -> Result<(Option<String>, Bytes), ApiError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| multipart_error(e, "Invalid multipart body", content_length, settings))?
    {
        if field.name() != Some(FILE_FIELD) {
            continue;
        }

        let filename = field.file_name().map(str::to_string);
        let bytes = field
            .bytes()
            .await
            .map_err(|e| multipart_error(e, "Failed to read upload", content_length, settings))?;
        return Ok((filename, bytes));
    }

    Err(ApiError::ValidationError(
        "Missing 'file' field in upload".to_string(),
    ))
}
