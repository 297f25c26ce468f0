// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Image sniffing and payload preparation for the vision API

use base64::{engine::general_purpose::STANDARD, Engine as _};
use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::{DynamicImage, ImageFormat};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::io::Cursor;
use thiserror::Error;
use tracing::{info, warn};

/// Base64 payload cap for a single image (the API limit is 5MB; keep a buffer)
pub const MAX_BASE64_SIZE: usize = 4 * 1024 * 1024;

/// Re-encoding quality for lossy formats
const RESIZE_QUALITY: u8 = 85;

/// Extra shrink passes when a re-encoded image is still over the cap
const MAX_RESIZE_ATTEMPTS: usize = 6;

/// Per-pass dimension factor after the first resize
const SHRINK_STEP: f64 = 0.75;

/// Custom error types for image processing
#[derive(Debug, Error)]
pub enum ImageError {
    #[error("Unsupported image format")]
    UnsupportedFormat,

    #[error("Image data is empty")]
    EmptyData,

    #[error("Failed to decode image: {0}")]
    DecodeFailed(String),

    #[error("Failed to encode image: {0}")]
    EncodeFailed(String),

    #[error("Image still too large after resizing: {0} bytes base64")]
    TooLarge(usize),
}

/// Image media types accepted by the vision API
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ImageMediaType {
    #[serde(rename = "image/jpeg")]
    Jpeg,
    #[serde(rename = "image/png")]
    Png,
    #[serde(rename = "image/webp")]
    Webp,
    #[serde(rename = "image/gif")]
    Gif,
}

impl ImageMediaType {
    /// MIME type string
    pub fn as_str(&self) -> &'static str {
        match self {
            ImageMediaType::Jpeg => "image/jpeg",
            ImageMediaType::Png => "image/png",
            ImageMediaType::Webp => "image/webp",
            ImageMediaType::Gif => "image/gif",
        }
    }

    pub fn image_format(&self) -> ImageFormat {
        match self {
            ImageMediaType::Jpeg => ImageFormat::Jpeg,
            ImageMediaType::Png => ImageFormat::Png,
            ImageMediaType::Webp => ImageFormat::WebP,
            ImageMediaType::Gif => ImageFormat::Gif,
        }
    }
}

impl fmt::Display for ImageMediaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Detect the media type from the file signature
pub fn detect_media_type(bytes: &[u8]) -> Result<ImageMediaType, ImageError> {
    if bytes.is_empty() {
        return Err(ImageError::EmptyData);
    }

    match bytes {
        // JPEG: FF D8 FF
        [0xFF, 0xD8, 0xFF, ..] => Ok(ImageMediaType::Jpeg),

        // PNG: 89 50 4E 47 0D 0A 1A 0A
        [0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, ..] => Ok(ImageMediaType::Png),

        // WebP: RIFF .... WEBP
        [0x52, 0x49, 0x46, 0x46, _, _, _, _, 0x57, 0x45, 0x42, 0x50, ..] => {
            Ok(ImageMediaType::Webp)
        }

        // GIF: GIF87a or GIF89a
        [0x47, 0x49, 0x46, 0x38, x, 0x61, ..] if *x == 0x37 || *x == 0x39 => {
            Ok(ImageMediaType::Gif)
        }

        _ => Err(ImageError::UnsupportedFormat),
    }
}

/// Length of the standard base64 encoding of `len` bytes
pub fn base64_len(len: usize) -> usize {
    len.div_ceil(3) * 4
}

/// Base64-encode image bytes for the API payload
pub fn encode_base64(bytes: &[u8]) -> String {
    STANDARD.encode(bytes)
}

/// Downscale an image when its base64 form would exceed [`MAX_BASE64_SIZE`]
///
/// Images under the cap are returned untouched. Larger ones are scaled by
/// `sqrt(target_raw / current_raw)` and re-encoded in their own format. The
/// encoded size is checked again since lossless encoders (PNG, and WebP in
/// `image` 0.25) can land above the estimate.
pub fn prepare_for_upload(bytes: Vec<u8>, media_type: ImageMediaType) -> Result<Vec<u8>, ImageError> {
    let encoded_size = base64_len(bytes.len());
    if encoded_size <= MAX_BASE64_SIZE {
        return Ok(bytes);
    }

    info!("Image too large ({} bytes base64), resizing...", encoded_size);

    let img = image::load_from_memory_with_format(&bytes, media_type.image_format())
        .map_err(|e| ImageError::DecodeFailed(e.to_string()))?;

    let target_raw_size = MAX_BASE64_SIZE as f64 * 0.75;
    let scale = (target_raw_size / bytes.len() as f64).sqrt();
    let new_width = ((img.width() as f64 * scale) as u32).max(1);
    let new_height = ((img.height() as f64 * scale) as u32).max(1);

    shrink_to_fit(&img, new_width, new_height, media_type, MAX_BASE64_SIZE)
}

/// Resize and re-encode until the base64 payload fits `max_base64`
fn shrink_to_fit(
    img: &DynamicImage,
    mut width: u32,
    mut height: u32,
    media_type: ImageMediaType,
    max_base64: usize,
) -> Result<Vec<u8>, ImageError> {
    let mut encoded_size = 0;

    for _ in 0..MAX_RESIZE_ATTEMPTS {
        let resized = img.resize_exact(width, height, FilterType::Lanczos3);
        let encoded = encode_image(resized, media_type)?;
        encoded_size = base64_len(encoded.len());

        if encoded_size <= max_base64 {
            info!(
                "Resized from {}x{} to {}x{}",
                img.width(),
                img.height(),
                width,
                height
            );
            return Ok(encoded);
        }

        warn!(
            "Re-encoded {}x{} image still too large ({} bytes base64)",
            width, height, encoded_size
        );
        width = ((width as f64 * SHRINK_STEP) as u32).max(1);
        height = ((height as f64 * SHRINK_STEP) as u32).max(1);
    }

    Err(ImageError::TooLarge(encoded_size))
}

fn encode_image(img: DynamicImage, media_type: ImageMediaType) -> Result<Vec<u8>, ImageError> {
    let mut output = Cursor::new(Vec::new());

    match media_type {
        ImageMediaType::Jpeg => {
            // JPEG has no alpha channel
            let rgb = DynamicImage::ImageRgb8(img.to_rgb8());
            let encoder = JpegEncoder::new_with_quality(&mut output, RESIZE_QUALITY);
            rgb.write_with_encoder(encoder)
                .map_err(|e| ImageError::EncodeFailed(e.to_string()))?;
        }
        other => {
            img.write_to(&mut output, other.image_format())
                .map_err(|e| ImageError::EncodeFailed(e.to_string()))?;
        }
    }

    Ok(output.into_inner())
}
