// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Service settings
//!
//! Loaded once at startup from the environment (after `.env`), then held
//! immutably and passed to the components that need it.

use std::env;
use std::time::Duration;
use thiserror::Error;
use url::Url;

use crate::marketplace::{DEFAULT_MAX_LINKS, DEFAULT_VALIDATION_TIMEOUT};
use crate::vision::claude_client::{DEFAULT_BASE_URL, DEFAULT_MODEL};

/// Upper bound for `MAX_UPLOAD_SIZE_MB`; uploads are buffered in memory
pub const MAX_UPLOAD_SIZE_MB_LIMIT: u64 = 1024;

/// Configuration errors
#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),

    #[error("Invalid setting {field}: {message}")]
    Invalid {
        field: &'static str,
        message: String,
    },
}

/// Application settings
#[derive(Debug, Clone)]
pub struct Settings {
    /// Anthropic API key (required)
    pub anthropic_api_key: String,
    /// Claude model used for image analysis
    pub claude_model: String,
    /// Anthropic API base URL
    pub anthropic_base_url: String,
    /// Maximum upload size in megabytes (default: 10)
    pub max_upload_size_mb: u64,
    /// Accepted file extensions, lower-case with leading dot
    pub allowed_extensions: Vec<String>,
    /// Vision API timeout in seconds (default: 30)
    pub vision_api_timeout_secs: u64,
    /// Maximum uploads processed at once (default: 10)
    pub max_concurrent_uploads: usize,
    /// Filter out marketplace links whose search has no results (default: true)
    pub link_validation_enabled: bool,
    /// Per-link validation timeout in seconds (default: 3)
    pub link_validation_timeout_secs: u64,
    /// Maximum links per response (default: 5)
    pub max_links: usize,
    /// Listen host (default: 0.0.0.0)
    pub host: String,
    /// Listen port (default: 8000)
    pub port: u16,
}

fn default_extensions() -> Vec<String> {
    [".jpg", ".jpeg", ".png", ".webp"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

/// Boolean env value; unrecognized strings yield `None`
fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_lowercase().as_str() {
        "true" | "1" | "yes" | "y" | "on" | "t" => Some(true),
        "false" | "0" | "no" | "n" | "off" | "f" => Some(false),
        _ => None,
    }
}

fn parse_extensions(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().to_lowercase())
        .filter(|s| !s.is_empty())
        .map(|s| if s.starts_with('.') { s } else { format!(".{}", s) })
        .collect()
}

impl Settings {
    /// Load settings from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load settings from an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let anthropic_api_key = lookup("ANTHROPIC_API_KEY")
            .filter(|v| !v.trim().is_empty())
            .ok_or(ConfigError::Missing("ANTHROPIC_API_KEY"))?;

        let settings = Self {
            anthropic_api_key,
            claude_model: lookup("CLAUDE_MODEL").unwrap_or(defaults.claude_model),
            anthropic_base_url: lookup("ANTHROPIC_BASE_URL")
                .unwrap_or(defaults.anthropic_base_url),
            max_upload_size_mb: lookup("MAX_UPLOAD_SIZE_MB")
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.max_upload_size_mb),
            allowed_extensions: lookup("ALLOWED_EXTENSIONS")
                .map(|v| parse_extensions(&v))
                .unwrap_or(defaults.allowed_extensions),
            vision_api_timeout_secs: lookup("VISION_API_TIMEOUT")
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.vision_api_timeout_secs),
            max_concurrent_uploads: lookup("MAX_CONCURRENT_UPLOADS")
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.max_concurrent_uploads),
            link_validation_enabled: lookup("LINK_VALIDATION_ENABLED")
                .and_then(|v| parse_bool(&v))
                .unwrap_or(defaults.link_validation_enabled),
            link_validation_timeout_secs: lookup("LINK_VALIDATION_TIMEOUT")
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.link_validation_timeout_secs),
            max_links: lookup("MAX_LINKS")
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.max_links),
            host: lookup("API_HOST").unwrap_or(defaults.host),
            port: lookup("API_PORT")
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.port),
        };

        settings.validate()?;
        Ok(settings)
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), ConfigError> {
        match Url::parse(&self.anthropic_base_url) {
            Ok(url) if url.scheme() == "http" || url.scheme() == "https" => {}
            Ok(url) => {
                return Err(ConfigError::Invalid {
                    field: "anthropic_base_url",
                    message: format!("unsupported scheme: {}", url.scheme()),
                })
            }
            Err(e) => {
                return Err(ConfigError::Invalid {
                    field: "anthropic_base_url",
                    message: e.to_string(),
                })
            }
        }
        if self.max_upload_size_mb == 0 || self.max_upload_size_mb > MAX_UPLOAD_SIZE_MB_LIMIT {
            return Err(ConfigError::Invalid {
                field: "max_upload_size_mb",
                message: format!("must be between 1 and {}", MAX_UPLOAD_SIZE_MB_LIMIT),
            });
        }
        if self.allowed_extensions.is_empty() {
            return Err(ConfigError::Invalid {
                field: "allowed_extensions",
                message: "at least one extension is required".to_string(),
            });
        }
        if self.vision_api_timeout_secs == 0 {
            return Err(ConfigError::Invalid {
                field: "vision_api_timeout_secs",
                message: "must be at least 1".to_string(),
            });
        }
        if self.max_concurrent_uploads == 0 {
            return Err(ConfigError::Invalid {
                field: "max_concurrent_uploads",
                message: "must be at least 1".to_string(),
            });
        }
        if self.link_validation_timeout_secs == 0 {
            return Err(ConfigError::Invalid {
                field: "link_validation_timeout_secs",
                message: "must be at least 1".to_string(),
            });
        }
        if self.max_links == 0 {
            return Err(ConfigError::Invalid {
                field: "max_links",
                message: "must be at least 1".to_string(),
            });
        }
        Ok(())
    }

    pub fn max_upload_bytes(&self) -> usize {
        usize::try_from(self.max_upload_size_mb)
            .unwrap_or(usize::MAX)
            .saturating_mul(1024 * 1024)
    }

    pub fn vision_api_timeout(&self) -> Duration {
        Duration::from_secs(self.vision_api_timeout_secs)
    }

    pub fn link_validation_timeout(&self) -> Duration {
        Duration::from_secs(self.link_validation_timeout_secs)
    }

    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            anthropic_api_key: String::new(),
            claude_model: DEFAULT_MODEL.to_string(),
            anthropic_base_url: DEFAULT_BASE_URL.to_string(),
            max_upload_size_mb: 10,
            allowed_extensions: default_extensions(),
            vision_api_timeout_secs: 30,
            max_concurrent_uploads: 10,
            link_validation_enabled: true,
            link_validation_timeout_secs: DEFAULT_VALIDATION_TIMEOUT.as_secs(),
            max_links: DEFAULT_MAX_LINKS,
            host: "0.0.0.0".to_string(),
            port: 8000,
        }
    }
}
