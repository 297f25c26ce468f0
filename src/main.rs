// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use anyhow::{Context, Result};
use clap::Parser;
use photo_market_search::{
    api::{start_server, AppState},
    config::Settings,
    service::MarketplaceSearchService,
    version,
    vision::ClaudeVisionClient,
};
use std::{env, sync::Arc};

/// Photo to Marketplace Search API server
#[derive(Parser, Debug)]
#[command(name = "photo-market-search")]
#[command(version = version::VERSION_NUMBER)]
#[command(about = "Turns a product photo into marketplace search links", long_about = None)]
struct Args {
    /// Override API_HOST
    #[arg(long)]
    host: Option<String>,

    /// Override API_PORT
    #[arg(long)]
    port: Option<u16>,

    /// Disable link validation regardless of LINK_VALIDATION_ENABLED
    #[arg(long)]
    no_validation: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();

    if env::var("RUST_LOG").is_err() {
        env::set_var("RUST_LOG", "info");
    }
    tracing_subscriber::fmt::init();

    let args = Args::parse();

    tracing::info!("Starting {}", version::get_version_string());

    let mut settings = Settings::from_env().context("Invalid configuration")?;
    if let Some(host) = args.host {
        settings.host = host;
    }
    if let Some(port) = args.port {
        settings.port = port;
    }
    if args.no_validation {
        settings.link_validation_enabled = false;
    }

    let classifier = ClaudeVisionClient::with_base_url(
        &settings.anthropic_api_key,
        &settings.claude_model,
        settings.vision_api_timeout(),
        &settings.anthropic_base_url,
    )?;
    tracing::info!("Vision model: {}", classifier.model());

    let service = MarketplaceSearchService::from_settings(Arc::new(classifier), &settings)?;
    tracing::info!(
        "Link validation: {} (timeout {:?}, max {} links)",
        if service.validation_enabled() { "enabled" } else { "disabled" },
        settings.link_validation_timeout(),
        settings.max_links
    );

    start_server(AppState::new(service, settings)).await
}
