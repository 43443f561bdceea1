// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! funcy
//!
//! Serves registered functions over stdin/stdout, one JSON request per line.

use std::sync::Arc;

use funcy_core::{Config, Engine, Registry};
use tokio::io::{BufReader, stdin, stdout};
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    // Initialize tracing; stdout carries responses only
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("funcy_core=info".parse()?)
                .add_directive("funcy_cli=info".parse()?),
        )
        .init();

    let config = Config::from_env()?;
    info!(
        coercion = config.coercion.as_str(),
        max_record_depth = config.max_record_depth,
        max_in_flight = config.max_in_flight,
        "Starting funcy"
    );

    let registry = Arc::new(Registry::new());
    registry.load_modules();

    let engine = Arc::new(Engine::with_options(registry, config.coercion_options()));

    let served = funcy_cli::runner::run(
        engine,
        BufReader::new(stdin()),
        stdout(),
        config.max_in_flight,
    )
    .await?;

    info!(served, "Input exhausted, shutting down");
    Ok(())
}
