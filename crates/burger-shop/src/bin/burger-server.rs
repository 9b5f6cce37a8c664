//! Burger shop server: chefs cook, connected customers eat.

use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;

use burger_shop::config::{
    DEFAULT_CAPACITY, DEFAULT_NUM_PRODUCERS, DEFAULT_REQUEST_QUOTA, ShopConfig,
};
use burger_shop::transport::tcp::DEFAULT_PORT;
use burger_shop::{Pacing, ServerConfig, serve, telemetry};

#[derive(Parser, Debug)]
#[command(author, version, about = "Serve a bounded batch of burgers to TCP customers")]
struct Args {
    /// Address to bind
    #[arg(long, env = "BURGER_HOST", default_value = "0.0.0.0")]
    host: String,

    /// Port to bind
    #[arg(long, env = "BURGER_PORT", default_value_t = DEFAULT_PORT)]
    port: u16,

    /// Total burgers the shop will make
    #[arg(long, env = "BURGER_CAPACITY", default_value_t = DEFAULT_CAPACITY)]
    capacity: u64,

    /// Number of chefs cooking concurrently
    #[arg(long, env = "BURGER_CHEFS", default_value_t = DEFAULT_NUM_PRODUCERS)]
    chefs: usize,

    /// Burgers a single customer connection may receive
    #[arg(long, env = "BURGER_QUOTA", default_value_t = DEFAULT_REQUEST_QUOTA)]
    quota: u32,

    /// Chef preparation times to pick from, in milliseconds (comma separated)
    #[arg(long, env = "BURGER_PREP_MS", default_value = "2000,4000")]
    prep_ms: Pacing,

    /// Post-serving delays to pick from, in milliseconds (comma separated)
    #[arg(long, env = "BURGER_SERVE_MS", default_value = "1000,3000,5000")]
    serve_ms: Pacing,

    /// Longest a waiting customer parks before re-checking stock, in milliseconds
    #[arg(long, env = "BURGER_WAKE_TIMEOUT_MS", default_value_t = 5000)]
    wake_timeout_ms: u64,
}

#[tokio::main]
async fn main() -> Result<()> {
    telemetry::init_tracing();

    let args = Args::parse();

    let shop = ShopConfig {
        capacity: args.capacity,
        num_producers: args.chefs,
        request_quota: args.quota,
        prep_pacing: args.prep_ms,
        consume_pacing: args.serve_ms,
        wake_timeout: Some(Duration::from_millis(args.wake_timeout_ms)),
    };
    shop.validate().context("invalid shop configuration")?;

    let server = ServerConfig {
        host: args.host,
        port: args.port,
    };

    let report = serve(server, shop).await?;

    tracing::info!(
        report = %serde_json::to_string(&report).context("failed to encode report")?,
        "Customer denied. No more burgers. Server shutting down"
    );
    Ok(())
}
