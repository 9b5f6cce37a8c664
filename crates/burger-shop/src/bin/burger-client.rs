//! Burger shop customer: orders until full or the shop runs out.

use anyhow::Result;
use clap::Parser;

use burger_shop::client::DEFAULT_MAX_ORDERS;
use burger_shop::transport::tcp::DEFAULT_PORT;
use burger_shop::{ClientConfig, Pacing, run_client, telemetry};

#[derive(Parser, Debug)]
#[command(author, version, about = "Order burgers from a burger shop server")]
struct Args {
    /// Server address
    #[arg(long, env = "BURGER_HOST", default_value = "127.0.0.1")]
    host: String,

    /// Server port
    #[arg(long, env = "BURGER_PORT", default_value_t = DEFAULT_PORT)]
    port: u16,

    /// Burgers to order before leaving
    #[arg(long, env = "BURGER_MAX_ORDERS", default_value_t = DEFAULT_MAX_ORDERS)]
    max_orders: u32,

    /// Eating times to pick from, in milliseconds (comma separated)
    #[arg(long, env = "BURGER_EAT_MS", default_value = "0")]
    eat_ms: Pacing,
}

#[tokio::main]
async fn main() -> Result<()> {
    telemetry::init_tracing();

    let args = Args::parse();

    let report = run_client(ClientConfig {
        host: args.host,
        port: args.port,
        max_orders: args.max_orders,
        eat_pacing: args.eat_ms,
    })
    .await?;

    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
