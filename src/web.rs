#![cfg(not(tarpaulin_include))]

use clap::Parser;
use csvchart::app;
use csvchart::chart::MAX_DIMENSION;
use csvchart::config::{Config, NormalizationMode};
use std::net::SocketAddr;

/// Serve the CSV chart page
#[derive(Parser, Debug)]
#[command(author, version, about = "Simple CSV Chart web server", long_about = None)]
struct Args {
    /// Address to listen on (overrides CSVCHART_ADDR)
    #[arg(long)]
    addr: Option<SocketAddr>,

    /// Series normalization (overrides CSVCHART_NORMALIZE)
    #[arg(long, value_enum)]
    mode: Option<NormalizationMode>,

    /// Chart width in pixels
    #[arg(long, value_parser = clap::value_parser!(u32).range(1..=MAX_DIMENSION as i64))]
    width: Option<u32>,

    /// Chart height in pixels
    #[arg(long, value_parser = clap::value_parser!(u32).range(1..=MAX_DIMENSION as i64))]
    height: Option<u32>,
}

/// Main entry point for the web application
///
/// Settings come from the defaults, then `CSVCHART_*` environment variables,
/// then command line flags.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let mut config = Config::from_env();
    if let Some(addr) = args.addr {
        config.bind_addr = addr;
    }
    if let Some(mode) = args.mode {
        config.normalization = mode;
    }
    if let Some(width) = args.width {
        config.chart_width = width;
    }
    if let Some(height) = args.height {
        config.chart_height = height;
    }

    app::run(config).await
}
