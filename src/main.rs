//! # Shorecast Application Entry Point
//!
//! Runs one aggregation cycle and prints the report JSON to stdout. Logs go
//! to stderr so the report stays machine-readable. The process exits 0 even
//! when every upstream failed: the `degraded` flag inside the report is the
//! only failure signal, so a consuming dashboard never sees a broken cycle.

use shorecast_lib::config::Config;
use shorecast_lib::engine::Engine;
use std::env;
use tracing_subscriber::EnvFilter;

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    // Human-readable output for poking at the report by hand
    let pretty = env::args().any(|arg| arg == "--pretty");

    let config = Config::load();
    let engine = Engine::new(config);

    // Create Tokio runtime for the async fetch fan-out
    let rt = tokio::runtime::Runtime::new()?;
    let report = rt.block_on(engine.run_cycle());

    let json = if pretty {
        serde_json::to_string_pretty(&report)?
    } else {
        serde_json::to_string(&report)?
    };
    println!("{json}");

    Ok(())
}
