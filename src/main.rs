// EsoxSolutions.PoolExporter
// Publishes resource pool state as Prometheus gauges

// This is just a binary wrapper - the actual library is in lib.rs
// Run demos with: cargo run --example basic

use esox_pool_exporter::{ExporterConfiguration, ExporterResult, PoolExporter, PoolSnapshot, PoolStateCell};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

fn main() -> ExporterResult<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    println!("=== EsoxSolutions.PoolExporter ===");
    println!("See demos/ directory for usage examples");
    println!("Run: cargo run --example basic");
    println!();

    // Quick demo
    let pool = Arc::new(PoolStateCell::new(PoolSnapshot::from_counts(2, 3, 2, 0, 0)));
    let exporter = PoolExporter::new(Arc::clone(&pool), ExporterConfiguration::new().without_timer())?;

    pool.update(|s| {
        s.available -= 1;
        s.borrowed += 1;
    });
    exporter.observe()?;

    print!("{}", exporter.render()?);
    Ok(())
}
