//! Async usage examples: timer-driven sampling inside a tokio runtime

use esox_pool_exporter::{ExporterConfiguration, PoolExporter, PoolField, PoolSnapshot, PoolStateCell};
use prometheus::Registry;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;

#[tokio::main]
async fn main() {
    println!("=== EsoxSolutions.PoolExporter - Async Examples ===\n");

    // Example 1: Periodic sampling
    periodic_sampling().await;

    // Example 2: Stop sampling
    stop_sampling().await;
}

async fn periodic_sampling() {
    println!("1. Periodic sampling:");
    let registry = Registry::new();
    let pool = Arc::new(PoolStateCell::new(PoolSnapshot::from_counts(1, 4, 1, 0, 0)));

    let config = ExporterConfiguration::new()
        .with_registry(registry)
        .with_interval(Duration::from_millis(50));
    let exporter = PoolExporter::new(Arc::clone(&pool), config).unwrap();

    // Simulated workers borrowing resources
    for borrowed in 1..=4 {
        pool.set(PoolSnapshot::from_counts(1, 4, 0, borrowed, 0));
        sleep(Duration::from_millis(60)).await;
        println!("   borrowed gauge: {}", exporter.value(PoolField::Borrowed));
    }

    println!();
}

async fn stop_sampling() {
    println!("2. Stop sampling:");
    let registry = Registry::new();
    let pool = Arc::new(PoolStateCell::new(PoolSnapshot::from_counts(0, 2, 2, 0, 0)));

    let config = ExporterConfiguration::new()
        .with_registry(registry)
        .with_interval(Duration::from_millis(20));
    let exporter = PoolExporter::new(Arc::clone(&pool), config).unwrap();

    exporter.stop();
    pool.set(PoolSnapshot::from_counts(0, 2, 0, 2, 3));
    sleep(Duration::from_millis(50)).await;

    println!("   running: {}", exporter.is_running());
    println!("   pending gauge still: {}", exporter.value(PoolField::Pending));
}
