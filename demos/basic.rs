//! Basic usage examples for PoolExporter

use esox_pool_exporter::{ExporterConfiguration, PerFieldLayout, PoolExporter, PoolField, PoolSnapshot, PoolStateCell};
use prometheus::Registry;
use std::sync::Arc;

fn main() {
    println!("=== EsoxSolutions.PoolExporter - Basic Examples ===\n");

    // Example 1: Default per-field gauges
    per_field_gauges();

    // Example 2: Manual sampling
    manual_sampling();

    // Example 3: Custom prefix
    custom_prefix();
}

fn per_field_gauges() {
    println!("1. Per-field gauges:");
    let registry = Registry::new();
    let config = ExporterConfiguration::new().with_registry(registry);

    let exporter = PoolExporter::new(PoolSnapshot::from_counts(2, 3, 2, 0, 0), config).unwrap();
    println!("{}", exporter.render().unwrap());
    // Timer stopped when `exporter` is dropped
}

fn manual_sampling() {
    println!("2. Manual sampling:");
    let registry = Registry::new();
    let pool = Arc::new(PoolStateCell::new(PoolSnapshot::from_counts(1, 5, 1, 0, 0)));

    let config = ExporterConfiguration::new()
        .with_registry(registry)
        .without_timer();
    let exporter = PoolExporter::new(Arc::clone(&pool), config).unwrap();

    // Every resource borrowed, one caller waiting
    pool.set(PoolSnapshot::from_counts(1, 5, 0, 5, 1));
    println!("   Before observe: {}", exporter.value(PoolField::Borrowed));

    exporter.observe().unwrap();
    println!("   After observe:  {}\n", exporter.value(PoolField::Borrowed));
}

fn custom_prefix() {
    println!("3. Custom prefix:");
    let registry = Registry::new();
    let config = ExporterConfiguration::new()
        .with_registry(registry)
        .with_layout(PerFieldLayout::new().with_prefix("db_pool_"))
        .without_timer();

    let exporter = PoolExporter::new(PoolSnapshot::from_counts(0, 10, 3, 4, 0), config).unwrap();
    for name in exporter.metric_names() {
        println!("   {}", name);
    }
}
