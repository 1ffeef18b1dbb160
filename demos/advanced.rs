//! Advanced features: labelled gauge, closure-backed pools, error hooks

use esox_pool_exporter::{
    ExporterConfiguration, ExporterError, LabeledLayout, PoolExporter, PoolSnapshot, pool_fn,
};
use prometheus::Registry;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;
use std::time::Duration;

/// Stand-in for a connection pool from another crate
struct ConnectionPool {
    max: usize,
    idle: AtomicUsize,
    in_use: AtomicUsize,
}

fn main() {
    println!("=== EsoxSolutions.PoolExporter - Advanced Features ===\n");

    // Example 1: Single labelled gauge
    labeled_gauge();

    // Example 2: Adapting a foreign pool
    foreign_pool();

    // Example 3: Duplicate registration
    duplicate_registration();

    // Example 4: Timer errors
    timer_errors();
}

fn labeled_gauge() {
    println!("1. Labelled gauge:");
    let registry = Registry::new();
    let layout = LabeledLayout::new("my_pool_size_total").with_label("service", "api");
    let config = ExporterConfiguration::new()
        .with_registry(registry)
        .with_layout(layout)
        .without_timer();

    let exporter = PoolExporter::new(PoolSnapshot::from_counts(2, 3, 2, 0, 0), config).unwrap();
    println!("{}", exporter.render().unwrap());
}

fn foreign_pool() {
    println!("2. Foreign pool:");
    let connections = Arc::new(ConnectionPool {
        max: 8,
        idle: AtomicUsize::new(3),
        in_use: AtomicUsize::new(2),
    });

    let source = Arc::clone(&connections);
    let pool = pool_fn(move || {
        Ok(PoolSnapshot::from_counts(
            1,
            source.max,
            source.idle.load(Ordering::Relaxed),
            source.in_use.load(Ordering::Relaxed),
            0,
        ))
    });

    let registry = Registry::new();
    let config = ExporterConfiguration::new()
        .with_registry(registry)
        .without_timer();
    let exporter = PoolExporter::new(pool, config).unwrap();

    connections.idle.fetch_sub(1, Ordering::Relaxed);
    connections.in_use.fetch_add(1, Ordering::Relaxed);
    exporter.observe().unwrap();

    for line in exporter.render().unwrap().lines().filter(|l| !l.starts_with('#')) {
        println!("   {}", line);
    }
    println!();
}

fn duplicate_registration() {
    println!("3. Duplicate registration:");
    let registry = Registry::new();
    let config = ExporterConfiguration::new()
        .with_registry(registry)
        .without_timer();

    let _first = PoolExporter::new(PoolSnapshot::default(), config.clone()).unwrap();
    match PoolExporter::new(PoolSnapshot::default(), config) {
        Ok(_) => println!("   Unexpectedly registered twice"),
        Err(ExporterError::DuplicateMetric(name)) => println!("   Rejected: {} already registered\n", name),
        Err(e) => println!("   Error: {}\n", e),
    }
}

fn timer_errors() {
    println!("4. Timer errors:");
    let reads = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&reads);
    let pool = pool_fn(move || {
        if counter.fetch_add(1, Ordering::Relaxed) == 0 {
            Ok(PoolSnapshot::default())
        } else {
            Err("pool was closed".into())
        }
    });

    let registry = Registry::new();
    let config = ExporterConfiguration::new()
        .with_registry(registry)
        .with_interval(Duration::from_millis(20))
        .with_error_hook(|err| println!("   Sample failed: {}", err));

    let exporter = PoolExporter::new(pool, config).unwrap();
    thread::sleep(Duration::from_millis(50));
    exporter.stop();
}
