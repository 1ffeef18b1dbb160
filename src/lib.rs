//! # EsoxSolutions.PoolExporter
//!
//! Publishes the state of a resource pool as Prometheus gauges.
//!
//! ## Features
//!
//! - Seven gauges per pool: min, max, size, spare capacity, available,
//!   borrowed and pending
//! - One gauge per field, or a single gauge with a `type` label and
//!   caller-supplied static labels
//! - Periodic sampling on a tokio task or a dedicated thread, or manual
//!   sampling only
//! - Explicit registry, with the process-wide default as a fallback
//! - Adapters for push-style pools and for pools read through a closure
//!
//! ## Quick Start
//!
//! ```rust
//! use esox_pool_exporter::{ExporterConfiguration, PoolExporter, PoolSnapshot};
//!
//! let registry = prometheus::Registry::new();
//! let pool = PoolSnapshot::from_counts(2, 3, 2, 0, 0);
//!
//! let exporter = PoolExporter::new(
//!     pool,
//!     ExporterConfiguration::new().with_registry(registry.clone()),
//! )
//! .unwrap();
//!
//! let output = exporter.render().unwrap();
//! assert!(output.contains("pool_min_total 2"));
//! // Timer stops when `exporter` goes out of scope
//! ```

mod config;
mod errors;
mod exporter;
mod metrics;
mod snapshot;
mod timer;

pub use config::{
    DEFAULT_INTERVAL, DEFAULT_LABELED_NAME, DEFAULT_PREFIX, ErrorHook, ExporterConfiguration, LabeledLayout,
    MetricLayout, PerFieldLayout, TYPE_LABEL,
};
pub use errors::{ExporterError, ExporterResult, PoolReadError};
pub use exporter::PoolExporter;
pub use metrics::{LABELED_HELP, encode_text};
pub use snapshot::{FnPool, ObservablePool, PoolField, PoolSnapshot, PoolStateCell, pool_fn};
