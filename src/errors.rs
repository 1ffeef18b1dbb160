//! Error types for the pool exporter

use thiserror::Error;

/// Error raised by a pool while its state is being read
pub type PoolReadError = Box<dyn std::error::Error + Send + Sync + 'static>;

#[derive(Error, Debug)]
pub enum ExporterError {
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Metric {0} is already registered")]
    DuplicateMetric(String),

    #[error("Failed to read pool state: {0}")]
    PoolRead(#[source] PoolReadError),

    #[error("Metrics registry error: {0}")]
    Registry(#[from] prometheus::Error),

    #[error("Failed to start sampling timer: {0}")]
    Timer(#[from] std::io::Error),

    #[error("Failed to encode metrics: {0}")]
    Encoding(String),
}

impl ExporterError {
    /// Classify an error returned by `Registry::register` for the metric `name`
    pub(crate) fn from_registration(name: &str, err: prometheus::Error) -> Self {
        match err {
            prometheus::Error::AlreadyReg => Self::DuplicateMetric(name.to_string()),
            // Same name registered with other help text or label names.
            prometheus::Error::Msg(ref msg) if msg.contains("same fully-qualified name") => {
                Self::DuplicateMetric(name.to_string())
            }
            other => Self::Registry(other),
        }
    }
}

pub type ExporterResult<T> = Result<T, ExporterError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_already_registered_maps_to_duplicate() {
        let err = ExporterError::from_registration("pool_min_total", prometheus::Error::AlreadyReg);
        assert!(matches!(err, ExporterError::DuplicateMetric(ref name) if name == "pool_min_total"));
        assert_eq!(err.to_string(), "Metric pool_min_total is already registered");
    }

    #[test]
    fn test_other_registry_errors_are_kept() {
        let err = ExporterError::from_registration(
            "pool_min_total",
            prometheus::Error::Msg("something else".to_string()),
        );
        assert!(matches!(err, ExporterError::Registry(_)));
    }

    #[test]
    fn test_pool_read_keeps_source() {
        use std::error::Error as _;

        let err = ExporterError::PoolRead("connection lost".into());
        assert_eq!(err.to_string(), "Failed to read pool state: connection lost");
        assert!(err.source().is_some());
    }
}
