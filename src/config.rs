//! Exporter configuration options

use crate::errors::{ExporterError, ExporterResult};
use crate::snapshot::PoolField;

use prometheus::Registry;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

/// Default sampling period
pub const DEFAULT_INTERVAL: Duration = Duration::from_millis(10_000);

/// Default metric name prefix in per-field mode
pub const DEFAULT_PREFIX: &str = "pool_";

/// Default gauge name in labelled mode
pub const DEFAULT_LABELED_NAME: &str = "pool_size_total";

/// Label carrying the field name in labelled mode
pub const TYPE_LABEL: &str = "type";

/// Callback for errors raised by timer-driven samples
pub type ErrorHook = Arc<dyn Fn(&ExporterError) + Send + Sync>;

/// One gauge per pool field, named `prefix + name`
///
/// # Examples
///
/// ```
/// use esox_pool_exporter::{PerFieldLayout, PoolField};
///
/// let layout = PerFieldLayout::new()
///     .with_prefix("db_pool_")
///     .with_field_name(PoolField::Pending, "waiting");
///
/// assert_eq!(layout.metric_name(PoolField::Min), "db_pool_min_total");
/// assert_eq!(layout.metric_name(PoolField::Pending), "db_pool_waiting");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PerFieldLayout {
    /// Prepended to every field name
    pub prefix: String,

    /// Field names, indexed by [`PoolField::index`]
    pub names: [String; 7],
}

impl Default for PerFieldLayout {
    fn default() -> Self {
        Self {
            prefix: DEFAULT_PREFIX.to_string(),
            names: PoolField::ALL.map(|field| field.default_name().to_string()),
        }
    }
}

impl PerFieldLayout {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the shared name prefix
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    /// Rename the gauge for one field
    pub fn with_field_name(mut self, field: PoolField, name: impl Into<String>) -> Self {
        self.names[field.index()] = name.into();
        self
    }

    /// Full metric name for a field
    pub fn metric_name(&self, field: PoolField) -> String {
        format!("{}{}", self.prefix, self.names[field.index()])
    }
}

/// A single gauge with a `type` label per pool field plus static labels
///
/// # Examples
///
/// ```
/// use esox_pool_exporter::LabeledLayout;
///
/// let layout = LabeledLayout::new("my_pool_size_total")
///     .with_label("foo", "bar");
///
/// assert_eq!(layout.name, "my_pool_size_total");
/// assert_eq!(layout.labels, vec![("foo".to_string(), "bar".to_string())]);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabeledLayout {
    pub name: String,

    /// Extra labels attached to every sample, in declaration order
    pub labels: Vec<(String, String)>,
}

impl Default for LabeledLayout {
    fn default() -> Self {
        Self::new(DEFAULT_LABELED_NAME)
    }
}

impl LabeledLayout {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            labels: Vec::new(),
        }
    }

    /// Add a static label
    pub fn with_label(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.labels.push((name.into(), value.into()));
        self
    }

    /// Label names of the gauge: `type` first, then the static labels
    pub(crate) fn label_names(&self) -> Vec<&str> {
        std::iter::once(TYPE_LABEL)
            .chain(self.labels.iter().map(|(name, _)| name.as_str()))
            .collect()
    }

    fn validate(&self) -> ExporterResult<()> {
        for (idx, (name, _)) in self.labels.iter().enumerate() {
            if name == TYPE_LABEL {
                return Err(ExporterError::InvalidArgument(format!(
                    "label `{TYPE_LABEL}` is reserved for the pool field"
                )));
            }
            if self.labels[..idx].iter().any(|(other, _)| other == name) {
                return Err(ExporterError::InvalidArgument(format!(
                    "label `{name}` is declared more than once"
                )));
            }
        }
        Ok(())
    }
}

/// How pool fields map onto gauges
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MetricLayout {
    /// One gauge per field (default)
    PerField(PerFieldLayout),

    /// One gauge, fields told apart by the `type` label
    Labeled(LabeledLayout),
}

impl Default for MetricLayout {
    fn default() -> Self {
        MetricLayout::PerField(PerFieldLayout::default())
    }
}

impl From<PerFieldLayout> for MetricLayout {
    fn from(layout: PerFieldLayout) -> Self {
        MetricLayout::PerField(layout)
    }
}

impl From<LabeledLayout> for MetricLayout {
    fn from(layout: LabeledLayout) -> Self {
        MetricLayout::Labeled(layout)
    }
}

/// Configuration for a pool exporter
///
/// # Examples
///
/// ```
/// use esox_pool_exporter::{ExporterConfiguration, LabeledLayout};
/// use std::time::Duration;
///
/// let registry = prometheus::Registry::new();
/// let config = ExporterConfiguration::new()
///     .with_registry(registry)
///     .with_layout(LabeledLayout::new("my_pool_size_total").with_label("service", "api"))
///     .with_interval(Duration::from_secs(5));
///
/// assert_eq!(config.interval, Some(Duration::from_secs(5)));
/// ```
#[derive(Clone)]
pub struct ExporterConfiguration {
    /// Registry the gauges are registered with, the process-wide default when unset
    pub registry: Option<Registry>,

    pub layout: MetricLayout,

    /// Sampling period; `None` means samples are only taken by calling `observe`
    pub interval: Option<Duration>,

    /// Receives errors from timer-driven samples
    pub on_error: Option<ErrorHook>,
}

impl Default for ExporterConfiguration {
    fn default() -> Self {
        Self {
            registry: None,
            layout: MetricLayout::default(),
            interval: Some(DEFAULT_INTERVAL),
            on_error: None,
        }
    }
}

impl fmt::Debug for ExporterConfiguration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExporterConfiguration")
            .field("registry", &self.registry.as_ref().map(|_| "custom").unwrap_or("default"))
            .field("layout", &self.layout)
            .field("interval", &self.interval)
            .field("on_error", &self.on_error.is_some())
            .finish()
    }
}

impl ExporterConfiguration {
    /// Create a new configuration with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Register gauges with `registry` instead of the default registry
    pub fn with_registry(mut self, registry: Registry) -> Self {
        self.registry = Some(registry);
        self
    }

    pub fn with_layout(mut self, layout: impl Into<MetricLayout>) -> Self {
        self.layout = layout.into();
        self
    }

    /// Set the sampling period
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = Some(interval);
        self
    }

    /// Disable the timer; samples are taken only by calling `observe`
    ///
    /// # Examples
    ///
    /// ```
    /// use esox_pool_exporter::ExporterConfiguration;
    ///
    /// let config = ExporterConfiguration::new().without_timer();
    /// assert!(config.interval.is_none());
    /// ```
    pub fn without_timer(mut self) -> Self {
        self.interval = None;
        self
    }

    /// Handle errors raised by timer-driven samples
    pub fn with_error_hook<F>(mut self, hook: F) -> Self
    where
        F: Fn(&ExporterError) + Send + Sync + 'static,
    {
        self.on_error = Some(Arc::new(hook));
        self
    }

    /// The registry gauges will be registered with
    pub(crate) fn resolve_registry(&self) -> Registry {
        self.registry
            .clone()
            .unwrap_or_else(|| prometheus::default_registry().clone())
    }

    pub(crate) fn validate(&self) -> ExporterResult<()> {
        if self.interval.is_some_and(|interval| interval.is_zero()) {
            return Err(ExporterError::InvalidArgument(
                "sampling interval must be greater than zero".to_string(),
            ));
        }
        match &self.layout {
            MetricLayout::PerField(_) => Ok(()),
            MetricLayout::Labeled(layout) => layout.validate(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ExporterConfiguration::default();
        assert!(config.registry.is_none());
        assert_eq!(config.interval, Some(Duration::from_millis(10_000)));
        assert_eq!(config.layout, MetricLayout::PerField(PerFieldLayout::default()));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_default_metric_names() {
        let layout = PerFieldLayout::default();
        let names: Vec<String> = PoolField::ALL.iter().map(|f| layout.metric_name(*f)).collect();
        assert_eq!(
            names,
            vec![
                "pool_min_total",
                "pool_max_total",
                "pool_size_total",
                "pool_spare_resource_capacity_total",
                "pool_available_total",
                "pool_borrowed_total",
                "pool_pending_total",
            ]
        );
    }

    #[test]
    fn test_zero_interval_is_rejected() {
        let config = ExporterConfiguration::new().with_interval(Duration::ZERO);
        assert!(matches!(config.validate(), Err(ExporterError::InvalidArgument(_))));
    }

    #[test]
    fn test_type_label_is_reserved() {
        let config = ExporterConfiguration::new().with_layout(LabeledLayout::default().with_label("type", "x"));
        assert!(matches!(config.validate(), Err(ExporterError::InvalidArgument(_))));
    }

    #[test]
    fn test_duplicate_static_label_is_rejected() {
        let layout = LabeledLayout::default()
            .with_label("service", "api")
            .with_label("service", "worker");
        let config = ExporterConfiguration::new().with_layout(layout);
        assert!(matches!(config.validate(), Err(ExporterError::InvalidArgument(_))));
    }

    #[test]
    fn test_label_names_start_with_type() {
        let layout = LabeledLayout::default().with_label("foo", "bar").with_label("zone", "eu");
        assert_eq!(layout.label_names(), vec!["type", "foo", "zone"]);
    }

    #[test]
    fn test_explicit_registry_is_used() {
        let registry = Registry::new();
        let config = ExporterConfiguration::new().with_registry(registry.clone());
        let gauge = prometheus::IntGauge::new("config_test_gauge", "test").unwrap();
        config.resolve_registry().register(Box::new(gauge)).unwrap();
        assert_eq!(registry.gather().len(), 1);
    }
}
