//! Prometheus gauges for pool state and text export

use crate::config::{LabeledLayout, MetricLayout, PerFieldLayout, TYPE_LABEL};
use crate::errors::{ExporterError, ExporterResult};
use crate::snapshot::{PoolField, PoolSnapshot};

use prometheus::core::Collector;
use prometheus::proto::{Metric, MetricFamily};
use prometheus::{Encoder, IntGauge, IntGaugeVec, Opts, Registry, TextEncoder};
use tracing::warn;

/// Help text of the gauge in labelled mode
pub const LABELED_HELP: &str = "Size of the pool";

/// Gauges holding the last sampled pool state
///
/// Created unregistered; [`PoolGauges::register`] adds them to a registry as
/// one unit.
#[derive(Clone)]
pub(crate) struct PoolGauges {
    /// Per-field gauge, or the labelled child, indexed by [`PoolField::index`]
    gauges: [IntGauge; 7],

    /// The labelled gauge family, when the layout has one
    family: Option<IntGaugeVec>,
}

impl PoolGauges {
    pub fn new(layout: &MetricLayout) -> ExporterResult<Self> {
        match layout {
            MetricLayout::PerField(layout) => Self::per_field(layout),
            MetricLayout::Labeled(layout) => Self::labeled(layout),
        }
    }

    fn per_field(layout: &PerFieldLayout) -> ExporterResult<Self> {
        let mut gauges = Vec::with_capacity(PoolField::ALL.len());
        for field in PoolField::ALL {
            let name = layout.metric_name(field);
            let gauge = IntGauge::with_opts(Opts::new(name.clone(), field.help()))
                .map_err(|err| invalid_metric(&name, err))?;
            gauges.push(gauge);
        }

        Ok(Self {
            gauges: into_array(gauges)?,
            family: None,
        })
    }

    fn labeled(layout: &LabeledLayout) -> ExporterResult<Self> {
        let family = IntGaugeVec::new(Opts::new(layout.name.clone(), LABELED_HELP), &layout.label_names())
            .map_err(|err| invalid_metric(&layout.name, err))?;

        let mut gauges = Vec::with_capacity(PoolField::ALL.len());
        for field in PoolField::ALL {
            let values: Vec<&str> = std::iter::once(field.type_label())
                .chain(layout.labels.iter().map(|(_, value)| value.as_str()))
                .collect();
            gauges.push(family.get_metric_with_label_values(&values)?);
        }

        Ok(Self {
            gauges: into_array(gauges)?,
            family: Some(family),
        })
    }

    /// Gauge for a single field
    pub fn gauge(&self, field: PoolField) -> &IntGauge {
        &self.gauges[field.index()]
    }

    /// Write every field of `snapshot` into its gauge
    pub fn set(&self, snapshot: &PoolSnapshot) {
        for field in PoolField::ALL {
            let value = i64::try_from(snapshot.get(field)).unwrap_or(i64::MAX);
            self.gauge(field).set(value);
        }
    }

    /// Names of the metrics these gauges export
    pub fn metric_names(&self) -> Vec<String> {
        self.collectors()
            .iter()
            .flat_map(|collector| collector.desc().into_iter().map(|desc| desc.fq_name.clone()))
            .collect()
    }

    fn collectors(&self) -> Vec<Box<dyn Collector>> {
        match &self.family {
            Some(family) => vec![Box::new(family.clone())],
            None => self
                .gauges
                .iter()
                .map(|gauge| Box::new(gauge.clone()) as Box<dyn Collector>)
                .collect(),
        }
    }

    /// Register all gauges, or none of them
    pub fn register(&self, registry: &Registry) -> ExporterResult<()> {
        let names = self.metric_names();
        for (idx, collector) in self.collectors().into_iter().enumerate() {
            if let Err(err) = registry.register(collector) {
                for registered in self.collectors().into_iter().take(idx) {
                    if let Err(err) = registry.unregister(registered) {
                        warn!(error = %err, "Failed to roll back gauge registration");
                    }
                }
                let name = names.get(idx).map(String::as_str).unwrap_or_default();
                return Err(ExporterError::from_registration(name, err));
            }
        }
        Ok(())
    }

    /// Remove the gauges from `registry`
    pub fn unregister(&self, registry: &Registry) {
        for collector in self.collectors() {
            if let Err(err) = registry.unregister(collector) {
                warn!(error = %err, "Failed to unregister gauge");
            }
        }
    }

    /// Put the families exported here first, in field order
    ///
    /// Samples of the labelled family are sorted by field too. Families this
    /// exporter does not own follow unchanged.
    pub fn order_families(&self, families: Vec<MetricFamily>) -> Vec<MetricFamily> {
        let names = self.metric_names();
        let position = |family: &MetricFamily| names.iter().position(|name| name == family.get_name());

        let (mut owned, others): (Vec<_>, Vec<_>) = families.into_iter().partition(|family| position(family).is_some());
        owned.sort_by_key(|family| position(family));

        if self.family.is_some() {
            for family in &mut owned {
                family.mut_metric().as_mut_slice().sort_by_key(field_position);
            }
        }

        owned.extend(others);
        owned
    }
}

/// Index of the field a labelled sample reports, by its `type` label
fn field_position(metric: &Metric) -> usize {
    metric
        .get_label()
        .iter()
        .find(|pair| pair.get_name() == TYPE_LABEL)
        .and_then(|pair| PoolField::ALL.iter().position(|field| field.type_label() == pair.get_value()))
        .unwrap_or(PoolField::ALL.len())
}

fn invalid_metric(name: &str, err: prometheus::Error) -> ExporterError {
    ExporterError::InvalidArgument(format!("cannot create metric `{name}`: {err}"))
}

fn into_array(gauges: Vec<IntGauge>) -> ExporterResult<[IntGauge; 7]> {
    gauges
        .try_into()
        .map_err(|_| ExporterError::InvalidArgument("expected one gauge per pool field".to_string()))
}

/// Serialize everything registered in `registry` in the Prometheus text format
///
/// # Examples
///
/// ```
/// use esox_pool_exporter::encode_text;
/// use prometheus::{IntGauge, Registry};
///
/// let registry = Registry::new();
/// let gauge = IntGauge::new("pool_min_total", "min size of the pool").unwrap();
/// registry.register(Box::new(gauge.clone())).unwrap();
/// gauge.set(2);
///
/// let output = encode_text(&registry).unwrap();
/// assert!(output.contains("# TYPE pool_min_total gauge"));
/// assert!(output.contains("pool_min_total 2"));
/// ```
pub fn encode_text(registry: &Registry) -> ExporterResult<String> {
    encode_families(&registry.gather())
}

pub(crate) fn encode_families(families: &[MetricFamily]) -> ExporterResult<String> {
    let mut buffer = Vec::new();
    TextEncoder::new().encode(families, &mut buffer)?;
    String::from_utf8(buffer).map_err(|err| ExporterError::Encoding(err.to_string()))
}
