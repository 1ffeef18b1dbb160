//! Pool exporter: samples a pool into Prometheus gauges

use crate::config::{ErrorHook, ExporterConfiguration};
use crate::errors::{ExporterError, ExporterResult};
use crate::metrics::{PoolGauges, encode_families};
use crate::snapshot::{ObservablePool, PoolField};
use crate::timer::SamplingTimer;

use parking_lot::Mutex;
use prometheus::Registry;
use std::sync::Arc;
use tracing::{debug, error};

/// Reads a pool and writes its state into the gauges
struct Sampler<P> {
    pool: P,
    gauges: PoolGauges,
    /// Serializes samples so every sample lands as a whole
    write_lock: Mutex<()>,
}

impl<P: ObservablePool> Sampler<P> {
    fn observe(&self) -> ExporterResult<()> {
        let _guard = self.write_lock.lock();
        let snapshot = self.pool.snapshot().map_err(ExporterError::PoolRead)?;
        self.gauges.set(&snapshot);
        Ok(())
    }
}

/// Publishes the state of one pool as Prometheus gauges
///
/// On construction the gauges are registered, the pool is sampled once and,
/// unless disabled, a timer keeps sampling it every interval. The timer stops
/// on [`PoolExporter::stop`] or when the exporter is dropped; the gauges stay
/// registered with their last values.
///
/// # Examples
///
/// ```
/// use esox_pool_exporter::{ExporterConfiguration, PoolExporter, PoolSnapshot, PoolStateCell};
/// use prometheus::Registry;
/// use std::sync::Arc;
///
/// let registry = Registry::new();
/// let pool = Arc::new(PoolStateCell::new(PoolSnapshot::from_counts(2, 3, 2, 0, 0)));
///
/// let config = ExporterConfiguration::new()
///     .with_registry(registry.clone())
///     .without_timer();
/// let exporter = PoolExporter::new(Arc::clone(&pool), config).unwrap();
///
/// assert!(exporter.render().unwrap().contains("pool_spare_resource_capacity_total 1"));
///
/// pool.update(|s| {
///     s.available -= 1;
///     s.borrowed += 1;
/// });
/// exporter.observe().unwrap();
/// assert!(exporter.render().unwrap().contains("pool_borrowed_total 1"));
/// ```
pub struct PoolExporter<P> {
    sampler: Arc<Sampler<P>>,
    registry: Registry,
    timer: Mutex<Option<SamplingTimer>>,
}

impl<P> PoolExporter<P>
where
    P: ObservablePool + Send + Sync + 'static,
{
    /// Create an exporter for `pool`
    pub fn new(pool: P, config: ExporterConfiguration) -> ExporterResult<Self> {
        Self::try_new(Some(pool), config)
    }

    /// Create an exporter with the default configuration and registry
    pub fn with_defaults(pool: P) -> ExporterResult<Self> {
        Self::new(pool, ExporterConfiguration::default())
    }

    /// Create an exporter for a pool that may be absent
    ///
    /// # Errors
    ///
    /// [`ExporterError::InvalidArgument`] when `pool` is `None` or the
    /// configuration is invalid, [`ExporterError::DuplicateMetric`] when a
    /// gauge name is already taken in the registry, and whatever the pool
    /// returns from the initial sample.
    pub fn try_new(pool: Option<P>, config: ExporterConfiguration) -> ExporterResult<Self> {
        let pool = pool.ok_or_else(|| ExporterError::InvalidArgument("pool instance is required".to_string()))?;
        config.validate()?;

        let registry = config.resolve_registry();
        let gauges = PoolGauges::new(&config.layout)?;
        gauges.register(&registry)?;

        let sampler = Arc::new(Sampler {
            pool,
            gauges,
            write_lock: Mutex::new(()),
        });

        if let Err(err) = sampler.observe() {
            sampler.gauges.unregister(&registry);
            return Err(err);
        }

        let timer = match config.interval {
            Some(period) => {
                let tick_sampler = Arc::clone(&sampler);
                let on_error = config.on_error.clone();
                let started = SamplingTimer::start(period, move || {
                    if let Err(err) = tick_sampler.observe() {
                        report_timer_error(on_error.as_ref(), &err);
                    }
                });
                match started {
                    Ok(timer) => Some(timer),
                    Err(err) => {
                        sampler.gauges.unregister(&registry);
                        return Err(err);
                    }
                }
            }
            None => None,
        };

        debug!(
            metrics = ?sampler.gauges.metric_names(),
            interval = ?config.interval,
            "Pool exporter started"
        );

        Ok(Self {
            sampler,
            registry,
            timer: Mutex::new(timer),
        })
    }
}

impl<P: ObservablePool> PoolExporter<P> {
    /// Sample the pool now and update every gauge
    ///
    /// Concurrent calls are serialized; each one writes all seven values
    /// before another can start.
    pub fn observe(&self) -> ExporterResult<()> {
        self.sampler.observe()
    }

    /// Stop periodic sampling
    ///
    /// Safe to call repeatedly and when no timer was started. Gauges keep their
    /// last values and stay registered.
    pub fn stop(&self) {
        if let Some(timer) = self.timer.lock().take() {
            timer.cancel();
            debug!("Pool exporter timer stopped");
        }
    }

    /// Same as [`PoolExporter::stop`]
    pub fn off(&self) {
        self.stop();
    }

    /// Whether a sampling timer is armed and still firing
    pub fn is_running(&self) -> bool {
        self.timer.lock().as_ref().is_some_and(SamplingTimer::is_active)
    }

    /// Registry the gauges are registered with
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Names of the exported metrics
    pub fn metric_names(&self) -> Vec<String> {
        self.sampler.gauges.metric_names()
    }

    /// Last value published for `field`
    pub fn value(&self, field: PoolField) -> i64 {
        self.sampler.gauges.gauge(field).get()
    }

    /// Serialize the bound registry in the Prometheus text format
    ///
    /// This exporter's metrics come first, in field order; anything else in
    /// the registry follows.
    pub fn render(&self) -> ExporterResult<String> {
        let families = self.sampler.gauges.order_families(self.registry.gather());
        encode_families(&families)
    }
}

impl<P> Drop for PoolExporter<P> {
    fn drop(&mut self) {
        if let Some(timer) = self.timer.get_mut().take() {
            timer.cancel();
        }
    }
}

fn report_timer_error(hook: Option<&ErrorHook>, err: &ExporterError) {
    match hook {
        Some(hook) => hook(err),
        None => error!(error = %err, "Pool sample failed"),
    }
}
