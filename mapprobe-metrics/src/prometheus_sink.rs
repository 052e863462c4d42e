//! Prometheus-backed sink.
//!
//! Every family in [`METRIC_CATALOG`] is registered when the sink is built.
//! Events that disagree with the catalog are logged and dropped.

use std::collections::HashMap;

use mapprobe_core::{
    METRIC_CATALOG, MetricDescriptor, MetricEvent, MetricKind, MetricsSink, metric_names,
};
use prometheus::{
    CounterVec, Encoder, GaugeVec, HistogramOpts, HistogramVec, Opts, Registry, TextEncoder,
};
use tracing::warn;

use crate::error::MetricsError;

/// One registered family.
#[derive(Clone)]
enum Family {
    Counter(CounterVec),
    Gauge(GaugeVec),
    Histogram(HistogramVec),
}

/// Sink that applies events to a Prometheus registry.
#[derive(Clone)]
pub struct PrometheusSink {
    registry: Registry,
    families: HashMap<&'static str, Family>,
}

impl std::fmt::Debug for PrometheusSink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PrometheusSink")
            .field("families", &self.families.len())
            .finish_non_exhaustive()
    }
}

impl PrometheusSink {
    /// Creates a sink with a fresh registry.
    ///
    /// # Errors
    ///
    /// Fails if a catalog family cannot be registered.
    pub fn new() -> Result<Self, MetricsError> {
        Self::with_registry(Registry::new())
    }

    /// Creates a sink that registers into `registry`.
    ///
    /// # Errors
    ///
    /// Fails if a catalog family cannot be registered, for example because
    /// the registry already holds a family with the same name.
    pub fn with_registry(registry: Registry) -> Result<Self, MetricsError> {
        let mut families = HashMap::with_capacity(METRIC_CATALOG.len());

        for descriptor in METRIC_CATALOG {
            let family = build_family(descriptor)?;
            // Label-less families get their single series now so they are
            // exported before the first event.
            let eager = descriptor.labels.is_empty();
            match &family {
                Family::Counter(v) => {
                    registry.register(Box::new(v.clone()))?;
                    if eager {
                        v.get_metric_with_label_values(&[])?;
                    }
                }
                Family::Gauge(v) => {
                    registry.register(Box::new(v.clone()))?;
                    if eager {
                        v.get_metric_with_label_values(&[])?;
                    }
                }
                Family::Histogram(v) => {
                    registry.register(Box::new(v.clone()))?;
                    if eager {
                        v.get_metric_with_label_values(&[])?;
                    }
                }
            }
            families.insert(descriptor.name, family);
        }

        Ok(Self { registry, families })
    }

    /// The underlying registry.
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Renders the registry in the Prometheus text format.
    ///
    /// # Errors
    ///
    /// Fails if encoding fails.
    pub fn encode(&self) -> Result<String, MetricsError> {
        let mut buffer = Vec::new();
        TextEncoder::new().encode(&self.registry.gather(), &mut buffer)?;
        Ok(String::from_utf8(buffer)?)
    }

    fn apply(&self, event: &MetricEvent) -> Result<(), String> {
        let descriptor = event.validate().map_err(|e| e.to_string())?;
        let family = self
            .families
            .get(descriptor.name)
            .ok_or_else(|| format!("family {} not registered", descriptor.name))?;
        let values = event.ordered_label_values(descriptor);

        match family {
            Family::Counter(vec) => {
                if !event.value.is_finite() || event.value < 0.0 {
                    return Err(format!("counter increment {} is invalid", event.value));
                }
                vec.get_metric_with_label_values(&values)
                    .map_err(|e| e.to_string())?
                    .inc_by(event.value);
            }
            Family::Gauge(vec) => {
                vec.get_metric_with_label_values(&values)
                    .map_err(|e| e.to_string())?
                    .add(event.value);
            }
            Family::Histogram(vec) => {
                vec.get_metric_with_label_values(&values)
                    .map_err(|e| e.to_string())?
                    .observe(event.value);
            }
        }
        Ok(())
    }
}

impl MetricsSink for PrometheusSink {
    fn record(&self, event: MetricEvent) {
        if let Err(reason) = self.apply(&event) {
            warn!(metric = %event.name, reason = %reason, "Dropping metric event");
        }
    }
}

fn build_family(descriptor: &MetricDescriptor) -> Result<Family, MetricsError> {
    let family = match descriptor.kind {
        MetricKind::Counter => Family::Counter(CounterVec::new(
            Opts::new(descriptor.name, descriptor.help),
            descriptor.labels,
        )?),
        MetricKind::Gauge => Family::Gauge(GaugeVec::new(
            Opts::new(descriptor.name, descriptor.help),
            descriptor.labels,
        )?),
        MetricKind::Histogram => {
            let mut opts = HistogramOpts::new(descriptor.name, descriptor.help);
            if descriptor.name == metric_names::REQUEST_SIZE_BYTES {
                // 64 B .. 1 MiB
                opts = opts.buckets(prometheus::exponential_buckets(64.0, 4.0, 8)?);
            } else if descriptor.name == metric_names::RUN_DURATION_SECONDS {
                opts = opts.buckets(vec![1.0, 5.0, 15.0, 30.0, 60.0, 120.0, 300.0]);
            }
            Family::Histogram(HistogramVec::new(opts, descriptor.labels)?)
        }
    };
    Ok(family)
}

// ============================================================================
// Tests
// ============================================================================
