//! Trait definitions for `mapprobe`.
//!
//! These are the capabilities the probe core depends on without knowing the
//! backend: somewhere to put metric events and a way to wait.

use async_trait::async_trait;
use std::time::Duration;

use crate::models::MetricEvent;

/// Destination for metric events.
///
/// Recording is fire-and-forget: a sink that cannot store an event logs and
/// drops it rather than failing the caller.
pub trait MetricsSink: Send + Sync {
    /// Records one event.
    fn record(&self, event: MetricEvent);

    /// Records several events in order.
    fn record_all(&self, events: Vec<MetricEvent>) {
        for event in events {
            self.record(event);
        }
    }
}

/// Fixed-duration waits.
///
/// Every pause in the probe (status polling, repeated updates, the
/// scheduler's wait) goes through this trait.
#[async_trait]
pub trait Sleeper: Send + Sync {
    /// Waits for `duration`.
    async fn sleep(&self, duration: Duration);
}
