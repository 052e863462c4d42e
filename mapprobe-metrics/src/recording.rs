//! In-memory sink.

use std::sync::{Mutex, PoisonError};

use mapprobe_core::{MetricEvent, MetricsSink};

/// Sink that keeps every event in arrival order.
#[derive(Debug, Default)]
pub struct RecordingSink {
    events: Mutex<Vec<MetricEvent>>,
}

impl RecordingSink {
    /// Creates an empty sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// All events recorded so far.
    pub fn events(&self) -> Vec<MetricEvent> {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Events of one family.
    pub fn named(&self, name: &str) -> Vec<MetricEvent> {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter(|e| e.name == name)
            .cloned()
            .collect()
    }

    /// Drops all recorded events.
    pub fn clear(&self) {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }
}

impl MetricsSink for RecordingSink {
    fn record(&self, event: MetricEvent) {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mapprobe_core::metric_names;

    #[test]
    fn test_records_in_order() {
        let sink = RecordingSink::new();
        sink.record(MetricEvent::active_requests(1.0));
        sink.record_all(vec![
            MetricEvent::request("api/login", "POST", "success"),
            MetricEvent::active_requests(-1.0),
        ]);

        let events = sink.events();
        assert_eq!(events.len(), 3);
        assert_eq!(events[1].name, metric_names::REQUESTS_TOTAL);
        assert_eq!(sink.named(metric_names::ACTIVE_REQUESTS).len(), 2);

        sink.clear();
        assert!(sink.events().is_empty());
    }
}
