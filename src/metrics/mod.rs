use crate::logging::{LogEvent, LogFields, LogLevel};
use serde_json::json;

/// Counters accumulated while a grid is mounted.
#[derive(Debug, Default, Clone)]
pub struct GridMetrics {
    layout_events: u64,
    drag_events: u64,
    relayouts: u64,
    snapshots_published: u64,
    items_skipped: u64,
}

impl GridMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_layout_event(&mut self) {
        self.layout_events = self.layout_events.saturating_add(1);
    }

    pub fn record_drag_event(&mut self) {
        self.drag_events = self.drag_events.saturating_add(1);
    }

    pub fn record_relayout(&mut self) {
        self.relayouts = self.relayouts.saturating_add(1);
    }

    pub fn record_snapshot_published(&mut self) {
        self.snapshots_published = self.snapshots_published.saturating_add(1);
    }

    pub fn record_items_skipped(&mut self, count: usize) {
        if count > 0 {
            self.items_skipped = self.items_skipped.saturating_add(count as u64);
        }
    }

    pub fn snapshot(&self) -> MetricSnapshot {
        MetricSnapshot {
            layout_events: self.layout_events,
            drag_events: self.drag_events,
            relayouts: self.relayouts,
            snapshots_published: self.snapshots_published,
            items_skipped: self.items_skipped,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetricSnapshot {
    pub layout_events: u64,
    pub drag_events: u64,
    pub relayouts: u64,
    pub snapshots_published: u64,
    pub items_skipped: u64,
}

impl MetricSnapshot {
    pub fn as_fields(&self) -> LogFields {
        let mut map = LogFields::new();
        map.insert("layout_events".to_string(), json!(self.layout_events));
        map.insert("drag_events".to_string(), json!(self.drag_events));
        map.insert("relayouts".to_string(), json!(self.relayouts));
        map.insert(
            "snapshots_published".to_string(),
            json!(self.snapshots_published),
        );
        map.insert("items_skipped".to_string(), json!(self.items_skipped));
        map
    }

    pub fn to_log_event(&self, target: &str) -> LogEvent {
        LogEvent::with_fields(LogLevel::Info, target, "grid_metrics", self.as_fields())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counters_accumulate() {
        let mut metrics = GridMetrics::new();
        metrics.record_layout_event();
        metrics.record_layout_event();
        metrics.record_drag_event();
        metrics.record_items_skipped(3);
        metrics.record_items_skipped(0);

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.layout_events, 2);
        assert_eq!(snapshot.drag_events, 1);
        assert_eq!(snapshot.items_skipped, 3);
    }

    #[test]
    fn snapshot_converts_to_log_event() {
        let mut metrics = GridMetrics::new();
        metrics.record_relayout();
        let event = metrics.snapshot().to_log_event("grid::metrics");
        assert_eq!(event.message, "grid_metrics");
        assert_eq!(event.fields.get("relayouts"), Some(&json!(1)));
    }
}
