//! Bridges engine events into the caller's layout-change callback.

use std::sync::Arc;

use serde_json::json;

use crate::engine::{EngineItem, EventBinding, SharedEngine};
use crate::logging::{LogLevel, Logger, event_with_fields, json_kv};

use super::GridInner;

/// Map an item set to its ordered identifier sequence.
///
/// Items whose element is missing or whose identifier attribute is absent or
/// empty are dropped from the sequence. Each drop is surfaced through the
/// logger so a misconfigured item is diagnosable instead of silently absent.
/// Returns the ids and the number of dropped items.
pub(super) fn collect_item_ids(
    items: &[EngineItem],
    logger: Option<&Logger>,
) -> (Vec<String>, usize) {
    let mut ids = Vec::with_capacity(items.len());
    let mut skipped = 0;
    for (index, item) in items.iter().enumerate() {
        match item.item_id() {
            Some(id) => ids.push(id),
            None => {
                skipped += 1;
                if let Some(logger) = logger {
                    let _ = logger.log_event(event_with_fields(
                        LogLevel::Warn,
                        "grid::bridge",
                        "item_missing_id",
                        [json_kv("index", json!(index))],
                    ));
                }
            }
        }
    }
    (ids, skipped)
}

/// Subscribe both bridge handlers against `engine`.
///
/// Handlers capture only a weak reference to the grid, so a dropped grid
/// renders them inert, and the returned bindings unsubscribe on drop. The
/// caller stores them in mount state; releasing the old pair before
/// installing a new one is what prevents duplicate delivery across
/// remounts.
pub(super) fn install(inner: &Arc<GridInner>, engine: &SharedEngine) -> Vec<EventBinding> {
    let weak = Arc::downgrade(inner);
    let layout_binding = engine.on_layout_end(Arc::new(move |items| {
        if let Some(inner) = weak.upgrade() {
            inner.handle_layout_end(items);
        }
    }));

    let weak = Arc::downgrade(inner);
    let drag_binding = engine.on_drag_end(Arc::new(move |_payload| {
        // The payload may be stale relative to the live order after a drag
        // reorder; the handler re-reads the engine instead.
        if let Some(inner) = weak.upgrade() {
            inner.handle_drag_end();
        }
    }));

    vec![layout_binding, drag_binding]
}
