use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, RwLock, Weak};

use crate::element::ElementRef;
use crate::engine::{EventBinding, SessionId, SharedEngine, SharedEngineRegistry};
use crate::geometry::Size;

/// Asks the owning grid to re-measure and recompute; a no-op when no engine
/// is live.
pub type RelayoutFn = Arc<dyn Fn() + Send + Sync>;

/// Forwards a descendant's reported size change to the caller's handler.
pub type ResizeNotifyFn = Arc<dyn Fn(&str, Size) + Send + Sync>;

/// Immutable-per-publication bundle of everything a descendant needs to
/// interact with the grid: the engine session, the pass-through column
/// count, the measured container width, the container element, and the
/// relayout / resize-notify capabilities.
///
/// The engine handle is resolved through the session registry on each
/// access, so a snapshot captured before teardown can never reach a
/// destroyed engine.
#[derive(Clone)]
pub struct ContextSnapshot {
    session: Option<SessionId>,
    cols: u16,
    grid_width: f64,
    container: Option<ElementRef>,
    engines: SharedEngineRegistry,
    relayout: RelayoutFn,
    on_resize: ResizeNotifyFn,
}

impl ContextSnapshot {
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(
        session: Option<SessionId>,
        cols: u16,
        grid_width: f64,
        container: Option<ElementRef>,
        engines: SharedEngineRegistry,
        relayout: RelayoutFn,
        on_resize: ResizeNotifyFn,
    ) -> Self {
        Self {
            session,
            cols,
            grid_width,
            container,
            engines,
            relayout,
            on_resize,
        }
    }

    /// The live engine handle, `None` before creation and after teardown.
    pub fn grid(&self) -> Option<SharedEngine> {
        self.session
            .and_then(|session| self.engines.resolve(session))
    }

    pub fn session(&self) -> Option<SessionId> {
        self.session
    }

    pub fn cols(&self) -> u16 {
        self.cols
    }

    pub fn grid_width(&self) -> f64 {
        self.grid_width
    }

    pub fn container(&self) -> Option<&ElementRef> {
        self.container.as_ref()
    }

    pub fn relayout(&self) {
        (self.relayout)();
    }

    pub fn notify_resize(&self, item_id: &str, size: Size) {
        (self.on_resize)(item_id, size);
    }
}

/// Listener invoked with every newly published snapshot.
pub type ContextListener = Arc<dyn Fn(&ContextSnapshot) + Send + Sync>;

/// Observable store broadcasting the current [`ContextSnapshot`] to any
/// number of downstream readers. The snapshot is replaced wholesale on each
/// publication; listeners are notified sequentially in subscription order.
pub struct ContextStore {
    snapshot: RwLock<ContextSnapshot>,
    listeners: Arc<Mutex<HashMap<u64, ContextListener>>>,
    next: AtomicU64,
}

impl ContextStore {
    pub(crate) fn new(initial: ContextSnapshot) -> Self {
        Self {
            snapshot: RwLock::new(initial),
            listeners: Arc::new(Mutex::new(HashMap::new())),
            next: AtomicU64::new(0),
        }
    }

    /// The current snapshot.
    pub fn snapshot(&self) -> ContextSnapshot {
        self.snapshot
            .read()
            .map(|guard| guard.clone())
            .expect("context store poisoned")
    }

    /// Register a listener for future publications. Dropping the returned
    /// binding unsubscribes.
    pub fn subscribe(&self, listener: ContextListener) -> EventBinding {
        let id = self.next.fetch_add(1, Ordering::Relaxed);
        if let Ok(mut guard) = self.listeners.lock() {
            guard.insert(id, listener);
        }
        let weak = Arc::downgrade(&self.listeners);
        EventBinding::new(move || release(&weak, id))
    }

    pub(crate) fn publish(&self, snapshot: ContextSnapshot) {
        if let Ok(mut guard) = self.snapshot.write() {
            *guard = snapshot.clone();
        }
        // Listeners run with no store lock held; they may read the store or
        // re-enter the grid.
        let mut entries: Vec<_> = self
            .listeners
            .lock()
            .map(|guard| {
                guard
                    .iter()
                    .map(|(id, listener)| (*id, listener.clone()))
                    .collect()
            })
            .unwrap_or_default();
        entries.sort_by_key(|(id, _)| *id);
        for (_, listener) in entries {
            listener(&snapshot);
        }
    }
}

fn release(listeners: &Weak<Mutex<HashMap<u64, ContextListener>>>, id: u64) {
    if let Some(listeners) = listeners.upgrade() {
        if let Ok(mut guard) = listeners.lock() {
            guard.remove(&id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::EngineRegistry;
    use std::sync::atomic::AtomicUsize;

    fn noop_snapshot(cols: u16, width: f64) -> ContextSnapshot {
        ContextSnapshot::new(
            None,
            cols,
            width,
            None,
            Arc::new(EngineRegistry::new()),
            Arc::new(|| {}),
            Arc::new(|_, _| {}),
        )
    }

    #[test]
    fn snapshot_replaced_wholesale_on_publish() {
        let store = ContextStore::new(noop_snapshot(1, 0.0));
        store.publish(noop_snapshot(3, 640.0));
        let snapshot = store.snapshot();
        assert_eq!(snapshot.cols(), 3);
        assert_eq!(snapshot.grid_width(), 640.0);
    }

    #[test]
    fn listeners_observe_each_publication() {
        let store = ContextStore::new(noop_snapshot(1, 0.0));
        let widths = Arc::new(Mutex::new(Vec::new()));
        let captured = widths.clone();
        let _binding = store.subscribe(Arc::new(move |snapshot| {
            if let Ok(mut guard) = captured.lock() {
                guard.push(snapshot.grid_width());
            }
        }));

        store.publish(noop_snapshot(1, 100.0));
        store.publish(noop_snapshot(1, 250.0));
        assert_eq!(widths.lock().unwrap().as_slice(), [100.0, 250.0]);
    }

    #[test]
    fn dropped_binding_stops_notifications() {
        let store = ContextStore::new(noop_snapshot(1, 0.0));
        let count = Arc::new(AtomicUsize::new(0));
        let captured = count.clone();
        let binding = store.subscribe(Arc::new(move |_| {
            captured.fetch_add(1, Ordering::SeqCst);
        }));

        store.publish(noop_snapshot(1, 1.0));
        drop(binding);
        store.publish(noop_snapshot(1, 2.0));
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn unresolvable_session_yields_no_grid() {
        let snapshot = noop_snapshot(1, 0.0);
        assert!(snapshot.grid().is_none());
    }
}
