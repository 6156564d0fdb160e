//! The packing grid component: engine lifecycle, event bridging, and
//! context distribution behind one handle.

mod bridge;

use std::sync::{Arc, Mutex, Weak};

use serde_json::{Value, json};

use crate::context::{ContextSnapshot, ContextStore, RelayoutFn, ResizeNotifyFn};
use crate::element::{DRAG_HANDLE_ATTR, ElementRef};
use crate::engine::{
    EngineItem, EngineOptions, EngineRegistry, EventBinding, SessionId, SharedEngine,
    SharedEngineFactory, SharedEngineRegistry,
};
use crate::geometry::Size;
use crate::logging::{LogLevel, Logger, event_with_fields, json_kv};
use crate::metrics::GridMetrics;

/// Handler invoked with the ordered identifier sequence after every
/// layout-completion or drag-completion event.
pub type LayoutChangeFn = Arc<dyn Fn(&[String]) + Send + Sync>;

/// Caller configuration for a [`PackingGrid`].
#[derive(Clone)]
pub struct GridOptions {
    /// Column count, passed through unmodified for descendant consumption.
    /// Not validated and not used for layout math here.
    pub cols: u16,
    /// Layout-change callback. Identifier filtering has already happened by
    /// the time this runs.
    pub on_layout_change: LayoutChangeFn,
    /// Invoked when a descendant reports its own size change.
    pub on_resize: ResizeNotifyFn,
    /// Optional structured logger for lifecycle and bridge diagnostics.
    pub logger: Option<Logger>,
    /// Metrics accumulator shared with the embedder.
    pub metrics: Option<Arc<Mutex<GridMetrics>>>,
}

impl Default for GridOptions {
    fn default() -> Self {
        Self {
            cols: 1,
            on_layout_change: Arc::new(|_| {}),
            on_resize: Arc::new(|_, _| {}),
            logger: None,
            metrics: None,
        }
    }
}

impl GridOptions {
    /// Enable metrics collection if it has not already been configured.
    pub fn enable_metrics(&mut self) {
        if self.metrics.is_none() {
            self.metrics = Some(Arc::new(Mutex::new(GridMetrics::new())));
        }
    }

    /// Access the shared metrics handle if metrics are enabled.
    pub fn metrics_handle(&self) -> Option<Arc<Mutex<GridMetrics>>> {
        self.metrics.as_ref().map(Arc::clone)
    }
}

/// Where a grid is in its mount lifecycle.
///
/// Per mount: `Unmounted → ContainerReady → EngineCreated → (steady state)
/// → Unmounting → Destroyed`. A destroyed grid may be mounted again and
/// yields a fresh engine and session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LifecyclePhase {
    #[default]
    Unmounted,
    ContainerReady,
    EngineCreated,
    Unmounting,
    Destroyed,
}

#[derive(Default)]
struct MountState {
    phase: LifecyclePhase,
    session: Option<SessionId>,
    engine: Option<SharedEngine>,
    container: Option<ElementRef>,
    bindings: Vec<EventBinding>,
    width: f64,
}

#[derive(Clone, Copy)]
enum EmitTrigger {
    Layout,
    Drag,
}

pub(crate) struct GridInner {
    self_weak: Weak<GridInner>,
    factory: SharedEngineFactory,
    engines: SharedEngineRegistry,
    store: ContextStore,
    options: Mutex<GridOptions>,
    state: Mutex<MountState>,
}

impl GridInner {
    fn mount(&self, container: Option<ElementRef>) {
        let Some(el) = container else {
            self.log(LogLevel::Debug, "mount_skipped_no_container", []);
            return;
        };

        {
            let Ok(mut state) = self.state.lock() else {
                return;
            };
            if state.phase == LifecyclePhase::EngineCreated {
                drop(state);
                self.log(LogLevel::Warn, "mount_ignored_already_mounted", []);
                return;
            }
            state.phase = LifecyclePhase::ContainerReady;
            state.container = Some(el.clone());
            // Release any stale pair before a new engine appears.
            state.bindings.clear();
        }

        let engine = self.factory.create(&el, &engine_options());

        // The engine auto-registers the container's existing children on
        // init. Registration is owned by item components, so the discovered
        // set is stripped before anything can observe it.
        let auto = engine.items();
        if !auto.is_empty() {
            engine.remove(&auto);
        }

        let session = self.engines.register(engine.clone());
        let bindings = match self.self_weak.upgrade() {
            Some(inner) => bridge::install(&inner, &engine),
            None => Vec::new(),
        };

        {
            let Ok(mut state) = self.state.lock() else {
                return;
            };
            state.engine = Some(engine);
            state.session = Some(session);
            state.bindings = bindings;
            state.phase = LifecyclePhase::EngineCreated;
        }

        self.log(
            LogLevel::Info,
            "engine_created",
            [json_kv("session", json!(format!("{session:?}")))],
        );
        self.publish_snapshot();
    }

    fn unmount(&self) {
        let (bindings, session, engine) = {
            let Ok(mut state) = self.state.lock() else {
                return;
            };
            state.phase = LifecyclePhase::Unmounting;
            (
                std::mem::take(&mut state.bindings),
                state.session.take(),
                state.engine.take(),
            )
        };

        // Unsubscribe before destroy so no handler can fire against a
        // destroyed engine or a torn-down grid.
        drop(bindings);
        if let Some(session) = session {
            self.engines.release(session);
        }

        let had_engine = engine.is_some();
        if let Some(engine) = engine {
            engine.destroy();
        }

        if let Ok(mut state) = self.state.lock() {
            state.phase = LifecyclePhase::Destroyed;
            state.container = None;
        }

        if had_engine {
            self.log(LogLevel::Info, "engine_destroyed", []);
        }
        self.publish_snapshot();
    }

    fn relayout(&self) {
        let engine = self.state.lock().ok().and_then(|state| state.engine.clone());
        let Some(engine) = engine else {
            self.log(LogLevel::Debug, "relayout_skipped_no_engine", []);
            return;
        };
        self.with_metrics(|metrics| metrics.record_relayout());
        engine.refresh_items();
        engine.layout();
    }

    fn report_width(&self, width: f64) {
        if let Ok(mut state) = self.state.lock() {
            state.width = width;
        }
        self.log(
            LogLevel::Debug,
            "width_observed",
            [json_kv("width", json!(width))],
        );
        self.publish_snapshot();
    }

    fn set_cols(&self, cols: u16) {
        if let Ok(mut options) = self.options.lock() {
            options.cols = cols;
        }
        self.publish_snapshot();
    }

    fn set_on_layout_change(&self, callback: LayoutChangeFn) {
        if let Ok(mut options) = self.options.lock() {
            options.on_layout_change = callback;
        }
    }

    fn set_on_resize(&self, callback: ResizeNotifyFn) {
        if let Ok(mut options) = self.options.lock() {
            options.on_resize = callback;
        }
        self.publish_snapshot();
    }

    fn notify_resize(&self, item_id: &str, size: Size) {
        let callback = self
            .options
            .lock()
            .ok()
            .map(|options| options.on_resize.clone());
        if let Some(callback) = callback {
            callback(item_id, size);
        }
    }

    fn phase(&self) -> LifecyclePhase {
        self.state
            .lock()
            .map(|state| state.phase)
            .unwrap_or_default()
    }

    fn is_live(&self) -> bool {
        self.phase() == LifecyclePhase::EngineCreated
    }

    fn handle_layout_end(&self, items: &[EngineItem]) {
        if !self.is_live() {
            return;
        }
        self.emit_order(items, EmitTrigger::Layout);
    }

    fn handle_drag_end(&self) {
        if !self.is_live() {
            return;
        }
        let engine = self.state.lock().ok().and_then(|state| state.engine.clone());
        let Some(engine) = engine else {
            return;
        };
        // Live order, not the event payload.
        let items = engine.items();
        self.emit_order(&items, EmitTrigger::Drag);
    }

    fn emit_order(&self, items: &[EngineItem], trigger: EmitTrigger) {
        let (logger, callback) = {
            let Ok(options) = self.options.lock() else {
                return;
            };
            (options.logger.clone(), options.on_layout_change.clone())
        };

        let (ids, skipped) = bridge::collect_item_ids(items, logger.as_ref());
        self.with_metrics(|metrics| {
            metrics.record_items_skipped(skipped);
            match trigger {
                EmitTrigger::Layout => metrics.record_layout_event(),
                EmitTrigger::Drag => metrics.record_drag_event(),
            }
        });
        self.log(
            LogLevel::Debug,
            match trigger {
                EmitTrigger::Layout => "layout_order_emitted",
                EmitTrigger::Drag => "drag_order_emitted",
            },
            [json_kv("items", json!(ids.len()))],
        );

        // No grid lock is held here; the callback may re-enter the grid.
        callback(&ids);
    }

    fn publish_snapshot(&self) {
        let (session, width, container) = {
            let Ok(state) = self.state.lock() else {
                return;
            };
            (state.session, state.width, state.container.clone())
        };
        let cols = self
            .options
            .lock()
            .map(|options| options.cols)
            .unwrap_or(1);

        let snapshot = ContextSnapshot::new(
            session,
            cols,
            width,
            container,
            self.engines.clone(),
            relayout_fn(self.self_weak.clone()),
            resize_fn(self.self_weak.clone()),
        );
        self.with_metrics(|metrics| metrics.record_snapshot_published());
        self.store.publish(snapshot);
    }

    fn with_metrics(&self, record: impl FnOnce(&mut GridMetrics)) {
        let metrics = self
            .options
            .lock()
            .ok()
            .and_then(|options| options.metrics.clone());
        if let Some(metrics) = metrics {
            if let Ok(mut guard) = metrics.lock() {
                record(&mut guard);
            }
        }
    }

    fn log<I>(&self, level: LogLevel, message: &str, fields: I)
    where
        I: IntoIterator<Item = (String, Value)>,
    {
        let logger = self
            .options
            .lock()
            .ok()
            .and_then(|options| options.logger.clone());
        if let Some(logger) = logger {
            let _ = logger.log_event(event_with_fields(level, "grid::lifecycle", message, fields));
        }
    }
}

impl Drop for GridInner {
    fn drop(&mut self) {
        // Backstop for grids dropped without an explicit unmount.
        if let Ok(mut state) = self.state.lock() {
            state.bindings.clear();
            if let Some(session) = state.session.take() {
                self.engines.release(session);
            }
            if let Some(engine) = state.engine.take() {
                engine.destroy();
            }
        }
    }
}

/// The engine configuration is fixed: dragging on, drag initiation
/// restricted to marked handles, gap-filling layout.
fn engine_options() -> EngineOptions {
    EngineOptions {
        drag_enabled: true,
        drag_handle: DRAG_HANDLE_ATTR.to_string(),
        fill_gaps: true,
    }
}

fn relayout_fn(weak: Weak<GridInner>) -> RelayoutFn {
    Arc::new(move || {
        if let Some(inner) = weak.upgrade() {
            inner.relayout();
        }
    })
}

fn resize_fn(weak: Weak<GridInner>) -> ResizeNotifyFn {
    Arc::new(move |item_id, size| {
        if let Some(inner) = weak.upgrade() {
            inner.notify_resize(item_id, size);
        }
    })
}

/// Coordinates one engine lifetime per mount, bridges its layout-end and
/// drag-end events into the caller's layout-change callback, and publishes
/// the [`ContextSnapshot`] descendants consume.
///
/// Identifier uniqueness across items is assumed, not enforced; duplicate
/// identifiers are a caller error.
pub struct PackingGrid {
    inner: Arc<GridInner>,
}

impl PackingGrid {
    pub fn new(factory: SharedEngineFactory, options: GridOptions) -> Self {
        let engines: SharedEngineRegistry = Arc::new(EngineRegistry::new());
        let inner = Arc::new_cyclic(|weak: &Weak<GridInner>| {
            let initial = ContextSnapshot::new(
                None,
                options.cols,
                0.0,
                None,
                engines.clone(),
                relayout_fn(weak.clone()),
                resize_fn(weak.clone()),
            );
            GridInner {
                self_weak: weak.clone(),
                factory,
                engines: engines.clone(),
                store: ContextStore::new(initial),
                options: Mutex::new(options),
                state: Mutex::new(MountState::default()),
            }
        });
        Self { inner }
    }

    /// Create exactly one engine bound to `container` and begin bridging
    /// its events. With `None` the mount is silently skipped. A second
    /// mount while an engine is live is refused.
    pub fn mount(&self, container: Option<ElementRef>) {
        self.inner.mount(container);
    }

    /// Tear down subscriptions, release the session, and destroy the
    /// engine exactly once. Runs unconditionally even when no items were
    /// ever registered; safe when never mounted.
    pub fn unmount(&self) {
        self.inner.unmount();
    }

    /// Ask the engine to re-measure all registered items and recompute the
    /// layout. Silent no-op when no engine exists.
    pub fn relayout(&self) {
        self.inner.relayout();
    }

    /// Record the measured container width and publish a fresh snapshot.
    /// Decoupled from engine lifecycle; valid in any phase.
    pub fn report_width(&self, width: f64) {
        self.inner.report_width(width);
    }

    pub fn set_cols(&self, cols: u16) {
        self.inner.set_cols(cols);
    }

    /// Swap the layout-change callback; the next layout-end or drag-end
    /// emission targets the new one.
    pub fn set_on_layout_change(&self, callback: LayoutChangeFn) {
        self.inner.set_on_layout_change(callback);
    }

    /// Swap the resize-notify callback and publish a fresh snapshot (the
    /// notify capability is part of the published snapshot).
    pub fn set_on_resize(&self, callback: ResizeNotifyFn) {
        self.inner.set_on_resize(callback);
    }

    /// Forward a descendant's reported size change to the caller's handler.
    pub fn notify_resize(&self, item_id: &str, size: Size) {
        self.inner.notify_resize(item_id, size);
    }

    /// The context distributor descendants subscribe to.
    pub fn context(&self) -> &ContextStore {
        &self.inner.store
    }

    pub fn phase(&self) -> LifecyclePhase {
        self.inner.phase()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::element::{Element, item_element};
    use crate::engine::GridEngine;
    use crate::engine::scripted::{ScriptedEngine, ScriptedEngineFactory};
    use crate::logging::MemorySink;

    fn recording_options() -> (GridOptions, Arc<Mutex<Vec<Vec<String>>>>) {
        let calls = Arc::new(Mutex::new(Vec::new()));
        let captured = calls.clone();
        let options = GridOptions {
            on_layout_change: Arc::new(move |ids: &[String]| {
                captured.lock().unwrap().push(ids.to_vec());
            }),
            ..GridOptions::default()
        };
        (options, calls)
    }

    fn mounted_grid(
        options: GridOptions,
    ) -> (PackingGrid, Arc<ScriptedEngineFactory>, Arc<ScriptedEngine>) {
        let factory = Arc::new(ScriptedEngineFactory::new());
        let grid = PackingGrid::new(factory.clone(), options);
        grid.mount(Some(Element::new("div")));
        let engine = factory.created().pop().expect("engine created");
        (grid, factory, engine)
    }

    #[test]
    fn mount_strips_auto_discovered_items() {
        let container = Element::new("div");
        container.append_child(item_element("ghost-a"));
        container.append_child(item_element("ghost-b"));

        let factory = Arc::new(ScriptedEngineFactory::new());
        let grid = PackingGrid::new(factory.clone(), GridOptions::default());
        grid.mount(Some(container));

        let engine = factory.created().pop().unwrap();
        assert!(engine.items().is_empty());
        assert_eq!(grid.phase(), LifecyclePhase::EngineCreated);
    }

    #[test]
    fn mount_configures_dragging_handles_and_gap_filling() {
        let (_grid, _factory, engine) = mounted_grid(GridOptions::default());
        let options = engine.options();
        assert!(options.drag_enabled);
        assert_eq!(options.drag_handle, DRAG_HANDLE_ATTR);
        assert!(options.fill_gaps);
    }

    #[test]
    fn mount_without_container_is_skipped() {
        let factory = Arc::new(ScriptedEngineFactory::new());
        let grid = PackingGrid::new(factory.clone(), GridOptions::default());
        grid.mount(None);
        assert!(factory.created().is_empty());
        assert_eq!(grid.phase(), LifecyclePhase::Unmounted);
        assert!(grid.context().snapshot().grid().is_none());
    }

    #[test]
    fn second_mount_while_live_is_refused() {
        let (grid, factory, _engine) = mounted_grid(GridOptions::default());
        grid.mount(Some(Element::new("div")));
        assert_eq!(factory.created().len(), 1);
    }

    #[test]
    fn layout_end_emits_ids_and_drops_unidentified_items() {
        let (options, calls) = recording_options();
        let (_grid, _factory, engine) = mounted_grid(options);

        engine.add(item_element("a"));
        engine.add(Element::new("div"));
        engine.layout();

        assert_eq!(calls.lock().unwrap().as_slice(), [vec!["a".to_string()]]);
    }

    #[test]
    fn drag_end_reflects_live_order_not_payload() {
        let (options, calls) = recording_options();
        let (_grid, _factory, engine) = mounted_grid(options);

        engine.add(item_element("a"));
        engine.add(item_element("b"));
        let stale_payload = engine.items();

        engine.drag_move(0, 1);
        engine.end_drag(&stale_payload);

        assert_eq!(
            calls.lock().unwrap().as_slice(),
            [vec!["b".to_string(), "a".to_string()]]
        );
    }

    #[test]
    fn unmount_destroys_engine_exactly_once_and_silences_handlers() {
        let (options, calls) = recording_options();
        let (grid, _factory, engine) = mounted_grid(options);
        engine.add(item_element("a"));
        engine.add(item_element("b"));

        grid.unmount();
        grid.unmount();

        assert_eq!(engine.destroy_count(), 1);
        assert_eq!(grid.phase(), LifecyclePhase::Destroyed);

        engine.layout();
        engine.end_drag(&[]);
        assert!(calls.lock().unwrap().is_empty());
    }

    #[test]
    fn unmount_destroys_even_with_no_registered_items() {
        let (grid, _factory, engine) = mounted_grid(GridOptions::default());
        grid.unmount();
        assert_eq!(engine.destroy_count(), 1);
    }

    #[test]
    fn snapshot_never_resolves_a_destroyed_engine() {
        let (grid, _factory, _engine) = mounted_grid(GridOptions::default());
        let before = grid.context().snapshot();
        assert!(before.grid().is_some());

        grid.unmount();
        // The pre-teardown snapshot goes stale along with the store's own.
        assert!(before.grid().is_none());
        assert!(grid.context().snapshot().grid().is_none());
    }

    #[test]
    fn remount_yields_fresh_engine_and_retargets_captured_relayout() {
        let (options, calls) = recording_options();
        let (grid, factory, first) = mounted_grid(options);
        let captured = grid.context().snapshot();

        grid.unmount();
        grid.mount(Some(Element::new("div")));

        let engines = factory.created();
        assert_eq!(engines.len(), 2);
        let second = engines.last().unwrap().clone();
        second.add(item_element("fresh"));

        // A relayout captured before teardown targets the current engine,
        // never the destroyed one.
        captured.relayout();
        assert_eq!(first.destroy_count(), 1);
        assert_eq!(
            calls.lock().unwrap().as_slice(),
            [vec!["fresh".to_string()]]
        );
    }

    #[test]
    fn relayout_before_any_engine_is_a_noop() {
        let (options, calls) = recording_options();
        let factory = Arc::new(ScriptedEngineFactory::new());
        let grid = PackingGrid::new(factory.clone(), options);

        grid.relayout();
        assert!(factory.created().is_empty());
        assert!(calls.lock().unwrap().is_empty());
    }

    #[test]
    fn width_change_republishes_with_stable_engine_identity() {
        let (grid, _factory, _engine) = mounted_grid(GridOptions::default());
        let before = grid.context().snapshot().grid().unwrap();

        grid.report_width(640.0);

        let snapshot = grid.context().snapshot();
        assert_eq!(snapshot.grid_width(), 640.0);
        let after = snapshot.grid().unwrap();
        assert!(Arc::ptr_eq(&before, &after));
    }

    #[test]
    fn width_observation_is_decoupled_from_engine_lifecycle() {
        let factory = Arc::new(ScriptedEngineFactory::new());
        let grid = PackingGrid::new(factory, GridOptions::default());
        grid.report_width(320.0);
        let snapshot = grid.context().snapshot();
        assert_eq!(snapshot.grid_width(), 320.0);
        assert!(snapshot.grid().is_none());
    }

    #[test]
    fn context_listeners_observe_lifecycle_publications() {
        let factory = Arc::new(ScriptedEngineFactory::new());
        let grid = PackingGrid::new(factory, GridOptions::default());

        let seen = Arc::new(Mutex::new(Vec::new()));
        let captured = seen.clone();
        let _binding = grid.context().subscribe(Arc::new(move |snapshot| {
            captured
                .lock()
                .unwrap()
                .push((snapshot.grid().is_some(), snapshot.grid_width()));
        }));

        grid.mount(Some(Element::new("div")));
        grid.report_width(800.0);
        grid.unmount();

        assert_eq!(
            seen.lock().unwrap().as_slice(),
            [(true, 0.0), (true, 800.0), (false, 800.0)]
        );
    }

    #[test]
    fn cols_pass_through_unmodified() {
        let factory = Arc::new(ScriptedEngineFactory::new());
        let grid = PackingGrid::new(
            factory,
            GridOptions {
                cols: 3,
                ..GridOptions::default()
            },
        );
        assert_eq!(grid.context().snapshot().cols(), 3);
        grid.set_cols(5);
        assert_eq!(grid.context().snapshot().cols(), 5);
    }

    #[test]
    fn resize_notifications_pass_through_to_caller() {
        let sizes = Arc::new(Mutex::new(Vec::new()));
        let captured = sizes.clone();
        let options = GridOptions {
            on_resize: Arc::new(move |item_id: &str, size: Size| {
                captured.lock().unwrap().push((item_id.to_string(), size));
            }),
            ..GridOptions::default()
        };
        let (grid, _factory, _engine) = mounted_grid(options);

        grid.notify_resize("a", Size::new(120.0, 80.0));
        grid.context()
            .snapshot()
            .notify_resize("b", Size::new(60.0, 40.0));

        let seen = sizes.lock().unwrap();
        assert_eq!(seen.len(), 2);
        assert_eq!(seen[0], ("a".to_string(), Size::new(120.0, 80.0)));
        assert_eq!(seen[1], ("b".to_string(), Size::new(60.0, 40.0)));
    }

    #[test]
    fn set_on_resize_republishes_and_swaps_the_target() {
        let old = Arc::new(Mutex::new(Vec::new()));
        let captured = old.clone();
        let options = GridOptions {
            on_resize: Arc::new(move |item_id: &str, _size: Size| {
                captured.lock().unwrap().push(item_id.to_string());
            }),
            ..GridOptions::default()
        };
        let (grid, _factory, _engine) = mounted_grid(options);

        let publications = Arc::new(Mutex::new(0usize));
        let captured = publications.clone();
        let _binding = grid.context().subscribe(Arc::new(move |_| {
            *captured.lock().unwrap() += 1;
        }));

        let new = Arc::new(Mutex::new(Vec::new()));
        let captured = new.clone();
        grid.set_on_resize(Arc::new(move |item_id: &str, _size: Size| {
            captured.lock().unwrap().push(item_id.to_string());
        }));
        assert_eq!(*publications.lock().unwrap(), 1);

        grid.context()
            .snapshot()
            .notify_resize("a", Size::new(10.0, 20.0));
        assert!(old.lock().unwrap().is_empty());
        assert_eq!(new.lock().unwrap().as_slice(), ["a".to_string()]);
    }

    #[test]
    fn set_on_layout_change_swaps_the_callback_mid_session() {
        let (options, old_calls) = recording_options();
        let (grid, _factory, engine) = mounted_grid(options);
        engine.add(item_element("a"));
        engine.layout();
        assert_eq!(old_calls.lock().unwrap().len(), 1);

        let new_calls = Arc::new(Mutex::new(Vec::new()));
        let captured = new_calls.clone();
        grid.set_on_layout_change(Arc::new(move |ids: &[String]| {
            captured.lock().unwrap().push(ids.to_vec());
        }));

        engine.layout();
        assert_eq!(old_calls.lock().unwrap().len(), 1);
        assert_eq!(
            new_calls.lock().unwrap().as_slice(),
            [vec!["a".to_string()]]
        );
    }

    #[test]
    fn missing_id_surfaces_diagnostic_and_metric() {
        let sink = MemorySink::new();
        let mut options = GridOptions {
            logger: Some(Logger::new(sink.clone())),
            ..GridOptions::default()
        };
        options.enable_metrics();
        let metrics = options.metrics_handle().unwrap();

        let (_grid, _factory, engine) = mounted_grid(options);
        engine.add(item_element("a"));
        engine.add(Element::new("div"));
        engine.layout();

        assert!(sink.messages().iter().any(|m| m == "item_missing_id"));
        let snapshot = metrics.lock().unwrap().snapshot();
        assert_eq!(snapshot.items_skipped, 1);
        assert_eq!(snapshot.layout_events, 1);
    }

    #[test]
    fn relayout_drives_engine_refresh_and_layout() {
        let (options, calls) = recording_options();
        let (grid, _factory, engine) = mounted_grid(options);
        engine.add(item_element("a"));
        engine.set_item_content("a", "one\ntwo").unwrap();

        grid.relayout();

        assert_eq!(calls.lock().unwrap().as_slice(), [vec!["a".to_string()]]);
        assert_eq!(engine.rect_of("a").unwrap().height, 20.0);
    }
}
