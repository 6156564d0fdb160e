//! The layout/drag capability behind the grid, expressed as a trait so the
//! packing algorithm itself stays external. [`ScriptedEngine`] is the
//! deterministic in-memory implementation used by tests, benches, and
//! embedders without a real layout backend.

mod registry;
pub mod scripted;

use std::sync::Arc;

use crate::element::ElementRef;

pub use registry::{EngineRegistry, SessionId, SharedEngineRegistry};
pub use scripted::{ScriptedEngine, ScriptedEngineFactory};

/// Configuration the grid hands to the factory at engine creation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineOptions {
    /// Whether pointer dragging of items is enabled.
    pub drag_enabled: bool,
    /// Attribute marking the descendant elements that may start a drag.
    pub drag_handle: String,
    /// Whether the layout strategy backfills gaps left by tall items.
    pub fill_gaps: bool,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            drag_enabled: false,
            drag_handle: String::new(),
            fill_gaps: false,
        }
    }
}

/// One registered tile. Detached items report no element.
#[derive(Debug, Clone)]
pub struct EngineItem {
    element: Option<ElementRef>,
}

impl EngineItem {
    pub fn new(element: ElementRef) -> Self {
        Self {
            element: Some(element),
        }
    }

    pub fn detached() -> Self {
        Self { element: None }
    }

    pub fn element(&self) -> Option<&ElementRef> {
        self.element.as_ref()
    }

    /// Identifier read from the backing element, `None` when the item is
    /// detached or the attribute is absent or empty.
    pub fn item_id(&self) -> Option<String> {
        self.element.as_ref().and_then(|el| el.item_id())
    }
}

/// Handler invoked with the item set a layout or drag event delivers.
pub type ItemHandler = Arc<dyn Fn(&[EngineItem]) + Send + Sync>;

/// Disposer returned by every subscribe call. Dropping it (or calling
/// [`dispose`](EventBinding::dispose)) removes the handler, so a binding held
/// in a struct field is released on every exit path.
pub struct EventBinding {
    release: Option<Box<dyn FnOnce() + Send>>,
}

impl EventBinding {
    pub fn new(release: impl FnOnce() + Send + 'static) -> Self {
        Self {
            release: Some(Box::new(release)),
        }
    }

    pub fn dispose(mut self) {
        if let Some(release) = self.release.take() {
            release();
        }
    }
}

impl Drop for EventBinding {
    fn drop(&mut self) {
        if let Some(release) = self.release.take() {
            release();
        }
    }
}

/// Black-box layout/drag engine contract.
///
/// Event ordering guarantee expected of implementations: handlers registered
/// via `on_layout_end`/`on_drag_end` fire synchronously when the engine
/// finishes a reflow or a drag gesture, and never again once their binding
/// is released or `destroy` has run.
pub trait GridEngine: Send + Sync {
    /// Register an item backed by `element` at the end of the current order.
    fn add(&self, element: ElementRef);

    /// Remove the given items from the engine.
    fn remove(&self, items: &[EngineItem]);

    /// The current item set in visual/registration order.
    fn items(&self) -> Vec<EngineItem>;

    /// Re-measure registered items' dimensions from their content.
    fn refresh_items(&self);

    /// Recompute positions and fire layout-end.
    fn layout(&self);

    fn on_layout_end(&self, handler: ItemHandler) -> EventBinding;

    fn on_drag_end(&self, handler: ItemHandler) -> EventBinding;

    /// Release all engine-internal listeners and element references. Runs
    /// exactly once per engine; later calls are no-ops.
    fn destroy(&self);
}

pub type SharedEngine = Arc<dyn GridEngine>;

/// Creates an engine bound to a container element. Engines auto-discover the
/// container's existing children as items at creation; the grid strips those
/// immediately since registration is owned by item components.
pub trait EngineFactory: Send + Sync {
    fn create(&self, container: &ElementRef, options: &EngineOptions) -> SharedEngine;
}

pub type SharedEngineFactory = Arc<dyn EngineFactory>;
