//! Deterministic in-memory engine. Placement is order-preserving (items
//! stack in registration/drag order, no packing), which keeps layout and
//! drag scripts reproducible for tests and benches.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, Weak};

use crate::element::ElementRef;
use crate::error::{GridError, Result};
use crate::geometry::Rect;

use super::{
    EngineFactory, EngineItem, EngineOptions, EventBinding, GridEngine, ItemHandler, SharedEngine,
};

const ITEM_WIDTH: f64 = 100.0;
const ROW_HEIGHT: f64 = 10.0;

struct ItemRecord {
    element: ElementRef,
    rect: Rect,
    content_hash: Option<blake3::Hash>,
    dirty: bool,
}

impl ItemRecord {
    fn new(element: ElementRef) -> Self {
        let mut record = Self {
            element,
            rect: Rect::default(),
            content_hash: None,
            dirty: true,
        };
        record.measure();
        record
    }

    /// Re-hash the backing element's content; items whose content is
    /// unchanged keep their measured size and stay clean.
    fn refresh(&mut self) {
        let new_hash = blake3::hash(self.element.content().as_bytes());
        if self.content_hash.map(|h| h != new_hash).unwrap_or(true) {
            self.content_hash = Some(new_hash);
            self.dirty = true;
            self.measure();
        }
    }

    fn measure(&mut self) {
        let lines = self.element.content().lines().count().max(1);
        self.rect.width = ITEM_WIDTH;
        self.rect.height = lines as f64 * ROW_HEIGHT;
    }
}

#[derive(Default)]
struct EngineState {
    records: Vec<ItemRecord>,
    layout_end: HashMap<u64, ItemHandler>,
    drag_end: HashMap<u64, ItemHandler>,
    destroyed: bool,
}

pub struct ScriptedEngine {
    options: EngineOptions,
    state: Arc<Mutex<EngineState>>,
    next_binding: AtomicU64,
    destroy_count: AtomicUsize,
}

impl ScriptedEngine {
    /// Build an engine bound to `container`, auto-discovering its existing
    /// children as items the way a DOM-backed engine would on init.
    pub fn create(container: &ElementRef, options: &EngineOptions) -> Arc<Self> {
        let engine = Arc::new(Self {
            options: options.clone(),
            state: Arc::new(Mutex::new(EngineState::default())),
            next_binding: AtomicU64::new(0),
            destroy_count: AtomicUsize::new(0),
        });
        if let Ok(mut state) = engine.state.lock() {
            for child in container.children() {
                state.records.push(ItemRecord::new(child));
            }
        }
        engine
    }

    /// The configuration this engine was created with.
    pub fn options(&self) -> &EngineOptions {
        &self.options
    }

    /// How many times `destroy` has actually torn the engine down.
    pub fn destroy_count(&self) -> usize {
        self.destroy_count.load(Ordering::SeqCst)
    }

    /// Replace an item's content by identifier. The new size takes effect on
    /// the next `refresh_items`/`layout` pass.
    pub fn set_item_content(&self, item_id: &str, content: impl Into<String>) -> Result<()> {
        let element = self
            .state
            .lock()
            .ok()
            .and_then(|state| {
                state
                    .records
                    .iter()
                    .find(|record| record.element.item_id().as_deref() == Some(item_id))
                    .map(|record| record.element.clone())
            })
            .ok_or_else(|| GridError::ItemNotFound(item_id.to_string()))?;
        element.set_content(content);
        Ok(())
    }

    /// Solved rectangle for an item, if it has been laid out.
    pub fn rect_of(&self, item_id: &str) -> Option<Rect> {
        self.state.lock().ok().and_then(|state| {
            state
                .records
                .iter()
                .find(|record| record.element.item_id().as_deref() == Some(item_id))
                .map(|record| record.rect)
        })
    }

    /// Move the item at `from` to position `to`, as a completed drag
    /// gesture would. Does not fire any event; pair with `end_drag`.
    pub fn drag_move(&self, from: usize, to: usize) {
        if let Ok(mut state) = self.state.lock() {
            if from < state.records.len() && to < state.records.len() {
                let record = state.records.remove(from);
                state.records.insert(to, record);
            }
        }
    }

    /// Fire drag-end with an explicit payload. The payload may be stale
    /// relative to the live order; consumers are expected to re-read
    /// `items()` rather than trust it.
    pub fn end_drag(&self, payload: &[EngineItem]) {
        for handler in self.handlers_of(EventKind::DragEnd) {
            handler(payload);
        }
    }

    fn handlers_of(&self, kind: EventKind) -> Vec<ItemHandler> {
        // Handlers are cloned out and invoked with no engine lock held, so
        // they may re-enter the engine.
        let Ok(state) = self.state.lock() else {
            return Vec::new();
        };
        if state.destroyed {
            return Vec::new();
        }
        let table = match kind {
            EventKind::LayoutEnd => &state.layout_end,
            EventKind::DragEnd => &state.drag_end,
        };
        let mut entries: Vec<_> = table
            .iter()
            .map(|(id, handler)| (*id, handler.clone()))
            .collect();
        entries.sort_by_key(|(id, _)| *id);
        entries.into_iter().map(|(_, handler)| handler).collect()
    }

    fn bind(&self, kind: EventKind, handler: ItemHandler) -> EventBinding {
        let id = self.next_binding.fetch_add(1, Ordering::Relaxed);
        if let Ok(mut state) = self.state.lock() {
            let table = match kind {
                EventKind::LayoutEnd => &mut state.layout_end,
                EventKind::DragEnd => &mut state.drag_end,
            };
            table.insert(id, handler);
        }
        let weak = Arc::downgrade(&self.state);
        EventBinding::new(move || release(&weak, id))
    }
}

#[derive(Clone, Copy)]
enum EventKind {
    LayoutEnd,
    DragEnd,
}

fn release(state: &Weak<Mutex<EngineState>>, id: u64) {
    if let Some(state) = state.upgrade() {
        if let Ok(mut guard) = state.lock() {
            guard.layout_end.remove(&id);
            guard.drag_end.remove(&id);
        }
    }
}

impl GridEngine for ScriptedEngine {
    fn add(&self, element: ElementRef) {
        if let Ok(mut state) = self.state.lock() {
            if state.destroyed {
                return;
            }
            state.records.push(ItemRecord::new(element));
        }
    }

    fn remove(&self, items: &[EngineItem]) {
        if let Ok(mut state) = self.state.lock() {
            state.records.retain(|record| {
                !items.iter().any(|item| {
                    item.element()
                        .map(|el| Arc::ptr_eq(el, &record.element))
                        .unwrap_or(false)
                })
            });
        }
    }

    fn items(&self) -> Vec<EngineItem> {
        self.state
            .lock()
            .map(|state| {
                state
                    .records
                    .iter()
                    .map(|record| EngineItem::new(record.element.clone()))
                    .collect()
            })
            .unwrap_or_default()
    }

    fn refresh_items(&self) {
        if let Ok(mut state) = self.state.lock() {
            for record in &mut state.records {
                record.refresh();
            }
        }
    }

    fn layout(&self) {
        let items = {
            let Ok(mut state) = self.state.lock() else {
                return;
            };
            if state.destroyed {
                return;
            }
            let mut y = 0.0;
            for record in &mut state.records {
                record.rect.x = 0.0;
                record.rect.y = y;
                y += record.rect.height;
                record.dirty = false;
            }
            state
                .records
                .iter()
                .map(|record| EngineItem::new(record.element.clone()))
                .collect::<Vec<_>>()
        };
        for handler in self.handlers_of(EventKind::LayoutEnd) {
            handler(&items);
        }
    }

    fn on_layout_end(&self, handler: ItemHandler) -> EventBinding {
        self.bind(EventKind::LayoutEnd, handler)
    }

    fn on_drag_end(&self, handler: ItemHandler) -> EventBinding {
        self.bind(EventKind::DragEnd, handler)
    }

    fn destroy(&self) {
        if let Ok(mut state) = self.state.lock() {
            if state.destroyed {
                return;
            }
            state.destroyed = true;
            state.records.clear();
            state.layout_end.clear();
            state.drag_end.clear();
        }
        self.destroy_count.fetch_add(1, Ordering::SeqCst);
    }
}

/// Factory handing out scripted engines; keeps every engine it created so
/// tests can inspect them after the grid is done with them.
#[derive(Default)]
pub struct ScriptedEngineFactory {
    created: Mutex<Vec<Arc<ScriptedEngine>>>,
}

impl ScriptedEngineFactory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn created(&self) -> Vec<Arc<ScriptedEngine>> {
        self.created
            .lock()
            .map(|guard| guard.clone())
            .unwrap_or_default()
    }
}

impl EngineFactory for ScriptedEngineFactory {
    fn create(&self, container: &ElementRef, options: &EngineOptions) -> SharedEngine {
        let engine = ScriptedEngine::create(container, options);
        if let Ok(mut guard) = self.created.lock() {
            guard.push(engine.clone());
        }
        engine
    }
}
