//! Coordination layer for a draggable, reflowing tile grid.
//!
//! The crate owns the grid engine's lifecycle (one engine per mount),
//! bridges its layout-end and drag-end events into an ordered sequence of
//! item identifiers, and distributes a shared context snapshot to
//! descendant consumers. The packing algorithm itself stays behind the
//! [`GridEngine`] trait; [`ScriptedEngine`] is the deterministic in-memory
//! implementation used by tests and benches.

pub mod context;
pub mod element;
pub mod engine;
pub mod error;
pub mod geometry;
pub mod grid;
pub mod logging;
pub mod metrics;

pub use context::{ContextListener, ContextSnapshot, ContextStore, RelayoutFn, ResizeNotifyFn};
pub use element::{DRAG_HANDLE_ATTR, Element, ElementRef, ITEM_ID_ATTR, item_element};
pub use engine::{
    EngineFactory, EngineItem, EngineOptions, EngineRegistry, EventBinding, GridEngine,
    ItemHandler, ScriptedEngine, ScriptedEngineFactory, SessionId, SharedEngine,
    SharedEngineFactory, SharedEngineRegistry,
};
pub use error::{GridError, Result};
pub use geometry::{Rect, Size};
pub use grid::{GridOptions, LayoutChangeFn, LifecyclePhase, PackingGrid};
pub use logging::{
    FileSink, LogEvent, LogFields, LogLevel, LogSink, Logger, LoggingError, LoggingResult,
    MemorySink,
};
pub use metrics::{GridMetrics, MetricSnapshot};
