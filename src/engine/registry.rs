use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};

use super::SharedEngine;

/// Key for one engine lifetime. Keys are never reused, so a stale key held
/// across a remount resolves to nothing instead of the wrong engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SessionId(u64);

/// Arena mapping session keys to live engine handles.
///
/// Dependents resolve the current handle by key instead of holding a raw
/// reference across sessions: once a session is released, resolution yields
/// `None` and nothing can reach the destroyed engine through the registry.
#[derive(Default)]
pub struct EngineRegistry {
    engines: RwLock<HashMap<SessionId, SharedEngine>>,
    next: AtomicU64,
}

pub type SharedEngineRegistry = Arc<EngineRegistry>;

impl EngineRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, engine: SharedEngine) -> SessionId {
        let session = SessionId(self.next.fetch_add(1, Ordering::Relaxed));
        if let Ok(mut guard) = self.engines.write() {
            guard.insert(session, engine);
        }
        session
    }

    pub fn release(&self, session: SessionId) {
        if let Ok(mut guard) = self.engines.write() {
            guard.remove(&session);
        }
    }

    pub fn resolve(&self, session: SessionId) -> Option<SharedEngine> {
        self.engines
            .read()
            .ok()
            .and_then(|guard| guard.get(&session).cloned())
    }

    pub fn len(&self) -> usize {
        self.engines.read().map(|guard| guard.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
