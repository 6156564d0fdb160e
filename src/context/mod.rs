//! Shared context surface descendants consume. The orchestrator re-exports
//! from the private `core` module.

mod core;

pub use core::{ContextListener, ContextSnapshot, ContextStore, RelayoutFn, ResizeNotifyFn};
