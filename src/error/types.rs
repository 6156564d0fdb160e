use thiserror::Error;

/// Unified result type for the packing grid crate.
pub type Result<T> = std::result::Result<T, GridError>;

/// Errors surfaced by the grid coordination layer.
///
/// The [`PackingGrid`](crate::PackingGrid) component itself never returns
/// these: missing containers, missing identifiers, and relayout without an
/// engine are silent (logged) no-ops. They exist for engine collaborators
/// and embedder helpers that do want a fallible surface.
#[derive(Debug, Error)]
pub enum GridError {
    #[error("item `{0}` not found")]
    ItemNotFound(String),
    /// Failure surfaced by an external engine collaborator. Embedder-facing:
    /// the grid and the scripted engine never produce it themselves.
    #[error("engine backend error: {0}")]
    Backend(String),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}
