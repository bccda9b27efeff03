//! Errors surfaced by the engine

use room_alloc_core::{SourceError, StoreError};
use thiserror::Error;

/// Failure of an engine operation
///
/// Pool exhaustion and rejections without an active claim are not errors.
#[derive(Debug, Error)]
pub enum EngineError {
    /// The request batch could not be loaded; nothing was changed
    #[error(transparent)]
    Source(#[from] SourceError),
    /// The store failed; in-memory state may be ahead of the store
    #[error(transparent)]
    Store(#[from] StoreError),
}
