//! 🛏 Allocation engine handing a fixed pool of rooms to two priority classes
//! of requests.
//!
//! A full run ([`Engine::run_full_reassignment`]) partitions the request batch
//! ([`partition`]), hands out rooms first-come-first-served ([`pass`]),
//! applies the batch rejection flags ([`rejection`]) and persists the result.
//! Between runs, live rejections ([`Engine::reject_primary`],
//! [`Engine::reject_secondary`]) move single requests along their downgrade
//! path and promote waitlisted requests ([`promoter`]) into the freed rooms.
//! Readers get the current assignments from a [`snapshot::Snapshot`].

use std::sync::Arc;

use room_alloc_core::{Config, RequestSource};

mod engine;
mod error;
mod events;
mod memory_store;
pub mod partition;
pub mod pass;
pub mod pool;
pub mod promoter;
pub mod rejection;
pub mod snapshot;

pub use engine::{Engine, RunSummary};
pub use error::EngineError;
pub use events::{RejectStep, Rejection};
pub use memory_store::MemoryStore;
pub use pool::PoolContents;

/// Build an engine backed by a [`MemoryStore`] and run the initial allocation
///
/// The store is returned alongside so that callers can inspect it.
pub fn launch(
    config: &Config,
    source: impl RequestSource + 'static,
) -> Result<(Engine, Arc<MemoryStore>), EngineError> {
    let store = Arc::new(MemoryStore::new());
    let engine = Engine::new(*config, source, store.clone());
    engine.run_full_reassignment()?;
    Ok((engine, store))
}
