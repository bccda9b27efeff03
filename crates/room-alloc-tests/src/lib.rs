use std::collections::HashSet;
use std::sync::Arc;

use eyre::{ensure, eyre, Result};
use room_alloc_core::{
    AllocationPolicy, Assignment, AssignmentStore, Class, Config, Request, RequestId, RoomId,
    Status,
};
use room_alloc_engine::{Engine, MemoryStore, RunSummary};

mod doubles;
mod fixtures;
pub use doubles::{FailingStore, ScriptedSource};
pub use fixtures::{primary, secondary};

pub struct TestCtxBuilder {
    /// Number of rooms in the pool
    pub rooms: u32,
    /// Pool split and downgrade behaviour
    pub policy: AllocationPolicy,
    /// Batch returned by the request source
    pub requests: Vec<Request>,
    /// Store to run against, a fresh [`MemoryStore`] if unset
    pub store: Option<Arc<dyn AssignmentStore>>,
}

impl TestCtxBuilder {
    /// Create a test context builder with 10 rooms, the default policy and
    /// no requests
    pub fn new() -> Self {
        TestCtxBuilder {
            rooms: 10,
            policy: AllocationPolicy::default(),
            requests: Vec::new(),
            store: None,
        }
    }

    /// Set the number of rooms
    pub fn with_rooms(mut self, rooms: u32) -> Self {
        self.rooms = rooms;
        self
    }

    /// Set the allocation policy
    pub fn with_policy(mut self, policy: AllocationPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Set the batch of requests the first run sees
    pub fn with_requests(mut self, requests: impl IntoIterator<Item = Request>) -> Self {
        self.requests = requests.into_iter().collect();
        self
    }

    /// Run against `store` instead of a fresh in-memory one
    pub fn with_store(mut self, store: Arc<dyn AssignmentStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Get the [`Config`] for launching the engine
    fn config(&self) -> Config {
        Config {
            rooms: self.rooms,
            policy: self.policy,
        }
    }

    /// Build the test context and run the initial allocation
    pub fn build(self) -> Result<TestCtx> {
        let config = self.config();
        let source = ScriptedSource::new(self.requests);
        let store = self.store.unwrap_or_else(|| Arc::new(MemoryStore::new()));
        let engine = Arc::new(Engine::new(config, source.clone(), store.clone()));
        let initial = engine.run_full_reassignment()?;

        Ok(TestCtx {
            engine,
            store,
            source,
            rooms: config.rooms,
            initial,
        })
    }
}

impl Default for TestCtxBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Test context
pub struct TestCtx {
    /// The engine under test
    pub engine: Arc<Engine>,
    /// Store the engine writes to
    pub store: Arc<dyn AssignmentStore>,
    /// Source feeding the engine's full runs
    pub source: ScriptedSource,
    /// Number of rooms in the pool
    pub rooms: u32,
    /// Outcome of the initial run
    pub initial: RunSummary,
}

impl TestCtx {
    /// Every row holding a room, primary ones first
    pub fn assigned_rows(&self) -> Result<Vec<Assignment>> {
        let mut rows = self.store.find_all_by_status(Status::PrimaryAssigned)?;
        rows.extend(self.store.find_all_by_status(Status::SecondaryAssigned)?);
        Ok(rows)
    }

    /// The row currently held by `request`, whatever its status
    pub fn row_of(&self, request: RequestId) -> Result<Assignment> {
        let mut rows = self.assigned_rows()?;
        rows.extend(self.store.find_waitlist_in_order()?);
        rows.into_iter()
            .find(|row| row.request_id() == request)
            .ok_or_else(|| eyre!("request {request} has no row"))
    }

    /// Request ids holding a room of `class`, ordered by assignment id
    pub fn holders(&self, class: Class) -> Result<Vec<u32>> {
        Ok(self
            .store
            .find_all_by_status(class.assigned_status())?
            .iter()
            .map(|row| row.request_id().0)
            .collect())
    }

    /// Request ids on the waitlist, in waitlist order
    pub fn waiting(&self) -> Result<Vec<u32>> {
        Ok(self
            .engine
            .waitlist()?
            .iter()
            .map(|row| row.request_id().0)
            .collect())
    }

    /// Check that rooms are neither lost nor shared and that the snapshot
    /// agrees with the store
    pub fn check_invariants(&self) -> Result<()> {
        let free = self.engine.pool_contents();
        let assigned = self.assigned_rows()?;

        let mut seen: HashSet<RoomId> = HashSet::new();
        for room in free.iter() {
            ensure!(seen.insert(room), "room {room} is free twice");
        }
        for row in &assigned {
            ensure!(row.is_consistent(), "inconsistent row {row:?}");
            let room = row.room().ok_or_else(|| eyre!("assigned row without a room"))?;
            ensure!(seen.insert(room), "room {room} is held and free, or held twice");
        }
        ensure!(
            seen.len() == self.rooms as usize,
            "{} rooms accounted for, expected {}",
            seen.len(),
            self.rooms
        );
        ensure!(
            seen.iter().all(|room| (1..=self.rooms).contains(&room.0)),
            "room outside of 1..={}",
            self.rooms
        );

        let mut requests = HashSet::new();
        for row in assigned.iter().chain(&self.store.find_waitlist_in_order()?) {
            ensure!(
                requests.insert(row.request_id()),
                "request {} has two rows",
                row.request_id()
            );
        }

        ensure!(
            *self.engine.primary_snapshot()
                == *self.store.find_all_by_status(Status::PrimaryAssigned)?,
            "primary snapshot differs from the store"
        );
        ensure!(
            *self.engine.secondary_snapshot()
                == *self.store.find_all_by_status(Status::SecondaryAssigned)?,
            "secondary snapshot differs from the store"
        );
        Ok(())
    }
}
