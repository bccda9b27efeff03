//! The allocation engine and its full-run orchestration

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Arc;

use parking_lot::Mutex;
use room_alloc_core::{
    Assignment, AssignmentId, AssignmentStore, Class, Config, Request, RequestId, RequestSource,
    Status, StoreError,
};
use serde::Serialize;
use tracing::{info, info_span};
use uuid::Uuid;

use crate::error::EngineError;
use crate::events::{self, Rejection};
use crate::pass;
use crate::partition::partition;
use crate::pool::{PoolContents, RoomPool};
use crate::rejection;
use crate::snapshot::Snapshot;

/// Counts of one full run
#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize)]
pub struct RunSummary {
    /// Rows holding a primary room
    pub primary_assigned: usize,
    /// Rows holding a secondary room
    pub secondary_assigned: usize,
    /// Rows left waiting
    pub waitlisted: usize,
}

/// Allocation engine owning the room pools and the published snapshot
///
/// One instance lives for the whole process. Live rejections and snapshot
/// reads may come from any thread. Full runs, live rejections and waitlist
/// reordering are serialized against each other; snapshot reads never wait
/// for them.
pub struct Engine {
    config: Config,
    pool: RoomPool,
    snapshot: Snapshot,
    store: Arc<dyn AssignmentStore>,
    source: Box<dyn RequestSource>,
    /// Held by every operation that moves rooms or writes the store
    mutations: Mutex<()>,
}

impl Engine {
    /// Create an engine with empty pools
    ///
    /// Nothing is allocated until [`Engine::run_full_reassignment`] is called.
    pub fn new(
        config: Config,
        source: impl RequestSource + 'static,
        store: Arc<dyn AssignmentStore>,
    ) -> Self {
        Self {
            config,
            pool: RoomPool::new(),
            snapshot: Snapshot::new(),
            store,
            source: Box::new(source),
            mutations: Mutex::new(()),
        }
    }

    /// Get the configuration
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Recompute every assignment from a fresh request batch
    ///
    /// The batch is loaded before anything is touched, so a failing source
    /// leaves the previous state in place. A failing store leaves the pools
    /// in their recomputed state and the snapshot at the previous run; the
    /// run has to be repeated.
    pub fn run_full_reassignment(&self) -> Result<RunSummary, EngineError> {
        let run_id = Uuid::new_v4();
        let span = info_span!("full_run", %run_id);
        let _enter = span.enter();

        let _guard = self.mutations.lock();
        let requests = self.source.load_requests()?;
        let total = requests.len();

        self.pool.reset(&self.config);
        let (primary, secondary) = partition(requests);
        info!(total, primary = primary.len(), secondary = secondary.len(), "partitioned requests");

        let mut primary_rows = Vec::new();
        let mut primary_waitlist = pass::assign(
            primary.iter().map(Request::id),
            Class::Primary,
            &self.pool,
            &mut primary_rows,
        );
        let downgraded_primary = rejection::resolve(
            &primary,
            Class::Primary,
            &self.config.policy,
            &self.pool,
            &mut primary_rows,
            &mut primary_waitlist,
        );

        // waiting primaries get the secondary range before native secondaries
        let mut secondary_rows = Vec::new();
        let still_waiting = pass::assign(
            primary_waitlist.drain(..),
            Class::Secondary,
            &self.pool,
            &mut secondary_rows,
        );
        let mut secondary_waitlist = pass::assign(
            secondary.iter().map(Request::id),
            Class::Secondary,
            &self.pool,
            &mut secondary_rows,
        );
        let downgraded_secondary = rejection::resolve(
            &secondary,
            Class::Secondary,
            &self.config.policy,
            &self.pool,
            &mut secondary_rows,
            &mut secondary_waitlist,
        );

        let rows = collect_rows(
            primary_rows.into_iter().chain(secondary_rows),
            still_waiting,
            secondary_waitlist,
            downgraded_primary.into_iter().chain(downgraded_secondary),
        );

        self.store.delete_all()?;
        let saved = self.store.save_all(rows)?;

        let mut primary_list = Vec::new();
        let mut secondary_list = Vec::new();
        let mut waitlisted = 0;
        for row in saved {
            match row.status() {
                Status::PrimaryAssigned => primary_list.push(row),
                Status::SecondaryAssigned => secondary_list.push(row),
                Status::Waitlist => waitlisted += 1,
            }
        }
        let summary = RunSummary {
            primary_assigned: primary_list.len(),
            secondary_assigned: secondary_list.len(),
            waitlisted,
        };
        self.snapshot.publish(primary_list, secondary_list);

        info!(
            primary_assigned = summary.primary_assigned,
            secondary_assigned = summary.secondary_assigned,
            waitlisted = summary.waitlisted,
            "assignments computed"
        );
        Ok(summary)
    }

    /// Reject the active primary assignment of `request`
    ///
    /// Returns [`None`] if there is none.
    pub fn reject_primary(&self, request: RequestId) -> Result<Option<Rejection>, EngineError> {
        self.reject(request, Class::Primary)
    }

    /// Reject the active secondary assignment of `request`
    ///
    /// Returns [`None`] if there is none.
    pub fn reject_secondary(&self, request: RequestId) -> Result<Option<Rejection>, EngineError> {
        self.reject(request, Class::Secondary)
    }

    /// Reject the active `class` assignment of `request`
    pub fn reject(&self, request: RequestId, class: Class) -> Result<Option<Rejection>, EngineError> {
        let _guard = self.mutations.lock();
        let rejection = events::reject(&*self.store, &self.pool, &self.config.policy, request, class)?;
        if let Some(rejection) = &rejection {
            self.refresh(rejection.touched(class))?;
        }
        Ok(rejection)
    }

    /// Currently published primary-assigned rows
    pub fn primary_snapshot(&self) -> Arc<[Assignment]> {
        self.snapshot.primary()
    }

    /// Currently published secondary-assigned rows
    pub fn secondary_snapshot(&self) -> Arc<[Assignment]> {
        self.snapshot.secondary()
    }

    /// All waitlisted rows, ordered by priority, then id
    pub fn waitlist(&self) -> Result<Vec<Assignment>, EngineError> {
        Ok(self.store.find_waitlist_in_order()?)
    }

    /// Every row in the store, whatever its status, ordered by id
    pub fn assignments(&self) -> Result<Vec<Assignment>, EngineError> {
        let mut rows = Vec::new();
        for status in [Status::PrimaryAssigned, Status::SecondaryAssigned, Status::Waitlist] {
            rows.extend(self.store.find_all_by_status(status)?);
        }
        rows.sort_by_key(Assignment::id);
        Ok(rows)
    }

    /// The row with the given id
    pub fn assignment(&self, id: AssignmentId) -> Result<Option<Assignment>, EngineError> {
        Ok(self.store.find_by_id(id)?)
    }

    /// Set the queue position of each row in `ids` to its index in the list
    ///
    /// Fails without writing anything if an id is unknown.
    pub fn reorder_waitlist(&self, ids: &[AssignmentId]) -> Result<Vec<Assignment>, EngineError> {
        let _guard = self.mutations.lock();
        let mut rows = Vec::with_capacity(ids.len());
        for (position, &id) in ids.iter().enumerate() {
            let mut row = self
                .store
                .find_by_id(id)?
                .ok_or(StoreError::UnknownAssignment(id))?;
            row.set_position(position as u32);
            rows.push(row);
        }
        Ok(self.store.save_all(rows)?)
    }

    /// Copy of the free pools
    pub fn pool_contents(&self) -> PoolContents {
        self.pool.contents()
    }

    /// Republish the lists of `classes` from the store
    fn refresh(&self, classes: &[Class]) -> Result<(), EngineError> {
        for &class in classes {
            let rows = self.store.find_all_by_status(class.assigned_status())?;
            self.snapshot.publish_class(class, rows);
        }
        Ok(())
    }
}

/// Assemble the rows to persist after a run
///
/// Rows holding a room come first, then the waitlist: primaries that found no
/// room at all, secondaries that found no room, and finally the downgraded
/// requests. A downgraded request keeps its demoted row if it had one. Each
/// request appears at most once. Waiting rows join their queues in this order
/// when saved.
fn collect_rows(
    rows: impl IntoIterator<Item = Assignment>,
    still_waiting: VecDeque<RequestId>,
    secondary_waitlist: VecDeque<RequestId>,
    downgraded: impl IntoIterator<Item = (RequestId, Option<Class>)>,
) -> Vec<Assignment> {
    let (mut rows, demoted): (Vec<_>, Vec<_>) =
        rows.into_iter().partition(|row| row.room().is_some());
    let mut demoted: HashMap<RequestId, Assignment> = demoted
        .into_iter()
        .map(|row| (row.request_id(), row))
        .collect();
    let mut seen: HashSet<RequestId> = rows.iter().map(Assignment::request_id).collect();

    let waiting = still_waiting
        .into_iter()
        .map(|id| (id, Class::Primary))
        .chain(secondary_waitlist.into_iter().map(|id| (id, Class::Secondary)));
    for (id, queue) in waiting {
        if seen.insert(id) {
            rows.push(Assignment::waitlisted(id, queue));
        }
    }
    for (id, queue) in downgraded {
        if seen.insert(id) {
            let row = demoted
                .remove(&id)
                .unwrap_or_else(|| Assignment::waitlisted(id, queue));
            rows.push(row);
        }
    }
    debug_assert!(demoted.is_empty(), "demoted rows without a downgrade: {demoted:?}");
    rows
}

#[cfg(test)]
mod tests {
    use room_alloc_core::RoomId;

    use super::*;

    #[test]
    fn collect_rows_orders_waitlist() {
        let mut demoted = Assignment::assigned(RequestId(1), RoomId(1), Class::Primary);
        demoted.demote(None);
        let rows = vec![
            demoted,
            Assignment::assigned(RequestId(2), RoomId(2), Class::Primary),
        ];

        let rows = collect_rows(
            rows,
            VecDeque::from([RequestId(3)]),
            VecDeque::from([RequestId(5), RequestId(3)]),
            [(RequestId(1), None), (RequestId(4), Some(Class::Secondary))],
        );

        let summary: Vec<_> = rows
            .iter()
            .map(|row| (row.request_id().0, row.status(), row.queue()))
            .collect();
        assert_eq!(
            summary,
            vec![
                (2, Status::PrimaryAssigned, Some(Class::Primary)),
                (3, Status::Waitlist, Some(Class::Primary)),
                (5, Status::Waitlist, Some(Class::Secondary)),
                (1, Status::Waitlist, None),
                (4, Status::Waitlist, Some(Class::Secondary)),
            ]
        );
    }
}
