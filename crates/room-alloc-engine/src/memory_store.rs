//! In-memory implementation of the assignment store

use std::sync::atomic::{AtomicU64, Ordering};

use dashmap::DashMap;
use room_alloc_core::{Assignment, AssignmentId, AssignmentStore, Class, RequestId, Status, StoreError};

/// Assignment store kept in a concurrent map
///
/// Ids and waitlist join stamps are handed out in increasing order and never
/// reused, also not after [`AssignmentStore::delete_all`].
#[derive(Default)]
pub struct MemoryStore {
    rows: DashMap<AssignmentId, Assignment>,
    next_id: AtomicU64,
    next_join: AtomicU64,
}

impl MemoryStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored rows
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether the store holds no rows
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// All rows ordered by id
    pub fn all(&self) -> Vec<Assignment> {
        self.sorted(|_| true)
    }

    fn sorted(&self, filter: impl Fn(&Assignment) -> bool) -> Vec<Assignment> {
        let mut rows: Vec<Assignment> = self
            .rows
            .iter()
            .filter(|entry| filter(entry.value()))
            .map(|entry| entry.value().clone())
            .collect();
        rows.sort_by_key(Assignment::id);
        rows
    }
}

impl AssignmentStore for MemoryStore {
    fn save_all(&self, rows: Vec<Assignment>) -> Result<Vec<Assignment>, StoreError> {
        // reject the whole batch before writing anything
        if let Some(id) = rows
            .iter()
            .filter_map(Assignment::id)
            .find(|id| !self.rows.contains_key(id))
        {
            return Err(StoreError::UnknownAssignment(id));
        }

        let mut saved = Vec::with_capacity(rows.len());
        for row in rows {
            debug_assert!(row.is_consistent(), "inconsistent row {row:?}");
            let id = row
                .id()
                .unwrap_or_else(|| AssignmentId(self.next_id.fetch_add(1, Ordering::Relaxed) + 1));
            let mut row = row.with_id(id);
            if row.status() == Status::Waitlist && row.joined().is_none() {
                row = row.with_joined(self.next_join.fetch_add(1, Ordering::Relaxed) + 1);
            }
            self.rows.insert(id, row.clone());
            saved.push(row);
        }
        Ok(saved)
    }

    fn delete_all(&self) -> Result<(), StoreError> {
        self.rows.clear();
        Ok(())
    }

    fn find_by_id(&self, id: AssignmentId) -> Result<Option<Assignment>, StoreError> {
        Ok(self.rows.get(&id).map(|entry| entry.value().clone()))
    }

    fn find_by_request_and_status(
        &self,
        request: RequestId,
        status: Status,
    ) -> Result<Option<Assignment>, StoreError> {
        Ok(self
            .sorted(|row| row.request_id() == request && row.status() == status)
            .into_iter()
            .next())
    }

    fn find_all_by_status(&self, status: Status) -> Result<Vec<Assignment>, StoreError> {
        Ok(self.sorted(|row| row.status() == status))
    }

    fn find_earliest_waitlisted(&self, class: Class) -> Result<Option<Assignment>, StoreError> {
        Ok(self
            .rows
            .iter()
            .filter(|entry| entry.status() == Status::Waitlist && entry.queue() == Some(class))
            .map(|entry| entry.value().clone())
            .min_by_key(Assignment::joined))
    }

    fn find_waitlist_in_order(&self) -> Result<Vec<Assignment>, StoreError> {
        let mut rows = self.sorted(|row| row.status() == Status::Waitlist);
        rows.sort_by_key(|row| (row.priority(), row.id()));
        Ok(rows)
    }
}
