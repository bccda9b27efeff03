use thiserror::Error;

use crate::assignment::{Assignment, AssignmentId, Class, Status};
use crate::request::RequestId;

/// Failure reported by an [`AssignmentStore`]
#[derive(Debug, Error)]
pub enum StoreError {
    /// The store could not complete the operation
    #[error("assignment store unavailable: {0}")]
    Unavailable(String),
    /// An update referenced a row that does not exist
    #[error("no assignment with id {0}")]
    UnknownAssignment(AssignmentId),
}

/// Durable home of [`Assignment`] rows
///
/// The engine treats the store as a synchronous table. Atomicity of a batch of
/// writes is the store's business.
pub trait AssignmentStore: Send + Sync {
    /// Insert rows without an id and update rows with an id
    ///
    /// A waiting row without a join stamp gets the next one, so rows join
    /// their queue in the order they are saved. The batch is written as a
    /// whole or not at all. Returns the rows as stored, in the order given,
    /// with ids and stamps attached.
    fn save_all(&self, rows: Vec<Assignment>) -> Result<Vec<Assignment>, StoreError>;

    /// Remove every row
    fn delete_all(&self) -> Result<(), StoreError>;

    /// Get the row with the given id
    fn find_by_id(&self, id: AssignmentId) -> Result<Option<Assignment>, StoreError>;

    /// Get the row of `request` that currently has `status`
    fn find_by_request_and_status(
        &self,
        request: RequestId,
        status: Status,
    ) -> Result<Option<Assignment>, StoreError>;

    /// Get all rows with `status`, ordered by id
    fn find_all_by_status(&self, status: Status) -> Result<Vec<Assignment>, StoreError>;

    /// Get the waitlisted row queued in `class` with the lowest join stamp
    fn find_earliest_waitlisted(&self, class: Class) -> Result<Option<Assignment>, StoreError>;

    /// Get all waitlisted rows ordered by priority, then id
    fn find_waitlist_in_order(&self) -> Result<Vec<Assignment>, StoreError>;

    /// Insert or update a single row
    fn save(&self, row: Assignment) -> Result<Assignment, StoreError> {
        self.save_all(vec![row])?
            .pop()
            .ok_or_else(|| StoreError::Unavailable("save returned no row".into()))
    }
}
