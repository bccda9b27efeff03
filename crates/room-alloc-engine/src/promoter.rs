//! Promotion of waitlisted requests into freed rooms

use room_alloc_core::{Assignment, AssignmentStore, Class, RoomId, StoreError};

/// Pick the request that receives `room`: the one waiting longest in `class`
///
/// The waiter is looked up in the store, not in an in-memory queue, since
/// promotions happen between full runs. Rows that are not queued in `class`
/// are never picked. The returned row already holds `room` but is not
/// written; the caller saves it together with the rest of the event.
/// Returns [`None`] if nobody waits in `class`.
pub fn next_waiter(
    store: &dyn AssignmentStore,
    room: RoomId,
    class: Class,
) -> Result<Option<Assignment>, StoreError> {
    let Some(mut waiter) = store.find_earliest_waitlisted(class)? else {
        return Ok(None);
    };
    waiter.grant(room, class);
    Ok(Some(waiter))
}

#[cfg(test)]
mod tests {
    use room_alloc_core::{RequestId, Status};

    use super::*;
    use crate::memory_store::MemoryStore;

    #[test]
    fn longest_waiter_of_class_is_picked() {
        let store = MemoryStore::new();
        store
            .save_all(vec![
                Assignment::waitlisted(RequestId(1), Class::Secondary),
                Assignment::waitlisted(RequestId(2), Class::Primary),
                Assignment::waitlisted(RequestId(3), Class::Primary),
            ])
            .unwrap();

        let waiter = next_waiter(&store, RoomId(4), Class::Primary)
            .unwrap()
            .unwrap();

        assert_eq!(waiter.request_id(), RequestId(2));
        assert_eq!(waiter.status(), Status::PrimaryAssigned);
        assert_eq!(waiter.room(), Some(RoomId(4)));
        // nothing is written yet
        assert_eq!(store.find_waitlist_in_order().unwrap().len(), 3);
    }

    #[test]
    fn no_waiter_in_class() {
        let store = MemoryStore::new();
        store
            .save_all(vec![
                Assignment::waitlisted(RequestId(1), Class::Secondary),
                Assignment::waitlisted(RequestId(2), None),
            ])
            .unwrap();

        assert!(next_waiter(&store, RoomId(2), Class::Primary)
            .unwrap()
            .is_none());
    }
}
