//! First-come-first-served assignment pass

use std::collections::VecDeque;

use room_alloc_core::{Assignment, Class, RequestId};
use tracing::debug;

use crate::pool::RoomPool;

/// Hand rooms of `class` to `requests` in input order
///
/// Every request that gets a room produces a row appended to `rows`. The
/// requests left without a room are returned as a FIFO waitlist, in input
/// order.
pub fn assign<I>(
    requests: I,
    class: Class,
    pool: &RoomPool,
    rows: &mut Vec<Assignment>,
) -> VecDeque<RequestId>
where
    I: IntoIterator<Item = RequestId>,
{
    let mut waitlist = VecDeque::new();
    for request in requests {
        match pool.take(class) {
            Some(room) => {
                debug!(%request, %room, %class, "assigned");
                rows.push(Assignment::assigned(request, room, class));
            }
            None => waitlist.push_back(request),
        }
    }
    waitlist
}

#[cfg(test)]
mod tests {
    use room_alloc_core::{Config, RoomId, Status};

    use super::*;

    fn ids(range: std::ops::RangeInclusive<u32>) -> impl Iterator<Item = RequestId> {
        range.map(RequestId)
    }

    #[test]
    fn assigns_in_order_until_exhausted() {
        let pool = RoomPool::new();
        pool.reset(&Config::new(6));
        let mut rows = Vec::new();

        let waitlist = assign(ids(1..=5), Class::Primary, &pool, &mut rows);

        let assigned: Vec<_> = rows.iter().map(|r| (r.request_id().0, r.room())).collect();
        assert_eq!(
            assigned,
            vec![(1, Some(RoomId(1))), (2, Some(RoomId(2))), (3, Some(RoomId(3)))]
        );
        assert!(rows.iter().all(|r| r.status() == Status::PrimaryAssigned));
        assert_eq!(waitlist, VecDeque::from([RequestId(4), RequestId(5)]));
    }

    #[test]
    fn uses_reclaimed_rooms_after_own_range() {
        let pool = RoomPool::new();
        pool.reset(&Config::new(2));
        let room = pool.take_primary().unwrap();
        pool.release(room);

        let mut rows = Vec::new();
        let waitlist = assign(ids(1..=3), Class::Secondary, &pool, &mut rows);

        let rooms: Vec<_> = rows.iter().filter_map(Assignment::room).collect();
        assert_eq!(rooms, vec![RoomId(2), RoomId(1)]);
        assert_eq!(waitlist, VecDeque::from([RequestId(3)]));
        assert_eq!(pool.contents().total(), 0);
    }
}
