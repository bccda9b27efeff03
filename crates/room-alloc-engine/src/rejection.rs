//! Rejection handling during a full run

use std::collections::{HashMap, VecDeque};

use room_alloc_core::{AllocationPolicy, Assignment, Class, DowngradePath, Request, RequestId};
use tracing::{debug, info};

use crate::pool::RoomPool;

/// Queue a request waits in after declining a room of `class`
///
/// A request is never queued for a class it declined. A declined primary
/// claim leaves the secondary queue open if the policy downgrades via
/// secondary rooms and the request has not declined those too.
pub(crate) fn declined_queue(
    class: Class,
    policy: &AllocationPolicy,
    declines_secondary: bool,
) -> Option<Class> {
    match (class, policy.downgrade) {
        (Class::Primary, DowngradePath::ViaSecondary) if !declines_secondary => {
            Some(Class::Secondary)
        }
        _ => None,
    }
}

/// Apply the `class` rejection flags of `requests` to the rows of one pass
///
/// Requests are visited in input order. A flagged request holding a room of
/// `class` gives it up: its row is demoted in place and the room goes to the
/// head of `waitlist`, or to the reclaimed pool if nobody waits. A flagged
/// request that is still waiting leaves `waitlist`. Both count as downgraded
/// and are returned in the order they were handled, with the queue they wait
/// in from now on. Flags without an active claim are ignored.
pub fn resolve(
    requests: &[Request],
    class: Class,
    policy: &AllocationPolicy,
    pool: &RoomPool,
    rows: &mut Vec<Assignment>,
    waitlist: &mut VecDeque<RequestId>,
) -> Vec<(RequestId, Option<Class>)> {
    let mut live: HashMap<RequestId, usize> = rows
        .iter()
        .enumerate()
        .filter(|(_, row)| row.is_assigned_in(class))
        .map(|(index, row)| (row.request_id(), index))
        .collect();
    let mut downgraded = Vec::new();

    for request in requests.iter().filter(|request| request.rejects(class)) {
        let id = request.id();
        let queue = declined_queue(class, policy, request.rejects(Class::Secondary));
        if let Some(index) = live.remove(&id) {
            let freed = rows[index]
                .demote(queue)
                .expect("assigned row without a room");
            downgraded.push((id, queue));

            match waitlist.pop_front() {
                Some(waiter) => {
                    info!(room = %freed, %waiter, %class, "reassigned rejected room to waiter");
                    rows.push(Assignment::assigned(waiter, freed, class));
                    live.insert(waiter, rows.len() - 1);
                }
                None => {
                    debug!(room = %freed, %class, "rejected room reclaimed");
                    pool.release(freed);
                }
            }
        } else if let Some(position) = waitlist.iter().position(|waiter| *waiter == id) {
            waitlist.remove(position);
            downgraded.push((id, queue));
        } else {
            debug!(request = %id, %class, "rejection without an active claim");
        }
    }

    downgraded
}

#[cfg(test)]
mod tests {
    use room_alloc_core::{Config, RoomId, Status};

    use super::*;
    use crate::pass;

    fn flagged(id: u32, reject: bool) -> Request {
        Request::new(RequestId(id), None, None, Some("FRA".into())).with_rejections(reject, false)
    }

    fn policy() -> AllocationPolicy {
        AllocationPolicy::default()
    }

    fn setup(rooms: u32, requests: &[Request]) -> (RoomPool, Vec<Assignment>, VecDeque<RequestId>) {
        let pool = RoomPool::new();
        pool.reset(&Config::new(rooms));
        let mut rows = Vec::new();
        let waitlist = pass::assign(requests.iter().map(Request::id), Class::Primary, &pool, &mut rows);
        (pool, rows, waitlist)
    }

    #[test]
    fn freed_room_goes_to_head_of_waitlist() {
        let requests = [flagged(1, true), flagged(2, false), flagged(3, false), flagged(4, false)];
        let (pool, mut rows, mut waitlist) = setup(4, &requests);
        assert_eq!(waitlist, VecDeque::from([RequestId(3), RequestId(4)]));

        let downgraded = resolve(&requests, Class::Primary, &policy(), &pool, &mut rows, &mut waitlist);

        assert_eq!(downgraded, vec![(RequestId(1), Some(Class::Secondary))]);
        assert_eq!(rows[0].status(), Status::Waitlist);
        assert_eq!(rows[0].room(), None);
        let promoted = rows.last().unwrap();
        assert_eq!(promoted.request_id(), RequestId(3));
        assert_eq!(promoted.room(), Some(RoomId(1)));
        assert_eq!(waitlist, VecDeque::from([RequestId(4)]));
        assert!(pool.contents().reclaimed.is_empty());
    }

    #[test]
    fn freed_room_is_reclaimed_without_waiters() {
        let requests = [flagged(1, false), flagged(2, true)];
        let (pool, mut rows, mut waitlist) = setup(4, &requests);

        let downgraded = resolve(&requests, Class::Primary, &policy(), &pool, &mut rows, &mut waitlist);

        assert_eq!(downgraded, vec![(RequestId(2), Some(Class::Secondary))]);
        assert_eq!(pool.contents().reclaimed, vec![RoomId(2)]);
    }

    #[test]
    fn waiting_request_leaves_the_waitlist() {
        let requests = [flagged(1, false), flagged(2, false), flagged(3, true), flagged(4, false)];
        let (pool, mut rows, mut waitlist) = setup(4, &requests);

        let downgraded = resolve(&requests, Class::Primary, &policy(), &pool, &mut rows, &mut waitlist);

        assert_eq!(downgraded, vec![(RequestId(3), Some(Class::Secondary))]);
        assert_eq!(waitlist, VecDeque::from([RequestId(4)]));
        assert_eq!(rows.len(), 2);
    }

    #[test]
    fn promoted_waiter_can_still_reject() {
        let requests = [flagged(1, true), flagged(2, false), flagged(3, true)];
        let (pool, mut rows, mut waitlist) = setup(4, &requests);

        let downgraded = resolve(&requests, Class::Primary, &policy(), &pool, &mut rows, &mut waitlist);

        assert_eq!(
            downgraded,
            vec![(RequestId(1), Some(Class::Secondary)), (RequestId(3), Some(Class::Secondary))]
        );
        assert!(rows.iter().all(|row| row.request_id() == RequestId(2) || row.room().is_none()));
        assert_eq!(pool.contents().reclaimed, vec![RoomId(1)]);
    }

    #[test]
    fn flags_of_other_class_are_ignored() {
        let requests = [flagged(1, false).with_rejections(false, true)];
        let (pool, mut rows, mut waitlist) = setup(2, &requests);

        let downgraded = resolve(&requests, Class::Primary, &policy(), &pool, &mut rows, &mut waitlist);

        assert!(downgraded.is_empty());
        assert_eq!(rows[0].status(), Status::PrimaryAssigned);
    }

    #[test]
    fn declining_both_classes_leaves_no_queue() {
        let requests = [flagged(1, false).with_rejections(true, true)];
        let (pool, mut rows, mut waitlist) = setup(2, &requests);

        let downgraded = resolve(&requests, Class::Primary, &policy(), &pool, &mut rows, &mut waitlist);

        assert_eq!(downgraded, vec![(RequestId(1), None)]);
        assert_eq!(rows[0].queue(), None);
    }

    #[test]
    fn declined_secondary_is_never_requeued() {
        assert_eq!(declined_queue(Class::Secondary, &policy(), false), None);
        let single_tier = AllocationPolicy {
            downgrade: DowngradePath::DirectToWaitlist,
            ..policy()
        };
        assert_eq!(declined_queue(Class::Primary, &single_tier, false), None);
        assert_eq!(declined_queue(Class::Primary, &policy(), false), Some(Class::Secondary));
    }
}
