//! Live rejection of a single active assignment between full runs

use room_alloc_core::{
    AllocationPolicy, Assignment, AssignmentStore, Class, DowngradePath, RequestId, RoomId,
    StoreError,
};
use serde::Serialize;
use tracing::info;

use crate::pool::RoomPool;
use crate::promoter;
use crate::rejection::declined_queue;

/// Where the rejecting request ended up
#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RejectStep {
    /// Moved to another room of its own range
    Reassigned,
    /// Moved from a primary to a secondary room
    Downgraded,
    /// Lost its room and joined the waitlist
    Waitlisted,
}

/// Result of a live rejection that found an active claim
#[derive(Clone, PartialEq, Eq, Debug, Serialize)]
pub struct Rejection {
    /// What happened to the rejecting request
    pub step: RejectStep,
    /// The rejecting request's row after the event
    pub row: Assignment,
    /// The room it gave up
    pub freed: RoomId,
    /// The waitlisted row that received the freed room, if any
    pub promoted: Option<Assignment>,
}

impl Rejection {
    /// Classes whose published list may have changed
    pub fn touched(&self, class: Class) -> &'static [Class] {
        match (self.step, class) {
            (RejectStep::Downgraded, _) => &[Class::Primary, Class::Secondary],
            (_, Class::Primary) => &[Class::Primary],
            (_, Class::Secondary) => &[Class::Secondary],
        }
    }
}

/// Handle "reject this active `class` assignment" for `request`
///
/// Returns [`None`] if the request holds no room of `class`; nothing is
/// changed in that case. Otherwise the request is moved along its downgrade
/// path and the room it gave up is offered to the longest waiter of `class`.
///
/// The waiter is picked before the rejecting row is written, so the rejecting
/// request can never be handed back its own room. Both rows are written in one
/// batch; if that fails, the store is unchanged and so are the pools.
pub(crate) fn reject(
    store: &dyn AssignmentStore,
    pool: &RoomPool,
    policy: &AllocationPolicy,
    request: RequestId,
    class: Class,
) -> Result<Option<Rejection>, StoreError> {
    let Some(mut row) = store.find_by_request_and_status(request, class.assigned_status())? else {
        info!(%request, %class, "no active assignment to reject");
        return Ok(None);
    };
    let freed = row.room().expect("assigned row without a room");

    let (step, taken) = if let Some(room) = pool.take_own(class) {
        row.swap_room(room);
        (RejectStep::Reassigned, Some(room))
    } else if let Some(room) = downgrade_room(pool, policy, class) {
        row.demote(None);
        row.grant(room, Class::Secondary);
        (RejectStep::Downgraded, Some(room))
    } else {
        row.demote(declined_queue(class, policy, false));
        (RejectStep::Waitlisted, None)
    };

    let written = promoter::next_waiter(store, freed, class).and_then(|waiter| {
        let mut batch = vec![row];
        batch.extend(waiter);
        store.save_all(batch)
    });
    let mut saved = match written {
        Ok(saved) => saved.into_iter(),
        Err(err) => {
            // nothing was written, the store still shows the old room as held
            if let Some(room) = taken {
                pool.release(room);
            }
            return Err(err);
        }
    };
    let Some(row) = saved.next() else {
        return Err(StoreError::Unavailable("save returned no row".into()));
    };
    let promoted = saved.next();
    match &promoted {
        Some(waiter) => info!(
            request = %waiter.request_id(),
            room = %freed,
            %class,
            "promoted waitlisted request"
        ),
        None => pool.release(freed),
    }

    match step {
        RejectStep::Reassigned => {
            info!(%request, %class, from = %freed, to = ?row.room(), "reassigned to a different room")
        }
        RejectStep::Downgraded => {
            info!(%request, from = %freed, to = ?row.room(), "downgraded to a secondary room")
        }
        RejectStep::Waitlisted => info!(%request, %class, room = %freed, "moved to the waitlist"),
    }

    Ok(Some(Rejection {
        step,
        row,
        freed,
        promoted,
    }))
}

/// Room for a primary request that found no other primary room
fn downgrade_room(pool: &RoomPool, policy: &AllocationPolicy, class: Class) -> Option<RoomId> {
    match (class, policy.downgrade) {
        (Class::Primary, DowngradePath::ViaSecondary) => pool.take(Class::Secondary),
        _ => None,
    }
}
