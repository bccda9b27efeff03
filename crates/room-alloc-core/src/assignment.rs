use std::fmt;

use serde::{Deserialize, Serialize};

use crate::request::RequestId;

/// Identifier of a room, `1..=N`
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoomId(pub u32);

impl fmt::Display for RoomId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Identifier of a stored assignment, handed out by the store
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AssignmentId(pub u64);

impl fmt::Display for AssignmentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Priority class of a request
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Class {
    /// First claim on the primary range
    Primary,
    /// First claim on the secondary range
    Secondary,
}

impl Class {
    /// Status of a row holding a room of this class
    #[inline]
    pub fn assigned_status(self) -> Status {
        match self {
            Class::Primary => Status::PrimaryAssigned,
            Class::Secondary => Status::SecondaryAssigned,
        }
    }

    /// Priority of a row holding a room of this class
    #[inline]
    pub fn priority(self) -> Priority {
        match self {
            Class::Primary => Priority::Primary,
            Class::Secondary => Priority::Secondary,
        }
    }
}

impl fmt::Display for Class {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Class::Primary => "primary",
            Class::Secondary => "secondary",
        })
    }
}

/// Status of an assignment row
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Status {
    /// Waiting for a room
    Waitlist,
    /// Holding a room as a primary request
    PrimaryAssigned,
    /// Holding a room as a secondary request
    SecondaryAssigned,
}

impl Status {
    /// The class of the room held, [`None`] while waiting
    #[inline]
    pub fn class(self) -> Option<Class> {
        match self {
            Status::Waitlist => None,
            Status::PrimaryAssigned => Some(Class::Primary),
            Status::SecondaryAssigned => Some(Class::Secondary),
        }
    }
}

/// Priority of an assignment row: 1 (primary), 2 (secondary), 3 (waitlist)
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
pub enum Priority {
    /// 1
    Primary,
    /// 2
    Secondary,
    /// 3
    Waitlist,
}

impl From<Priority> for u8 {
    fn from(priority: Priority) -> u8 {
        match priority {
            Priority::Primary => 1,
            Priority::Secondary => 2,
            Priority::Waitlist => 3,
        }
    }
}

impl TryFrom<u8> for Priority {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(Priority::Primary),
            2 => Ok(Priority::Secondary),
            3 => Ok(Priority::Waitlist),
            _ => Err(format!("invalid priority {value}")),
        }
    }
}

/// A request's claim on a room, or its place on the waitlist
///
/// Rows are mutated in place on every status transition so that the store
/// identity survives. The invariant `room == None ⇔ status == WAITLIST ⇔
/// priority == 3` holds after every method.
#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Assignment {
    id: Option<AssignmentId>,
    status: Status,
    request_id: RequestId,
    room_id: Option<RoomId>,
    priority: Priority,
    position: u32,
    /// Class whose waitlist the row is queued in, or the class of the room
    /// held; [`None`] for a request that is not queued for any room
    queue: Option<Class>,
    /// Place in the waitlist, stamped by the store when the row joins it
    joined: Option<u64>,
}

impl Assignment {
    /// A new row holding `room` in `class`
    pub fn assigned(request: RequestId, room: RoomId, class: Class) -> Self {
        Self {
            id: None,
            status: class.assigned_status(),
            request_id: request,
            room_id: Some(room),
            priority: class.priority(),
            position: 0,
            queue: Some(class),
            joined: None,
        }
    }

    /// A new row waiting in the waitlist of `queue`
    ///
    /// A row without a queue waits but is never promoted.
    pub fn waitlisted(request: RequestId, queue: impl Into<Option<Class>>) -> Self {
        Self {
            id: None,
            status: Status::Waitlist,
            request_id: request,
            room_id: None,
            priority: Priority::Waitlist,
            position: 0,
            queue: queue.into(),
            joined: None,
        }
    }

    /// Attach the id handed out by a store
    pub fn with_id(mut self, id: AssignmentId) -> Self {
        self.id = Some(id);
        self
    }

    /// Get the store id, [`None`] if the row was never saved
    #[inline]
    pub fn id(&self) -> Option<AssignmentId> {
        self.id
    }

    /// Get the status
    #[inline]
    pub fn status(&self) -> Status {
        self.status
    }

    /// Get the id of the request this row belongs to
    #[inline]
    pub fn request_id(&self) -> RequestId {
        self.request_id
    }

    /// Get the room held, if any
    #[inline]
    pub fn room(&self) -> Option<RoomId> {
        self.room_id
    }

    /// Get the priority
    #[inline]
    pub fn priority(&self) -> Priority {
        self.priority
    }

    /// Get the manual queue position
    #[inline]
    pub fn position(&self) -> u32 {
        self.position
    }

    /// Get the class the row is queued in (or holds a room of)
    #[inline]
    pub fn queue(&self) -> Option<Class> {
        self.queue
    }

    /// Get the waitlist join stamp, [`None`] unless a store saved the row
    /// while it was waiting
    #[inline]
    pub fn joined(&self) -> Option<u64> {
        self.joined
    }

    /// Attach the waitlist join stamp handed out by a store
    pub fn with_joined(mut self, joined: u64) -> Self {
        self.joined = Some(joined);
        self
    }

    /// Whether the row holds a room of `class`
    #[inline]
    pub fn is_assigned_in(&self, class: Class) -> bool {
        self.status == class.assigned_status()
    }

    /// Set the manual queue position
    pub fn set_position(&mut self, position: u32) {
        self.position = position;
    }

    /// Hand `room` of `class` to this row
    ///
    /// The row must not hold a room already.
    pub fn grant(&mut self, room: RoomId, class: Class) {
        assert!(
            self.room_id.is_none(),
            "request {} already holds room {:?}",
            self.request_id,
            self.room_id
        );
        self.status = class.assigned_status();
        self.room_id = Some(room);
        self.priority = class.priority();
        self.queue = Some(class);
        self.joined = None;
    }

    /// Move an assigned row to `room` of the same class, returning the old room
    pub fn swap_room(&mut self, room: RoomId) -> RoomId {
        match self.room_id.replace(room) {
            Some(old) => old,
            None => panic!("request {} has no room to swap", self.request_id),
        }
    }

    /// Give up the room and wait in the waitlist of `queue`
    ///
    /// The row goes to the back of its queue the next time it is saved.
    /// Returns the room that was held, if any.
    pub fn demote(&mut self, queue: Option<Class>) -> Option<RoomId> {
        self.status = Status::Waitlist;
        self.priority = Priority::Waitlist;
        self.queue = queue;
        self.joined = None;
        self.room_id.take()
    }

    /// Whether status, room, priority and join stamp agree with each other
    pub fn is_consistent(&self) -> bool {
        let waiting = self.status == Status::Waitlist;
        waiting == self.room_id.is_none()
            && waiting == (self.priority == Priority::Waitlist)
            && (waiting || self.joined.is_none())
            && (waiting || self.queue.is_some())
    }
}
