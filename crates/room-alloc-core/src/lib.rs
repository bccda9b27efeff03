//! 🏗 Shared model for the room allocation engine: requests, assignments and
//! the collaborators the engine talks to.
#![warn(missing_docs)]

mod assignment;
mod request;
mod store;

pub use assignment::{Assignment, AssignmentId, Class, Priority, RoomId, Status};
pub use request::{JsonFileSource, Request, RequestId, RequestSource, SourceError};
pub use store::{AssignmentStore, StoreError};

/// How far a primary request may fall when it rejects its room during a live
/// event
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Default)]
pub enum DowngradePath {
    /// Another primary room, then a secondary room, then the waitlist
    #[default]
    ViaSecondary,
    /// Another primary room, then the waitlist
    DirectToWaitlist,
}

/// Tunables shared by the batch run and the live events
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct AllocationPolicy {
    /// Downgrade tiers available to a rejected primary assignment
    pub downgrade: DowngradePath,
    /// Percentage of the pool that forms the primary range
    pub primary_share: u8,
}

impl Default for AllocationPolicy {
    fn default() -> Self {
        Self {
            downgrade: DowngradePath::ViaSecondary,
            primary_share: 50,
        }
    }
}

/// Configuration of the allocation engine
#[derive(Clone, Copy, Debug)]
pub struct Config {
    /// Number of rooms in the pool, numbered `1..=rooms`
    pub rooms: u32,
    /// Pool split and downgrade behaviour
    pub policy: AllocationPolicy,
}

impl Config {
    /// Create a configuration with the default policy
    pub fn new(rooms: u32) -> Self {
        Self {
            rooms,
            policy: AllocationPolicy::default(),
        }
    }

    /// Number of rooms in the primary range
    ///
    /// The primary range is `1..=primary_rooms()`, the secondary range holds
    /// the remaining rooms.
    pub fn primary_rooms(&self) -> u32 {
        let share = u64::from(self.policy.primary_share.min(100));
        (u64::from(self.rooms) * share / 100) as u32
    }
}
