//! Free room pools

use std::collections::VecDeque;

use parking_lot::Mutex;
use room_alloc_core::{Class, Config, RoomId};
use serde::Serialize;

/// The three pools of free rooms
///
/// Each pool is a double-ended queue behind its own lock, so threads
/// working on different pools never wait on each other and no call holds two
/// pool locks at once. No ordering is promised across pools. A room is in at
/// most one pool at a time; rooms in no pool are held by an assignment.
#[derive(Default)]
pub struct RoomPool {
    /// Free rooms of the primary range
    primary: Mutex<VecDeque<RoomId>>,
    /// Free rooms of the secondary range
    secondary: Mutex<VecDeque<RoomId>>,
    /// Rooms given back by a rejection, usable by either class
    reclaimed: Mutex<VecDeque<RoomId>>,
}

/// Copy of the pools' contents, front (next to be taken) first
#[derive(Clone, PartialEq, Eq, Debug, Default, Serialize)]
pub struct PoolContents {
    /// Free primary range rooms
    pub primary: Vec<RoomId>,
    /// Free secondary range rooms
    pub secondary: Vec<RoomId>,
    /// Reclaimed rooms
    pub reclaimed: Vec<RoomId>,
}

impl PoolContents {
    /// Number of free rooms over all pools
    pub fn total(&self) -> usize {
        self.primary.len() + self.secondary.len() + self.reclaimed.len()
    }

    /// Iterate over every free room
    pub fn iter(&self) -> impl Iterator<Item = RoomId> + '_ {
        self.primary
            .iter()
            .chain(&self.secondary)
            .chain(&self.reclaimed)
            .copied()
    }
}

impl RoomPool {
    /// Create empty pools
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop every free room and split `1..=config.rooms` into the two ranges
    pub fn reset(&self, config: &Config) {
        let split = config.primary_rooms();
        *self.primary.lock() = (1..=split).map(RoomId).collect();
        *self.secondary.lock() = (split + 1..=config.rooms).map(RoomId).collect();
        self.reclaimed.lock().clear();
    }

    /// Take a room of `class`, falling back to the reclaimed pool
    ///
    /// Returns [`None`] if both pools are empty.
    pub fn take(&self, class: Class) -> Option<RoomId> {
        let room = self.range(class).lock().pop_front();
        if room.is_some() {
            return room;
        }
        self.reclaimed.lock().pop_front()
    }

    /// Take a room of `class`'s own range, never a reclaimed one
    pub fn take_own(&self, class: Class) -> Option<RoomId> {
        self.range(class).lock().pop_front()
    }

    /// Take a room of the primary range, falling back to the reclaimed pool
    #[inline]
    pub fn take_primary(&self) -> Option<RoomId> {
        self.take(Class::Primary)
    }

    /// Take a room of the secondary range, falling back to the reclaimed pool
    #[inline]
    pub fn take_secondary(&self) -> Option<RoomId> {
        self.take(Class::Secondary)
    }

    /// Give a room back
    ///
    /// The room goes to the front of the reclaimed pool so that it is the next
    /// one to be reused.
    pub fn release(&self, room: RoomId) {
        debug_assert!(
            !self.contents().iter().any(|free| free == room),
            "room {room} released while already free"
        );
        self.reclaimed.lock().push_front(room);
    }

    /// Copy the current contents of all pools
    pub fn contents(&self) -> PoolContents {
        PoolContents {
            primary: self.primary.lock().iter().copied().collect(),
            secondary: self.secondary.lock().iter().copied().collect(),
            reclaimed: self.reclaimed.lock().iter().copied().collect(),
        }
    }

    fn range(&self, class: Class) -> &Mutex<VecDeque<RoomId>> {
        match class {
            Class::Primary => &self.primary,
            Class::Secondary => &self.secondary,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rooms(ids: &[u32]) -> Vec<RoomId> {
        ids.iter().copied().map(RoomId).collect()
    }

    #[test]
    fn reset_splits_ranges() {
        let pool = RoomPool::new();
        pool.reset(&Config::new(10));
        let contents = pool.contents();
        assert_eq!(contents.primary, rooms(&[1, 2, 3, 4, 5]));
        assert_eq!(contents.secondary, rooms(&[6, 7, 8, 9, 10]));
        assert!(contents.reclaimed.is_empty());
    }

    #[test]
    fn take_falls_back_to_reclaimed() {
        let pool = RoomPool::new();
        pool.reset(&Config::new(2));
        assert_eq!(pool.take_primary(), Some(RoomId(1)));
        assert_eq!(pool.take_primary(), None);

        pool.release(RoomId(1));
        assert_eq!(pool.take_own(Class::Primary), None);
        assert_eq!(pool.take_secondary(), Some(RoomId(2)));
        assert_eq!(pool.take_secondary(), Some(RoomId(1)));
        assert_eq!(pool.take_secondary(), None);
    }

    #[test]
    fn released_rooms_are_reused_first() {
        let pool = RoomPool::new();
        pool.reset(&Config::new(4));
        let a = pool.take_primary().unwrap();
        let b = pool.take_primary().unwrap();
        pool.release(a);
        pool.release(b);
        assert_eq!(pool.contents().reclaimed, vec![b, a]);
        assert_eq!(pool.take_primary(), Some(b));
    }

    #[test]
    fn reset_clears_reclaimed() {
        let pool = RoomPool::new();
        pool.reset(&Config::new(4));
        let room = pool.take_secondary().unwrap();
        pool.release(room);
        pool.reset(&Config::new(4));
        assert_eq!(pool.contents().total(), 4);
        assert!(pool.contents().reclaimed.is_empty());
    }

    #[test]
    fn threads_on_both_pools_take_each_room_once() {
        let pool = RoomPool::new();
        pool.reset(&Config::new(400));
        for room in 1..=50 {
            pool.take_own(Class::Primary).unwrap();
            pool.release(RoomId(room));
        }

        let taken: Vec<RoomId> = std::thread::scope(|s| {
            let workers: Vec<_> = [Class::Primary, Class::Secondary]
                .into_iter()
                .cycle()
                .take(8)
                .map(|class| {
                    let pool = &pool;
                    s.spawn(move || std::iter::from_fn(|| pool.take(class)).collect::<Vec<_>>())
                })
                .collect();
            workers
                .into_iter()
                .flat_map(|worker| worker.join().unwrap())
                .collect()
        });

        let mut sorted = taken.clone();
        sorted.sort();
        sorted.dedup();
        assert_eq!(sorted.len(), taken.len());
        assert_eq!(taken.len(), 400);
        assert_eq!(pool.contents().total(), 0);
    }
}
