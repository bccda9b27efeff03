//! Published read view of the current assignments

use std::sync::Arc;

use parking_lot::RwLock;
use room_alloc_core::{Assignment, Class};

struct Published {
    primary: Arc<[Assignment]>,
    secondary: Arc<[Assignment]>,
}

/// Read-mostly lists of the rows holding a primary and a secondary room
///
/// Lists are replaced wholesale. Writers build the new list before taking the
/// lock, so the write lock is only held for the pointer swap. Readers get a
/// shared handle and never see a half-updated list.
pub struct Snapshot {
    published: RwLock<Published>,
}

impl Default for Snapshot {
    fn default() -> Self {
        Self::new()
    }
}

impl Snapshot {
    /// Create empty lists
    pub fn new() -> Self {
        Self {
            published: RwLock::new(Published {
                primary: Arc::from(Vec::new()),
                secondary: Arc::from(Vec::new()),
            }),
        }
    }

    /// Current primary-assigned rows
    pub fn primary(&self) -> Arc<[Assignment]> {
        self.published.read().primary.clone()
    }

    /// Current secondary-assigned rows
    pub fn secondary(&self) -> Arc<[Assignment]> {
        self.published.read().secondary.clone()
    }

    /// Current rows of `class`
    pub fn get(&self, class: Class) -> Arc<[Assignment]> {
        match class {
            Class::Primary => self.primary(),
            Class::Secondary => self.secondary(),
        }
    }

    /// Replace both lists at once
    pub fn publish(&self, primary: Vec<Assignment>, secondary: Vec<Assignment>) {
        let primary: Arc<[Assignment]> = primary.into();
        let secondary: Arc<[Assignment]> = secondary.into();
        let mut published = self.published.write();
        published.primary = primary;
        published.secondary = secondary;
    }

    /// Replace the list of `class`
    pub fn publish_class(&self, class: Class, rows: Vec<Assignment>) {
        let rows: Arc<[Assignment]> = rows.into();
        let mut published = self.published.write();
        match class {
            Class::Primary => published.primary = rows,
            Class::Secondary => published.secondary = rows,
        }
    }
}
