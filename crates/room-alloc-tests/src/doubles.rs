use std::io;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use room_alloc_core::{
    Assignment, AssignmentId, AssignmentStore, Class, Request, RequestId, RequestSource,
    SourceError, Status, StoreError,
};
use room_alloc_engine::MemoryStore;
use thiserror::Error;

#[derive(Debug, Error)]
#[error("the scripted source was told to fail")]
struct SourceDown;

/// Request source whose batch can be replaced between runs
///
/// Clones share the same batch.
#[derive(Clone)]
pub struct ScriptedSource {
    /// `None` makes every load fail
    batch: Arc<Mutex<Option<Vec<Request>>>>,
}

impl ScriptedSource {
    pub fn new(requests: Vec<Request>) -> Self {
        Self {
            batch: Arc::new(Mutex::new(Some(requests))),
        }
    }

    /// Serve `requests` from the next run on
    pub fn set(&self, requests: Vec<Request>) {
        *self.batch.lock() = Some(requests);
    }

    /// Fail every following load
    pub fn fail(&self) {
        *self.batch.lock() = None;
    }
}

impl RequestSource for ScriptedSource {
    fn load_requests(&self) -> Result<Vec<Request>, SourceError> {
        match &*self.batch.lock() {
            Some(requests) => Ok(requests.clone()),
            None => Err(SourceError::Io {
                path: PathBuf::from("scripted"),
                source: io::Error::other(SourceDown),
            }),
        }
    }
}

/// In-memory store whose writes can be switched off
#[derive(Default)]
pub struct FailingStore {
    inner: MemoryStore,
    fail_writes: AtomicBool,
    /// Writes left before a single failing one
    countdown: Mutex<Option<usize>>,
}

impl FailingStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every following write fail (or succeed again)
    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Let the next `writes` writes through and fail the one after
    pub fn fail_write_after(&self, writes: usize) {
        *self.countdown.lock() = Some(writes);
    }

    /// All rows ordered by id
    pub fn all(&self) -> Vec<Assignment> {
        self.inner.all()
    }

    fn check(&self) -> Result<(), StoreError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("writes are switched off".into()));
        }
        let mut countdown = self.countdown.lock();
        match *countdown {
            Some(0) => {
                *countdown = None;
                Err(StoreError::Unavailable("write failed on cue".into()))
            }
            Some(left) => {
                *countdown = Some(left - 1);
                Ok(())
            }
            None => Ok(()),
        }
    }
}

impl AssignmentStore for FailingStore {
    fn save_all(&self, rows: Vec<Assignment>) -> Result<Vec<Assignment>, StoreError> {
        self.check()?;
        self.inner.save_all(rows)
    }

    fn delete_all(&self) -> Result<(), StoreError> {
        self.check()?;
        self.inner.delete_all()
    }

    fn find_by_id(&self, id: AssignmentId) -> Result<Option<Assignment>, StoreError> {
        self.inner.find_by_id(id)
    }

    fn find_by_request_and_status(
        &self,
        request: RequestId,
        status: Status,
    ) -> Result<Option<Assignment>, StoreError> {
        self.inner.find_by_request_and_status(request, status)
    }

    fn find_all_by_status(&self, status: Status) -> Result<Vec<Assignment>, StoreError> {
        self.inner.find_all_by_status(status)
    }

    fn find_earliest_waitlisted(&self, class: Class) -> Result<Option<Assignment>, StoreError> {
        self.inner.find_earliest_waitlisted(class)
    }

    fn find_waitlist_in_order(&self) -> Result<Vec<Assignment>, StoreError> {
        self.inner.find_waitlist_in_order()
    }
}
