use std::fmt;
use std::fs;
use std::io;
use std::path::PathBuf;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::assignment::Class;

/// Identifier of a request, unique within one run
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RequestId(pub u32);

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// A request for a room
///
/// Requests are immutable input to a run. The rejection flags are set by
/// whoever produced the batch; the engine only reads them.
#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Request {
    id: RequestId,
    #[serde(default)]
    arr: Option<NaiveDateTime>,
    #[serde(default)]
    dep: Option<NaiveDateTime>,
    #[serde(default)]
    origin: Option<String>,
    #[serde(default, rename = "rejectP1")]
    reject_primary: bool,
    #[serde(default, rename = "rejectP2")]
    reject_secondary: bool,
}

impl Request {
    /// Create a request without rejection flags
    pub fn new(
        id: RequestId,
        arrival: Option<NaiveDateTime>,
        departure: Option<NaiveDateTime>,
        origin: Option<String>,
    ) -> Self {
        Self {
            id,
            arr: arrival,
            dep: departure,
            origin,
            reject_primary: false,
            reject_secondary: false,
        }
    }

    /// Set the rejection flags of both classes
    pub fn with_rejections(mut self, primary: bool, secondary: bool) -> Self {
        self.reject_primary = primary;
        self.reject_secondary = secondary;
        self
    }

    /// Get the request's id
    #[inline]
    pub fn id(&self) -> RequestId {
        self.id
    }

    /// Get the arrival time, if known
    #[inline]
    pub fn arrival(&self) -> Option<NaiveDateTime> {
        self.arr
    }

    /// Get the departure time, if known
    #[inline]
    pub fn departure(&self) -> Option<NaiveDateTime> {
        self.dep
    }

    /// Get the origin, if any
    #[inline]
    pub fn origin(&self) -> Option<&str> {
        self.origin.as_deref()
    }

    /// Whether the request declines a room of the given class
    #[inline]
    pub fn rejects(&self, class: Class) -> bool {
        match class {
            Class::Primary => self.reject_primary,
            Class::Secondary => self.reject_secondary,
        }
    }
}

/// Failure to obtain the batch of requests for a run
#[derive(Debug, Error)]
pub enum SourceError {
    /// The source could not be read
    #[error("could not read requests from {path}: {source}")]
    Io {
        /// Where the requests were read from
        path: PathBuf,
        /// Underlying error
        source: io::Error,
    },
    /// The payload is not a valid request batch
    #[error("malformed request batch: {0}")]
    Decode(#[from] serde_json::Error),
}

/// Supplies the batch of requests for a full run
///
/// 📌 Called exactly once per run, before any pool is touched.
pub trait RequestSource: Send + Sync {
    /// Load the requests in arrival order
    fn load_requests(&self) -> Result<Vec<Request>, SourceError>;
}

impl RequestSource for Vec<Request> {
    fn load_requests(&self) -> Result<Vec<Request>, SourceError> {
        Ok(self.clone())
    }
}

/// Request source reading a JSON array from a file
///
/// The file is re-read on every run so that edits are picked up without a
/// restart.
#[derive(Clone, Debug)]
pub struct JsonFileSource {
    path: PathBuf,
}

impl JsonFileSource {
    /// Create a source for the file at `path`
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Parse a JSON array of requests
    pub fn parse(json: &str) -> Result<Vec<Request>, SourceError> {
        Ok(serde_json::from_str(json)?)
    }
}

impl RequestSource for JsonFileSource {
    fn load_requests(&self) -> Result<Vec<Request>, SourceError> {
        let contents = fs::read_to_string(&self.path).map_err(|source| SourceError::Io {
            path: self.path.clone(),
            source,
        })?;
        Self::parse(&contents)
    }
}
