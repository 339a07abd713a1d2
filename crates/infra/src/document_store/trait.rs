use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use thiserror::Error;

use dealflow_core::ExpectedVersion;

/// A stored record plus the revision it was read at.
///
/// Revisions start at 1 and increase by one on every successful write to the
/// path, whoever makes it (the deal service, a collaborator merge or an append).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub revision: u64,
    pub record: JsonValue,
}

/// Write options for [`DocumentStore::set`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SetOptions {
    /// Deep-merge JSON objects into the existing record instead of replacing it.
    pub merge: bool,
    /// Compare-and-set precondition on the current revision.
    pub expected: ExpectedVersion,
}

impl SetOptions {
    /// Full replace guarded by `expected`.
    pub fn replace(expected: ExpectedVersion) -> Self {
        Self { merge: false, expected }
    }

    /// Unconditional deep merge.
    pub fn merge() -> Self {
        Self {
            merge: true,
            expected: ExpectedVersion::Any,
        }
    }
}

#[derive(Debug, Error)]
pub enum StoreError {
    /// The CAS precondition did not hold.
    #[error("revision conflict at {path}: expected {expected:?}, found {actual:?}")]
    Conflict {
        path: String,
        expected: ExpectedVersion,
        actual: Option<u64>,
    },

    #[error("field '{field}' at {path} is not a list")]
    NotAList { path: String, field: String },

    #[error("record at {0} is not a JSON object")]
    NotAnObject(String),

    #[error("no document at {0}")]
    Missing(String),

    #[error("store unavailable: {0}")]
    Unavailable(String),
}

impl StoreError {
    pub fn is_conflict(&self) -> bool {
        matches!(self, StoreError::Conflict { .. })
    }
}

/// Generic document-store port.
///
/// Any key/value or document database with an atomic compare-and-set on a
/// per-path revision satisfies it. Paths are opaque, slash-separated strings.
pub trait DocumentStore: Send + Sync {
    fn get(&self, path: &str) -> Result<Option<Document>, StoreError>;

    /// Write `record` at `path` and return the new revision.
    ///
    /// With `merge`, objects are merged recursively and a missing document is
    /// created. The `expected` precondition is checked first either way.
    fn set(&self, path: &str, record: JsonValue, options: SetOptions) -> Result<u64, StoreError>;

    /// Append `item` to the array at `field` of an existing document,
    /// creating the field when missing. Returns the new revision.
    ///
    /// Fails with [`StoreError::Missing`] when nothing is stored at `path`.
    fn append_to_list(&self, path: &str, field: &str, item: JsonValue) -> Result<u64, StoreError>;
}

impl<S> DocumentStore for Arc<S>
where
    S: DocumentStore + ?Sized,
{
    fn get(&self, path: &str) -> Result<Option<Document>, StoreError> {
        (**self).get(path)
    }

    fn set(&self, path: &str, record: JsonValue, options: SetOptions) -> Result<u64, StoreError> {
        (**self).set(path, record, options)
    }

    fn append_to_list(&self, path: &str, field: &str, item: JsonValue) -> Result<u64, StoreError> {
        (**self).append_to_list(path, field, item)
    }
}
