use std::collections::HashMap;
use std::sync::RwLock;

use serde_json::Value as JsonValue;

use super::r#trait::{Document, DocumentStore, SetOptions, StoreError};

/// In-memory document store.
///
/// Intended for tests/dev and single-process deployments. A single write lock
/// makes every `set`/`append_to_list` atomic, including the revision check.
#[derive(Debug, Default)]
pub struct InMemoryDocumentStore {
    documents: RwLock<HashMap<String, Document>>,
}

impl InMemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored documents.
    pub fn len(&self) -> usize {
        self.documents.read().map(|d| d.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn poisoned() -> StoreError {
    StoreError::Unavailable("lock poisoned".to_string())
}

/// Recursively merge `patch` into `target`. Objects merge key by key; any
/// other value (arrays included) replaces what was there.
pub fn deep_merge(target: &mut JsonValue, patch: JsonValue) {
    match (target, patch) {
        (JsonValue::Object(existing), JsonValue::Object(patch)) => {
            for (key, value) in patch {
                match existing.get_mut(&key) {
                    Some(slot) => deep_merge(slot, value),
                    None => {
                        existing.insert(key, value);
                    }
                }
            }
        }
        (slot, value) => *slot = value,
    }
}

impl DocumentStore for InMemoryDocumentStore {
    fn get(&self, path: &str) -> Result<Option<Document>, StoreError> {
        let documents = self.documents.read().map_err(|_| poisoned())?;
        Ok(documents.get(path).cloned())
    }

    fn set(&self, path: &str, record: JsonValue, options: SetOptions) -> Result<u64, StoreError> {
        let mut documents = self.documents.write().map_err(|_| poisoned())?;

        let current = documents.get(path).map(|d| d.revision);
        if !options.expected.matches(current) {
            return Err(StoreError::Conflict {
                path: path.to_string(),
                expected: options.expected,
                actual: current,
            });
        }

        let revision = current.unwrap_or(0) + 1;
        let record = match documents.get(path) {
            Some(existing) if options.merge => {
                if !existing.record.is_object() || !record.is_object() {
                    return Err(StoreError::NotAnObject(path.to_string()));
                }
                let mut merged = existing.record.clone();
                deep_merge(&mut merged, record);
                merged
            }
            _ => record,
        };

        documents.insert(path.to_string(), Document { revision, record });
        Ok(revision)
    }

    fn append_to_list(&self, path: &str, field: &str, item: JsonValue) -> Result<u64, StoreError> {
        let mut documents = self.documents.write().map_err(|_| poisoned())?;

        let doc = documents
            .get_mut(path)
            .ok_or_else(|| StoreError::Missing(path.to_string()))?;
        let object = doc
            .record
            .as_object_mut()
            .ok_or_else(|| StoreError::NotAnObject(path.to_string()))?;

        let slot = object.entry(field.to_string()).or_insert(JsonValue::Null);
        if slot.is_null() {
            *slot = JsonValue::Array(Vec::new());
        }
        match slot {
            JsonValue::Array(items) => items.push(item),
            _ => {
                return Err(StoreError::NotAList {
                    path: path.to_string(),
                    field: field.to_string(),
                })
            }
        }

        doc.revision += 1;
        Ok(doc.revision)
    }
}
