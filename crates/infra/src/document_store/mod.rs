//! Document-store boundary.
//!
//! The deal service persists each opportunity as one JSON document and
//! writes it back with a compare-and-set on the document revision.
//! Collaborators (viewings, marketing counters) write to the same document
//! through merge and append; those writes bump the revision too, so a
//! concurrent deal transition loses its CAS instead of overwriting them.

pub mod in_memory;
pub mod r#trait;

use dealflow_core::{ClientId, ConsultantId, OpportunityId};

pub use in_memory::{deep_merge, InMemoryDocumentStore};
pub use r#trait::{Document, DocumentStore, SetOptions, StoreError};

/// `consultants/{consultant}/clients/{client}/opportunities/{opportunity}`
pub fn opportunity_path(consultant_id: ConsultantId, client_id: ClientId, opportunity_id: OpportunityId) -> String {
    format!("consultants/{consultant_id}/clients/{client_id}/opportunities/{opportunity_id}")
}
