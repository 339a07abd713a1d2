//! `dealflow-core`: domain foundation building blocks.
//!
//! This crate contains **pure domain** primitives shared by the deal crates
//! (no persistence, no HTTP, no clock).

pub mod aggregate;
pub mod entity;
pub mod error;
pub mod id;
pub mod value_object;

pub use aggregate::{Aggregate, AggregateRoot, ExpectedVersion};
pub use entity::Entity;
pub use error::{DomainError, DomainResult};
pub use id::{ClientId, ConsultantId, OfferId, OpportunityId};
pub use value_object::ValueObject;
