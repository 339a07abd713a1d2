//! Infrastructure layer: document store, configuration and the deal service.

pub mod config;
pub mod deal_service;
pub mod document_store;


pub use config::{ConfigError, DealSettings, DealflowConfig};
pub use deal_service::{preview_commission, DealContext, DealError, DealService, MarketingUpdate};
pub use document_store::{Document, DocumentStore, InMemoryDocumentStore, SetOptions, StoreError};
