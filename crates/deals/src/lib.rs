//! Deal domain module.
//!
//! The [`Opportunity`] aggregate owns the offers on a listing, the transaction
//! opened by the accepted offer, its document checklist and financing ledger,
//! and the commission. Everything here is pure: commands are decided into
//! events and events are applied, with no IO and no clock.

pub mod checklist;
pub mod financing;
pub mod offer;
pub mod opportunity;
pub mod transaction;

pub use checklist::{DocumentChecklist, DocumentEntry, DocumentStatus, DocumentType};
pub use financing::{FinancingLedger, FinancingMilestone, MilestoneMark};
pub use offer::{rank_offers, BuyerQuality, FinancingStatus, Offer, OfferState, OfferStatus, OfferTerms};
pub use opportunity::*;
pub use transaction::{
    AcceptedOfferSnapshot, Cpcv, CpcvDraft, CpcvStatus, Escritura, EscrituraDraft, EscrituraStatus, FellThrough,
    Transaction, TransactionStage,
};
