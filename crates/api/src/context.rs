use axum::http::StatusCode;
use serde::Deserialize;

use dealflow_core::{ClientId, ConsultantId, OfferId, OpportunityId};
use dealflow_infra::DealContext;

use crate::app::errors;

/// Ownership segments of every opportunity route.
///
/// The consultant and client come from the URL and are threaded into each
/// operation; there is no session or ambient user.
#[derive(Debug, Clone, Deserialize)]
pub struct OpportunityPath {
    pub consultant_id: String,
    pub client_id: String,
    pub opportunity_id: String,
}

impl OpportunityPath {
    pub fn context(&self) -> Result<DealContext, axum::response::Response> {
        Ok(DealContext::new(
            parse_id::<ConsultantId>(&self.consultant_id, "invalid consultant id")?,
            parse_id::<ClientId>(&self.client_id, "invalid client id")?,
            parse_id::<OpportunityId>(&self.opportunity_id, "invalid opportunity id")?,
        ))
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct OfferPath {
    pub consultant_id: String,
    pub client_id: String,
    pub opportunity_id: String,
    pub offer_id: String,
}

impl OfferPath {
    pub fn context(&self) -> Result<(DealContext, OfferId), axum::response::Response> {
        let ctx = OpportunityPath {
            consultant_id: self.consultant_id.clone(),
            client_id: self.client_id.clone(),
            opportunity_id: self.opportunity_id.clone(),
        }
        .context()?;
        Ok((ctx, parse_id(&self.offer_id, "invalid offer id")?))
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct DocumentPath {
    pub consultant_id: String,
    pub client_id: String,
    pub opportunity_id: String,
    pub doc_type: String,
}

impl DocumentPath {
    pub fn opportunity(&self) -> OpportunityPath {
        OpportunityPath {
            consultant_id: self.consultant_id.clone(),
            client_id: self.client_id.clone(),
            opportunity_id: self.opportunity_id.clone(),
        }
    }
}

pub fn parse_id<T: core::str::FromStr>(raw: &str, message: &'static str) -> Result<T, axum::response::Response> {
    raw.parse()
        .map_err(|_| errors::json_error(StatusCode::BAD_REQUEST, "invalid_id", message))
}
