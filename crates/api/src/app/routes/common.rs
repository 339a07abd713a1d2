use axum::{http::StatusCode, response::IntoResponse, Json};

use dealflow_deals::Opportunity;
use dealflow_infra::DealError;

use crate::app::errors;

/// Map an operation result to the updated opportunity or an error body.
pub fn opportunity_response(status: StatusCode, result: Result<Opportunity, DealError>) -> axum::response::Response {
    match result {
        Ok(opportunity) => (status, Json(opportunity)).into_response(),
        Err(e) => errors::deal_error_to_response(e),
    }
}
