use axum::{
    routing::{get, post},
    Router,
};

pub mod activity;
pub mod commission;
pub mod common;
pub mod offers;
pub mod opportunities;
pub mod system;
pub mod transaction;

/// Every opportunity route hangs off its owner's path.
pub const OPPORTUNITY_SCOPE: &str = "/consultants/:consultant_id/clients/:client_id/opportunities/:opportunity_id";

pub fn router() -> Router {
    let opportunity = opportunities::router()
        .merge(offers::router())
        .merge(transaction::router())
        .merge(commission::router());

    Router::new()
        .route("/commission/preview", post(commission::preview))
        .route("/consultants/:consultant_id/activity", get(activity::list))
        .nest(OPPORTUNITY_SCOPE, opportunity)
}
