use std::sync::Arc;

use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use chrono::Utc;

use crate::app::routes::common::opportunity_response;
use crate::app::services::AppServices;
use crate::app::{dto, errors};
use crate::context::{OfferPath, OpportunityPath};

pub fn router() -> Router {
    Router::new()
        .route("/offers", post(submit_offer))
        .route("/offers/ranked", get(ranked_offers))
        .route("/offers/expire", post(expire_offers))
        .route("/offers/:offer_id/accept", post(accept_offer))
        .route("/offers/:offer_id/reject", post(reject_offer))
        .route("/offers/:offer_id/counter", post(counter_offer))
}

pub async fn submit_offer(
    Extension(services): Extension<Arc<AppServices>>,
    Path(path): Path<OpportunityPath>,
    Json(body): Json<dto::SubmitOfferRequest>,
) -> axum::response::Response {
    let ctx = match path.context() {
        Ok(c) => c,
        Err(r) => return r,
    };
    let offer_id = body.offer_id.unwrap_or_default();
    opportunity_response(
        StatusCode::CREATED,
        services.deals().submit_offer(&ctx, offer_id, body.terms),
    )
}

pub async fn ranked_offers(
    Extension(services): Extension<Arc<AppServices>>,
    Path(path): Path<OpportunityPath>,
) -> axum::response::Response {
    let ctx = match path.context() {
        Ok(c) => c,
        Err(r) => return r,
    };
    match services.deals().rank_offers(&ctx) {
        Ok(offers) => (StatusCode::OK, Json(dto::ranked_offers_to_json(&offers))).into_response(),
        Err(e) => errors::deal_error_to_response(e),
    }
}

pub async fn expire_offers(
    Extension(services): Extension<Arc<AppServices>>,
    Path(path): Path<OpportunityPath>,
    Json(body): Json<dto::ExpireOffersRequest>,
) -> axum::response::Response {
    let ctx = match path.context() {
        Ok(c) => c,
        Err(r) => return r,
    };
    let now = body.now.unwrap_or_else(Utc::now);
    opportunity_response(StatusCode::OK, services.deals().expire_offers(&ctx, now))
}

pub async fn accept_offer(
    Extension(services): Extension<Arc<AppServices>>,
    Path(path): Path<OfferPath>,
    Json(body): Json<dto::AcceptOfferRequest>,
) -> axum::response::Response {
    let (ctx, offer_id) = match path.context() {
        Ok(c) => c,
        Err(r) => return r,
    };
    opportunity_response(
        StatusCode::OK,
        services.deals().accept_offer(&ctx, offer_id, body.commission_terms),
    )
}

pub async fn reject_offer(
    Extension(services): Extension<Arc<AppServices>>,
    Path(path): Path<OfferPath>,
    Json(body): Json<dto::RejectOfferRequest>,
) -> axum::response::Response {
    let (ctx, offer_id) = match path.context() {
        Ok(c) => c,
        Err(r) => return r,
    };
    opportunity_response(StatusCode::OK, services.deals().reject_offer(&ctx, offer_id, &body.reason))
}

pub async fn counter_offer(
    Extension(services): Extension<Arc<AppServices>>,
    Path(path): Path<OfferPath>,
    Json(body): Json<dto::CounterOfferRequest>,
) -> axum::response::Response {
    let (ctx, offer_id) = match path.context() {
        Ok(c) => c,
        Err(r) => return r,
    };
    opportunity_response(
        StatusCode::OK,
        services
            .deals()
            .counter_offer(&ctx, offer_id, body.counter_amount, body.counter_conditions),
    )
}
