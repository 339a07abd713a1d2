use std::sync::Arc;

use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};

use dealflow_commission::{CommissionInputs, PaymentReceipt};
use dealflow_infra::preview_commission;

use crate::app::errors;
use crate::app::routes::common::opportunity_response;
use crate::app::services::AppServices;
use crate::context::OpportunityPath;

pub fn router() -> Router {
    Router::new()
        .route("/commission", get(commission_summary).put(update_terms))
        .route("/commission/payment", post(record_payment).delete(revert_payment))
}

/// Stateless calculator; no opportunity involved.
pub async fn preview(Json(body): Json<CommissionInputs>) -> axum::response::Response {
    match preview_commission(&body) {
        Ok(breakdown) => (StatusCode::OK, Json(breakdown)).into_response(),
        Err(e) => errors::deal_error_to_response(e),
    }
}

pub async fn commission_summary(
    Extension(services): Extension<Arc<AppServices>>,
    Path(path): Path<OpportunityPath>,
) -> axum::response::Response {
    let ctx = match path.context() {
        Ok(c) => c,
        Err(r) => return r,
    };
    match services.deals().commission_summary(&ctx) {
        Ok(summary) => (StatusCode::OK, Json(summary)).into_response(),
        Err(e) => errors::deal_error_to_response(e),
    }
}

pub async fn update_terms(
    Extension(services): Extension<Arc<AppServices>>,
    Path(path): Path<OpportunityPath>,
    Json(body): Json<CommissionInputs>,
) -> axum::response::Response {
    let ctx = match path.context() {
        Ok(c) => c,
        Err(r) => return r,
    };
    opportunity_response(StatusCode::OK, services.deals().update_commission_terms(&ctx, body))
}

pub async fn record_payment(
    Extension(services): Extension<Arc<AppServices>>,
    Path(path): Path<OpportunityPath>,
    Json(body): Json<PaymentReceipt>,
) -> axum::response::Response {
    let ctx = match path.context() {
        Ok(c) => c,
        Err(r) => return r,
    };
    opportunity_response(StatusCode::OK, services.deals().record_commission_payment(&ctx, body))
}

pub async fn revert_payment(
    Extension(services): Extension<Arc<AppServices>>,
    Path(path): Path<OpportunityPath>,
) -> axum::response::Response {
    let ctx = match path.context() {
        Ok(c) => c,
        Err(r) => return r,
    };
    opportunity_response(StatusCode::OK, services.deals().revert_commission_payment(&ctx))
}
