use std::sync::Arc;

use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    routing::{patch, post, put},
    Json, Router,
};

use dealflow_deals::Viewing;
use dealflow_infra::MarketingUpdate;

use crate::app::dto;
use crate::app::routes::common::opportunity_response;
use crate::app::services::AppServices;
use crate::context::OpportunityPath;

pub fn router() -> Router {
    Router::new()
        .route("/", put(open_opportunity).get(get_opportunity))
        .route("/stage", post(set_stage))
        .route("/viewings", post(record_viewing))
        .route("/marketing", patch(update_marketing))
}

pub async fn open_opportunity(
    Extension(services): Extension<Arc<AppServices>>,
    Path(path): Path<OpportunityPath>,
    Json(body): Json<dto::OpenOpportunityRequest>,
) -> axum::response::Response {
    let ctx = match path.context() {
        Ok(c) => c,
        Err(r) => return r,
    };
    opportunity_response(
        StatusCode::CREATED,
        services
            .deals()
            .open_opportunity(&ctx, body.asking_price, body.property_ref),
    )
}

pub async fn get_opportunity(
    Extension(services): Extension<Arc<AppServices>>,
    Path(path): Path<OpportunityPath>,
) -> axum::response::Response {
    let ctx = match path.context() {
        Ok(c) => c,
        Err(r) => return r,
    };
    opportunity_response(StatusCode::OK, services.deals().get_opportunity(&ctx))
}

pub async fn set_stage(
    Extension(services): Extension<Arc<AppServices>>,
    Path(path): Path<OpportunityPath>,
    Json(body): Json<dto::SetStageRequest>,
) -> axum::response::Response {
    let ctx = match path.context() {
        Ok(c) => c,
        Err(r) => return r,
    };
    opportunity_response(StatusCode::OK, services.deals().set_pipeline_stage(&ctx, body.stage))
}

pub async fn record_viewing(
    Extension(services): Extension<Arc<AppServices>>,
    Path(path): Path<OpportunityPath>,
    Json(body): Json<Viewing>,
) -> axum::response::Response {
    let ctx = match path.context() {
        Ok(c) => c,
        Err(r) => return r,
    };
    opportunity_response(StatusCode::CREATED, services.deals().record_viewing(&ctx, body))
}

pub async fn update_marketing(
    Extension(services): Extension<Arc<AppServices>>,
    Path(path): Path<OpportunityPath>,
    Json(body): Json<MarketingUpdate>,
) -> axum::response::Response {
    let ctx = match path.context() {
        Ok(c) => c,
        Err(r) => return r,
    };
    opportunity_response(StatusCode::OK, services.deals().update_marketing_counters(&ctx, body))
}
