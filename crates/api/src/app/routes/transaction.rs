use std::sync::Arc;

use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    routing::{post, put},
    Json, Router,
};

use dealflow_deals::{CpcvDraft, DocumentType, EscrituraDraft};

use crate::app::dto;
use crate::app::routes::common::opportunity_response;
use crate::app::services::AppServices;
use crate::context::{parse_id, DocumentPath, OpportunityPath};

pub fn router() -> Router {
    Router::new()
        .route("/transaction/cpcv", post(prepare_cpcv))
        .route("/transaction/cpcv/sign", post(sign_cpcv))
        .route("/transaction/escritura", post(prepare_escritura))
        .route("/transaction/escritura/complete", post(complete_escritura))
        .route("/transaction/fell-through", post(mark_fell_through))
        .route("/transaction/documents/:doc_type", put(set_document_status))
        .route("/transaction/financing", put(set_financing).patch(update_financing_details))
        .route("/transaction/financing/milestones", post(record_financing_milestone))
}

pub async fn prepare_cpcv(
    Extension(services): Extension<Arc<AppServices>>,
    Path(path): Path<OpportunityPath>,
    Json(body): Json<CpcvDraft>,
) -> axum::response::Response {
    let ctx = match path.context() {
        Ok(c) => c,
        Err(r) => return r,
    };
    opportunity_response(StatusCode::OK, services.deals().prepare_cpcv(&ctx, body))
}

pub async fn sign_cpcv(
    Extension(services): Extension<Arc<AppServices>>,
    Path(path): Path<OpportunityPath>,
) -> axum::response::Response {
    let ctx = match path.context() {
        Ok(c) => c,
        Err(r) => return r,
    };
    opportunity_response(StatusCode::OK, services.deals().sign_cpcv(&ctx))
}

pub async fn prepare_escritura(
    Extension(services): Extension<Arc<AppServices>>,
    Path(path): Path<OpportunityPath>,
    Json(body): Json<EscrituraDraft>,
) -> axum::response::Response {
    let ctx = match path.context() {
        Ok(c) => c,
        Err(r) => return r,
    };
    opportunity_response(StatusCode::OK, services.deals().prepare_escritura(&ctx, body))
}

pub async fn complete_escritura(
    Extension(services): Extension<Arc<AppServices>>,
    Path(path): Path<OpportunityPath>,
    Json(body): Json<dto::CompleteEscrituraRequest>,
) -> axum::response::Response {
    let ctx = match path.context() {
        Ok(c) => c,
        Err(r) => return r,
    };
    opportunity_response(
        StatusCode::OK,
        services.deals().complete_escritura(&ctx, body.registration_number),
    )
}

pub async fn mark_fell_through(
    Extension(services): Extension<Arc<AppServices>>,
    Path(path): Path<OpportunityPath>,
    Json(body): Json<dto::FellThroughRequest>,
) -> axum::response::Response {
    let ctx = match path.context() {
        Ok(c) => c,
        Err(r) => return r,
    };
    opportunity_response(StatusCode::OK, services.deals().mark_fell_through(&ctx, &body.reason))
}

pub async fn set_document_status(
    Extension(services): Extension<Arc<AppServices>>,
    Path(path): Path<DocumentPath>,
    Json(body): Json<dto::DocumentStatusRequest>,
) -> axum::response::Response {
    let ctx = match path.opportunity().context() {
        Ok(c) => c,
        Err(r) => return r,
    };
    let doc_type: DocumentType = match parse_id(&path.doc_type, "unknown document type") {
        Ok(t) => t,
        Err(r) => return r,
    };
    opportunity_response(
        StatusCode::OK,
        services
            .deals()
            .set_document_status(&ctx, doc_type, body.status, body.notes),
    )
}

pub async fn set_financing(
    Extension(services): Extension<Arc<AppServices>>,
    Path(path): Path<OpportunityPath>,
    Json(body): Json<dto::SetFinancingRequest>,
) -> axum::response::Response {
    let ctx = match path.context() {
        Ok(c) => c,
        Err(r) => return r,
    };
    opportunity_response(StatusCode::OK, services.deals().set_financing(&ctx, body.enabled))
}

pub async fn update_financing_details(
    Extension(services): Extension<Arc<AppServices>>,
    Path(path): Path<OpportunityPath>,
    Json(body): Json<dto::FinancingDetailsRequest>,
) -> axum::response::Response {
    let ctx = match path.context() {
        Ok(c) => c,
        Err(r) => return r,
    };
    opportunity_response(
        StatusCode::OK,
        services
            .deals()
            .update_financing_details(&ctx, body.bank_name, body.approval_amount),
    )
}

pub async fn record_financing_milestone(
    Extension(services): Extension<Arc<AppServices>>,
    Path(path): Path<OpportunityPath>,
    Json(body): Json<dto::FinancingMilestoneRequest>,
) -> axum::response::Response {
    let ctx = match path.context() {
        Ok(c) => c,
        Err(r) => return r,
    };
    opportunity_response(
        StatusCode::OK,
        services
            .deals()
            .record_financing_milestone(&ctx, body.milestone, body.done, body.date),
    )
}
