use std::sync::Arc;

use axum::{
    extract::{Extension, Path, Query},
    http::StatusCode,
    response::IntoResponse,
    Json,
};

use dealflow_core::ConsultantId;

use crate::app::dto;
use crate::app::services::AppServices;
use crate::context::parse_id;

const DEFAULT_LIMIT: usize = 50;

/// Recently published deal events for one consultant, newest first.
pub async fn list(
    Extension(services): Extension<Arc<AppServices>>,
    Path(consultant_id): Path<String>,
    Query(query): Query<dto::ActivityQuery>,
) -> axum::response::Response {
    let consultant_id: ConsultantId = match parse_id(&consultant_id, "invalid consultant id") {
        Ok(v) => v,
        Err(r) => return r,
    };
    let events = services
        .activity()
        .for_consultant(consultant_id, query.limit.unwrap_or(DEFAULT_LIMIT));

    (
        StatusCode::OK,
        Json(serde_json::json!({
            "count": events.len(),
            "events": events.iter().map(dto::envelope_to_json).collect::<Vec<_>>(),
        })),
    )
        .into_response()
}
