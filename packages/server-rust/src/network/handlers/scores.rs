//! Score endpoints.
//!
//! - `GET /api/scores/{mode}`: point lookup (`id`) or window (`loadCount`,
//!   `centerOn`)
//! - `POST /api/scores/{mode}`: authorized submission; responds with the
//!   stored record and its placement

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::HeaderMap;
use axum::response::{IntoResponse, Response};
use axum::Json;
use scoreboard_core::messages::{ApiEnvelope, ScoreQueryParams, SubmitScoreBody};
use tower::ServiceExt;

use super::AppState;
use crate::network::{ApiError, RequestKind};
use crate::service::{Operation, OperationResponse};

fn success(response: OperationResponse) -> Response {
    match response {
        OperationResponse::Record(record) => Json(ApiEnvelope::success(record)).into_response(),
        OperationResponse::Records(records) => Json(ApiEnvelope::success(records)).into_response(),
    }
}

async fn dispatch(state: &AppState, op: Operation) -> Result<Response, ApiError> {
    let response = state.pipeline.clone().oneshot(op).await?;
    Ok(success(response))
}

/// `GET /api/scores/{mode}`.
pub async fn get_scores_handler(
    State(state): State<AppState>,
    Path(mode): Path<String>,
    query: Result<Query<ScoreQueryParams>, QueryRejection>,
) -> Result<Response, ApiError> {
    let _in_flight = state.shutdown.track(RequestKind::Read);
    let Query(params) = query.map_err(|e| ApiError::Malformed(e.body_text()))?;
    let op = state.classifier.classify_query(&mode, &params)?;
    dispatch(&state, op).await
}

/// `POST /api/scores/{mode}`.
///
/// Authorization is checked before the body is looked at.
pub async fn post_score_handler(
    State(state): State<AppState>,
    Path(mode): Path<String>,
    headers: HeaderMap,
    body: Result<Json<SubmitScoreBody>, JsonRejection>,
) -> Result<Response, ApiError> {
    let _in_flight = state.shutdown.track(RequestKind::Submit);
    state.password.authorize(&headers)?;
    let Json(body) = body.map_err(|e| ApiError::Malformed(e.body_text()))?;
    let op = state.classifier.classify_submit(&mode, body)?;
    dispatch(&state, op).await
}
