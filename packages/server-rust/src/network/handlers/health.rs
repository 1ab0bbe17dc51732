//! Health endpoints for load balancers and orchestrators.
//!
//! - `GET /health`: lifecycle state, storage backend, modes, and the reads
//!   and submissions in flight
//! - `GET /health/live`: 200 while the process answers
//! - `GET /health/ready`: 200 only in the `Ready` state

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde_json::{json, Value};

use super::AppState;
use crate::network::HealthState;

/// Always 200; the `state` field carries the lifecycle so a draining
/// server can be told apart from a dead one.
pub async fn health_handler(State(state): State<AppState>) -> Json<Value> {
    let in_flight = state.shutdown.in_flight();
    Json(json!({
        "state": state.shutdown.health_state().as_str(),
        "storage": state.board.storage_backend,
        "modes": state.board.modes,
        "inFlight": {
            "reads": in_flight.reads,
            "submits": in_flight.submits,
        },
        "uptimeSecs": state.start_time.elapsed().as_secs(),
    }))
}

pub async fn liveness_handler() -> StatusCode {
    StatusCode::OK
}

/// 503 while starting, draining, or stopped, so no new submissions are
/// routed to an instance that is going away.
pub async fn readiness_handler(State(state): State<AppState>) -> StatusCode {
    if state.shutdown.health_state() == HealthState::Ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::network::test_support::test_state;
    use crate::network::RequestKind;

    #[tokio::test]
    async fn health_reports_backend_and_modes() {
        let state = test_state();
        state.shutdown.set_ready();

        let Json(body) = health_handler(State(state)).await;

        assert_eq!(body["state"], "ready");
        assert_eq!(body["storage"], "memory");
        assert_eq!(body["modes"], json!(["multipleTiming", "oneTiming", "timing"]));
        assert!(body["uptimeSecs"].is_u64());
    }

    #[tokio::test]
    async fn health_splits_in_flight_by_kind() {
        let state = test_state();
        let _read = state.shutdown.track(RequestKind::Read);
        let _submit = state.shutdown.track(RequestKind::Submit);
        let _another = state.shutdown.track(RequestKind::Submit);

        let Json(body) = health_handler(State(state)).await;

        assert_eq!(body["inFlight"], json!({ "reads": 1, "submits": 2 }));
    }

    #[tokio::test]
    async fn health_follows_lifecycle() {
        let state = test_state();
        assert_eq!(health_handler(State(state.clone())).await.0["state"], "starting");

        state.shutdown.set_ready();
        state.shutdown.trigger_shutdown();
        assert_eq!(health_handler(State(state)).await.0["state"], "draining");
    }

    #[tokio::test]
    async fn liveness_ignores_lifecycle() {
        assert_eq!(liveness_handler().await, StatusCode::OK);
    }

    #[tokio::test]
    async fn readiness_only_when_ready() {
        let state = test_state();
        assert_eq!(
            readiness_handler(State(state.clone())).await,
            StatusCode::SERVICE_UNAVAILABLE
        );

        state.shutdown.set_ready();
        assert_eq!(readiness_handler(State(state.clone())).await, StatusCode::OK);

        state.shutdown.trigger_shutdown();
        assert_eq!(
            readiness_handler(State(state)).await,
            StatusCode::SERVICE_UNAVAILABLE
        );
    }
}
