//! Metrics middleware for operations.
//!
//! Wraps each operation in a `tracing` span and records
//! `scoreboard_operations_total{op,outcome}` and
//! `scoreboard_operation_duration_seconds{op}` through the `metrics` facade.
//! Without an installed recorder the `metrics` calls are no-ops.

use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};
use std::time::Instant;

use tower::{Layer, Service};
use tracing::{info_span, Instrument};

use crate::service::operation::{Operation, OperationError, OperationResponse};

// ---------------------------------------------------------------------------
// MetricsLayer
// ---------------------------------------------------------------------------

/// Tower layer that instruments operations with timing and outcome counters.
#[derive(Debug, Clone)]
pub struct MetricsLayer;

impl<S> Layer<S> for MetricsLayer {
    type Service = MetricsService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        MetricsService { inner }
    }
}

// ---------------------------------------------------------------------------
// MetricsService
// ---------------------------------------------------------------------------

/// Service wrapper that records operation duration and outcome.
#[derive(Debug, Clone)]
pub struct MetricsService<S> {
    inner: S,
}

/// Metric label for an operation result.
pub(crate) fn outcome_label(result: &Result<OperationResponse, OperationError>) -> &'static str {
    match result {
        Ok(_) => "ok",
        Err(OperationError::Timeout { .. }) => "timeout",
        Err(OperationError::Overloaded) => "overloaded",
        Err(OperationError::Ranking(e)) if e.is_client_error() => "rejected",
        Err(OperationError::Ranking(_)) => "error",
    }
}

impl<S> Service<Operation> for MetricsService<S>
where
    S: Service<Operation, Response = OperationResponse, Error = OperationError> + Send,
    S::Future: Send + 'static,
{
    type Response = OperationResponse;
    type Error = OperationError;
    type Future = Pin<Box<dyn Future<Output = Result<OperationResponse, OperationError>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, op: Operation) -> Self::Future {
        let kind = op.kind();
        let call_id = op.ctx().call_id;

        let span = info_span!(
            "operation",
            op = kind,
            mode = %op.ctx().mode,
            call_id = call_id,
            duration_ms = tracing::field::Empty,
            outcome = tracing::field::Empty,
        );

        let fut = self.inner.call(op);

        Box::pin(
            async move {
                let start = Instant::now();
                let result = fut.await;
                let elapsed = start.elapsed();
                let outcome = outcome_label(&result);

                metrics::counter!("scoreboard_operations_total", "op" => kind, "outcome" => outcome)
                    .increment(1);
                metrics::histogram!("scoreboard_operation_duration_seconds", "op" => kind)
                    .record(elapsed.as_secs_f64());

                #[allow(clippy::cast_possible_truncation)]
                let duration_ms = elapsed.as_millis() as u64;
                tracing::Span::current().record("duration_ms", duration_ms);
                tracing::Span::current().record("outcome", outcome);

                tracing::debug!(
                    op = kind,
                    call_id = call_id,
                    duration_ms = duration_ms,
                    outcome = outcome,
                    "operation complete"
                );

                result
            }
            .instrument(span),
        )
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use scoreboard_core::WindowQuery;
    use tower::ServiceExt;

    use super::*;
    use crate::ranking::RankingError;
    use crate::service::operation::OperationContext;

    /// Immediately-completing service for metrics testing.
    struct ImmediateService;

    impl Service<Operation> for ImmediateService {
        type Response = OperationResponse;
        type Error = OperationError;
        type Future =
            Pin<Box<dyn Future<Output = Result<OperationResponse, OperationError>> + Send>>;

        fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
            Poll::Ready(Ok(()))
        }

        fn call(&mut self, _op: Operation) -> Self::Future {
            Box::pin(async move { Ok(OperationResponse::Records(Vec::new())) })
        }
    }

    #[tokio::test]
    async fn metrics_layer_passes_through_response() {
        let svc = MetricsLayer.layer(ImmediateService);
        let op = Operation::GetWindow {
            ctx: OperationContext::new(42, "timing", 0, 5000),
            query: WindowQuery::top(),
        };
        let resp = svc.oneshot(op).await.unwrap();
        assert_eq!(resp, OperationResponse::Records(Vec::new()));
    }

    #[test]
    fn outcome_labels() {
        assert_eq!(outcome_label(&Ok(OperationResponse::Records(Vec::new()))), "ok");
        assert_eq!(outcome_label(&Err(OperationError::Overloaded)), "overloaded");
        assert_eq!(
            outcome_label(&Err(OperationError::Timeout { timeout_ms: 1 })),
            "timeout"
        );
        assert_eq!(
            outcome_label(&Err(RankingError::RecordNotFound(1).into())),
            "rejected"
        );
        assert_eq!(
            outcome_label(&Err(RankingError::Internal("x".into()).into())),
            "error"
        );
    }
}
