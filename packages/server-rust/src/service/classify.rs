//! Request classification: converts raw transport input into typed `Operation` variants.

use std::str::FromStr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use scoreboard_core::messages::{ScoreQueryParams, SubmitScoreBody};
use scoreboard_core::{modes, ClockSource, NewScore, ScoreId, ValidationResult, WindowQuery};

use super::config::ServerConfig;
use super::operation::{ClassifyError, Operation, OperationContext};

/// Classifies query strings and submission bodies into [`Operation`] values.
///
/// Each call gets a unique call ID and the classification time. Numeric
/// parameters arrive as raw strings and are parsed here, so malformed
/// numbers surface as [`ClassifyError::InvalidArgument`].
pub struct OperationService {
    clock: Arc<dyn ClockSource>,
    config: Arc<ServerConfig>,
    call_id_counter: AtomicU64,
}

impl OperationService {
    #[must_use]
    pub fn new(clock: Arc<dyn ClockSource>, config: Arc<ServerConfig>) -> Self {
        Self {
            clock,
            config,
            call_id_counter: AtomicU64::new(1),
        }
    }

    fn next_call_id(&self) -> u64 {
        self.call_id_counter.fetch_add(1, Ordering::Relaxed)
    }

    fn make_ctx(&self, mode: &str) -> OperationContext {
        OperationContext::new(
            self.next_call_id(),
            mode,
            self.clock.now_millis(),
            self.config.default_operation_timeout_ms,
        )
    }

    /// Classifies `GET /api/scores/{mode}`.
    ///
    /// `id` selects a point lookup and the window parameters are ignored;
    /// otherwise `loadCount` and `centerOn` describe a window.
    ///
    /// # Errors
    ///
    /// [`ClassifyError::InvalidArgument`] for a non-integer parameter or a
    /// non-positive `loadCount`.
    pub fn classify_query(
        &self,
        mode: &str,
        params: &ScoreQueryParams,
    ) -> Result<Operation, ClassifyError> {
        if let Some(raw) = params.id.as_deref() {
            let id: ScoreId = parse_int("id", raw)?;
            return Ok(Operation::GetSingle {
                ctx: self.make_ctx(mode),
                id,
            });
        }

        let load_count = params
            .load_count
            .as_deref()
            .map(|raw| parse_int::<i64>("loadCount", raw))
            .transpose()?;
        let center_on = params
            .center_on
            .as_deref()
            .map(|raw| parse_int::<ScoreId>("centerOn", raw))
            .transpose()?;
        let query = WindowQuery::new(load_count, center_on).map_err(|e| {
            ClassifyError::InvalidArgument {
                field: "loadCount",
                reason: e.to_string(),
            }
        })?;

        Ok(Operation::GetWindow {
            ctx: self.make_ctx(mode),
            query,
        })
    }

    /// Classifies `POST /api/scores/{mode}`.
    ///
    /// Bodies for a known mode are checked against that mode's schema. An
    /// unknown mode passes through unchecked and is rejected by the
    /// leaderboard before any store is touched.
    ///
    /// # Errors
    ///
    /// [`ClassifyError::Validation`] listing every schema violation.
    pub fn classify_submit(
        &self,
        mode: &str,
        body: SubmitScoreBody,
    ) -> Result<Operation, ClassifyError> {
        let score = NewScore::from(body);
        if let Some(descriptor) = modes::find(mode) {
            if let ValidationResult::Invalid { errors } = descriptor.schema.validate(&score) {
                return Err(ClassifyError::Validation { errors });
            }
        }
        Ok(Operation::SubmitScore {
            ctx: self.make_ctx(mode),
            score,
        })
    }
}

fn parse_int<T: FromStr>(field: &'static str, raw: &str) -> Result<T, ClassifyError> {
    raw.trim()
        .parse()
        .map_err(|_| ClassifyError::InvalidArgument {
            field,
            reason: format!("expected an integer, got {raw:?}"),
        })
}

#[cfg(test)]
mod tests {
    use scoreboard_core::ManualClock;

    use super::*;

    fn service() -> OperationService {
        OperationService::new(
            Arc::new(ManualClock::new(42)),
            Arc::new(ServerConfig {
                default_operation_timeout_ms: 1234,
                ..ServerConfig::default()
            }),
        )
    }

    fn params(id: Option<&str>, load: Option<&str>, center: Option<&str>) -> ScoreQueryParams {
        ScoreQueryParams {
            id: id.map(str::to_string),
            load_count: load.map(str::to_string),
            center_on: center.map(str::to_string),
        }
    }

    fn body(username: &str, multiplier: Option<f64>) -> SubmitScoreBody {
        SubmitScoreBody {
            score: 100,
            username: username.to_string(),
            multiplier,
            mods: None,
        }
    }

    #[test]
    fn empty_query_is_default_top_window() {
        let op = service().classify_query("timing", &params(None, None, None)).unwrap();
        match op {
            Operation::GetWindow { ctx, query } => {
                assert_eq!(ctx.mode, "timing");
                assert_eq!(ctx.started_at_ms, 42);
                assert_eq!(ctx.call_timeout_ms, 1234);
                assert_eq!(query, WindowQuery::top());
            }
            other => panic!("unexpected operation: {other:?}"),
        }
    }

    #[test]
    fn id_takes_precedence_over_window() {
        let op = service()
            .classify_query("timing", &params(Some("7"), Some("abc"), None))
            .unwrap();
        assert!(matches!(op, Operation::GetSingle { id: 7, .. }));
    }

    #[test]
    fn centered_window_parses_both_parameters() {
        let op = service()
            .classify_query("timing", &params(None, Some("4"), Some("12")))
            .unwrap();
        let Operation::GetWindow { query, .. } = op else {
            panic!("expected window");
        };
        assert_eq!(query.load_count(), 4);
        assert_eq!(query.center_on(), Some(12));
    }

    #[test]
    fn malformed_numbers_are_invalid_arguments() {
        let svc = service();
        for (p, field) in [
            (params(Some("x"), None, None), "id"),
            (params(None, Some("2.5"), None), "loadCount"),
            (params(None, Some("0"), None), "loadCount"),
            (params(None, Some("-3"), None), "loadCount"),
            (params(None, None, Some("-1")), "centerOn"),
        ] {
            match svc.classify_query("timing", &p) {
                Err(ClassifyError::InvalidArgument { field: f, .. }) => assert_eq!(f, field),
                other => panic!("expected invalid {field}, got {other:?}"),
            }
        }
    }

    #[test]
    fn call_ids_increase() {
        let svc = service();
        let a = svc.classify_query("timing", &params(None, None, None)).unwrap();
        let b = svc.classify_query("timing", &params(None, None, None)).unwrap();
        assert!(b.ctx().call_id > a.ctx().call_id);
    }

    #[test]
    fn submit_checks_mode_schema() {
        let svc = service();
        assert!(svc.classify_submit("timing", body("abc", Some(1.1))).is_ok());

        match svc.classify_submit("oneTiming", body("abcd", Some(1.1))) {
            Err(ClassifyError::Validation { errors }) => assert_eq!(errors.len(), 2),
            other => panic!("expected validation failure, got {other:?}"),
        }
    }

    #[test]
    fn submit_to_unknown_mode_is_left_to_the_leaderboard() {
        let op = service().classify_submit("unknown", body("", None)).unwrap();
        assert_eq!(op.ctx().mode, "unknown");
    }
}
