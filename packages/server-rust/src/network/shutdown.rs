//! Graceful shutdown for the score endpoints.
//!
//! Health state sits in an `ArcSwap` so health checks never block. Reads and
//! submissions in flight are counted separately and published through a
//! `watch` channel; draining waits on that channel until both reach zero.

use std::sync::Arc;
use std::time::Duration;

use arc_swap::ArcSwap;
use tokio::sync::watch;

/// Server lifecycle: `Starting -> Ready -> Draining -> Stopped`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HealthState {
    Starting,
    /// Accepting reads and submissions.
    Ready,
    /// Listener closed; requests already accepted still run.
    Draining,
    /// Nothing left in flight.
    Stopped,
}

impl HealthState {
    /// Lowercase name used in the health endpoint body.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Starting => "starting",
            Self::Ready => "ready",
            Self::Draining => "draining",
            Self::Stopped => "stopped",
        }
    }
}

/// What an in-flight request is doing to the leaderboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestKind {
    Read,
    Submit,
}

/// Requests currently being served, by kind.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InFlight {
    pub reads: u64,
    pub submits: u64,
}

impl InFlight {
    #[must_use]
    pub fn total(self) -> u64 {
        self.reads + self.submits
    }

    fn slot(&mut self, kind: RequestKind) -> &mut u64 {
        match kind {
            RequestKind::Read => &mut self.reads,
            RequestKind::Submit => &mut self.submits,
        }
    }
}

/// Owns the health state and the in-flight counters.
///
/// `serve()` marks the controller ready, `trigger_shutdown()` flips it to
/// draining and wakes the TLS acceptor, and `wait_for_drain()` resolves once
/// the last [`RequestGuard`] is dropped.
#[derive(Debug)]
pub struct ShutdownController {
    shutdown_signal: watch::Sender<bool>,
    in_flight: Arc<watch::Sender<InFlight>>,
    health_state: ArcSwap<HealthState>,
}

impl ShutdownController {
    #[must_use]
    pub fn new() -> Self {
        let (shutdown_signal, _) = watch::channel(false);
        let (in_flight, _) = watch::channel(InFlight::default());
        Self {
            shutdown_signal,
            in_flight: Arc::new(in_flight),
            health_state: ArcSwap::from_pointee(HealthState::Starting),
        }
    }

    pub fn set_ready(&self) {
        self.health_state.store(Arc::new(HealthState::Ready));
    }

    /// Receiver that flips to `true` when shutdown is triggered.
    #[must_use]
    pub fn shutdown_receiver(&self) -> watch::Receiver<bool> {
        self.shutdown_signal.subscribe()
    }

    /// Moves to `Draining` and notifies every shutdown receiver.
    pub fn trigger_shutdown(&self) {
        self.health_state.store(Arc::new(HealthState::Draining));
        self.shutdown_signal.send_replace(true);
    }

    #[must_use]
    pub fn health_state(&self) -> HealthState {
        **self.health_state.load()
    }

    /// Counts one request of `kind` until the returned guard is dropped.
    #[must_use]
    pub fn track(&self, kind: RequestKind) -> RequestGuard {
        self.in_flight.send_modify(|n| *n.slot(kind) += 1);
        RequestGuard {
            kind,
            in_flight: Arc::clone(&self.in_flight),
        }
    }

    #[must_use]
    pub fn in_flight(&self) -> InFlight {
        *self.in_flight.borrow()
    }

    /// Waits up to `timeout` for every tracked request to finish.
    ///
    /// Moves to `Stopped` and returns `true` once nothing is in flight;
    /// returns `false` and stays `Draining` when the timeout wins.
    pub async fn wait_for_drain(&self, timeout: Duration) -> bool {
        let mut rx = self.in_flight.subscribe();
        let drained = tokio::time::timeout(timeout, rx.wait_for(|n| n.total() == 0))
            .await
            .is_ok_and(|idle| idle.is_ok());
        if drained {
            self.health_state.store(Arc::new(HealthState::Stopped));
        }
        drained
    }
}

impl Default for ShutdownController {
    fn default() -> Self {
        Self::new()
    }
}

/// Decrements its request kind's counter on drop, including during unwinding.
#[derive(Debug)]
pub struct RequestGuard {
    kind: RequestKind,
    in_flight: Arc<watch::Sender<InFlight>>,
}

impl Drop for RequestGuard {
    fn drop(&mut self) {
        let kind = self.kind;
        self.in_flight.send_modify(|n| *n.slot(kind) -= 1);
    }
}
