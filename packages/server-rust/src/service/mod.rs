//! Operation classification and execution framework.
//!
//! This module implements the service-oriented operation pipeline:
//!
//! 1. **Classification** (`classify`): query strings and bodies -> `Result<Operation, ClassifyError>`
//! 2. **Middleware** (`middleware`): Tower layers (load-shedding, timeout, metrics)
//! 3. **Domain service** (`domain`): `LeaderboardService`, the innermost `tower::Service`

pub mod classify;
pub mod config;
pub mod domain;
pub mod middleware;
pub mod operation;

// Re-export key types for convenient access.
pub use classify::OperationService;
pub use config::ServerConfig;
pub use domain::LeaderboardService;
pub use middleware::{build_operation_pipeline, OperationPipeline};
pub use operation::{
    ClassifyError, Operation, OperationContext, OperationError, OperationResponse,
};
