//! Services module for afip-service.

pub mod amounts;
pub mod client;
pub mod interpreter;
pub mod mapper;
pub mod metrics;
pub mod orchestrator;
pub mod providers;
pub mod qr;
pub mod store;

pub use client::AuthorizationClient;
pub use metrics::{get_metrics, init_metrics};
pub use orchestrator::{
    AuthorizationOrchestrator, AuthorizationOutcome, AuthorizationState, BatchReport, SkipReason,
};
pub use store::{AuthorizationStore, InMemoryAuthorizationStore, StoreError};
