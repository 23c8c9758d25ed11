//! service-core: Shared infrastructure for the fiscal authorization services.
pub mod config;
pub mod error;
pub mod observability;
pub mod retry;

pub use serde;
pub use tokio;
pub use tracing;
