//! Remote fiscal web service abstractions and implementations.
//!
//! The authority is reached through the [`FiscalWebService`] capability so the
//! client, interpreter and orchestrator can run against the HTTP gateway or a
//! scripted mock alike.

pub mod certificates;
pub mod http;
pub mod mock;

use async_trait::async_trait;
use service_core::retry::Retryable;
use std::sync::Arc;
use thiserror::Error;

use crate::models::{AuditTrace, AuthorizationRequest, FiscalService, Observation};

/// Fault raised by the remote service or the path to it.
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct ServiceFault {
    /// Diagnostic text, the authority's own when it sent one.
    pub message: String,
    pub retryable: bool,
    pub trace: AuditTrace,
}

impl ServiceFault {
    pub fn transient(message: impl Into<String>, trace: AuditTrace) -> Self {
        Self {
            message: message.into(),
            retryable: true,
            trace,
        }
    }

    pub fn permanent(message: impl Into<String>, trace: AuditTrace) -> Self {
        Self {
            message: message.into(),
            retryable: false,
            trace,
        }
    }
}

impl Retryable for ServiceFault {
    fn is_retryable(&self) -> bool {
        self.retryable
    }
}

/// Structured answer to an authorization request, before classification.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawResponse {
    pub auth_code: Option<String>,
    /// Result letter: "A", "R" or "O".
    pub result: Option<String>,
    /// Expiry date, as named by wsfex/wsmtxca.
    pub vencimiento: Option<String>,
    /// Expiry date, as named by wsfe.
    pub fch_venc_cae: Option<String>,
    pub observations: Vec<Observation>,
    pub error_message: Option<String>,
    /// Exception the service reported while processing the request.
    pub exception: Option<String>,
    pub trace: AuditTrace,
}

/// Connection to one fiscal web service.
#[async_trait]
pub trait FiscalWebService: Send + Sync {
    fn service(&self) -> FiscalService;

    /// Last number the authority authorized for the point of sale and document type.
    async fn last_authorized_number(
        &self,
        point_of_sale: u32,
        document_type: u16,
    ) -> Result<u64, ServiceFault>;

    /// Create the draft, attach the additional info and request authorization.
    async fn submit(&self, request: &AuthorizationRequest) -> Result<RawResponse, ServiceFault>;
}

/// Opens connections to the configured environment.
#[async_trait]
pub trait Connector: Send + Sync {
    async fn connect(&self, service: FiscalService)
        -> Result<Arc<dyn FiscalWebService>, ServiceFault>;
}
