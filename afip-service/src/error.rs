//! Failure taxonomy of the authorization pipeline.

use thiserror::Error;
use uuid::Uuid;

use crate::models::{AuditTrace, Observation};

#[derive(Debug, Error)]
pub enum AuthorizationError {
    /// Fiscal amounts do not add up to the invoice total.
    #[error("Invalid amounts: {0}")]
    InvalidAmount(String),

    /// A field the service requires for this document has no source data.
    #[error("Missing {field}: {reason}")]
    Mapping { field: &'static str, reason: String },

    /// The local sequence is out of step with the authority's ledger.
    #[error("Check document number. Next is {expected}, invoice has {requested}")]
    SequenceMismatch { expected: u64, requested: u64 },

    /// Network, certificate or service-side fault.
    #[error("AFIP Validation Error. {message}")]
    Transport { message: String, trace: AuditTrace },

    #[error("AFIP Validation Error. {message}")]
    Rejected {
        message: String,
        observations: Vec<Observation>,
        trace: AuditTrace,
    },

    /// Observed, or approved without a code. Handled as a rejection.
    #[error("AFIP Validation Error. {message}")]
    ObservedWithoutCode {
        message: String,
        observations: Vec<Observation>,
        trace: AuditTrace,
    },

    #[error("Invoice {0} already has an authorization code")]
    AlreadyAuthorized(Uuid),

    #[error("Failed to commit authorization record: {0}")]
    Store(anyhow::Error),
}

impl AuthorizationError {
    /// Wire payloads of the failed exchange, when one took place.
    pub fn trace(&self) -> Option<&AuditTrace> {
        match self {
            AuthorizationError::Transport { trace, .. }
            | AuthorizationError::Rejected { trace, .. }
            | AuthorizationError::ObservedWithoutCode { trace, .. } => Some(trace),
            _ => None,
        }
    }

    /// Re-running the pipeline unchanged may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            AuthorizationError::Transport { .. } | AuthorizationError::Store(_)
        )
    }

    /// Metric label.
    pub fn kind(&self) -> &'static str {
        match self {
            AuthorizationError::InvalidAmount(_) => "invalid_amount",
            AuthorizationError::Mapping { .. } => "mapping",
            AuthorizationError::SequenceMismatch { .. } => "sequence_mismatch",
            AuthorizationError::Transport { .. } => "transport",
            AuthorizationError::Rejected { .. } => "rejected",
            AuthorizationError::ObservedWithoutCode { .. } => "observed_without_code",
            AuthorizationError::AlreadyAuthorized(_) => "already_authorized",
            AuthorizationError::Store(_) => "store",
        }
    }

    pub(crate) fn mapping(field: &'static str, reason: impl Into<String>) -> Self {
        AuthorizationError::Mapping {
            field,
            reason: reason.into(),
        }
    }
}
