//! Authorization results and the durable record derived from them.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Kind of authorization code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AuthMode {
    /// Issued at transaction time.
    #[serde(rename = "CAE")]
    Cae,
    /// Pre-printed vouchers.
    #[serde(rename = "CAI")]
    Cai,
    /// Issued in advance for a period.
    #[serde(rename = "CAEA")]
    Caea,
}

impl AuthMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuthMode::Cae => "CAE",
            AuthMode::Cai => "CAI",
            AuthMode::Caea => "CAEA",
        }
    }
}

/// Outbound and inbound wire payloads of one exchange.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditTrace {
    pub request: Option<String>,
    pub response: Option<String>,
}

impl AuditTrace {
    pub fn new(request: Option<String>, response: Option<String>) -> Self {
        Self { request, response }
    }
}

/// Observation or error reported by the authority.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Observation {
    pub code: i64,
    pub message: String,
}

impl std::fmt::Display for Observation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.code, self.message)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    Authorized,
    Rejected,
    Observed,
    TransportError,
}

/// Classified response of the authority.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthorizationResult {
    pub outcome: Outcome,
    pub code: Option<String>,
    pub code_type: AuthMode,
    pub expiry_date: Option<NaiveDate>,
    /// "A", "R" or "O" as reported.
    pub result_letter: Option<String>,
    pub observations: Vec<Observation>,
    pub message: String,
    pub trace: AuditTrace,
}

/// Persisted authorization, written once per invoice.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthorizationRecord {
    pub auth_mode: AuthMode,
    pub auth_code: String,
    pub auth_code_due_date: Option<NaiveDate>,
    /// "A" for genuine approvals, empty for local-only validation.
    pub result: String,
    pub message: String,
    #[serde(default)]
    pub request_trace: Option<String>,
    #[serde(default)]
    pub response_trace: Option<String>,
}
