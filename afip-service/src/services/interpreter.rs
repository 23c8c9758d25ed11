//! Classification of authority responses.

use chrono::NaiveDate;

use super::providers::{RawResponse, ServiceFault};
use crate::error::AuthorizationError;
use crate::models::{
    AuditTrace, AuthMode, AuthorizationRecord, AuthorizationResult, Observation, Outcome,
};

const GENERIC_FAULT: &str = "Unexpected error communicating with AFIP web service";

const RESULT_APPROVED: &str = "A";
const RESULT_REJECTED: &str = "R";

/// Classify what came back from a submission.
pub fn interpret(response: Result<RawResponse, ServiceFault>) -> AuthorizationResult {
    let raw = match response {
        Ok(raw) => raw,
        Err(fault) => return transport_error(fault.message, fault.trace),
    };

    if let Some(exception) = raw.exception.as_deref().filter(|e| !e.trim().is_empty()) {
        return transport_error(exception.to_string(), raw.trace);
    }

    let code = raw.auth_code.clone().filter(|c| !c.trim().is_empty());
    let letter = raw.result.as_deref().map(str::trim).unwrap_or_default();
    let outcome = match (letter, &code) {
        (RESULT_APPROVED, Some(_)) => Outcome::Authorized,
        (RESULT_REJECTED, _) => Outcome::Rejected,
        _ => Outcome::Observed,
    };

    AuthorizationResult {
        outcome,
        expiry_date: expiry_date(&raw),
        code,
        code_type: AuthMode::Cae,
        result_letter: raw.result.clone(),
        message: message(&raw.observations, raw.error_message.as_deref()),
        observations: raw.observations,
        trace: raw.trace,
    }
}

fn transport_error(message: String, trace: AuditTrace) -> AuthorizationResult {
    let message = if message.trim().is_empty() {
        GENERIC_FAULT.to_string()
    } else {
        message
    };
    AuthorizationResult {
        outcome: Outcome::TransportError,
        code: None,
        code_type: AuthMode::Cae,
        expiry_date: None,
        result_letter: None,
        observations: Vec::new(),
        message,
        trace,
    }
}

/// Observations and the error message, one per line.
fn message(observations: &[Observation], error_message: Option<&str>) -> String {
    observations
        .iter()
        .map(|o| o.to_string())
        .chain(error_message.map(str::to_string))
        .filter(|part| !part.trim().is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Expiry from `fch_venc_cae`, else `vencimiento`; the first 8-digit date wins.
fn expiry_date(raw: &RawResponse) -> Option<NaiveDate> {
    [raw.fch_venc_cae.as_deref(), raw.vencimiento.as_deref()]
        .into_iter()
        .flatten()
        .map(str::trim)
        .filter(|value| value.len() == 8 && value.bytes().all(|b| b.is_ascii_digit()))
        .find_map(|value| NaiveDate::parse_from_str(value, "%Y%m%d").ok())
}

impl AuthorizationResult {
    /// The durable record for an authorized result; any other outcome is the
    /// fatal error to surface for the invoice.
    pub fn into_record(self) -> Result<AuthorizationRecord, AuthorizationError> {
        match (self.outcome, self.code) {
            (Outcome::Authorized, Some(code)) => Ok(AuthorizationRecord {
                auth_mode: self.code_type,
                auth_code: code,
                auth_code_due_date: self.expiry_date,
                result: self.result_letter.unwrap_or_default(),
                message: self.message,
                request_trace: self.trace.request,
                response_trace: self.trace.response,
            }),
            (Outcome::TransportError, _) => Err(AuthorizationError::Transport {
                message: self.message,
                trace: self.trace,
            }),
            (Outcome::Rejected, _) => Err(AuthorizationError::Rejected {
                message: self.message,
                observations: self.observations,
                trace: self.trace,
            }),
            _ => Err(AuthorizationError::ObservedWithoutCode {
                message: self.message,
                observations: self.observations,
                trace: self.trace,
            }),
        }
    }
}
