//! Per-invoice authorization pipeline and batch processing.
//!
//! ```text
//! NotRequested ──skip──────────────────────────────▶ (unchanged)
//!      │ ──homologation without certificate──────▶ Authorized (local only)
//!      ▼
//!  Requested ──authorized──▶ Authorized (record committed at once)
//!      └──────any failure──▶ Rejected (nothing written, may be re-run)
//! ```

use service_core::retry::RetryConfig;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::amounts::calculate;
use super::client::{AuthorizationClient, DEFAULT_REQUEST_TIMEOUT};
use super::interpreter::interpret;
use super::mapper::mapper_for;
use super::metrics::{AUTHORIZATIONS_TOTAL, ERRORS_TOTAL};
use super::providers::certificates::{validation_type, CertificateProvider};
use super::providers::Connector;
use super::store::AuthorizationStore;
use crate::error::AuthorizationError;
use crate::models::{AuthMode, AuthorizationRecord, FiscalService, Invoice};

/// Code recorded when an invoice is only validated locally.
pub const PLACEHOLDER_AUTH_CODE: &str = "68448767638166";

pub const LOCAL_ONLY_MESSAGE: &str =
    "Invoice validated only locally: homologation environment without homologation credentials";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthorizationState {
    NotRequested,
    Requested,
    Authorized,
    Rejected,
}

impl AuthorizationState {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuthorizationState::NotRequested => "not_requested",
            AuthorizationState::Requested => "requested",
            AuthorizationState::Authorized => "authorized",
            AuthorizationState::Rejected => "rejected",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// Vendor bills and refunds are never authorized.
    NotCustomerDocument,
    /// The journal is not configured for electronic authorization.
    NoFiscalService,
    AlreadyAuthorized,
}

#[derive(Debug, Clone, PartialEq)]
pub enum AuthorizationOutcome {
    Skipped(SkipReason),
    /// Placeholder record from the homologation shortcut.
    LocallyValidated(AuthorizationRecord),
    Authorized(AuthorizationRecord),
}

impl AuthorizationOutcome {
    pub fn record(&self) -> Option<&AuthorizationRecord> {
        match self {
            AuthorizationOutcome::Skipped(_) => None,
            AuthorizationOutcome::LocallyValidated(record)
            | AuthorizationOutcome::Authorized(record) => Some(record),
        }
    }

    fn metric_label(&self) -> &'static str {
        match self {
            AuthorizationOutcome::Skipped(_) => "skipped",
            AuthorizationOutcome::LocallyValidated(_) => "local_only",
            AuthorizationOutcome::Authorized(_) => "authorized",
        }
    }
}

/// Per-invoice results of a batch, in input order.
#[derive(Debug, Default)]
pub struct BatchReport {
    pub results: Vec<(Uuid, Result<AuthorizationOutcome, AuthorizationError>)>,
}

impl BatchReport {
    fn count(&self, predicate: impl Fn(&Result<AuthorizationOutcome, AuthorizationError>) -> bool) -> usize {
        self.results.iter().filter(|(_, r)| predicate(r)).count()
    }

    pub fn authorized_count(&self) -> usize {
        self.count(|r| matches!(r, Ok(AuthorizationOutcome::Authorized(_))))
    }

    pub fn locally_validated_count(&self) -> usize {
        self.count(|r| matches!(r, Ok(AuthorizationOutcome::LocallyValidated(_))))
    }

    pub fn skipped_count(&self) -> usize {
        self.count(|r| matches!(r, Ok(AuthorizationOutcome::Skipped(_))))
    }

    pub fn failed_count(&self) -> usize {
        self.count(|r| r.is_err())
    }

    /// Records written during the batch.
    pub fn records(&self) -> impl Iterator<Item = (Uuid, &AuthorizationRecord)> {
        self.results
            .iter()
            .filter_map(|(id, r)| r.as_ref().ok()?.record().map(|record| (*id, record)))
    }
}

pub struct AuthorizationOrchestrator {
    connector: Arc<dyn Connector>,
    certificates: Arc<dyn CertificateProvider>,
    store: Arc<dyn AuthorizationStore>,
    request_timeout: Duration,
    retry: RetryConfig,
    clients: Mutex<HashMap<FiscalService, Arc<AuthorizationClient>>>,
}

impl AuthorizationOrchestrator {
    pub fn new(
        connector: Arc<dyn Connector>,
        certificates: Arc<dyn CertificateProvider>,
        store: Arc<dyn AuthorizationStore>,
    ) -> Self {
        Self {
            connector,
            certificates,
            store,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            retry: RetryConfig::quick(),
            clients: Mutex::new(HashMap::new()),
        }
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    /// Client for the service, connecting on first use and reusing it after.
    pub async fn client_for(
        &self,
        service: FiscalService,
    ) -> Result<Arc<AuthorizationClient>, AuthorizationError> {
        let mut clients = self.clients.lock().await;
        if let Some(client) = clients.get(&service) {
            return Ok(client.clone());
        }

        let connection = self.connector.connect(service).await?;
        let client = Arc::new(
            AuthorizationClient::new(connection)
                .with_request_timeout(self.request_timeout)
                .with_retry(self.retry.clone()),
        );
        clients.insert(service, client.clone());
        Ok(client)
    }

    /// Run the pipeline for one invoice.
    pub async fn authorize(&self, invoice: &Invoice) -> Result<AuthorizationOutcome, AuthorizationError> {
        let result = self.run(invoice).await;

        match &result {
            Ok(AuthorizationOutcome::Skipped(reason)) => {
                debug!(
                    invoice_id = %invoice.invoice_id,
                    state = AuthorizationState::NotRequested.as_str(),
                    reason = ?reason,
                    "Invoice left untouched"
                );
                AUTHORIZATIONS_TOTAL.with_label_values(&["skipped"]).inc();
            }
            Ok(outcome) => {
                AUTHORIZATIONS_TOTAL
                    .with_label_values(&[outcome.metric_label()])
                    .inc();
            }
            Err(err) => {
                AUTHORIZATIONS_TOTAL.with_label_values(&["failed"]).inc();
                ERRORS_TOTAL.with_label_values(&[err.kind()]).inc();
                let trace = err.trace();
                warn!(
                    invoice_id = %invoice.invoice_id,
                    number = %invoice.display_number(),
                    state = AuthorizationState::Rejected.as_str(),
                    error_type = err.kind(),
                    retryable = err.is_retryable(),
                    request = trace.and_then(|t| t.request.as_deref()).unwrap_or_default(),
                    response = trace.and_then(|t| t.response.as_deref()).unwrap_or_default(),
                    "{}",
                    err
                );
            }
        }
        result
    }

    async fn run(&self, invoice: &Invoice) -> Result<AuthorizationOutcome, AuthorizationError> {
        if !invoice.is_customer_document() {
            return Ok(AuthorizationOutcome::Skipped(SkipReason::NotCustomerDocument));
        }
        let Some(service) = invoice.journal.fiscal_service else {
            return Ok(AuthorizationOutcome::Skipped(SkipReason::NoFiscalService));
        };
        if self.already_authorized(invoice).await? {
            debug!(invoice_id = %invoice.invoice_id, "Invoice already has an authorization code");
            return Ok(AuthorizationOutcome::Skipped(SkipReason::AlreadyAuthorized));
        }

        if validation_type(invoice, self.certificates.as_ref()).is_none() {
            return self.validate_locally(invoice).await;
        }

        debug!(
            invoice_id = %invoice.invoice_id,
            state = AuthorizationState::Requested.as_str(),
            service = %service,
            "Requesting authorization"
        );

        let amounts = calculate(invoice)?;
        let request = mapper_for(service).map(invoice, &amounts)?;

        let client = self.client_for(service).await?;
        client.ensure_next_in_sequence(&request).await?;

        let record = interpret(client.submit(&request).await).into_record()?;
        self.store.commit(invoice.invoice_id, &record).await?;

        info!(
            invoice_id = %invoice.invoice_id,
            number = %invoice.display_number(),
            state = AuthorizationState::Authorized.as_str(),
            auth_code = %record.auth_code,
            result = %record.result,
            "CAE obtained"
        );
        Ok(AuthorizationOutcome::Authorized(record))
    }

    async fn already_authorized(&self, invoice: &Invoice) -> Result<bool, AuthorizationError> {
        if invoice.auth_code().is_some() {
            return Ok(true);
        }
        let stored = self.store.find(invoice.invoice_id).await?;
        Ok(stored.is_some_and(|record| !record.auth_code.is_empty()))
    }

    /// Homologation shortcut: fixed placeholder, no network.
    async fn validate_locally(
        &self,
        invoice: &Invoice,
    ) -> Result<AuthorizationOutcome, AuthorizationError> {
        let record = AuthorizationRecord {
            auth_mode: AuthMode::Cae,
            auth_code: PLACEHOLDER_AUTH_CODE.to_string(),
            auth_code_due_date: Some(invoice.issue_date),
            result: String::new(),
            message: LOCAL_ONLY_MESSAGE.to_string(),
            request_trace: None,
            response_trace: None,
        };
        self.store.commit(invoice.invoice_id, &record).await?;

        warn!(
            invoice_id = %invoice.invoice_id,
            number = %invoice.display_number(),
            validation = "local_only",
            "{}",
            LOCAL_ONLY_MESSAGE
        );
        Ok(AuthorizationOutcome::LocallyValidated(record))
    }

    /// Authorize invoices one after another; a failure only affects its invoice.
    pub async fn authorize_batch(&self, invoices: &[Invoice]) -> BatchReport {
        let mut report = BatchReport::default();
        for invoice in invoices {
            let result = self.authorize(invoice).await;
            report.results.push((invoice.invoice_id, result));
        }

        info!(
            total = invoices.len(),
            authorized = report.authorized_count(),
            local_only = report.locally_validated_count(),
            skipped = report.skipped_count(),
            failed = report.failed_count(),
            "Batch processed"
        );
        report
    }
}
