//! Authorization client: number queries and submission against one service.

use service_core::retry::{retry_call, RetryConfig};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, instrument};

use super::metrics::REMOTE_CALL_DURATION;
use super::providers::{FiscalWebService, RawResponse, ServiceFault};
use crate::error::AuthorizationError;
use crate::models::{AuditTrace, AuthorizationRequest, FiscalService};

pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

impl From<ServiceFault> for AuthorizationError {
    fn from(fault: ServiceFault) -> Self {
        AuthorizationError::Transport {
            message: fault.message,
            trace: fault.trace,
        }
    }
}

pub struct AuthorizationClient {
    service: Arc<dyn FiscalWebService>,
    request_timeout: Duration,
    retry: RetryConfig,
}

impl AuthorizationClient {
    pub fn new(service: Arc<dyn FiscalWebService>) -> Self {
        Self {
            service,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            retry: RetryConfig::quick(),
        }
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Retry policy for the number query. Submissions are never retried.
    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    pub fn fiscal_service(&self) -> FiscalService {
        self.service.service()
    }

    async fn last_authorized_number(
        &self,
        point_of_sale: u32,
        document_type: u16,
    ) -> Result<u64, AuthorizationError> {
        let _timer = REMOTE_CALL_DURATION
            .with_label_values(&["last_authorized_number"])
            .start_timer();

        let last = retry_call(&self.retry, "last_authorized_number", move || async move {
            match tokio::time::timeout(
                self.request_timeout,
                self.service.last_authorized_number(point_of_sale, document_type),
            )
            .await
            {
                Ok(result) => result,
                Err(_) => Err(ServiceFault::transient(
                    format!(
                        "No answer to the number query within {}s",
                        self.request_timeout.as_secs()
                    ),
                    AuditTrace::default(),
                )),
            }
        })
        .await?;
        Ok(last)
    }

    /// Number the authority expects next for this point of sale and document type.
    pub async fn next_invoice_number(
        &self,
        point_of_sale: u32,
        document_type: u16,
    ) -> Result<u64, AuthorizationError> {
        let last = self.last_authorized_number(point_of_sale, document_type).await?;
        last.checked_add(1).ok_or_else(|| AuthorizationError::Transport {
            message: format!("AFIP reported an out-of-range last authorized number {}", last),
            trace: AuditTrace::default(),
        })
    }

    /// Fails with `SequenceMismatch` unless the request targets the next number.
    #[instrument(
        skip(self, request),
        fields(
            point_of_sale = request.point_of_sale,
            document_type = request.document_type,
            invoice_number = request.invoice_number,
        )
    )]
    pub async fn ensure_next_in_sequence(
        &self,
        request: &AuthorizationRequest,
    ) -> Result<(), AuthorizationError> {
        let expected = self
            .next_invoice_number(request.point_of_sale, request.document_type)
            .await?;
        if expected != request.invoice_number {
            return Err(AuthorizationError::SequenceMismatch {
                expected,
                requested: request.invoice_number,
            });
        }
        Ok(())
    }

    /// Submit once and wait for a definitive answer or the timeout.
    #[instrument(
        skip(self, request),
        fields(
            service = %request.service,
            point_of_sale = request.point_of_sale,
            document_type = request.document_type,
            invoice_number = request.invoice_number,
        )
    )]
    pub async fn submit(&self, request: &AuthorizationRequest) -> Result<RawResponse, ServiceFault> {
        let _timer = REMOTE_CALL_DURATION
            .with_label_values(&["submit"])
            .start_timer();

        match tokio::time::timeout(self.request_timeout, self.service.submit(request)).await {
            Ok(result) => {
                if result.is_ok() {
                    info!("AFIP answered the authorization request");
                }
                result
            }
            Err(_) => Err(ServiceFault::transient(
                format!(
                    "No answer from AFIP within {}s",
                    self.request_timeout.as_secs()
                ),
                AuditTrace::new(serde_json::to_string(request).ok(), None),
            )),
        }
    }
}
