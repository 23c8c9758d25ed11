//! Scripted fiscal web service for testing.

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use super::{Connector, FiscalWebService, RawResponse, ServiceFault};
use crate::models::{AuditTrace, AuthorizationRequest, FiscalService, Observation};

/// Approval the way wsfe reports it.
pub fn approved(code: &str, expiry: &str) -> RawResponse {
    RawResponse {
        auth_code: Some(code.to_string()),
        result: Some("A".to_string()),
        fch_venc_cae: Some(expiry.to_string()),
        trace: mock_trace(),
        ..Default::default()
    }
}

pub fn rejected(observations: Vec<Observation>) -> RawResponse {
    RawResponse {
        result: Some("R".to_string()),
        observations,
        trace: mock_trace(),
        ..Default::default()
    }
}

fn mock_trace() -> AuditTrace {
    AuditTrace::new(
        Some("{\"mock\":\"request\"}".to_string()),
        Some("{\"mock\":\"response\"}".to_string()),
    )
}

/// Mock service that keeps its own authorized-number ledger.
///
/// Each submission pops the next scripted response; once the script runs out
/// every submission is approved. Approvals advance the ledger.
pub struct MockFiscalWebService {
    service: FiscalService,
    last_number: AtomicU64,
    responses: Mutex<VecDeque<Result<RawResponse, ServiceFault>>>,
    query_faults: Mutex<VecDeque<ServiceFault>>,
    delay: Option<Duration>,
    queries: AtomicUsize,
    submissions: AtomicUsize,
    submitted: Mutex<Vec<AuthorizationRequest>>,
}

impl MockFiscalWebService {
    pub fn new(service: FiscalService, last_number: u64) -> Self {
        Self {
            service,
            last_number: AtomicU64::new(last_number),
            responses: Mutex::new(VecDeque::new()),
            query_faults: Mutex::new(VecDeque::new()),
            delay: None,
            queries: AtomicUsize::new(0),
            submissions: AtomicUsize::new(0),
            submitted: Mutex::new(Vec::new()),
        }
    }

    /// Every submission waits this long before answering.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn push_response(&self, response: Result<RawResponse, ServiceFault>) {
        if let Ok(mut responses) = self.responses.lock() {
            responses.push_back(response);
        }
    }

    /// Fail the next number query with this fault.
    pub fn push_query_fault(&self, fault: ServiceFault) {
        if let Ok(mut faults) = self.query_faults.lock() {
            faults.push_back(fault);
        }
    }

    pub fn query_count(&self) -> usize {
        self.queries.load(Ordering::SeqCst)
    }

    pub fn submission_count(&self) -> usize {
        self.submissions.load(Ordering::SeqCst)
    }

    pub fn last_number(&self) -> u64 {
        self.last_number.load(Ordering::SeqCst)
    }

    pub fn submitted(&self) -> Vec<AuthorizationRequest> {
        self.submitted
            .lock()
            .map(|requests| requests.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl FiscalWebService for MockFiscalWebService {
    fn service(&self) -> FiscalService {
        self.service
    }

    async fn last_authorized_number(
        &self,
        _point_of_sale: u32,
        _document_type: u16,
    ) -> Result<u64, ServiceFault> {
        self.queries.fetch_add(1, Ordering::SeqCst);
        let fault = self.query_faults.lock().ok().and_then(|mut f| f.pop_front());
        match fault {
            Some(fault) => Err(fault),
            None => Ok(self.last_number()),
        }
    }

    async fn submit(&self, request: &AuthorizationRequest) -> Result<RawResponse, ServiceFault> {
        self.submissions.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut submitted) = self.submitted.lock() {
            submitted.push(request.clone());
        }

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        let scripted = self.responses.lock().ok().and_then(|mut r| r.pop_front());
        let response = scripted.unwrap_or_else(|| {
            Ok(approved(
                &format!("{:014}", 74_000_000_000_000u64 + request.invoice_number),
                "20991231",
            ))
        });

        if let Ok(raw) = &response {
            if raw.result.as_deref() == Some("A") && raw.auth_code.as_deref().is_some_and(|c| !c.is_empty()) {
                self.last_number.store(request.invoice_number, Ordering::SeqCst);
            }
        }
        response
    }
}

/// Hands out the same mock service for every fiscal service.
pub struct MockConnector {
    service: Arc<MockFiscalWebService>,
    connects: AtomicUsize,
}

impl MockConnector {
    pub fn new(service: Arc<MockFiscalWebService>) -> Self {
        Self {
            service,
            connects: AtomicUsize::new(0),
        }
    }

    pub fn connect_count(&self) -> usize {
        self.connects.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Connector for MockConnector {
    async fn connect(
        &self,
        _service: FiscalService,
    ) -> Result<Arc<dyn FiscalWebService>, ServiceFault> {
        self.connects.fetch_add(1, Ordering::SeqCst);
        Ok(self.service.clone())
    }
}
