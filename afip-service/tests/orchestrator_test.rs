//! Authorization pipeline integration tests for afip-service.

mod common;

use afip_service::error::AuthorizationError;
use afip_service::models::{
    AuditTrace, AuthMode, AuthorizationRecord, DocumentLetter, DocumentType, EnvironmentKind,
    FiscalService, InternalType, Observation, EXPORT_INVOICE_CODE,
};
use afip_service::services::orchestrator::{
    AuthorizationOutcome, SkipReason, LOCAL_ONLY_MESSAGE, PLACEHOLDER_AUTH_CODE,
};
use afip_service::services::providers::mock::{approved, rejected, MockFiscalWebService};
use afip_service::services::providers::ServiceFault;
use afip_service::services::AuthorizationStore;
use common::{date, dec, invoice, TestPipeline};
use std::time::Duration;

#[tokio::test]
async fn authorized_invoice_commits_record_with_trace() {
    let pipeline = TestPipeline::production(41);
    pipeline
        .service
        .push_response(Ok(approved("74190123456789", "20240520")));
    let inv = invoice(42);

    let outcome = pipeline
        .orchestrator
        .authorize(&inv)
        .await
        .expect("Authorization failed");

    let record = match outcome {
        AuthorizationOutcome::Authorized(record) => record,
        other => panic!("Expected an authorized outcome, got {:?}", other),
    };
    assert_eq!(record.auth_mode, AuthMode::Cae);
    assert_eq!(record.auth_code, "74190123456789");
    assert_eq!(record.auth_code_due_date, Some(date(2024, 5, 20)));
    assert_eq!(record.result, "A");
    assert!(record.request_trace.is_some());
    assert!(record.response_trace.is_some());

    let stored = pipeline
        .store
        .find(inv.invoice_id)
        .await
        .expect("Store lookup failed")
        .expect("Record was not committed");
    assert_eq!(stored, record);
}

#[tokio::test]
async fn submitted_request_carries_mapped_fields() {
    let pipeline = TestPipeline::production(41);
    pipeline
        .orchestrator
        .authorize(&invoice(42))
        .await
        .expect("Authorization failed");

    let submitted = pipeline.service.submitted();
    assert_eq!(submitted.len(), 1);
    let request = &submitted[0];
    assert_eq!(request.invoice_number, 42);
    assert_eq!(
        request.field("ImpTotal").and_then(|v| v.as_text()),
        Some("3025.00")
    );
    assert_eq!(
        request.field("CbteFch").and_then(|v| v.as_text()),
        Some("20240510")
    );
    assert!(!request.has_field("FchVtoPago"));
}

#[tokio::test]
async fn invoice_with_existing_code_is_not_mapped_or_sent() {
    let pipeline = TestPipeline::production(41);
    let mut inv = invoice(42);
    // Totals that would fail reconciliation prove nothing is calculated.
    inv.amount_total = dec("1.00");
    inv.authorization = Some(AuthorizationRecord {
        auth_mode: AuthMode::Cae,
        auth_code: "74190123456789".to_string(),
        auth_code_due_date: Some(date(2024, 5, 20)),
        result: "A".to_string(),
        message: String::new(),
        request_trace: None,
        response_trace: None,
    });

    let outcome = pipeline
        .orchestrator
        .authorize(&inv)
        .await
        .expect("Skip should not fail");

    assert_eq!(
        outcome,
        AuthorizationOutcome::Skipped(SkipReason::AlreadyAuthorized)
    );
    assert_eq!(pipeline.connector.connect_count(), 0);
    assert_eq!(pipeline.service.query_count(), 0);
    assert_eq!(pipeline.service.submission_count(), 0);
}

#[tokio::test]
async fn homologation_without_certificate_validates_locally() {
    let pipeline = TestPipeline::homologation_without_certificates();
    let inv = invoice(42);

    let outcome = pipeline
        .orchestrator
        .authorize(&inv)
        .await
        .expect("Local validation failed");

    let record = match outcome {
        AuthorizationOutcome::LocallyValidated(record) => record,
        other => panic!("Expected local validation, got {:?}", other),
    };
    assert_eq!(record.auth_mode, AuthMode::Cae);
    assert_eq!(record.auth_code, PLACEHOLDER_AUTH_CODE);
    assert_eq!(record.auth_code_due_date, Some(inv.issue_date));
    assert_eq!(record.result, "");
    assert_eq!(record.message, LOCAL_ONLY_MESSAGE);
    assert!(record.request_trace.is_none());

    assert_eq!(pipeline.connector.connect_count(), 0);
    assert_eq!(pipeline.store.commit_count(), 1);
}

#[tokio::test]
async fn sequence_mismatch_aborts_before_submission() {
    let pipeline = TestPipeline::production(10);

    let err = pipeline
        .orchestrator
        .authorize(&invoice(42))
        .await
        .expect_err("Out of sequence invoice must fail");

    assert!(matches!(
        err,
        AuthorizationError::SequenceMismatch {
            expected: 11,
            requested: 42
        }
    ));
    assert_eq!(
        err.to_string(),
        "Check document number. Next is 11, invoice has 42"
    );
    assert_eq!(pipeline.service.query_count(), 1);
    assert_eq!(pipeline.service.submission_count(), 0);
    assert_eq!(pipeline.store.commit_count(), 0);
}

#[tokio::test]
async fn unreconciled_amounts_fail_before_any_network_call() {
    let pipeline = TestPipeline::production(41);
    let mut inv = invoice(42);
    inv.amount_total = dec("3030.00");

    let err = pipeline
        .orchestrator
        .authorize(&inv)
        .await
        .expect_err("Unreconciled totals must fail");

    assert!(matches!(err, AuthorizationError::InvalidAmount(_)));
    assert_eq!(pipeline.connector.connect_count(), 0);
    assert_eq!(pipeline.service.query_count(), 0);
}

#[tokio::test]
async fn approval_without_code_is_not_persisted() {
    let pipeline = TestPipeline::production(41);
    pipeline.service.push_response(Ok(approved("", "20240520")));
    let inv = invoice(42);

    let err = pipeline
        .orchestrator
        .authorize(&inv)
        .await
        .expect_err("Approval without code must fail");

    assert!(matches!(err, AuthorizationError::ObservedWithoutCode { .. }));
    assert!(err.trace().is_some());
    assert_eq!(pipeline.store.commit_count(), 0);
    assert!(pipeline
        .store
        .find(inv.invoice_id)
        .await
        .expect("Store lookup failed")
        .is_none());
}

#[tokio::test]
async fn rejection_surfaces_authority_message() {
    let pipeline = TestPipeline::production(41);
    pipeline.service.push_response(Ok(rejected(vec![Observation {
        code: 10015,
        message: "DocNro invalido".to_string(),
    }])));

    let err = pipeline
        .orchestrator
        .authorize(&invoice(42))
        .await
        .expect_err("Rejected invoice must fail");

    assert_eq!(err.to_string(), "AFIP Validation Error. 10015: DocNro invalido");
    let AuthorizationError::Rejected { observations, .. } = &err else {
        panic!("Expected a rejection, got {:?}", err);
    };
    assert_eq!(observations.len(), 1);
    assert!(!err.is_retryable());
}

#[tokio::test]
async fn rejected_invoice_can_be_rerun_after_correction() {
    let pipeline = TestPipeline::production(41);
    pipeline
        .service
        .push_response(Ok(rejected(vec![Observation {
            code: 10016,
            message: "CbteFch fuera de rango".to_string(),
        }])));
    let inv = invoice(42);

    assert!(pipeline.orchestrator.authorize(&inv).await.is_err());
    let outcome = pipeline
        .orchestrator
        .authorize(&inv)
        .await
        .expect("Second attempt failed");

    assert!(matches!(outcome, AuthorizationOutcome::Authorized(_)));
    assert_eq!(pipeline.service.submission_count(), 2);
}

#[tokio::test]
async fn batch_isolates_failures() {
    let pipeline = TestPipeline::production(41);
    let mut vendor_bill = invoice(99);
    vendor_bill.move_type = afip_service::models::MoveType::VendorBill;
    let mut broken = invoice(43);
    broken.amount_total = dec("1.00");

    let invoices = vec![invoice(42), broken, vendor_bill, invoice(43)];
    let report = pipeline.orchestrator.authorize_batch(&invoices).await;

    assert_eq!(report.results.len(), 4);
    assert_eq!(report.authorized_count(), 2);
    assert_eq!(report.failed_count(), 1);
    assert_eq!(report.skipped_count(), 1);
    assert_eq!(report.records().count(), 2);
    assert!(matches!(
        report.results[1].1,
        Err(AuthorizationError::InvalidAmount(_))
    ));
    assert_eq!(pipeline.service.last_number(), 43);
}

#[tokio::test]
async fn transport_failure_writes_nothing_and_can_be_rerun() {
    let pipeline = TestPipeline::production(41);
    pipeline.service.push_response(Err(ServiceFault::transient(
        "Could not connect to AFIP: connection refused",
        AuditTrace::new(Some("{\"CbteDesde\":42}".to_string()), None),
    )));
    let inv = invoice(42);

    let err = pipeline
        .orchestrator
        .authorize(&inv)
        .await
        .expect_err("Transport failure must fail");

    assert!(matches!(err, AuthorizationError::Transport { .. }));
    assert!(err.is_retryable());
    assert!(err.trace().is_some());
    assert_eq!(pipeline.store.commit_count(), 0);
    assert!(pipeline
        .store
        .find(inv.invoice_id)
        .await
        .expect("Store lookup failed")
        .is_none());
    assert_eq!(pipeline.service.last_number(), 41);

    let outcome = pipeline
        .orchestrator
        .authorize(&inv)
        .await
        .expect("Re-run failed");
    assert!(matches!(outcome, AuthorizationOutcome::Authorized(_)));
    assert_eq!(pipeline.store.commit_count(), 1);
}

#[tokio::test]
async fn submission_timeout_is_a_transport_error_without_record() {
    let pipeline = TestPipeline::build(
        MockFiscalWebService::new(FiscalService::Wsfe, 41).with_delay(Duration::from_secs(1)),
        EnvironmentKind::Production,
        true,
    );
    let inv = invoice(42);

    let err = pipeline
        .orchestrator
        .authorize(&inv)
        .await
        .expect_err("Slow submission must time out");

    assert!(matches!(err, AuthorizationError::Transport { .. }));
    assert_eq!(pipeline.service.submission_count(), 1);
    assert_eq!(pipeline.store.commit_count(), 0);
}

#[tokio::test]
async fn export_invoice_is_authorized_through_wsfex() {
    let pipeline = TestPipeline::production(41);
    let mut inv = invoice(42);
    inv.journal.fiscal_service = Some(FiscalService::Wsfex);
    inv.document_type = DocumentType {
        code: EXPORT_INVOICE_CODE,
        letter: DocumentLetter::E,
        internal_type: InternalType::Invoice,
    };
    inv.tax_lines.clear();
    inv.amount_untaxed = dec("1000.00");
    inv.amount_total = dec("1000.00");
    inv.buyer.country_code = Some("203".to_string());

    let outcome = pipeline
        .orchestrator
        .authorize(&inv)
        .await
        .expect("Export authorization failed");

    assert!(matches!(outcome, AuthorizationOutcome::Authorized(_)));
    let submitted = pipeline.service.submitted();
    assert_eq!(
        submitted[0].field("Imp_total").and_then(|v| v.as_text()),
        Some("1000.00")
    );
    assert_eq!(
        submitted[0].field("Permiso_existente").and_then(|v| v.as_text()),
        Some("N")
    );
}
