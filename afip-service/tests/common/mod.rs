#![allow(dead_code)]

use afip_service::models::{
    Buyer, Concept, Currency, DocumentLetter, DocumentType, EnvironmentKind, FiscalService,
    InternalType, Invoice, Journal, MoveType, TaxKind, TaxLine,
};
use afip_service::services::orchestrator::AuthorizationOrchestrator;
use afip_service::services::providers::certificates::StaticCertificates;
use afip_service::services::providers::mock::{MockConnector, MockFiscalWebService};
use afip_service::services::InMemoryAuthorizationStore;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use service_core::retry::RetryConfig;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

pub const TEST_ISSUER_CUIT: &str = "30700000007";
pub const TEST_POINT_OF_SALE: u32 = 5;

pub fn dec(s: &str) -> Decimal {
    Decimal::from_str(s).expect("Invalid decimal literal")
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).expect("Invalid date")
}

/// Factura B, 21% VAT, goods, on a wsfe journal.
pub fn invoice(number: u64) -> Invoice {
    Invoice {
        invoice_id: Uuid::new_v4(),
        move_type: MoveType::CustomerInvoice,
        journal: Journal {
            name: "Ventas electrónicas".to_string(),
            fiscal_service: Some(FiscalService::Wsfe),
        },
        document_type: DocumentType {
            code: 6,
            letter: DocumentLetter::B,
            internal_type: InternalType::Invoice,
        },
        point_of_sale: TEST_POINT_OF_SALE,
        document_number: number,
        concept: Concept::Goods,
        issue_date: date(2024, 5, 10),
        due_date: Some(date(2024, 6, 9)),
        service_start: None,
        service_end: None,
        currency: Currency {
            afip_code: "PES".to_string(),
            rate: Decimal::ONE,
        },
        amount_untaxed: dec("2500.00"),
        amount_total: dec("3025.00"),
        tax_lines: vec![TaxLine {
            kind: TaxKind::Vat { vat_code: 5 },
            description: "IVA 21%".to_string(),
            base: dec("2500.00"),
            amount: dec("525.00"),
            rate: None,
        }],
        reversed_entry: None,
        debit_origin: None,
        buyer: Buyer {
            name: "Consumidor Final".to_string(),
            identification_type: Some(96),
            identification_number: Some("28.123.456".to_string()),
            ..Default::default()
        },
        incoterm: None,
        payment_terms: None,
        narration: None,
        fce_is_cancellation: false,
        authorization: None,
    }
}

pub struct TestPipeline {
    pub service: Arc<MockFiscalWebService>,
    pub connector: Arc<MockConnector>,
    pub store: Arc<InMemoryAuthorizationStore>,
    pub orchestrator: AuthorizationOrchestrator,
}

impl TestPipeline {
    /// Production environment with valid certificates.
    pub fn production(last_number: u64) -> Self {
        Self::build(
            MockFiscalWebService::new(FiscalService::Wsfe, last_number),
            EnvironmentKind::Production,
            true,
        )
    }

    /// Homologation environment without certificates.
    pub fn homologation_without_certificates() -> Self {
        Self::build(
            MockFiscalWebService::new(FiscalService::Wsfe, 0),
            EnvironmentKind::Homologation,
            false,
        )
    }

    pub fn build(service: MockFiscalWebService, environment: EnvironmentKind, valid: bool) -> Self {
        let service = Arc::new(service);
        let connector = Arc::new(MockConnector::new(service.clone()));
        let store = Arc::new(InMemoryAuthorizationStore::new());
        let orchestrator = AuthorizationOrchestrator::new(
            connector.clone(),
            Arc::new(StaticCertificates { environment, valid }),
            store.clone(),
        )
        .with_request_timeout(Duration::from_millis(200))
        .with_retry(RetryConfig {
            initial_backoff: Duration::from_millis(1),
            max_backoff: Duration::from_millis(2),
            add_jitter: false,
            ..RetryConfig::quick()
        });

        Self {
            service,
            connector,
            store,
            orchestrator,
        }
    }
}
