//! AFIP authorization batch entry point.
//!
//! Usage: `afip-service <invoices.json>`

use afip_service::config::AfipConfig;
use afip_service::models::Invoice;
use afip_service::services::orchestrator::AuthorizationOrchestrator;
use afip_service::services::providers::certificates::ConfiguredCertificates;
use afip_service::services::providers::http::HttpConnector;
use afip_service::services::{get_metrics, init_metrics, qr, InMemoryAuthorizationStore};

use serde::Serialize;
use service_core::observability::init_tracing;
use std::sync::Arc;

#[derive(Serialize)]
struct CommittedRecord<'a> {
    invoice_id: uuid::Uuid,
    number: String,
    record: &'a afip_service::models::AuthorizationRecord,
    qr_url: Option<String>,
}

fn config_error(e: impl std::fmt::Display) -> std::io::Error {
    eprintln!("Failed to load configuration: {}", e);
    std::io::Error::other(format!("Configuration error: {}", e))
}

#[tokio::main]
async fn main() -> std::io::Result<()> {
    let config = AfipConfig::load().map_err(config_error)?;

    init_tracing(&config.common.service_name, &config.common.log_level);

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        environment = config.environment.as_str(),
        base_url = %config.base_url(),
        "Starting afip-service"
    );

    init_metrics();

    let path = std::env::args().nth(1).ok_or_else(|| {
        std::io::Error::new(
            std::io::ErrorKind::InvalidInput,
            "usage: afip-service <invoices.json>",
        )
    })?;
    let raw = tokio::fs::read_to_string(&path).await?;
    let mut invoices: Vec<Invoice> = serde_json::from_str(&raw)
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;

    tracing::info!(path = %path, count = invoices.len(), "Loaded invoices");

    let connector = HttpConnector::from_config(&config).map_err(std::io::Error::other)?;
    let orchestrator = AuthorizationOrchestrator::new(
        Arc::new(connector),
        Arc::new(ConfiguredCertificates::from_config(&config)),
        Arc::new(InMemoryAuthorizationStore::new()),
    )
    .with_request_timeout(config.request_timeout());

    let report = orchestrator.authorize_batch(&invoices).await;

    for (invoice_id, record) in report.records() {
        if let Some(invoice) = invoices.iter_mut().find(|i| i.invoice_id == invoice_id) {
            invoice.authorization = Some(record.clone());
        }
    }

    let committed: Vec<CommittedRecord<'_>> = report
        .records()
        .filter_map(|(invoice_id, record)| {
            let invoice = invoices.iter().find(|i| i.invoice_id == invoice_id)?;
            Some(CommittedRecord {
                invoice_id,
                number: invoice.display_number(),
                record,
                qr_url: qr::qr_url(invoice, &config.issuer.cuit),
            })
        })
        .collect();

    let output = serde_json::to_string_pretty(&committed).map_err(std::io::Error::other)?;
    println!("{}", output);

    for (invoice_id, result) in &report.results {
        if let Err(e) = result {
            eprintln!("{}: {}", invoice_id, e);
        }
    }

    if let Some(metrics_path) = &config.metrics_path {
        tokio::fs::write(metrics_path, get_metrics()).await?;
        tracing::info!(path = %metrics_path.display(), "Metrics written");
    }

    tracing::info!(
        authorized = report.authorized_count(),
        local_only = report.locally_validated_count(),
        skipped = report.skipped_count(),
        failed = report.failed_count(),
        "afip-service finished"
    );

    Ok(())
}
