//! QR payload printed on authorized invoices.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use chrono::NaiveDate;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::Serialize;

use crate::models::{AuthMode, Invoice};

pub const QR_URL_PREFIX: &str = "https://www.afip.gob.ar/fe/qr/?p=";

const QR_VERSION: u8 = 1;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QrPayload {
    pub ver: u8,
    pub fecha: NaiveDate,
    pub cuit: u64,
    pub pto_vta: u32,
    pub tipo_cmp: u16,
    pub nro_cmp: u64,
    pub importe: f64,
    pub moneda: String,
    pub ctz: f64,
    /// "E" for CAE, "A" for CAEA.
    pub tipo_cod_aut: &'static str,
    pub cod_aut: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tipo_doc_rec: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nro_doc_rec: Option<u64>,
}

fn two_decimals(value: Decimal) -> Option<f64> {
    value
        .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
        .to_f64()
}

/// Payload for an invoice holding a CAE or CAEA; `None` otherwise.
pub fn payload(invoice: &Invoice, issuer_cuit: &str) -> Option<QrPayload> {
    let record = invoice.authorization.as_ref()?;
    let tipo_cod_aut = match record.auth_mode {
        AuthMode::Cae => "E",
        AuthMode::Caea => "A",
        AuthMode::Cai => return None,
    };
    if record.auth_code.is_empty() {
        return None;
    }

    // Buyer fields are optional: a foreign or non-numeric id only drops them.
    let buyer = &invoice.buyer;
    let buyer_document = match (buyer.identification_type, buyer.identification_digits()) {
        (Some(kind), Some(digits)) => digits.parse::<u64>().ok().map(|number| (kind, number)),
        _ => None,
    };

    Some(QrPayload {
        ver: QR_VERSION,
        fecha: invoice.issue_date,
        cuit: issuer_cuit.replace(['-', '.'], "").parse().ok()?,
        pto_vta: invoice.point_of_sale,
        tipo_cmp: invoice.document_type.code,
        nro_cmp: invoice.document_number,
        importe: two_decimals(invoice.amount_total)?,
        moneda: invoice.currency.afip_code.clone(),
        ctz: two_decimals(invoice.currency.rate)?,
        tipo_cod_aut,
        cod_aut: record.auth_code.trim().parse().ok()?,
        tipo_doc_rec: buyer_document.as_ref().map(|(kind, _)| *kind),
        nro_doc_rec: buyer_document.map(|(_, number)| number),
    })
}

/// QR URL for the invoice, if it can carry one.
pub fn qr_url(invoice: &Invoice, issuer_cuit: &str) -> Option<String> {
    if invoice.auth_code().is_none() {
        return None;
    }
    let Some(payload) = payload(invoice, issuer_cuit) else {
        tracing::warn!(
            invoice_id = %invoice.invoice_id,
            "Authorization data cannot be encoded into a QR payload"
        );
        return None;
    };
    let json = serde_json::to_vec(&payload).ok()?;
    Some(format!("{}{}", QR_URL_PREFIX, STANDARD.encode(json)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AuthorizationRecord, FiscalService};
    use crate::services::mapper::test_support::invoice_a;

    fn authorized(mode: AuthMode, code: &str) -> Invoice {
        let mut invoice = invoice_a(FiscalService::Wsfe);
        invoice.authorization = Some(AuthorizationRecord {
            auth_mode: mode,
            auth_code: code.to_string(),
            auth_code_due_date: None,
            result: "A".to_string(),
            message: String::new(),
            request_trace: None,
            response_trace: None,
        });
        invoice
    }

    fn decode(url: &str) -> serde_json::Value {
        let data = url.strip_prefix(QR_URL_PREFIX).unwrap();
        serde_json::from_slice(&STANDARD.decode(data).unwrap()).unwrap()
    }

    #[test]
    fn test_cae_invoice_payload() {
        let url = qr_url(&authorized(AuthMode::Cae, "74123456789012"), "30-70000000-7").unwrap();
        assert!(!url.contains('\n'));

        let json = decode(&url);
        assert_eq!(json["ver"], 1);
        assert_eq!(json["fecha"], "2024-03-15");
        assert_eq!(json["cuit"], 30700000007u64);
        assert_eq!(json["ptoVta"], 3);
        assert_eq!(json["tipoCmp"], 1);
        assert_eq!(json["nroCmp"], 42);
        assert_eq!(json["importe"], 1210.0);
        assert_eq!(json["moneda"], "PES");
        assert_eq!(json["ctz"], 1.0);
        assert_eq!(json["tipoCodAut"], "E");
        assert_eq!(json["codAut"], 74123456789012u64);
        assert_eq!(json["tipoDocRec"], 80);
        assert_eq!(json["nroDocRec"], 30712345679u64);
    }

    #[test]
    fn test_caea_uses_its_own_code_type() {
        let payload = payload(&authorized(AuthMode::Caea, "31234567890123"), "30700000007").unwrap();
        assert_eq!(payload.tipo_cod_aut, "A");
    }

    #[test]
    fn test_buyer_fields_omitted_without_identification() {
        let mut invoice = authorized(AuthMode::Cae, "74123456789012");
        invoice.buyer.identification_number = None;

        let json = decode(&qr_url(&invoice, "30700000007").unwrap());
        assert!(json.get("tipoDocRec").is_none());
        assert!(json.get("nroDocRec").is_none());
    }

    #[test]
    fn test_non_numeric_buyer_id_keeps_qr_without_buyer_fields() {
        let mut invoice = authorized(AuthMode::Cae, "74123456789012");
        invoice.buyer.identification_type = Some(80);
        invoice.buyer.identification_number = Some("BR-12.345.678/0001-90".to_string());

        let url = qr_url(&invoice, "30700000007").unwrap();
        let json = decode(&url);
        assert_eq!(json["codAut"], 74123456789012u64);
        assert!(json.get("tipoDocRec").is_none());
        assert!(json.get("nroDocRec").is_none());
    }

    #[test]
    fn test_no_qr_without_code_or_for_cai() {
        let pending = invoice_a(FiscalService::Wsfe);
        assert!(qr_url(&pending, "30700000007").is_none());
        assert!(qr_url(&authorized(AuthMode::Cai, "12345678901234"), "30700000007").is_none());
    }
}
