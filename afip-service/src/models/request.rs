//! Service-specific payload handed to the transport.

use chrono::NaiveDate;
use serde::Serialize;
use std::collections::BTreeMap;

use super::FiscalService;

/// A single wire value. Amounts are already fixed-point strings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum FieldValue {
    Text(String),
    Integer(i64),
    Amount(String),
    /// Native date, kept by the legacy service only.
    Date(NaiveDate),
}

impl FieldValue {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            FieldValue::Text(s) | FieldValue::Amount(s) => Some(s),
            _ => None,
        }
    }
}

/// One VAT aliquot subtotal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VatLine {
    #[serde(rename = "Id")]
    pub id: u8,
    #[serde(rename = "BaseImp")]
    pub base: String,
    #[serde(rename = "Importe")]
    pub amount: String,
}

/// One non-VAT tribute subtotal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TributeLine {
    #[serde(rename = "Id")]
    pub id: u16,
    #[serde(rename = "Desc")]
    pub description: String,
    #[serde(rename = "BaseImp")]
    pub base: String,
    #[serde(rename = "Alic")]
    pub rate: String,
    #[serde(rename = "Importe")]
    pub amount: String,
}

/// Reference to the voucher a note corrects.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AssociatedVoucher {
    #[serde(rename = "Tipo")]
    pub document_type: u16,
    #[serde(rename = "PtoVta")]
    pub point_of_sale: u32,
    #[serde(rename = "Nro")]
    pub number: u64,
    #[serde(rename = "Cuit", skip_serializing_if = "Option::is_none")]
    pub issuer_cuit: Option<String>,
    #[serde(rename = "CbteFch", skip_serializing_if = "Option::is_none")]
    pub issue_date: Option<FieldValue>,
}

/// Optional-data entry ("Opcionales").
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OptionalField {
    #[serde(rename = "Id")]
    pub id: String,
    #[serde(rename = "Valor")]
    pub value: String,
}

/// Data attached to the draft after creation: aliquots, tributes, related vouchers.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AdditionalInfo {
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub vat_lines: Vec<VatLine>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tributes: Vec<TributeLine>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub associated_vouchers: Vec<AssociatedVoucher>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub optionals: Vec<OptionalField>,
}

/// Fully mapped request. Carries no business logic past construction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AuthorizationRequest {
    pub service: FiscalService,
    pub point_of_sale: u32,
    pub document_type: u16,
    pub invoice_number: u64,
    pub fields: BTreeMap<&'static str, FieldValue>,
    pub additional: AdditionalInfo,
}

impl AuthorizationRequest {
    pub fn field(&self, name: &str) -> Option<&FieldValue> {
        self.fields.get(name)
    }

    pub fn has_field(&self, name: &str) -> bool {
        self.fields.contains_key(name)
    }
}
