//! Invoice model for afip-service.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{AuthorizationRecord, Concept, DocumentType, FiscalService, InternalType, TaxLine};

/// Accounting move type; only customer documents are authorized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MoveType {
    CustomerInvoice,
    CustomerRefund,
    VendorBill,
    VendorRefund,
}

/// Journal the invoice is posted on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Journal {
    pub name: String,
    /// Web service used for electronic authorization; `None` for manual journals.
    #[serde(default)]
    pub fiscal_service: Option<FiscalService>,
}

impl Journal {
    pub fn uses_electronic_authorization(&self) -> bool {
        self.fiscal_service.is_some()
    }
}

/// Invoice recipient.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Buyer {
    pub name: String,
    /// AFIP identification type code (80 = CUIT, 96 = DNI, 99 = final consumer).
    #[serde(default)]
    pub identification_type: Option<u16>,
    #[serde(default)]
    pub identification_number: Option<String>,
    /// AFIP destination country code, required for exports.
    #[serde(default)]
    pub country_code: Option<String>,
    /// Generic CUIT AFIP assigns to the buyer's country.
    #[serde(default)]
    pub country_cuit: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
}

impl Buyer {
    /// Identification number with separators stripped.
    pub fn identification_digits(&self) -> Option<String> {
        self.identification_number
            .as_deref()
            .map(|n| n.replace(['-', '.'], ""))
            .filter(|n| !n.is_empty())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Currency {
    /// AFIP currency code ("PES", "DOL", ...).
    pub afip_code: String,
    /// Rate to pesos at invoice date.
    pub rate: Decimal,
}

/// The document a credit or debit note corrects.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelatedDocument {
    pub document_type_code: u16,
    pub point_of_sale: u32,
    pub number: u64,
    #[serde(default)]
    pub issuer_cuit: Option<String>,
    #[serde(default)]
    pub issue_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Incoterm {
    pub code: String,
    pub name: String,
}

/// Fiscal view of an invoice awaiting (or holding) authorization.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Invoice {
    pub invoice_id: Uuid,
    pub move_type: MoveType,
    pub journal: Journal,
    pub document_type: DocumentType,
    pub point_of_sale: u32,
    pub document_number: u64,
    pub concept: Concept,
    pub issue_date: NaiveDate,
    #[serde(default)]
    pub due_date: Option<NaiveDate>,
    #[serde(default)]
    pub service_start: Option<NaiveDate>,
    #[serde(default)]
    pub service_end: Option<NaiveDate>,
    pub currency: Currency,
    pub amount_untaxed: Decimal,
    pub amount_total: Decimal,
    #[serde(default)]
    pub tax_lines: Vec<TaxLine>,
    /// Set on credit notes.
    #[serde(default)]
    pub reversed_entry: Option<RelatedDocument>,
    /// Set on debit notes.
    #[serde(default)]
    pub debit_origin: Option<RelatedDocument>,
    pub buyer: Buyer,
    #[serde(default)]
    pub incoterm: Option<Incoterm>,
    #[serde(default)]
    pub payment_terms: Option<String>,
    #[serde(default)]
    pub narration: Option<String>,
    /// FCE notes only: the original document was rejected by the buyer.
    #[serde(default)]
    pub fce_is_cancellation: bool,
    #[serde(default)]
    pub authorization: Option<AuthorizationRecord>,
}

impl Invoice {
    pub fn is_customer_document(&self) -> bool {
        matches!(
            self.move_type,
            MoveType::CustomerInvoice | MoveType::CustomerRefund
        )
    }

    /// Authorization code already obtained for this invoice, if any.
    pub fn auth_code(&self) -> Option<&str> {
        self.authorization
            .as_ref()
            .map(|record| record.auth_code.as_str())
            .filter(|code| !code.is_empty())
    }

    /// Related document reported in the associated-vouchers block: the reversed
    /// entry for credit notes, the debit origin for debit notes, never both.
    pub fn related_document(&self) -> Option<&RelatedDocument> {
        match self.document_type.internal_type {
            InternalType::CreditNote => self.reversed_entry.as_ref(),
            InternalType::DebitNote => self.debit_origin.as_ref(),
            InternalType::Invoice => None,
        }
    }

    pub fn display_number(&self) -> String {
        format!("{:05}-{:08}", self.point_of_sale, self.document_number)
    }
}
