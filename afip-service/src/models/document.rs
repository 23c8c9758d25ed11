//! Fiscal document classification: web service flavor, document type and concept.

use serde::{Deserialize, Serialize};

/// MiPyME (FCE) invoice codes: A, B and C.
pub const MIPYME_INVOICE_CODES: [u16; 3] = [201, 206, 211];

/// MiPyME (FCE) debit and credit note codes.
pub const MIPYME_NOTE_CODES: [u16; 6] = [202, 203, 207, 208, 212, 213];

/// Export invoice ("Factura E").
pub const EXPORT_INVOICE_CODE: u16 = 19;

/// AFIP web service a journal is configured for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FiscalService {
    /// Domestic electronic invoice.
    Wsfe,
    /// Export invoice.
    Wsfex,
    /// Domestic invoice with item detail; keeps native dates.
    Wsmtxca,
}

impl FiscalService {
    pub fn as_str(&self) -> &'static str {
        match self {
            FiscalService::Wsfe => "wsfe",
            FiscalService::Wsfex => "wsfex",
            FiscalService::Wsmtxca => "wsmtxca",
        }
    }

    pub fn from_string(s: &str) -> Option<Self> {
        match s {
            "wsfe" => Some(FiscalService::Wsfe),
            "wsfex" => Some(FiscalService::Wsfex),
            "wsmtxca" => Some(FiscalService::Wsmtxca),
            _ => None,
        }
    }
}

impl std::fmt::Display for FiscalService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Document letter, driving VAT reporting rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DocumentLetter {
    A,
    B,
    /// Issued by non-VAT-registered taxpayers; no VAT is discriminated.
    C,
    /// Export.
    E,
    M,
}

/// Whether the document is an invoice or a note correcting another one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InternalType {
    Invoice,
    CreditNote,
    DebitNote,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentType {
    /// AFIP voucher type code (1 = Factura A, 6 = Factura B, 19 = Factura E, ...).
    pub code: u16,
    pub letter: DocumentLetter,
    pub internal_type: InternalType,
}

impl DocumentType {
    pub fn is_mipyme_invoice(&self) -> bool {
        MIPYME_INVOICE_CODES.contains(&self.code)
    }

    pub fn is_mipyme_note(&self) -> bool {
        MIPYME_NOTE_CODES.contains(&self.code)
    }
}

/// What the invoice bills for. Drives the mandatory date fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Concept {
    Goods,
    Services,
    GoodsAndServices,
    /// Export of anything other than goods or services; wsfex only.
    Other,
}

impl Concept {
    pub fn code(&self) -> i64 {
        match self {
            Concept::Goods => 1,
            Concept::Services => 2,
            Concept::GoodsAndServices => 3,
            Concept::Other => 4,
        }
    }
}
