//! Tax lines of an invoice, grouped by tax treatment.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// VAT "no corresponde": the line is outside VAT (letter C issuers).
pub const VAT_NOT_APPLICABLE: u8 = 0;
/// VAT "no gravado".
pub const VAT_UNTAXED: u8 = 1;
/// VAT exempt.
pub const VAT_EXEMPT: u8 = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TaxKind {
    /// VAT, identified by the AFIP aliquot code (3 = 0%, 4 = 10.5%, 5 = 21%, ...).
    Vat { vat_code: u8 },
    /// Any other tax (perceptions, internal taxes), identified by the tribute code.
    Other { tribute_code: u16 },
}

/// Aggregated base and amount of one tax over the invoice lines.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaxLine {
    pub kind: TaxKind,
    #[serde(default)]
    pub description: String,
    pub base: Decimal,
    pub amount: Decimal,
    /// Percentage rate, reported for non-VAT tributes.
    #[serde(default)]
    pub rate: Option<Decimal>,
}

impl TaxLine {
    pub fn vat_code(&self) -> Option<u8> {
        match self.kind {
            TaxKind::Vat { vat_code } => Some(vat_code),
            TaxKind::Other { .. } => None,
        }
    }

    /// VAT with an actual aliquot (not untaxed, exempt or not applicable).
    pub fn is_taxable_vat(&self) -> bool {
        matches!(self.vat_code(), Some(code) if code > VAT_EXEMPT)
    }
}
