//! Fiscal amount calculation and wire formatting.

use rust_decimal::{Decimal, RoundingStrategy};
use std::collections::BTreeMap;

use crate::error::AuthorizationError;
use crate::models::{
    AmountBreakdown, DocumentLetter, Invoice, TaxKind, TaxLine, VAT_EXEMPT,
};

/// Derive the reported totals from the invoice tax lines.
///
/// Letter C documents carry no VAT: the whole pre-tax subtotal is reported as
/// the taxed base and the untaxed/exempt/VAT figures are zero. Export (letter
/// E) documents are outside VAT and report the subtotal as untaxed. Otherwise
/// any part of the subtotal no VAT line covers counts as untaxed.
pub fn calculate(invoice: &Invoice) -> Result<AmountBreakdown, AuthorizationError> {
    let mut taxed_base = Decimal::ZERO;
    let mut untaxed_base = Decimal::ZERO;
    let mut exempt_base = Decimal::ZERO;
    let mut tax_total = Decimal::ZERO;
    let mut other_taxes_total = Decimal::ZERO;
    let mut vat_covered = Decimal::ZERO;

    for line in &invoice.tax_lines {
        if line.base.is_sign_negative() || line.amount.is_sign_negative() {
            return Err(AuthorizationError::InvalidAmount(format!(
                "negative tax line '{}' (base {}, amount {})",
                line.description, line.base, line.amount
            )));
        }
        match line.kind {
            TaxKind::Vat { vat_code } if vat_code == VAT_EXEMPT => exempt_base += line.base,
            TaxKind::Vat { .. } if line.is_taxable_vat() => {
                taxed_base += line.base;
                tax_total += line.amount;
            }
            // untaxed and not applicable
            TaxKind::Vat { .. } => untaxed_base += line.base,
            TaxKind::Other { .. } => other_taxes_total += line.amount,
        }
        if line.vat_code().is_some() {
            vat_covered += line.base;
        }
    }

    match invoice.document_type.letter {
        DocumentLetter::C => {
            taxed_base = invoice.amount_untaxed;
            untaxed_base = Decimal::ZERO;
            exempt_base = Decimal::ZERO;
            tax_total = Decimal::ZERO;
        }
        DocumentLetter::E => {
            taxed_base = Decimal::ZERO;
            untaxed_base = invoice.amount_untaxed;
            exempt_base = Decimal::ZERO;
            tax_total = Decimal::ZERO;
        }
        DocumentLetter::A | DocumentLetter::B | DocumentLetter::M => {
            let uncovered = invoice.amount_untaxed - vat_covered;
            if uncovered > Decimal::ZERO {
                untaxed_base += uncovered;
            }
        }
    }

    if invoice.amount_total.is_sign_negative() || invoice.amount_untaxed.is_sign_negative() {
        return Err(AuthorizationError::InvalidAmount(format!(
            "negative invoice totals (untaxed {}, total {})",
            invoice.amount_untaxed, invoice.amount_total
        )));
    }

    let breakdown = AmountBreakdown {
        taxed_base,
        untaxed_base,
        exempt_base,
        tax_total,
        other_taxes_total,
        grand_total: invoice.amount_total,
    };

    if !breakdown.reconciles() {
        return Err(AuthorizationError::InvalidAmount(format!(
            "components add up to {} but invoice total is {} (difference {})",
            format_amount(breakdown.components_sum()),
            format_amount(breakdown.grand_total),
            format_amount(breakdown.discrepancy()),
        )));
    }

    Ok(breakdown)
}

/// Fixed-point string with exactly two decimals, as the authority requires.
pub fn format_amount(value: Decimal) -> String {
    let rounded = value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    format!("{:.2}", rounded)
}

/// Exchange rate with at most six decimals and no trailing zeros.
pub fn format_rate(value: Decimal) -> String {
    value
        .round_dp_with_strategy(6, RoundingStrategy::MidpointAwayFromZero)
        .normalize()
        .to_string()
}

/// Base and amount per VAT aliquot code, only for aliquots that carry tax.
pub fn vat_subtotals(lines: &[TaxLine]) -> BTreeMap<u8, (Decimal, Decimal)> {
    let mut groups: BTreeMap<u8, (Decimal, Decimal)> = BTreeMap::new();
    for line in lines.iter().filter(|l| l.is_taxable_vat()) {
        if let Some(code) = line.vat_code() {
            let entry = groups.entry(code).or_insert((Decimal::ZERO, Decimal::ZERO));
            entry.0 += line.base;
            entry.1 += line.amount;
        }
    }
    groups
}
