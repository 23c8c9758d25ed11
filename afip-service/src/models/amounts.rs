use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Largest accepted gap between the component sum and the grand total.
pub const RECONCILIATION_TOLERANCE: Decimal = Decimal::from_parts(1, 0, 0, false, 2);

/// Fiscal totals reported to the authority.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AmountBreakdown {
    pub taxed_base: Decimal,
    pub untaxed_base: Decimal,
    pub exempt_base: Decimal,
    pub tax_total: Decimal,
    pub other_taxes_total: Decimal,
    pub grand_total: Decimal,
}

impl AmountBreakdown {
    pub fn components_sum(&self) -> Decimal {
        self.taxed_base + self.untaxed_base + self.exempt_base + self.tax_total + self.other_taxes_total
    }

    pub fn discrepancy(&self) -> Decimal {
        (self.components_sum() - self.grand_total).abs()
    }

    pub fn reconciles(&self) -> bool {
        self.discrepancy() <= RECONCILIATION_TOLERANCE
    }
}
