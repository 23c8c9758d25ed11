//! Domestic invoice with item detail (wsmtxca). Dates stay native.

use super::wsfe::{tributes, vat_lines};
use super::{
    associated_vouchers, buyer_id_number, buyer_id_type, concept, currency_code, currency_rate,
    document_type, invoice_number, issue_date, payment_due_date, point_of_sale, service_end,
    service_start, total, DateStyle, FieldRule, InvoiceMapper, MappingContext, RuleResult,
};
use crate::error::AuthorizationError;
use crate::models::{AdditionalInfo, FieldValue, FiscalService};

pub struct WsmtxcaMapper;

static RULES: &[FieldRule] = &[
    FieldRule { name: "codigoConcepto", value: concept },
    FieldRule { name: "codigoTipoDocumento", value: buyer_id_type },
    FieldRule { name: "numeroDocumento", value: buyer_id_number },
    FieldRule { name: "codigoTipoComprobante", value: document_type },
    FieldRule { name: "numeroPuntoVenta", value: point_of_sale },
    FieldRule { name: "numeroComprobante", value: invoice_number },
    FieldRule { name: "importeTotal", value: total },
    FieldRule { name: "importeNoGravado", value: untaxed },
    FieldRule { name: "importeGravado", value: taxed },
    FieldRule { name: "importeSubtotal", value: subtotal },
    FieldRule { name: "importeOtrosTributos", value: other_taxes },
    FieldRule { name: "importeExento", value: exempt },
    FieldRule { name: "fechaEmision", value: issue_date },
    FieldRule { name: "fechaVencimientoPago", value: payment_due_date },
    FieldRule { name: "fechaServicioDesde", value: service_start },
    FieldRule { name: "fechaServicioHasta", value: service_end },
    FieldRule { name: "codigoMoneda", value: currency_code },
    FieldRule { name: "cotizacionMoneda", value: currency_rate },
    FieldRule { name: "observaciones", value: observations },
];

fn untaxed(ctx: &MappingContext<'_>) -> RuleResult {
    Ok(Some(ctx.amount(ctx.amounts.untaxed_base)))
}

fn taxed(ctx: &MappingContext<'_>) -> RuleResult {
    Ok(Some(ctx.amount(ctx.amounts.taxed_base)))
}

/// Pre-tax subtotal of the invoice; this service reports it instead of VAT.
fn subtotal(ctx: &MappingContext<'_>) -> RuleResult {
    Ok(Some(ctx.amount(ctx.invoice.amount_untaxed)))
}

fn other_taxes(ctx: &MappingContext<'_>) -> RuleResult {
    Ok(Some(ctx.amount(ctx.amounts.other_taxes_total)))
}

fn exempt(ctx: &MappingContext<'_>) -> RuleResult {
    Ok(Some(ctx.amount(ctx.amounts.exempt_base)))
}

fn observations(ctx: &MappingContext<'_>) -> RuleResult {
    Ok(ctx.invoice.narration.clone().map(FieldValue::Text))
}

impl InvoiceMapper for WsmtxcaMapper {
    fn service(&self) -> FiscalService {
        FiscalService::Wsmtxca
    }

    fn date_style(&self) -> DateStyle {
        DateStyle::Native
    }

    fn rules(&self) -> &'static [FieldRule] {
        RULES
    }

    fn additional_info(&self, ctx: &MappingContext<'_>) -> Result<AdditionalInfo, AuthorizationError> {
        Ok(AdditionalInfo {
            vat_lines: vat_lines(ctx),
            tributes: tributes(ctx),
            associated_vouchers: associated_vouchers(ctx),
            optionals: Vec::new(),
        })
    }
}
