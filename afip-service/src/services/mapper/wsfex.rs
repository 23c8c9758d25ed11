//! Export invoice (wsfex).

use super::{
    associated_vouchers, currency_code, currency_rate, document_type, invoice_number, issue_date,
    payment_due_date, point_of_sale, total, FieldRule, InvoiceMapper, MappingContext, RuleResult,
};
use crate::error::AuthorizationError;
use crate::models::{AdditionalInfo, Concept, FieldValue, FiscalService, EXPORT_INVOICE_CODE};

/// Longest incoterm description the service accepts.
const INCOTERM_DESCRIPTION_MAX: usize = 20;

/// Spanish.
const INVOICE_LANGUAGE: i64 = 1;

pub struct WsfexMapper;

static RULES: &[FieldRule] = &[
    FieldRule { name: "Cbte_Tipo", value: document_type },
    FieldRule { name: "Punto_vta", value: point_of_sale },
    FieldRule { name: "Cbte_nro", value: invoice_number },
    FieldRule { name: "Fecha_cbte", value: issue_date },
    FieldRule { name: "Imp_total", value: total },
    FieldRule { name: "Tipo_expo", value: export_type },
    FieldRule { name: "Permiso_existente", value: existing_permit },
    FieldRule { name: "Dst_cmp", value: destination_country },
    FieldRule { name: "Cliente", value: client_name },
    FieldRule { name: "Cuit_pais_cliente", value: country_cuit },
    FieldRule { name: "Domicilio_cliente", value: client_address },
    FieldRule { name: "Id_impositivo", value: tax_id },
    FieldRule { name: "Moneda_Id", value: currency_code },
    FieldRule { name: "Moneda_ctz", value: currency_rate },
    FieldRule { name: "Obs_comerciales", value: payment_terms },
    FieldRule { name: "Obs", value: narration },
    FieldRule { name: "Forma_pago", value: payment_terms },
    FieldRule { name: "Incoterms", value: incoterm_code },
    FieldRule { name: "Incoterms_Ds", value: incoterm_description },
    FieldRule { name: "Idioma_cbte", value: language },
    FieldRule { name: "Fecha_pago", value: payment_due_date },
];

/// Export type shares the concept codes (1 goods, 2 services, 4 other).
fn export_type(ctx: &MappingContext<'_>) -> RuleResult {
    match ctx.invoice.concept {
        Concept::GoodsAndServices => Err(AuthorizationError::mapping(
            "export type",
            "exports are goods, services or other, never both goods and services",
        )),
        concept => Ok(Some(FieldValue::Integer(concept.code()))),
    }
}

/// "N" only for goods exported on a Factura E; every other combination sends
/// an empty flag.
fn existing_permit(ctx: &MappingContext<'_>) -> RuleResult {
    let flag = if ctx.invoice.document_type.code == EXPORT_INVOICE_CODE
        && ctx.invoice.concept == Concept::Goods
    {
        "N"
    } else {
        ""
    };
    Ok(Some(FieldValue::Text(flag.to_string())))
}

fn destination_country(ctx: &MappingContext<'_>) -> RuleResult {
    let code = ctx.invoice.buyer.country_code.as_deref().ok_or_else(|| {
        AuthorizationError::mapping("destination country", "buyer has no AFIP country code")
    })?;
    let code = code.parse::<i64>().map_err(|_| {
        AuthorizationError::mapping("destination country", format!("'{}' is not numeric", code))
    })?;
    Ok(Some(FieldValue::Integer(code)))
}

fn client_name(ctx: &MappingContext<'_>) -> RuleResult {
    Ok(Some(FieldValue::Text(ctx.invoice.buyer.name.clone())))
}

fn country_cuit(ctx: &MappingContext<'_>) -> RuleResult {
    Ok(ctx
        .invoice
        .buyer
        .country_cuit
        .as_deref()
        .map(|cuit| FieldValue::Text(cuit.replace(['-', '.'], ""))))
}

fn client_address(ctx: &MappingContext<'_>) -> RuleResult {
    let address = ctx.invoice.buyer.address.clone().unwrap_or_default();
    Ok(Some(FieldValue::Text(address)))
}

fn tax_id(ctx: &MappingContext<'_>) -> RuleResult {
    let id = ctx.invoice.buyer.identification_number.clone().unwrap_or_default();
    Ok(Some(FieldValue::Text(id)))
}

fn payment_terms(ctx: &MappingContext<'_>) -> RuleResult {
    Ok(ctx.invoice.payment_terms.clone().map(FieldValue::Text))
}

fn narration(ctx: &MappingContext<'_>) -> RuleResult {
    Ok(ctx.invoice.narration.clone().map(FieldValue::Text))
}

fn incoterm_code(ctx: &MappingContext<'_>) -> RuleResult {
    Ok(ctx
        .invoice
        .incoterm
        .as_ref()
        .map(|incoterm| FieldValue::Text(incoterm.code.clone())))
}

fn incoterm_description(ctx: &MappingContext<'_>) -> RuleResult {
    Ok(ctx.invoice.incoterm.as_ref().map(|incoterm| {
        FieldValue::Text(incoterm.name.chars().take(INCOTERM_DESCRIPTION_MAX).collect())
    }))
}

fn language(_ctx: &MappingContext<'_>) -> RuleResult {
    Ok(Some(FieldValue::Integer(INVOICE_LANGUAGE)))
}

impl InvoiceMapper for WsfexMapper {
    fn service(&self) -> FiscalService {
        FiscalService::Wsfex
    }

    fn rules(&self) -> &'static [FieldRule] {
        RULES
    }

    fn additional_info(&self, ctx: &MappingContext<'_>) -> Result<AdditionalInfo, AuthorizationError> {
        Ok(AdditionalInfo {
            associated_vouchers: associated_vouchers(ctx),
            ..Default::default()
        })
    }
}
