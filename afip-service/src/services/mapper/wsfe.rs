//! Domestic electronic invoice (wsfe).

use super::{
    associated_vouchers, buyer_id_number, buyer_id_type, concept, currency_code, currency_rate,
    document_type, fce_optionals, invoice_number, issue_date, payment_due_date, point_of_sale,
    service_end, service_start, total, FieldRule, InvoiceMapper, MappingContext, RuleResult,
};
use crate::error::AuthorizationError;
use crate::models::{AdditionalInfo, DocumentLetter, FiscalService, TaxKind, TributeLine, VatLine};
use crate::services::amounts::{format_amount, vat_subtotals};

pub struct WsfeMapper;

static RULES: &[FieldRule] = &[
    FieldRule { name: "Concepto", value: concept },
    FieldRule { name: "DocTipo", value: buyer_id_type },
    FieldRule { name: "DocNro", value: buyer_id_number },
    FieldRule { name: "CbteTipo", value: document_type },
    FieldRule { name: "PtoVta", value: point_of_sale },
    FieldRule { name: "CbteDesde", value: invoice_number },
    FieldRule { name: "CbteHasta", value: invoice_number },
    FieldRule { name: "ImpTotal", value: total },
    FieldRule { name: "ImpTotConc", value: untaxed },
    FieldRule { name: "ImpNeto", value: taxed },
    FieldRule { name: "ImpIVA", value: vat },
    FieldRule { name: "ImpTrib", value: other_taxes },
    FieldRule { name: "ImpOpEx", value: exempt },
    FieldRule { name: "CbteFch", value: issue_date },
    FieldRule { name: "FchVtoPago", value: payment_due_date },
    FieldRule { name: "FchServDesde", value: service_start },
    FieldRule { name: "FchServHasta", value: service_end },
    FieldRule { name: "MonId", value: currency_code },
    FieldRule { name: "MonCotiz", value: currency_rate },
];

fn untaxed(ctx: &MappingContext<'_>) -> RuleResult {
    Ok(Some(ctx.amount(ctx.amounts.untaxed_base)))
}

fn taxed(ctx: &MappingContext<'_>) -> RuleResult {
    Ok(Some(ctx.amount(ctx.amounts.taxed_base)))
}

fn vat(ctx: &MappingContext<'_>) -> RuleResult {
    Ok(Some(ctx.amount(ctx.amounts.tax_total)))
}

fn other_taxes(ctx: &MappingContext<'_>) -> RuleResult {
    Ok(Some(ctx.amount(ctx.amounts.other_taxes_total)))
}

fn exempt(ctx: &MappingContext<'_>) -> RuleResult {
    Ok(Some(ctx.amount(ctx.amounts.exempt_base)))
}

/// VAT aliquot block; letter C documents report none.
pub(super) fn vat_lines(ctx: &MappingContext<'_>) -> Vec<VatLine> {
    if ctx.invoice.document_type.letter == DocumentLetter::C {
        return Vec::new();
    }
    vat_subtotals(&ctx.invoice.tax_lines)
        .into_iter()
        .map(|(id, (base, amount))| VatLine {
            id,
            base: format_amount(base),
            amount: format_amount(amount),
        })
        .collect()
}

pub(super) fn tributes(ctx: &MappingContext<'_>) -> Vec<TributeLine> {
    ctx.invoice
        .tax_lines
        .iter()
        .filter_map(|line| match line.kind {
            TaxKind::Other { tribute_code } => Some(TributeLine {
                id: tribute_code,
                description: line.description.clone(),
                base: format_amount(line.base),
                rate: format_amount(line.rate.unwrap_or_default()),
                amount: format_amount(line.amount),
            }),
            TaxKind::Vat { .. } => None,
        })
        .collect()
}

impl InvoiceMapper for WsfeMapper {
    fn service(&self) -> FiscalService {
        FiscalService::Wsfe
    }

    fn rules(&self) -> &'static [FieldRule] {
        RULES
    }

    fn additional_info(&self, ctx: &MappingContext<'_>) -> Result<AdditionalInfo, AuthorizationError> {
        Ok(AdditionalInfo {
            vat_lines: vat_lines(ctx),
            tributes: tributes(ctx),
            associated_vouchers: associated_vouchers(ctx),
            optionals: fce_optionals(ctx),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::*;
    use super::*;
    use crate::models::{
        Concept, DocumentType, FieldValue, InternalType, RelatedDocument, TaxLine,
    };
    use crate::services::amounts::calculate;

    fn map(inv: &crate::models::Invoice) -> crate::models::AuthorizationRequest {
        WsfeMapper.map(inv, &calculate(inv).unwrap()).unwrap()
    }

    #[test]
    fn test_goods_invoice_has_no_due_date_or_service_period() {
        let request = map(&invoice_a(FiscalService::Wsfe));

        assert!(!request.has_field("FchVtoPago"));
        assert!(!request.has_field("FchServDesde"));
        assert!(!request.has_field("FchServHasta"));
        assert_eq!(
            request.field("CbteFch"),
            Some(&FieldValue::Text("20240315".to_string()))
        );
    }

    #[test]
    fn test_services_invoice_carries_due_date_and_period() {
        let mut inv = invoice_a(FiscalService::Wsfe);
        inv.concept = Concept::Services;
        inv.service_start = Some(date(2024, 2, 1));
        inv.service_end = Some(date(2024, 2, 29));

        let request = map(&inv);
        assert_eq!(
            request.field("FchVtoPago"),
            Some(&FieldValue::Text("20240414".to_string()))
        );
        assert_eq!(
            request.field("FchServDesde"),
            Some(&FieldValue::Text("20240201".to_string()))
        );
        assert_eq!(
            request.field("FchServHasta"),
            Some(&FieldValue::Text("20240229".to_string()))
        );
    }

    #[test]
    fn test_due_date_falls_back_to_issue_date() {
        let mut inv = invoice_a(FiscalService::Wsfe);
        inv.concept = Concept::Services;
        inv.due_date = None;
        inv.service_start = Some(date(2024, 3, 1));
        inv.service_end = Some(date(2024, 3, 31));

        let request = map(&inv);
        assert_eq!(
            request.field("FchVtoPago"),
            Some(&FieldValue::Text("20240315".to_string()))
        );
    }

    #[test]
    fn test_missing_service_dates_fail_mapping() {
        let mut inv = invoice_a(FiscalService::Wsfe);
        inv.concept = Concept::GoodsAndServices;

        let err = WsfeMapper.map(&inv, &calculate(&inv).unwrap()).unwrap_err();
        assert!(matches!(err, AuthorizationError::Mapping { .. }));
    }

    #[test]
    fn test_amounts_are_fixed_point_strings() {
        let request = map(&invoice_a(FiscalService::Wsfe));

        assert_eq!(request.field("ImpTotal").and_then(|v| v.as_text()), Some("1210.00"));
        assert_eq!(request.field("ImpNeto").and_then(|v| v.as_text()), Some("1000.00"));
        assert_eq!(request.field("ImpIVA").and_then(|v| v.as_text()), Some("210.00"));
        assert_eq!(request.field("ImpTotConc").and_then(|v| v.as_text()), Some("0.00"));
        assert_eq!(request.field("MonCotiz").and_then(|v| v.as_text()), Some("1"));
        assert_eq!(request.field("DocNro"), Some(&FieldValue::Integer(30712345679)));
    }

    #[test]
    fn test_vat_block_lists_aliquots() {
        let request = map(&invoice_a(FiscalService::Wsfe));
        assert_eq!(
            request.additional.vat_lines,
            vec![VatLine {
                id: 5,
                base: "1000.00".to_string(),
                amount: "210.00".to_string(),
            }]
        );
    }

    #[test]
    fn test_letter_c_has_no_vat_block() {
        let mut inv = invoice_a(FiscalService::Wsfe);
        inv.document_type.code = 11;
        inv.document_type.letter = DocumentLetter::C;
        inv.amount_total = inv.amount_untaxed;
        inv.tax_lines = vec![TaxLine {
            kind: TaxKind::Vat { vat_code: 0 },
            description: "IVA No Corresponde".to_string(),
            base: dec("1000.00"),
            amount: dec("0"),
            rate: None,
        }];

        let request = map(&inv);
        assert!(request.additional.vat_lines.is_empty());
        assert_eq!(request.field("ImpNeto").and_then(|v| v.as_text()), Some("1000.00"));
        assert_eq!(request.field("ImpIVA").and_then(|v| v.as_text()), Some("0.00"));
    }

    #[test]
    fn test_credit_note_references_reversed_entry_only() {
        let mut inv = invoice_a(FiscalService::Wsfe);
        inv.document_type = DocumentType {
            code: 3,
            letter: DocumentLetter::A,
            internal_type: InternalType::CreditNote,
        };
        inv.reversed_entry = Some(RelatedDocument {
            document_type_code: 1,
            point_of_sale: 3,
            number: 40,
            issuer_cuit: Some("30712345679".to_string()),
            issue_date: Some(date(2024, 3, 1)),
        });
        inv.debit_origin = Some(RelatedDocument {
            document_type_code: 1,
            point_of_sale: 3,
            number: 7,
            issuer_cuit: None,
            issue_date: None,
        });

        let request = map(&inv);
        assert_eq!(request.additional.associated_vouchers.len(), 1);
        let voucher = &request.additional.associated_vouchers[0];
        assert_eq!(voucher.number, 40);
        assert_eq!(
            voucher.issue_date,
            Some(FieldValue::Text("20240301".to_string()))
        );
    }

    #[test]
    fn test_debit_note_references_debit_origin_only() {
        let mut inv = invoice_a(FiscalService::Wsfe);
        inv.document_type = DocumentType {
            code: 2,
            letter: DocumentLetter::A,
            internal_type: InternalType::DebitNote,
        };
        inv.reversed_entry = Some(RelatedDocument {
            document_type_code: 1,
            point_of_sale: 3,
            number: 40,
            issuer_cuit: None,
            issue_date: None,
        });
        inv.debit_origin = Some(RelatedDocument {
            document_type_code: 1,
            point_of_sale: 3,
            number: 7,
            issuer_cuit: Some("30712345679".to_string()),
            issue_date: Some(date(2024, 2, 20)),
        });

        let request = map(&inv);
        assert_eq!(request.additional.associated_vouchers.len(), 1);
        let voucher = &request.additional.associated_vouchers[0];
        assert_eq!(voucher.number, 7);
        assert_eq!(voucher.issuer_cuit.as_deref(), Some("30712345679"));
        assert_eq!(
            voucher.issue_date,
            Some(FieldValue::Text("20240220".to_string()))
        );
    }

    #[test]
    fn test_fce_goods_invoice_carries_due_date() {
        let mut inv = invoice_a(FiscalService::Wsfe);
        inv.document_type = DocumentType {
            code: 201,
            letter: DocumentLetter::A,
            internal_type: InternalType::Invoice,
        };
        assert_eq!(inv.concept, Concept::Goods);

        let request = map(&inv);
        assert_eq!(
            request.field("FchVtoPago"),
            Some(&FieldValue::Text("20240414".to_string()))
        );
        assert!(!request.has_field("FchServDesde"));
        assert!(request.additional.optionals.is_empty());
    }

    #[test]
    fn test_fce_note_reports_cancellation_flag() {
        let mut inv = invoice_a(FiscalService::Wsfe);
        inv.document_type = DocumentType {
            code: 203,
            letter: DocumentLetter::A,
            internal_type: InternalType::CreditNote,
        };
        inv.fce_is_cancellation = true;

        let request = map(&inv);
        assert_eq!(request.additional.optionals.len(), 1);
        assert_eq!(request.additional.optionals[0].id, "22");
        assert_eq!(request.additional.optionals[0].value, "S");
    }
}
