//! Invoice field mapping, one strategy per fiscal web service.
//!
//! Each strategy is a static table of [`FieldRule`]s. A rule either yields a
//! wire value, omits the field (`Ok(None)`), or fails because the data a
//! conditional field needs is missing. Data that is not a flat field (VAT
//! aliquots, tributes, related vouchers) is produced by
//! [`InvoiceMapper::additional_info`].

mod wsfe;
mod wsfex;
mod wsmtxca;

pub use wsfe::WsfeMapper;
pub use wsfex::WsfexMapper;
pub use wsmtxca::WsmtxcaMapper;

use chrono::NaiveDate;
use std::collections::BTreeMap;

use crate::error::AuthorizationError;
use crate::models::{
    AdditionalInfo, AmountBreakdown, AssociatedVoucher, AuthorizationRequest, Concept,
    FieldValue, FiscalService, Invoice, OptionalField,
};
use crate::services::amounts::{format_amount, format_rate};

/// Optional-data id carrying the FCE cancellation flag.
const FCE_CANCELLATION_OPTIONAL_ID: &str = "22";

/// How a service expects dates on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateStyle {
    /// `YYYYMMDD` string.
    Compact,
    /// Native date value.
    Native,
}

/// Inputs available to every field rule.
pub struct MappingContext<'a> {
    pub invoice: &'a Invoice,
    pub amounts: &'a AmountBreakdown,
    pub date_style: DateStyle,
}

impl MappingContext<'_> {
    pub fn date(&self, date: NaiveDate) -> FieldValue {
        match self.date_style {
            DateStyle::Compact => FieldValue::Text(date.format("%Y%m%d").to_string()),
            DateStyle::Native => FieldValue::Date(date),
        }
    }

    pub fn amount(&self, value: rust_decimal::Decimal) -> FieldValue {
        FieldValue::Amount(format_amount(value))
    }

    pub fn rate(&self) -> FieldValue {
        FieldValue::Amount(format_rate(self.invoice.currency.rate))
    }
}

pub type RuleResult = Result<Option<FieldValue>, AuthorizationError>;

/// One wire field and how to derive it.
pub struct FieldRule {
    pub name: &'static str,
    pub value: fn(&MappingContext<'_>) -> RuleResult,
}

pub trait InvoiceMapper: Send + Sync {
    fn service(&self) -> FiscalService;

    fn date_style(&self) -> DateStyle {
        DateStyle::Compact
    }

    fn rules(&self) -> &'static [FieldRule];

    fn additional_info(&self, _ctx: &MappingContext<'_>) -> Result<AdditionalInfo, AuthorizationError> {
        Ok(AdditionalInfo::default())
    }

    fn map(
        &self,
        invoice: &Invoice,
        amounts: &AmountBreakdown,
    ) -> Result<AuthorizationRequest, AuthorizationError> {
        let ctx = MappingContext {
            invoice,
            amounts,
            date_style: self.date_style(),
        };

        let mut fields = BTreeMap::new();
        for rule in self.rules() {
            if let Some(value) = (rule.value)(&ctx)? {
                fields.insert(rule.name, value);
            }
        }

        Ok(AuthorizationRequest {
            service: self.service(),
            point_of_sale: invoice.point_of_sale,
            document_type: invoice.document_type.code,
            invoice_number: invoice.document_number,
            fields,
            additional: self.additional_info(&ctx)?,
        })
    }
}

static WSFE: WsfeMapper = WsfeMapper;
static WSFEX: WsfexMapper = WsfexMapper;
static WSMTXCA: WsmtxcaMapper = WsmtxcaMapper;

/// Strategy for the given service.
pub fn mapper_for(service: FiscalService) -> &'static dyn InvoiceMapper {
    match service {
        FiscalService::Wsfe => &WSFE,
        FiscalService::Wsfex => &WSFEX,
        FiscalService::Wsmtxca => &WSMTXCA,
    }
}

// ---------------------------------------------------------------------------
// Rules shared by several services
// ---------------------------------------------------------------------------

/// Payment due date applies to services (except FCE notes) and to FCE invoices.
pub fn due_date_applies(invoice: &Invoice) -> bool {
    let doc = &invoice.document_type;
    (invoice.concept != Concept::Goods && !doc.is_mipyme_note()) || doc.is_mipyme_invoice()
}

pub fn payment_due_date(ctx: &MappingContext<'_>) -> RuleResult {
    if !due_date_applies(ctx.invoice) {
        return Ok(None);
    }
    let date = ctx.invoice.due_date.unwrap_or(ctx.invoice.issue_date);
    Ok(Some(ctx.date(date)))
}

pub fn service_start(ctx: &MappingContext<'_>) -> RuleResult {
    if ctx.invoice.concept == Concept::Goods {
        return Ok(None);
    }
    let date = ctx.invoice.service_start.ok_or_else(|| {
        AuthorizationError::mapping("service start date", "required when the concept includes services")
    })?;
    Ok(Some(ctx.date(date)))
}

pub fn service_end(ctx: &MappingContext<'_>) -> RuleResult {
    if ctx.invoice.concept == Concept::Goods {
        return Ok(None);
    }
    let date = ctx.invoice.service_end.ok_or_else(|| {
        AuthorizationError::mapping("service end date", "required when the concept includes services")
    })?;
    Ok(Some(ctx.date(date)))
}

pub fn issue_date(ctx: &MappingContext<'_>) -> RuleResult {
    Ok(Some(ctx.date(ctx.invoice.issue_date)))
}

/// Domestic concept: goods, services or both.
pub fn concept(ctx: &MappingContext<'_>) -> RuleResult {
    if ctx.invoice.concept == Concept::Other {
        return Err(AuthorizationError::mapping(
            "concept",
            "the 'other' concept only exists for export invoices",
        ));
    }
    Ok(Some(FieldValue::Integer(ctx.invoice.concept.code())))
}

pub fn document_type(ctx: &MappingContext<'_>) -> RuleResult {
    Ok(Some(FieldValue::Integer(i64::from(ctx.invoice.document_type.code))))
}

pub fn point_of_sale(ctx: &MappingContext<'_>) -> RuleResult {
    Ok(Some(FieldValue::Integer(i64::from(ctx.invoice.point_of_sale))))
}

pub fn invoice_number(ctx: &MappingContext<'_>) -> RuleResult {
    let number = i64::try_from(ctx.invoice.document_number).map_err(|_| {
        AuthorizationError::mapping(
            "invoice number",
            format!("{} is out of range", ctx.invoice.document_number),
        )
    })?;
    Ok(Some(FieldValue::Integer(number)))
}

/// Buyer identification type; final consumer (99) when unknown.
pub fn buyer_id_type(ctx: &MappingContext<'_>) -> RuleResult {
    let code = ctx.invoice.buyer.identification_type.unwrap_or(99);
    Ok(Some(FieldValue::Integer(i64::from(code))))
}

pub fn buyer_id_number(ctx: &MappingContext<'_>) -> RuleResult {
    let number = match ctx.invoice.buyer.identification_digits() {
        Some(digits) => digits.parse::<i64>().map_err(|_| {
            AuthorizationError::mapping(
                "buyer identification number",
                format!("'{}' is not numeric", digits),
            )
        })?,
        None => 0,
    };
    Ok(Some(FieldValue::Integer(number)))
}

pub fn total(ctx: &MappingContext<'_>) -> RuleResult {
    Ok(Some(ctx.amount(ctx.amounts.grand_total)))
}

pub fn currency_code(ctx: &MappingContext<'_>) -> RuleResult {
    Ok(Some(FieldValue::Text(ctx.invoice.currency.afip_code.clone())))
}

pub fn currency_rate(ctx: &MappingContext<'_>) -> RuleResult {
    Ok(Some(ctx.rate()))
}

/// The voucher a credit/debit note corrects, if any.
pub fn associated_vouchers(ctx: &MappingContext<'_>) -> Vec<AssociatedVoucher> {
    ctx.invoice
        .related_document()
        .map(|related| AssociatedVoucher {
            document_type: related.document_type_code,
            point_of_sale: related.point_of_sale,
            number: related.number,
            issuer_cuit: related.issuer_cuit.clone(),
            issue_date: related.issue_date.map(|d| ctx.date(d)),
        })
        .into_iter()
        .collect()
}

/// FCE notes must state whether they cancel a document the buyer rejected.
pub fn fce_optionals(ctx: &MappingContext<'_>) -> Vec<OptionalField> {
    if !ctx.invoice.document_type.is_mipyme_note() {
        return Vec::new();
    }
    let flag = if ctx.invoice.fce_is_cancellation { "S" } else { "N" };
    vec![OptionalField {
        id: FCE_CANCELLATION_OPTIONAL_ID.to_string(),
        value: flag.to_string(),
    }]
}
