//! Domain models for afip-service.

mod amounts;
mod authorization;
mod document;
mod environment;
mod invoice;
mod request;
mod tax_line;

pub use amounts::{AmountBreakdown, RECONCILIATION_TOLERANCE};
pub use authorization::{
    AuditTrace, AuthMode, AuthorizationRecord, AuthorizationResult, Observation, Outcome,
};
pub use document::{
    Concept, DocumentLetter, DocumentType, FiscalService, InternalType, EXPORT_INVOICE_CODE,
    MIPYME_INVOICE_CODES, MIPYME_NOTE_CODES,
};
pub use environment::EnvironmentKind;
pub use invoice::{Buyer, Currency, Incoterm, Invoice, Journal, MoveType, RelatedDocument};
pub use request::{
    AdditionalInfo, AssociatedVoucher, AuthorizationRequest, FieldValue, OptionalField,
    TributeLine, VatLine,
};
pub use tax_line::{TaxKind, TaxLine, VAT_EXEMPT, VAT_NOT_APPLICABLE, VAT_UNTAXED};
