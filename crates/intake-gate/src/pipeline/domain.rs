use std::collections::BTreeMap;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::normalizer::{parse_amount, NormalizedValue};

const DATE_FORMATS: [&str; 4] = ["%Y-%m-%d", "%d/%m/%Y", "%d.%m.%Y", "%d-%m-%Y"];

/// Which extraction pass produced a candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceOrigin {
    Fast,
    Expert,
}

impl SourceOrigin {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Fast => "fast",
            Self::Expert => "expert",
        }
    }
}

/// How a field's raw value is interpreted for comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Text,
    Amount,
    Date,
}

/// Closed schema of the fields an extraction may carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentField {
    DocumentNumber,
    IssueDate,
    DueDate,
    Currency,
    VendorName,
    VendorVat,
    VendorAddress,
    CustomerName,
    CustomerVat,
    CustomerAddress,
    Subtotal,
    VatAmount,
    TotalAmount,
    Iban,
    PaymentReference,
}

impl DocumentField {
    pub const fn ordered() -> [Self; 15] {
        [
            Self::DocumentNumber,
            Self::IssueDate,
            Self::DueDate,
            Self::Currency,
            Self::VendorName,
            Self::VendorVat,
            Self::VendorAddress,
            Self::CustomerName,
            Self::CustomerVat,
            Self::CustomerAddress,
            Self::Subtotal,
            Self::VatAmount,
            Self::TotalAmount,
            Self::Iban,
            Self::PaymentReference,
        ]
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::DocumentNumber => "document_number",
            Self::IssueDate => "issue_date",
            Self::DueDate => "due_date",
            Self::Currency => "currency",
            Self::VendorName => "vendor_name",
            Self::VendorVat => "vendor_vat",
            Self::VendorAddress => "vendor_address",
            Self::CustomerName => "customer_name",
            Self::CustomerVat => "customer_vat",
            Self::CustomerAddress => "customer_address",
            Self::Subtotal => "subtotal",
            Self::VatAmount => "vat_amount",
            Self::TotalAmount => "total_amount",
            Self::Iban => "iban",
            Self::PaymentReference => "payment_reference",
        }
    }

    pub const fn kind(self) -> FieldKind {
        match self {
            Self::IssueDate | Self::DueDate => FieldKind::Date,
            Self::Subtotal | Self::VatAmount | Self::TotalAmount => FieldKind::Amount,
            _ => FieldKind::Text,
        }
    }

    /// Fields whose disagreement moves money to the wrong place or amount.
    pub const fn is_critical(self) -> bool {
        matches!(self, Self::TotalAmount | Self::Iban | Self::PaymentReference)
    }
}

/// A single extracted value, kept in the representation the extractor produced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Text(String),
    Amount(Decimal),
    Date(NaiveDate),
}

impl FieldValue {
    pub fn text(value: impl Into<String>) -> Self {
        Self::Text(value.into())
    }

    fn is_blank(&self) -> bool {
        matches!(self, Self::Text(value) if value.trim().is_empty())
    }

    pub fn as_amount(&self) -> Option<Decimal> {
        match self {
            Self::Amount(value) => Some(*value),
            Self::Text(raw) => parse_amount(raw),
            Self::Date(_) => None,
        }
    }

    pub fn as_date(&self) -> Option<NaiveDate> {
        match self {
            Self::Date(value) => Some(*value),
            Self::Text(raw) => parse_date(raw),
            Self::Amount(_) => None,
        }
    }

    /// Whether the value can be read as `kind`. Amounts and dates that fail to parse are
    /// treated as absent.
    pub fn is_readable(&self, kind: FieldKind) -> bool {
        match kind {
            FieldKind::Amount => self.as_amount().is_some(),
            FieldKind::Date => self.as_date().is_some(),
            FieldKind::Text => !self.is_blank(),
        }
    }

    /// Canonical form used for conflict detection; unparsable amounts and dates fall back
    /// to their trimmed text.
    pub fn normalized(&self, kind: FieldKind) -> NormalizedValue {
        let parsed = match kind {
            FieldKind::Amount => self.as_amount().map(NormalizedValue::Amount),
            FieldKind::Date => self.as_date().map(NormalizedValue::Date),
            FieldKind::Text => None,
        };
        parsed.unwrap_or_else(|| NormalizedValue::Text(self.to_string().trim().to_string()))
    }
}

impl std::fmt::Display for FieldValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Text(value) => write!(f, "{value}"),
            Self::Amount(value) => write!(f, "{value}"),
            Self::Date(value) => write!(f, "{}", value.format("%Y-%m-%d")),
        }
    }
}

fn parse_date(raw: &str) -> Option<NaiveDate> {
    let trimmed = raw.trim();
    DATE_FORMATS
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(trimmed, format).ok())
}

/// One row of the document's line-item table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineItem {
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub quantity: Option<Decimal>,
    #[serde(default)]
    pub unit_price: Option<Decimal>,
    #[serde(default)]
    pub line_total: Option<Decimal>,
}

/// Field values and line items of one document, as extracted or as merged.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractedDocument {
    #[serde(default)]
    pub fields: BTreeMap<DocumentField, FieldValue>,
    #[serde(default)]
    pub line_items: Vec<LineItem>,
}

impl ExtractedDocument {
    pub fn with_field(mut self, field: DocumentField, value: FieldValue) -> Self {
        self.fields.insert(field, value);
        self
    }

    pub fn with_line_item(mut self, item: LineItem) -> Self {
        self.line_items.push(item);
        self
    }

    /// Present, non-blank value for the field.
    pub fn get(&self, field: DocumentField) -> Option<&FieldValue> {
        self.fields.get(&field).filter(|value| !value.is_blank())
    }

    pub fn text(&self, field: DocumentField) -> Option<String> {
        self.get(field).map(|value| value.to_string().trim().to_string())
    }

    pub fn amount(&self, field: DocumentField) -> Option<Decimal> {
        self.get(field).and_then(FieldValue::as_amount)
    }

    pub fn date(&self, field: DocumentField) -> Option<NaiveDate> {
        self.get(field).and_then(FieldValue::as_date)
    }

    /// Whether the field holds a usable value for its kind.
    pub fn has(&self, field: DocumentField) -> bool {
        match field.kind() {
            FieldKind::Amount => self.amount(field).is_some(),
            FieldKind::Date => self.date(field).is_some(),
            FieldKind::Text => self.get(field).is_some(),
        }
    }
}

/// One structured read of a document by a single extraction pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractionCandidate {
    pub origin: SourceOrigin,
    pub confidence: f32,
    #[serde(flatten)]
    pub document: ExtractedDocument,
}

impl ExtractionCandidate {
    pub fn new(origin: SourceOrigin, confidence: f32, document: ExtractedDocument) -> Self {
        Self {
            origin,
            confidence: clamp_confidence(confidence),
            document,
        }
    }

    pub fn clamped_confidence(&self) -> f32 {
        clamp_confidence(self.confidence)
    }
}

pub(crate) fn clamp_confidence(value: f32) -> f32 {
    if value.is_finite() {
        value.clamp(0.0, 1.0)
    } else {
        0.0
    }
}

/// Document classes the intake pipeline knows how to judge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentType {
    Invoice,
    Bill,
    Receipt,
    Unclassified,
}

impl DocumentType {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Invoice => "Invoice",
            Self::Bill => "Bill",
            Self::Receipt => "Receipt",
            Self::Unclassified => "Unclassified",
        }
    }
}

/// Result of the upstream document classifier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentClassification {
    pub document_type: DocumentType,
    pub confidence: f32,
    #[serde(default)]
    pub language: Option<String>,
    #[serde(default)]
    pub reasoning: String,
}

/// Identity of the tenant that owns the document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TenantIdentity {
    #[serde(default)]
    pub vat_number: Option<String>,
    pub legal_name: String,
    #[serde(default)]
    pub person_names: Vec<String>,
}
