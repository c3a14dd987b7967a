//! Places a document relative to the owning tenant and derives its counterparty.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::audit::{AuditCheck, CheckType, FailureSeverity};
use super::domain::{DocumentField, DocumentType, ExtractedDocument, TenantIdentity};
use super::normalizer::{normalize_party_name, normalize_vat};

const VAT_MATCH_CONFIDENCE: f32 = 0.95;
const NAME_MATCH_CONFIDENCE: f32 = 0.75;
const TYPE_HINT_CONFIDENCE: f32 = 0.6;
const DEFAULT_CONFIDENCE: f32 = 0.4;

/// Flow of the document relative to the tenant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    /// The tenant received the document (purchase, expense).
    Inbound,
    /// The tenant issued the document (sale).
    Outbound,
}

impl Direction {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Inbound => "inbound",
            Self::Outbound => "outbound",
        }
    }

    const fn counterparty_vat_field(self) -> DocumentField {
        match self {
            Self::Inbound => DocumentField::VendorVat,
            Self::Outbound => DocumentField::CustomerVat,
        }
    }

    const fn counterparty_name_field(self) -> DocumentField {
        match self {
            Self::Inbound => DocumentField::VendorName,
            Self::Outbound => DocumentField::CustomerName,
        }
    }
}

/// Evidence the resolver relied on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResolutionMethod {
    VatMatch,
    NameMatch,
    DocumentTypeHint,
    Default,
}

impl ResolutionMethod {
    pub const fn label(self) -> &'static str {
        match self {
            Self::VatMatch => "VAT match",
            Self::NameMatch => "name match",
            Self::DocumentTypeHint => "document type hint",
            Self::Default => "default",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DirectionResolution {
    pub direction: Direction,
    pub source: ResolutionMethod,
    pub confidence: f32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub counterparty_vat: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub counterparty_name: Option<String>,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct DirectionResolver;

impl DirectionResolver {
    pub fn resolve(
        &self,
        document: &ExtractedDocument,
        tenant: &TenantIdentity,
        document_type: DocumentType,
    ) -> DirectionResolution {
        let (direction, source, confidence) = decide_direction(document, tenant, document_type);
        let resolution = DirectionResolution {
            direction,
            source,
            confidence,
            counterparty_vat: document.text(direction.counterparty_vat_field()),
            counterparty_name: document.text(direction.counterparty_name_field()),
        };

        debug!(
            direction = direction.label(),
            method = source.label(),
            confidence,
            "resolved document direction"
        );
        resolution
    }

    /// A counterparty sharing the tenant's VAT number is always a critical failure.
    pub fn counterparty_integrity_check(
        &self,
        resolution: &DirectionResolution,
        tenant: &TenantIdentity,
    ) -> AuditCheck {
        let field = resolution.direction.counterparty_vat_field().label();
        let counterparty = resolution.counterparty_vat.as_deref().and_then(normalize_vat);
        let own = tenant.vat_number.as_deref().and_then(normalize_vat);

        match (counterparty, own) {
            (Some(counterparty), Some(own)) if counterparty == own => {
                warn!(direction = resolution.direction.label(), "counterparty VAT equals tenant VAT");
                AuditCheck::fail(
                    CheckType::CounterpartyIntegrity,
                    field,
                    FailureSeverity::Critical,
                    format!("counterparty VAT {counterparty} is the tenant's own VAT number"),
                )
                .with_hint("verify the document direction and which party is the issuer")
                .with_values(format!("a VAT number other than {own}"), counterparty)
            }
            (Some(_), Some(_)) => AuditCheck::pass(
                CheckType::CounterpartyIntegrity,
                field,
                "counterparty is distinct from the tenant",
            ),
            _ => AuditCheck::pass(
                CheckType::CounterpartyIntegrity,
                field,
                "counterparty check skipped: insufficient data",
            ),
        }
    }
}

fn decide_direction(
    document: &ExtractedDocument,
    tenant: &TenantIdentity,
    document_type: DocumentType,
) -> (Direction, ResolutionMethod, f32) {
    if let Some(own_vat) = tenant.vat_number.as_deref().and_then(normalize_vat) {
        let vat_of = |field| document.text(field).as_deref().and_then(normalize_vat);
        if vat_of(DocumentField::VendorVat).as_deref() == Some(own_vat.as_str()) {
            return (Direction::Outbound, ResolutionMethod::VatMatch, VAT_MATCH_CONFIDENCE);
        }
        if vat_of(DocumentField::CustomerVat).as_deref() == Some(own_vat.as_str()) {
            return (Direction::Inbound, ResolutionMethod::VatMatch, VAT_MATCH_CONFIDENCE);
        }
    }

    let known_names = tenant_names(tenant);
    let name_matches = |field| {
        document
            .text(field)
            .map(|name| normalize_party_name(&name))
            .is_some_and(|name| !name.is_empty() && known_names.contains(&name))
    };
    if name_matches(DocumentField::VendorName) {
        return (Direction::Outbound, ResolutionMethod::NameMatch, NAME_MATCH_CONFIDENCE);
    }
    if name_matches(DocumentField::CustomerName) {
        return (Direction::Inbound, ResolutionMethod::NameMatch, NAME_MATCH_CONFIDENCE);
    }

    match document_type {
        DocumentType::Bill | DocumentType::Receipt => (
            Direction::Inbound,
            ResolutionMethod::DocumentTypeHint,
            TYPE_HINT_CONFIDENCE,
        ),
        DocumentType::Invoice | DocumentType::Unclassified => {
            (Direction::Inbound, ResolutionMethod::Default, DEFAULT_CONFIDENCE)
        }
    }
}

fn tenant_names(tenant: &TenantIdentity) -> Vec<String> {
    std::iter::once(&tenant.legal_name)
        .chain(tenant.person_names.iter())
        .map(|name| normalize_party_name(name))
        .filter(|name| !name.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::audit::Severity;
    use crate::pipeline::domain::FieldValue;

    fn tenant() -> TenantIdentity {
        TenantIdentity {
            vat_number: Some("BE0123.456.789".to_string()),
            legal_name: "Northwind Consulting BV".to_string(),
            person_names: vec!["Jo Peeters".to_string()],
        }
    }

    fn document(vendor_vat: &str, customer_vat: &str) -> ExtractedDocument {
        ExtractedDocument::default()
            .with_field(DocumentField::VendorName, FieldValue::text("Acme Supplies"))
            .with_field(DocumentField::VendorVat, FieldValue::text(vendor_vat))
            .with_field(DocumentField::CustomerName, FieldValue::text("Northwind Consulting"))
            .with_field(DocumentField::CustomerVat, FieldValue::text(customer_vat))
    }

    #[test]
    fn tenant_vat_on_customer_side_is_inbound() {
        let resolution = DirectionResolver.resolve(
            &document("NL999999999B01", "BE 0123 456 789"),
            &tenant(),
            DocumentType::Invoice,
        );
        assert_eq!(resolution.direction, Direction::Inbound);
        assert_eq!(resolution.source, ResolutionMethod::VatMatch);
        assert_eq!(resolution.counterparty_vat.as_deref(), Some("NL999999999B01"));
        assert_eq!(resolution.counterparty_name.as_deref(), Some("Acme Supplies"));
    }

    #[test]
    fn tenant_vat_on_vendor_side_is_outbound() {
        let resolution = DirectionResolver.resolve(
            &document("BE0123456789", "NL999999999B01"),
            &tenant(),
            DocumentType::Invoice,
        );
        assert_eq!(resolution.direction, Direction::Outbound);
        assert_eq!(resolution.counterparty_vat.as_deref(), Some("NL999999999B01"));
    }

    #[test]
    fn falls_back_to_name_matching() {
        let document = ExtractedDocument::default()
            .with_field(DocumentField::VendorName, FieldValue::text("Jo Peeters"))
            .with_field(DocumentField::CustomerName, FieldValue::text("Some Client"));
        let resolution = DirectionResolver.resolve(&document, &tenant(), DocumentType::Invoice);
        assert_eq!(resolution.direction, Direction::Outbound);
        assert_eq!(resolution.source, ResolutionMethod::NameMatch);
    }

    #[test]
    fn unknown_parties_use_document_type_then_default() {
        let document = ExtractedDocument::default();
        let bill = DirectionResolver.resolve(&document, &tenant(), DocumentType::Bill);
        assert_eq!(bill.source, ResolutionMethod::DocumentTypeHint);
        let invoice = DirectionResolver.resolve(&document, &tenant(), DocumentType::Invoice);
        assert_eq!(invoice.source, ResolutionMethod::Default);
        assert_eq!(invoice.direction, Direction::Inbound);
    }

    #[test]
    fn self_referential_counterparty_is_critical() {
        let tenant = tenant();
        let resolution = DirectionResolver.resolve(
            &document("BE0123456789", "BE0123456789"),
            &tenant,
            DocumentType::Invoice,
        );
        let check = DirectionResolver.counterparty_integrity_check(&resolution, &tenant);
        assert!(!check.passed());
        assert_eq!(check.severity(), Severity::Critical);
        assert_eq!(check.check_type(), &CheckType::CounterpartyIntegrity);
    }

    #[test]
    fn blank_vat_never_triggers_integrity_failure() {
        let tenant = TenantIdentity {
            vat_number: Some("  ".to_string()),
            ..tenant()
        };
        let resolution = DirectionResolver.resolve(
            &document("", ""),
            &tenant,
            DocumentType::Invoice,
        );
        assert!(DirectionResolver.counterparty_integrity_check(&resolution, &tenant).passed());
    }
}
