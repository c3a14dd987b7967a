use serde::{Deserialize, Serialize};

use super::report::{AuditCheck, CheckType, FailureSeverity};

/// Outcome of an external checksum validator (IBAN mod-97, structured reference mod-97).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationResult {
    pub valid: bool,
    /// Canonical value after the validator's own cleanup.
    #[serde(default)]
    pub normalized: Option<String>,
    /// The validator repaired OCR confusions (O/0, I/1, ...) to make the checksum pass.
    #[serde(default)]
    pub corrected: bool,
}

/// Payment facts supplied alongside the extraction.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentValidation {
    #[serde(default)]
    pub iban: Option<ValidationResult>,
    #[serde(default)]
    pub payment_reference: Option<ValidationResult>,
}

pub(crate) fn payment_checks(validation: &PaymentValidation) -> Vec<AuditCheck> {
    let mut checks = Vec::new();

    if let Some(iban) = &validation.iban {
        checks.push(if iban.valid {
            AuditCheck::pass(CheckType::Iban, "iban", describe_valid("IBAN", iban))
        } else {
            AuditCheck::fail(
                CheckType::Iban,
                "iban",
                FailureSeverity::Warning,
                "IBAN fails the mod-97 checksum",
            )
            .with_hint("compare the IBAN digit by digit with the source document")
        });
    }

    if let Some(reference) = &validation.payment_reference {
        checks.push(if reference.valid {
            AuditCheck::pass(
                CheckType::PaymentReference,
                "payment_reference",
                describe_valid("structured payment reference", reference),
            )
        } else {
            AuditCheck::fail(
                CheckType::PaymentReference,
                "payment_reference",
                FailureSeverity::Warning,
                "structured payment reference fails its checksum",
            )
            .with_hint("re-read the +++xxx/xxxx/xxxxx+++ reference on the payment slip")
        });
    }

    checks
}

fn describe_valid(label: &str, result: &ValidationResult) -> String {
    match (&result.normalized, result.corrected) {
        (Some(normalized), true) => format!("{label} valid after OCR correction to {normalized}"),
        (None, true) => format!("{label} valid after OCR correction"),
        (_, false) => format!("{label} checksum valid"),
    }
}
