//! Deterministic arithmetic and structural checks over a (merged) extraction.
//!
//! Rules never treat absent data as an error: a rule without enough input reports a
//! passing `Info` check that says it was skipped.

mod payment;
mod report;
mod rules;

pub use payment::{PaymentValidation, ValidationResult};
pub use report::{AuditCheck, AuditReport, AuditStatus, CheckType, FailureSeverity, Severity};
pub use rules::{verify_dates, verify_line_item_math, verify_line_items, verify_totals};

use rust_decimal::Decimal;
use tracing::debug;

use super::domain::{DocumentField, ExtractedDocument};
use crate::config::AuditConfig;

/// Runs every audit rule against one document.
#[derive(Debug, Clone)]
pub struct AuditEngine {
    tolerance: Decimal,
}

impl Default for AuditEngine {
    fn default() -> Self {
        Self::new(&AuditConfig::default())
    }
}

impl AuditEngine {
    pub fn new(config: &AuditConfig) -> Self {
        Self {
            tolerance: config.amount_tolerance.abs(),
        }
    }

    pub fn tolerance(&self) -> Decimal {
        self.tolerance
    }

    pub fn audit(&self, document: &ExtractedDocument, payments: &PaymentValidation) -> AuditReport {
        let mut checks = vec![verify_totals(
            document.amount(DocumentField::Subtotal),
            document.amount(DocumentField::VatAmount),
            document.amount(DocumentField::TotalAmount),
            self.tolerance,
        )];

        checks.push(self.line_item_sum_check(document));
        checks.extend(
            document
                .line_items
                .iter()
                .enumerate()
                .map(|(index, item)| verify_line_item_math(index, item, self.tolerance)),
        );

        checks.push(verify_dates(
            document.date(DocumentField::IssueDate),
            document.date(DocumentField::DueDate),
        ));
        checks.extend(payment::payment_checks(payments));

        let report = AuditReport::new(checks);
        debug!(
            status = report.overall_status().label(),
            passed = report.passed_count(),
            failed = report.failed_count(),
            "audit completed"
        );
        report
    }

    fn line_item_sum_check(&self, document: &ExtractedDocument) -> AuditCheck {
        let subtotal = document.amount(DocumentField::Subtotal);
        let line_totals: Vec<Decimal> = document
            .line_items
            .iter()
            .filter_map(|item| item.line_total)
            .collect();

        let missing = document.line_items.len() - line_totals.len();
        if missing > 0 {
            return AuditCheck::pass(
                CheckType::LineItems,
                "subtotal",
                format!("line item sum skipped: {missing} line item(s) without a total"),
            );
        }

        verify_line_items(&line_totals, subtotal, self.tolerance)
    }
}
