use serde::{Deserialize, Serialize};

/// Severity attached to an audit check. Passing checks are always `Info`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Info,
    Warning,
    Critical,
}

impl Severity {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Info => "INFO",
            Self::Warning => "WARNING",
            Self::Critical => "CRITICAL",
        }
    }
}

/// Severity a failing check may carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureSeverity {
    Warning,
    Critical,
}

impl From<FailureSeverity> for Severity {
    fn from(value: FailureSeverity) -> Self {
        match value {
            FailureSeverity::Warning => Severity::Warning,
            FailureSeverity::Critical => Severity::Critical,
        }
    }
}

/// Family of rule that produced a check.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckType {
    Math,
    LineItems,
    LineItemMath,
    CounterpartyIntegrity,
    Iban,
    PaymentReference,
    DateConsistency,
    Other(String),
}

impl CheckType {
    pub fn label(&self) -> &str {
        match self {
            Self::Math => "MATH",
            Self::LineItems => "LINE_ITEMS",
            Self::LineItemMath => "LINE_ITEM_MATH",
            Self::CounterpartyIntegrity => "COUNTERPARTY_INTEGRITY",
            Self::Iban => "IBAN",
            Self::PaymentReference => "PAYMENT_REFERENCE",
            Self::DateConsistency => "DATE_CONSISTENCY",
            Self::Other(name) => name,
        }
    }
}

/// Aggregate verdict of an audit report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditStatus {
    Pass,
    Warn,
    Critical,
}

impl AuditStatus {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Pass => "PASS",
            Self::Warn => "WARN",
            Self::Critical => "CRITICAL",
        }
    }
}

/// Result of one deterministic rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditCheck {
    check_type: CheckType,
    field: String,
    passed: bool,
    severity: Severity,
    message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    hint: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    expected: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    actual: Option<String>,
}

impl AuditCheck {
    pub fn pass(check_type: CheckType, field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            check_type,
            field: field.into(),
            passed: true,
            severity: Severity::Info,
            message: message.into(),
            hint: None,
            expected: None,
            actual: None,
        }
    }

    pub fn fail(
        check_type: CheckType,
        field: impl Into<String>,
        severity: FailureSeverity,
        message: impl Into<String>,
    ) -> Self {
        Self {
            check_type,
            field: field.into(),
            passed: false,
            severity: severity.into(),
            message: message.into(),
            hint: None,
            expected: None,
            actual: None,
        }
    }

    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }

    pub fn with_values(mut self, expected: impl Into<String>, actual: impl Into<String>) -> Self {
        self.expected = Some(expected.into());
        self.actual = Some(actual.into());
        self
    }

    pub fn check_type(&self) -> &CheckType {
        &self.check_type
    }

    pub fn field(&self) -> &str {
        &self.field
    }

    pub fn passed(&self) -> bool {
        self.passed
    }

    pub fn severity(&self) -> Severity {
        self.severity
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn hint(&self) -> Option<&str> {
        self.hint.as_deref()
    }

    pub fn expected(&self) -> Option<&str> {
        self.expected.as_deref()
    }

    pub fn actual(&self) -> Option<&str> {
        self.actual.as_deref()
    }

    pub fn is_critical_failure(&self) -> bool {
        !self.passed && self.severity == Severity::Critical
    }

    pub fn is_warning(&self) -> bool {
        !self.passed && self.severity == Severity::Warning
    }

    pub fn summary(&self) -> String {
        format!("{}: {}", self.field, self.message)
    }
}

/// Ordered list of checks run against one document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditReport {
    checks: Vec<AuditCheck>,
}

impl AuditReport {
    pub const EMPTY: AuditReport = AuditReport { checks: Vec::new() };

    pub fn new(checks: Vec<AuditCheck>) -> Self {
        Self { checks }
    }

    pub fn checks(&self) -> &[AuditCheck] {
        &self.checks
    }

    pub fn is_empty(&self) -> bool {
        self.checks.is_empty()
    }

    pub fn passed_count(&self) -> usize {
        self.checks.iter().filter(|check| check.passed).count()
    }

    pub fn failed_count(&self) -> usize {
        self.checks.len() - self.passed_count()
    }

    pub fn overall_status(&self) -> AuditStatus {
        if self.checks.iter().any(AuditCheck::is_critical_failure) {
            AuditStatus::Critical
        } else if self.checks.iter().any(AuditCheck::is_warning) {
            AuditStatus::Warn
        } else {
            AuditStatus::Pass
        }
    }

    pub fn critical_failures(&self) -> Vec<&AuditCheck> {
        self.checks
            .iter()
            .filter(|check| check.is_critical_failure())
            .collect()
    }

    pub fn warnings(&self) -> Vec<&AuditCheck> {
        self.checks.iter().filter(|check| check.is_warning()).collect()
    }

    pub fn failures(&self) -> Vec<&AuditCheck> {
        self.checks.iter().filter(|check| !check.passed).collect()
    }

    pub fn has_critical_failures(&self) -> bool {
        self.checks.iter().any(AuditCheck::is_critical_failure)
    }

    /// Additive union: every check of `other` is appended after the existing ones.
    pub fn merge(mut self, other: AuditReport) -> Self {
        self.checks.extend(other.checks);
        self
    }

    pub fn with_check(mut self, check: AuditCheck) -> Self {
        self.checks.push(check);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_report_is_neutral() {
        let report = AuditReport::EMPTY;
        assert_eq!(report.overall_status(), AuditStatus::Pass);
        assert_eq!(report.passed_count(), 0);
        assert_eq!(report.failed_count(), 0);
    }

    #[test]
    fn status_escalates_with_worst_failure() {
        let warn = AuditReport::new(vec![
            AuditCheck::pass(CheckType::Math, "total_amount", "ok"),
            AuditCheck::fail(CheckType::LineItems, "subtotal", FailureSeverity::Warning, "off"),
        ]);
        assert_eq!(warn.overall_status(), AuditStatus::Warn);
        assert_eq!(warn.warnings().len(), 1);

        let critical = warn.with_check(AuditCheck::fail(
            CheckType::Math,
            "total_amount",
            FailureSeverity::Critical,
            "mismatch",
        ));
        assert_eq!(critical.overall_status(), AuditStatus::Critical);
        assert_eq!(critical.failed_count(), 2);
        assert_eq!(critical.critical_failures().len(), 1);
    }

    #[test]
    fn passing_checks_always_carry_info() {
        let check = AuditCheck::pass(CheckType::Other("CUSTOM".to_string()), "x", "fine");
        assert!(check.passed());
        assert_eq!(check.severity(), Severity::Info);
        assert_eq!(check.check_type().label(), "CUSTOM");
    }

    #[test]
    fn merge_keeps_both_sides_in_order() {
        let left = AuditReport::new(vec![AuditCheck::pass(CheckType::Math, "a", "ok")]);
        let right = AuditReport::new(vec![AuditCheck::pass(CheckType::Iban, "b", "ok")]);
        let merged = left.merge(right);
        let fields: Vec<&str> = merged.checks().iter().map(AuditCheck::field).collect();
        assert_eq!(fields, vec!["a", "b"]);
    }
}
