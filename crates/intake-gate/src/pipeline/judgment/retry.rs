use serde::{Deserialize, Serialize};

use super::super::audit::{AuditCheck, AuditReport};

/// Outcome of a targeted re-extraction of failing fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RetryResult {
    NoRetryNeeded,
    CorrectedOnRetry {
        attempt: u32,
        corrected_fields: Vec<String>,
    },
    StillFailing {
        attempts: u32,
        remaining_failures: Vec<AuditCheck>,
    },
}

impl RetryResult {
    /// Compares the audit of the first pass with the audit of retry `attempt`.
    pub fn from_reports(before: &AuditReport, after: &AuditReport, attempt: u32) -> Self {
        let failed_before = failing_fields(before);
        if failed_before.is_empty() {
            return Self::NoRetryNeeded;
        }

        let remaining: Vec<AuditCheck> = after.failures().into_iter().cloned().collect();
        if remaining.is_empty() {
            return Self::CorrectedOnRetry {
                attempt,
                corrected_fields: failed_before,
            };
        }

        Self::StillFailing {
            attempts: attempt,
            remaining_failures: remaining,
        }
    }

    /// Whether the retry repaired the named field.
    pub fn corrected(&self, field: &str) -> bool {
        match self {
            Self::CorrectedOnRetry {
                corrected_fields, ..
            } => corrected_fields.iter().any(|corrected| corrected == field),
            Self::NoRetryNeeded | Self::StillFailing { .. } => false,
        }
    }

    pub fn summary(&self) -> String {
        match self {
            Self::NoRetryNeeded => "no retry needed".to_string(),
            Self::CorrectedOnRetry {
                attempt,
                corrected_fields,
            } => format!(
                "corrected on attempt {attempt}: {}",
                corrected_fields.join(", ")
            ),
            Self::StillFailing {
                attempts,
                remaining_failures,
            } => {
                let failures: Vec<String> =
                    remaining_failures.iter().map(AuditCheck::summary).collect();
                format!(
                    "still failing after {attempts} attempt(s): {}",
                    failures.join("; ")
                )
            }
        }
    }
}

fn failing_fields(report: &AuditReport) -> Vec<String> {
    let mut fields: Vec<String> = Vec::new();
    for check in report.failures() {
        if !fields.iter().any(|field| field == check.field()) {
            fields.push(check.field().to_string());
        }
    }
    fields
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::audit::{CheckType, FailureSeverity};

    fn mismatch() -> AuditCheck {
        AuditCheck::fail(
            CheckType::Math,
            "total_amount",
            FailureSeverity::Critical,
            "subtotal + vat = 121.00 but total is 120.00",
        )
    }

    #[test]
    fn clean_first_pass_needs_no_retry() {
        let clean = AuditReport::new(vec![AuditCheck::pass(CheckType::Math, "total_amount", "ok")]);
        assert_eq!(
            RetryResult::from_reports(&clean, &clean, 1),
            RetryResult::NoRetryNeeded
        );
    }

    #[test]
    fn repaired_fields_are_listed() {
        let before = AuditReport::new(vec![mismatch(), mismatch()]);
        let after = AuditReport::new(vec![AuditCheck::pass(CheckType::Math, "total_amount", "ok")]);
        let result = RetryResult::from_reports(&before, &after, 2);
        assert_eq!(
            result,
            RetryResult::CorrectedOnRetry {
                attempt: 2,
                corrected_fields: vec!["total_amount".to_string()],
            }
        );
        assert!(result.corrected("total_amount"));
        assert!(!result.corrected("iban"));
    }

    #[test]
    fn persisting_failures_are_carried_forward() {
        let before = AuditReport::new(vec![mismatch()]);
        let result = RetryResult::from_reports(&before, &before, 3);
        assert!(matches!(
            &result,
            RetryResult::StillFailing { attempts: 3, remaining_failures } if remaining_failures.len() == 1
        ));
        assert!(result.summary().starts_with("still failing after 3 attempt(s)"));
    }
}
