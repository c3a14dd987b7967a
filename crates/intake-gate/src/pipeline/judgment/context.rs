use serde::{Deserialize, Serialize};

use super::super::audit::AuditReport;
use super::super::consensus::ConflictReport;
use super::super::domain::DocumentType;
use super::essentials::EssentialFieldsAssessment;
use super::retry::RetryResult;

/// Final routing of a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JudgmentOutcome {
    #[serde(alias = "AUTO_APPROVE")]
    AutoApprove,
    #[serde(alias = "NEEDS_REVIEW")]
    NeedsReview,
    #[serde(alias = "REJECT")]
    Reject,
}

impl JudgmentOutcome {
    pub const fn label(self) -> &'static str {
        match self {
            Self::AutoApprove => "AUTO_APPROVE",
            Self::NeedsReview => "NEEDS_REVIEW",
            Self::Reject => "REJECT",
        }
    }
}

/// Which phase of the gate produced the decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DecisionSource {
    Deterministic,
    Arbitration,
}

/// Everything the gate needs to judge one document attempt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JudgmentContext {
    pub extraction_confidence: f32,
    #[serde(default)]
    pub consensus_report: Option<ConflictReport>,
    pub audit_report: AuditReport,
    #[serde(default)]
    pub retry_result: Option<RetryResult>,
    pub document_type: DocumentType,
    pub has_essential_fields: bool,
    #[serde(default)]
    pub missing_essential_fields: Vec<String>,
}

impl JudgmentContext {
    pub fn new(
        extraction_confidence: f32,
        audit_report: AuditReport,
        document_type: DocumentType,
        essentials: EssentialFieldsAssessment,
    ) -> Self {
        Self {
            extraction_confidence,
            consensus_report: None,
            audit_report,
            retry_result: None,
            document_type,
            has_essential_fields: essentials.present,
            missing_essential_fields: essentials.missing,
        }
    }

    pub fn with_conflicts(mut self, report: ConflictReport) -> Self {
        self.consensus_report = Some(report);
        self
    }

    pub fn with_retry(mut self, retry: RetryResult) -> Self {
        self.retry_result = Some(retry);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JudgmentDecision {
    pub outcome: JudgmentOutcome,
    pub confidence: f32,
    pub reasoning: String,
    pub issues_for_user: Vec<String>,
    pub decided_by: DecisionSource,
}

impl JudgmentDecision {
    pub fn summary(&self) -> String {
        if self.issues_for_user.is_empty() {
            format!(
                "{} ({:.2}): {}",
                self.outcome.label(),
                self.confidence,
                self.reasoning
            )
        } else {
            format!(
                "{} ({:.2}): {} [issues: {}]",
                self.outcome.label(),
                self.confidence,
                self.reasoning,
                self.issues_for_user.join("; ")
            )
        }
    }
}
