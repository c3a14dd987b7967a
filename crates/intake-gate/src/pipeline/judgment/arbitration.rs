//! Optional second opinion for borderline decisions.
//!
//! Arbitrators only ever see the digest in [`ArbitrationSummary`], never the document itself.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::super::audit::AuditStatus;
use super::super::domain::DocumentType;
use super::context::{JudgmentContext, JudgmentDecision, JudgmentOutcome};

#[derive(Debug, Error)]
pub enum ArbitrationError {
    #[error("arbitration timed out after {0} ms")]
    Timeout(u64),
    #[error("arbitration transport failed: {0}")]
    Transport(String),
    #[error("malformed arbitration response: {0}")]
    Malformed(String),
}

/// Backend able to weigh a borderline decision, typically a language model.
#[async_trait]
pub trait Arbitrator: Send + Sync {
    async fn arbitrate(
        &self,
        summary: &ArbitrationSummary,
    ) -> Result<ArbitrationVerdict, ArbitrationError>;
}

/// Structured digest of the reports behind a deterministic decision.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArbitrationSummary {
    pub document_type: DocumentType,
    pub extraction_confidence: f32,
    pub deterministic_outcome: JudgmentOutcome,
    pub deterministic_reasoning: String,
    pub audit_status: AuditStatus,
    pub audit_failures: Vec<String>,
    pub conflicting_fields: Vec<String>,
    pub missing_essential_fields: Vec<String>,
    pub retry: Option<String>,
}

impl ArbitrationSummary {
    pub fn from_context(context: &JudgmentContext, deterministic: &JudgmentDecision) -> Self {
        let conflicting_fields = context
            .consensus_report
            .as_ref()
            .map(|report| {
                report
                    .conflicts()
                    .iter()
                    .map(|conflict| {
                        format!("{} ({})", conflict.field.label(), conflict.severity.label())
                    })
                    .collect()
            })
            .unwrap_or_default();

        Self {
            document_type: context.document_type,
            extraction_confidence: deterministic.confidence,
            deterministic_outcome: deterministic.outcome,
            deterministic_reasoning: deterministic.reasoning.clone(),
            audit_status: context.audit_report.overall_status(),
            audit_failures: context
                .audit_report
                .failures()
                .into_iter()
                .map(|check| format!("{} {}", check.severity().label(), check.summary()))
                .collect(),
            conflicting_fields,
            missing_essential_fields: context.missing_essential_fields.clone(),
            retry: context.retry_result.as_ref().map(|retry| retry.summary()),
        }
    }
}

/// Decision proposed by an arbitrator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArbitrationVerdict {
    pub outcome: JudgmentOutcome,
    pub confidence: f32,
    pub reasoning: String,
    #[serde(default)]
    pub issues: Vec<String>,
}

/// Parses a raw arbitrator reply, tolerating a surrounding markdown code fence.
pub fn parse_arbitration_response(raw: &str) -> Result<ArbitrationVerdict, ArbitrationError> {
    let body = strip_code_fence(raw);
    if body.is_empty() {
        return Err(ArbitrationError::Malformed("empty response".to_string()));
    }
    serde_json::from_str(body).map_err(|err| ArbitrationError::Malformed(err.to_string()))
}

fn strip_code_fence(raw: &str) -> &str {
    let trimmed = raw.trim();
    let Some(fence_start) = trimmed.find("```") else {
        return trimmed;
    };

    let after_fence = &trimmed[fence_start + 3..];
    let content = after_fence
        .strip_prefix("json")
        .unwrap_or(after_fence);
    match content.find("```") {
        Some(end) => content[..end].trim(),
        None => content.trim(),
    }
}
