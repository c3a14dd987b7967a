use super::super::audit::AuditCheck;
use super::super::consensus::FieldConflict;
use super::super::domain::{clamp_confidence, DocumentType};
use super::arbitration::ArbitrationVerdict;
use super::context::{DecisionSource, JudgmentContext, JudgmentDecision, JudgmentOutcome};
use super::retry::RetryResult;
use crate::config::JudgmentConfig;

pub(crate) fn decide(context: &JudgmentContext, config: &JudgmentConfig) -> JudgmentDecision {
    let confidence = clamp_confidence(context.extraction_confidence);

    let reject_reasons = reject_reasons(context, config, confidence);
    if !reject_reasons.is_empty() {
        return JudgmentDecision {
            outcome: JudgmentOutcome::Reject,
            confidence,
            reasoning: format!("rejected: {}", reject_reasons.join("; ")),
            issues_for_user: reject_reasons,
            decided_by: DecisionSource::Deterministic,
        };
    }

    let unresolved = unresolved_critical_conflicts(context);
    let warnings = context.audit_report.warnings();
    let still_failing = still_failing_issue(context.retry_result.as_ref());

    if unresolved.is_empty() && confidence >= config.auto_approve_at {
        let mut reasoning = format!(
            "approved: essential fields present, no critical findings, confidence {confidence:.2}"
        );
        if !warnings.is_empty() {
            let noted: Vec<String> = warnings.iter().map(|check| check.summary()).collect();
            reasoning.push_str(&format!(
                "; {} warning(s) noted: {}",
                warnings.len(),
                noted.join("; ")
            ));
        }
        if let Some(retry) = &still_failing {
            reasoning.push_str(&format!("; {retry}"));
        }
        return JudgmentDecision {
            outcome: JudgmentOutcome::AutoApprove,
            confidence,
            reasoning,
            issues_for_user: Vec::new(),
            decided_by: DecisionSource::Deterministic,
        };
    }

    let mut issues: Vec<String> = unresolved
        .iter()
        .map(|conflict| format!("unresolved critical conflict: {}", conflict.describe()))
        .collect();
    issues.extend(warnings.iter().map(|check| warning_issue(check)));
    issues.extend(still_failing);

    let reasoning = if confidence < config.auto_approve_at {
        format!(
            "review required: confidence {confidence:.2} is below the {:.2} approval threshold",
            config.auto_approve_at
        )
    } else {
        format!(
            "review required: {} unresolved critical conflict(s)",
            unresolved.len()
        )
    };

    JudgmentDecision {
        outcome: JudgmentOutcome::NeedsReview,
        confidence,
        reasoning,
        issues_for_user: issues,
        decided_by: DecisionSource::Deterministic,
    }
}

/// Decisions that arbitration cannot plausibly improve.
pub(crate) fn is_clear_cut(decision: &JudgmentDecision, config: &JudgmentConfig) -> bool {
    match decision.outcome {
        JudgmentOutcome::Reject => true,
        JudgmentOutcome::AutoApprove => decision.confidence >= config.clear_cut_approve_at,
        JudgmentOutcome::NeedsReview => {
            !decision.issues_for_user.is_empty()
                || decision.confidence < config.clear_cut_review_below
        }
    }
}

/// Critical conflicts whose field was not repaired by a retry.
pub(crate) fn unresolved_critical_conflicts(context: &JudgmentContext) -> Vec<&FieldConflict> {
    let Some(report) = &context.consensus_report else {
        return Vec::new();
    };

    report
        .critical_conflicts()
        .into_iter()
        .filter(|conflict| {
            !context
                .retry_result
                .as_ref()
                .is_some_and(|retry| retry.corrected(conflict.field.label()))
        })
        .collect()
}

/// Folds an arbitrated verdict into the deterministic decision it was asked about.
pub(crate) fn apply_verdict(
    deterministic: &JudgmentDecision,
    verdict: ArbitrationVerdict,
    context: &JudgmentContext,
) -> JudgmentDecision {
    if deterministic.outcome == JudgmentOutcome::Reject {
        return deterministic.clone();
    }

    let mut outcome = verdict.outcome;
    let mut reasoning = verdict.reasoning;
    let mut issues = verdict.issues;

    let unresolved = unresolved_critical_conflicts(context);
    if outcome == JudgmentOutcome::AutoApprove && !unresolved.is_empty() {
        outcome = JudgmentOutcome::NeedsReview;
        reasoning = format!(
            "{reasoning} (downgraded: {} unresolved critical conflict(s))",
            unresolved.len()
        );
        issues.extend(
            unresolved
                .iter()
                .map(|conflict| format!("unresolved critical conflict: {}", conflict.describe())),
        );
    }

    JudgmentDecision {
        outcome,
        confidence: clamp_confidence(verdict.confidence),
        reasoning,
        issues_for_user: issues,
        decided_by: DecisionSource::Arbitration,
    }
}

fn reject_reasons(
    context: &JudgmentContext,
    config: &JudgmentConfig,
    confidence: f32,
) -> Vec<String> {
    let mut reasons: Vec<String> = context
        .audit_report
        .critical_failures()
        .into_iter()
        .map(|check| format!("critical audit failure: {}", check.summary()))
        .collect();

    if context.document_type == DocumentType::Unclassified {
        reasons.push("document type could not be classified".to_string());
    } else if !context.has_essential_fields {
        if context.missing_essential_fields.is_empty() {
            reasons.push("missing essential fields".to_string());
        } else {
            reasons.push(format!(
                "missing essential fields: {}",
                context.missing_essential_fields.join(", ")
            ));
        }
    }

    if confidence < config.reject_below {
        reasons.push(format!(
            "extraction confidence {confidence:.2} is below the {:.2} rejection threshold",
            config.reject_below
        ));
    }

    reasons
}

fn warning_issue(check: &AuditCheck) -> String {
    match check.hint() {
        Some(hint) => format!("warning: {} ({hint})", check.summary()),
        None => format!("warning: {}", check.summary()),
    }
}

fn still_failing_issue(retry: Option<&RetryResult>) -> Option<String> {
    match retry {
        Some(retry @ RetryResult::StillFailing { .. }) => Some(retry.summary()),
        _ => None,
    }
}
