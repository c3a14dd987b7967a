use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::info;

use super::audit::{AuditEngine, AuditReport, PaymentValidation};
use super::consensus::{ConsensusEngine, ConsensusResult};
use super::direction::{DirectionResolution, DirectionResolver};
use super::domain::{DocumentClassification, DocumentType, ExtractionCandidate, TenantIdentity};
use super::judgment::{
    assess_essential_fields, Arbitrator, EssentialFieldsAssessment, JudgmentContext,
    JudgmentDecision, JudgmentGate, RetryResult,
};
use crate::config::GateConfig;

/// Everything known about one document attempt when it reaches the gate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentIntake {
    #[serde(default)]
    pub fast: Option<ExtractionCandidate>,
    #[serde(default)]
    pub expert: Option<ExtractionCandidate>,
    pub classification: DocumentClassification,
    pub tenant: TenantIdentity,
    #[serde(default)]
    pub payments: PaymentValidation,
    #[serde(default)]
    pub retry: Option<RetryResult>,
}

impl DocumentIntake {
    pub fn new(classification: DocumentClassification, tenant: TenantIdentity) -> Self {
        Self {
            fast: None,
            expert: None,
            classification,
            tenant,
            payments: PaymentValidation::default(),
            retry: None,
        }
    }

    pub fn with_fast(mut self, candidate: ExtractionCandidate) -> Self {
        self.fast = Some(candidate);
        self
    }

    pub fn with_expert(mut self, candidate: ExtractionCandidate) -> Self {
        self.expert = Some(candidate);
        self
    }

    pub fn with_payments(mut self, payments: PaymentValidation) -> Self {
        self.payments = payments;
        self
    }

    pub fn with_retry(mut self, retry: RetryResult) -> Self {
        self.retry = Some(retry);
        self
    }

    pub fn document_type(&self) -> DocumentType {
        self.classification.document_type
    }
}

/// Intermediate reports and final decision for one document attempt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineOutcome {
    pub consensus: ConsensusResult,
    pub direction: Option<DirectionResolution>,
    pub audit: AuditReport,
    pub essentials: EssentialFieldsAssessment,
    pub decision: JudgmentDecision,
}

/// Composes consensus, audit, direction and judgment for one document.
pub struct IntakePipeline {
    consensus: ConsensusEngine,
    audit: AuditEngine,
    direction: DirectionResolver,
    gate: JudgmentGate,
}

impl Default for IntakePipeline {
    fn default() -> Self {
        Self::new(&GateConfig::default())
    }
}

impl IntakePipeline {
    pub fn new(config: &GateConfig) -> Self {
        Self {
            consensus: ConsensusEngine::new(&config.consensus),
            audit: AuditEngine::new(&config.audit),
            direction: DirectionResolver,
            gate: JudgmentGate::new(config.judgment.clone()),
        }
    }

    pub fn with_arbitrator(mut self, arbitrator: Arc<dyn Arbitrator>) -> Self {
        self.gate = self.gate.with_arbitrator(arbitrator);
        self
    }

    pub fn gate(&self) -> &JudgmentGate {
        &self.gate
    }

    /// Runs every deterministic stage. The same intake always yields the same outcome.
    pub fn process(&self, intake: &DocumentIntake) -> PipelineOutcome {
        let (outcome, context) = self.prepare(intake);
        let decision = self.gate.evaluate(&context);
        self.finish(outcome, decision, intake)
    }

    /// Like [`IntakePipeline::process`], but lets the gate consult its arbitrator.
    pub async fn process_with_arbitration(&self, intake: &DocumentIntake) -> PipelineOutcome {
        let (outcome, context) = self.prepare(intake);
        let decision = self.gate.judge(&context).await;
        self.finish(outcome, decision, intake)
    }

    fn prepare(&self, intake: &DocumentIntake) -> (PendingOutcome, JudgmentContext) {
        let document_type = intake.classification.document_type;
        let consensus = self
            .consensus
            .merge(intake.fast.as_ref(), intake.expert.as_ref());

        let (direction, audit, essentials) = match consensus.document() {
            Some(document) => {
                let direction = self.direction.resolve(document, &intake.tenant, document_type);
                let integrity = self
                    .direction
                    .counterparty_integrity_check(&direction, &intake.tenant);
                let audit = self
                    .audit
                    .audit(document, &intake.payments)
                    .with_check(integrity);
                let essentials = assess_essential_fields(document_type, document);
                (Some(direction), audit, essentials)
            }
            None => (
                None,
                AuditReport::EMPTY,
                assess_essential_fields(document_type, &Default::default()),
            ),
        };

        let mut context = JudgmentContext::new(
            consensus.confidence(),
            audit.clone(),
            document_type,
            essentials.clone(),
        );
        if let Some(report) = consensus.report() {
            context = context.with_conflicts(report.clone());
        }
        if let Some(retry) = &intake.retry {
            context = context.with_retry(retry.clone());
        }

        let pending = PendingOutcome {
            consensus,
            direction,
            audit,
            essentials,
        };
        (pending, context)
    }

    fn finish(
        &self,
        pending: PendingOutcome,
        decision: JudgmentDecision,
        intake: &DocumentIntake,
    ) -> PipelineOutcome {
        info!(
            document_type = intake.classification.document_type.label(),
            outcome = decision.outcome.label(),
            confidence = decision.confidence,
            audit = pending.audit.overall_status().label(),
            "document judged"
        );

        PipelineOutcome {
            consensus: pending.consensus,
            direction: pending.direction,
            audit: pending.audit,
            essentials: pending.essentials,
            decision,
        }
    }
}

struct PendingOutcome {
    consensus: ConsensusResult,
    direction: Option<DirectionResolution>,
    audit: AuditReport,
    essentials: EssentialFieldsAssessment,
}
