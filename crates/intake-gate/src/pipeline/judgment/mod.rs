//! Final routing decision: approve, send to review, or reject.
//!
//! The deterministic phase always runs. Arbitration is consulted only for decisions that are
//! not clear-cut, and any arbitration failure leaves the deterministic decision in place.

mod arbitration;
mod context;
mod essentials;
mod policy;
mod retry;

pub use arbitration::{
    parse_arbitration_response, ArbitrationError, ArbitrationSummary, ArbitrationVerdict,
    Arbitrator,
};
pub use context::{DecisionSource, JudgmentContext, JudgmentDecision, JudgmentOutcome};
pub use essentials::{assess_essential_fields, EssentialFieldsAssessment};
pub use retry::RetryResult;

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::config::JudgmentConfig;

pub struct JudgmentGate {
    config: JudgmentConfig,
    arbitrator: Option<Arc<dyn Arbitrator>>,
}

impl Default for JudgmentGate {
    fn default() -> Self {
        Self::new(JudgmentConfig::default())
    }
}

impl JudgmentGate {
    pub fn new(config: JudgmentConfig) -> Self {
        Self {
            config,
            arbitrator: None,
        }
    }

    pub fn with_arbitrator(mut self, arbitrator: Arc<dyn Arbitrator>) -> Self {
        self.arbitrator = Some(arbitrator);
        self
    }

    pub fn config(&self) -> &JudgmentConfig {
        &self.config
    }

    /// Deterministic decision only; never consults the arbitrator.
    pub fn evaluate(&self, context: &JudgmentContext) -> JudgmentDecision {
        let decision = policy::decide(context, &self.config);
        debug!(
            outcome = decision.outcome.label(),
            confidence = decision.confidence,
            issues = decision.issues_for_user.len(),
            "deterministic judgment"
        );
        decision
    }

    pub fn is_clear_cut(&self, decision: &JudgmentDecision) -> bool {
        policy::is_clear_cut(decision, &self.config)
    }

    /// Deterministic decision, refined by the arbitrator when one is enabled and the case is
    /// borderline.
    pub async fn judge(&self, context: &JudgmentContext) -> JudgmentDecision {
        let deterministic = self.evaluate(context);

        let Some(arbitrator) = self.arbitrator.as_ref() else {
            return deterministic;
        };
        if !self.config.arbitration_enabled || self.is_clear_cut(&deterministic) {
            return deterministic;
        }

        let summary = ArbitrationSummary::from_context(context, &deterministic);
        let timeout_ms = self.config.arbitration_timeout_ms;
        let verdict = match tokio::time::timeout(
            Duration::from_millis(timeout_ms),
            arbitrator.arbitrate(&summary),
        )
        .await
        {
            Ok(result) => result,
            Err(_) => Err(ArbitrationError::Timeout(timeout_ms)),
        };

        match verdict {
            Ok(verdict) => {
                let decision = policy::apply_verdict(&deterministic, verdict, context);
                info!(
                    deterministic = deterministic.outcome.label(),
                    arbitrated = decision.outcome.label(),
                    "arbitration completed"
                );
                decision
            }
            Err(err) => {
                warn!(
                    error = %err,
                    outcome = deterministic.outcome.label(),
                    "arbitration failed, keeping deterministic decision"
                );
                deterministic
            }
        }
    }
}
