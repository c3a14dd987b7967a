//! Decision core of the document intake pipeline.
//!
//! Two extraction candidates are merged by [`consensus`], checked by [`audit`], placed
//! relative to the tenant by [`direction`], and routed by [`judgment`]. [`IntakePipeline`]
//! wires the stages together.

pub mod audit;
pub mod consensus;
pub mod direction;
pub mod domain;
pub mod judgment;
pub mod normalizer;
pub mod service;

#[cfg(test)]
mod tests;

pub use audit::{
    AuditCheck, AuditEngine, AuditReport, AuditStatus, CheckType, PaymentValidation, Severity,
    ValidationResult,
};
pub use consensus::{
    ConflictReport, ConflictSeverity, ConsensusEngine, ConsensusResult, FieldConflict,
    MergedExtraction,
};
pub use direction::{Direction, DirectionResolution, DirectionResolver, ResolutionMethod};
pub use domain::{
    DocumentClassification, DocumentField, DocumentType, ExtractedDocument, ExtractionCandidate,
    FieldValue, LineItem, SourceOrigin, TenantIdentity,
};
pub use judgment::{
    assess_essential_fields, parse_arbitration_response, ArbitrationError, ArbitrationSummary,
    ArbitrationVerdict, Arbitrator, DecisionSource, EssentialFieldsAssessment, JudgmentContext,
    JudgmentDecision, JudgmentGate, JudgmentOutcome, RetryResult,
};
pub use normalizer::parse_amount;
pub use service::{DocumentIntake, IntakePipeline, PipelineOutcome};
