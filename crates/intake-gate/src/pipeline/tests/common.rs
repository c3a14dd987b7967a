use std::str::FromStr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use rust_decimal::Decimal;

use crate::config::JudgmentConfig;
use crate::pipeline::audit::{AuditCheck, AuditReport, CheckType, FailureSeverity};
use crate::pipeline::domain::{
    DocumentClassification, DocumentField, DocumentType, ExtractedDocument, ExtractionCandidate,
    FieldValue, LineItem, SourceOrigin, TenantIdentity,
};
use crate::pipeline::judgment::{
    ArbitrationError, ArbitrationSummary, ArbitrationVerdict, Arbitrator, EssentialFieldsAssessment,
    JudgmentContext, JudgmentOutcome,
};
use crate::pipeline::service::DocumentIntake;

pub(super) fn amount(raw: &str) -> Decimal {
    Decimal::from_str(raw).expect("valid decimal")
}

pub(super) fn tenant() -> TenantIdentity {
    TenantIdentity {
        vat_number: Some("BE0123456789".to_string()),
        legal_name: "Northwind Consulting BV".to_string(),
        person_names: vec!["Jo Peeters".to_string()],
    }
}

/// Purchase invoice from Acme addressed to the tenant, with consistent totals.
pub(super) fn clean_invoice() -> ExtractedDocument {
    ExtractedDocument::default()
        .with_field(DocumentField::DocumentNumber, FieldValue::text("INV-2025-0042"))
        .with_field(DocumentField::IssueDate, FieldValue::text("2025-03-01"))
        .with_field(DocumentField::DueDate, FieldValue::text("2025-03-31"))
        .with_field(DocumentField::Currency, FieldValue::text("EUR"))
        .with_field(DocumentField::VendorName, FieldValue::text("Acme Supplies NV"))
        .with_field(DocumentField::VendorVat, FieldValue::text("BE0987654321"))
        .with_field(DocumentField::CustomerName, FieldValue::text("Northwind Consulting BV"))
        .with_field(DocumentField::CustomerVat, FieldValue::text("BE0123456789"))
        .with_field(DocumentField::Subtotal, FieldValue::Amount(amount("100.00")))
        .with_field(DocumentField::VatAmount, FieldValue::Amount(amount("21.00")))
        .with_field(DocumentField::TotalAmount, FieldValue::Amount(amount("121.00")))
        .with_line_item(line_item("Consulting", "2", "40.00", "80.00"))
        .with_line_item(line_item("Travel", "1", "20.00", "20.00"))
}

pub(super) fn line_item(description: &str, quantity: &str, unit: &str, total: &str) -> LineItem {
    LineItem {
        description: Some(description.to_string()),
        quantity: Some(amount(quantity)),
        unit_price: Some(amount(unit)),
        line_total: Some(amount(total)),
    }
}

pub(super) fn fast(confidence: f32, document: ExtractedDocument) -> ExtractionCandidate {
    ExtractionCandidate::new(SourceOrigin::Fast, confidence, document)
}

pub(super) fn expert(confidence: f32, document: ExtractedDocument) -> ExtractionCandidate {
    ExtractionCandidate::new(SourceOrigin::Expert, confidence, document)
}

pub(super) fn classification(document_type: DocumentType) -> DocumentClassification {
    DocumentClassification {
        document_type,
        confidence: 0.9,
        language: Some("nl".to_string()),
        reasoning: "layout and keywords".to_string(),
    }
}

pub(super) fn intake(
    document_type: DocumentType,
    fast_candidate: Option<ExtractionCandidate>,
    expert_candidate: Option<ExtractionCandidate>,
) -> DocumentIntake {
    let mut intake = DocumentIntake::new(classification(document_type), tenant());
    intake.fast = fast_candidate;
    intake.expert = expert_candidate;
    intake
}

pub(super) fn passing_audit() -> AuditReport {
    AuditReport::new(vec![AuditCheck::pass(
        CheckType::Math,
        "total_amount",
        "subtotal 100.00 + vat 21.00 matches total 121.00",
    )])
}

pub(super) fn warning_audit() -> AuditReport {
    passing_audit().with_check(
        AuditCheck::fail(
            CheckType::LineItems,
            "subtotal",
            FailureSeverity::Warning,
            "line items sum to 80.00 but subtotal is 100.00",
        )
        .with_hint("some line items may be missing from the extraction"),
    )
}

pub(super) fn critical_audit() -> AuditReport {
    passing_audit().with_check(AuditCheck::fail(
        CheckType::Math,
        "total_amount",
        FailureSeverity::Critical,
        "subtotal + vat = 121.00 but total is 120.00",
    ))
}

pub(super) fn essentials_present() -> EssentialFieldsAssessment {
    EssentialFieldsAssessment {
        present: true,
        missing: Vec::new(),
    }
}

pub(super) fn context(confidence: f32, audit: AuditReport) -> JudgmentContext {
    JudgmentContext::new(confidence, audit, DocumentType::Invoice, essentials_present())
}

pub(super) fn arbitration_config() -> JudgmentConfig {
    JudgmentConfig {
        arbitration_enabled: true,
        arbitration_timeout_ms: 50,
        ..JudgmentConfig::default()
    }
}

/// Arbitrator replaying a fixed reply and counting how often it was asked.
pub(super) struct ScriptedArbitrator {
    reply: Result<ArbitrationVerdict, String>,
    delay: Option<Duration>,
    calls: AtomicUsize,
}

impl ScriptedArbitrator {
    pub(super) fn verdict(outcome: JudgmentOutcome, confidence: f32) -> Self {
        Self {
            reply: Ok(ArbitrationVerdict {
                outcome,
                confidence,
                reasoning: "arbitrated".to_string(),
                issues: Vec::new(),
            }),
            delay: None,
            calls: AtomicUsize::new(0),
        }
    }

    pub(super) fn failing(message: &str) -> Self {
        Self {
            reply: Err(message.to_string()),
            delay: None,
            calls: AtomicUsize::new(0),
        }
    }

    pub(super) fn slow(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub(super) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Arbitrator for ScriptedArbitrator {
    async fn arbitrate(
        &self,
        _summary: &ArbitrationSummary,
    ) -> Result<ArbitrationVerdict, ArbitrationError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        match &self.reply {
            Ok(verdict) => Ok(verdict.clone()),
            Err(raw) => Err(ArbitrationError::Malformed(raw.clone())),
        }
    }
}
