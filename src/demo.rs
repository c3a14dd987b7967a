use chrono::NaiveDate;
use clap::Args;
use intake_gate::error::AppError;
use intake_gate::pipeline::{
    DocumentClassification, DocumentField, DocumentIntake, DocumentType, ExtractedDocument,
    ExtractionCandidate, FieldValue, IntakePipeline, LineItem, SourceOrigin, TenantIdentity,
};
use rust_decimal::Decimal;

use crate::render::{print_outcome, OutputFormat};

#[derive(Args, Debug, Default)]
pub(crate) struct DemoArgs {
    /// Print each outcome as JSON instead of a text summary
    #[arg(long)]
    pub(crate) json: bool,
}

pub(crate) async fn run_demo(pipeline: &IntakePipeline, args: DemoArgs) -> Result<(), AppError> {
    let format = OutputFormat::from_flag(args.json);
    for (index, (label, intake)) in scenarios().into_iter().enumerate() {
        if index > 0 && format == OutputFormat::Text {
            println!();
        }
        let outcome = pipeline.process_with_arbitration(&intake).await;
        print_outcome(label, &outcome, format)?;
    }
    Ok(())
}

pub(crate) fn scenarios() -> Vec<(&'static str, DocumentIntake)> {
    let invoice = classification(DocumentType::Invoice);
    let conflicting_fast = purchase_invoice()
        .with_field(DocumentField::TotalAmount, FieldValue::text("€ 1.201,00"));
    let self_billed = purchase_invoice()
        .with_field(DocumentField::VendorVat, FieldValue::text("BE 0123.456.789"));

    vec![
        (
            "clean purchase invoice",
            DocumentIntake::new(invoice.clone(), tenant())
                .with_fast(candidate(SourceOrigin::Fast, 0.86, purchase_invoice()))
                .with_expert(candidate(SourceOrigin::Expert, 0.95, purchase_invoice())),
        ),
        (
            "conflicting totals",
            DocumentIntake::new(invoice.clone(), tenant())
                .with_fast(candidate(SourceOrigin::Fast, 0.90, conflicting_fast))
                .with_expert(candidate(SourceOrigin::Expert, 0.93, purchase_invoice())),
        ),
        (
            "self-referential counterparty",
            DocumentIntake::new(invoice, tenant())
                .with_expert(candidate(SourceOrigin::Expert, 0.91, self_billed)),
        ),
        (
            "low-confidence receipt",
            DocumentIntake::new(classification(DocumentType::Receipt), tenant())
                .with_fast(candidate(SourceOrigin::Fast, 0.45, parking_receipt())),
        ),
    ]
}

fn tenant() -> TenantIdentity {
    TenantIdentity {
        vat_number: Some("BE0123456789".to_string()),
        legal_name: "Northwind Consulting BV".to_string(),
        person_names: vec!["Jo Peeters".to_string()],
    }
}

fn classification(document_type: DocumentType) -> DocumentClassification {
    DocumentClassification {
        document_type,
        confidence: 0.92,
        language: Some("nl".to_string()),
        reasoning: "demo scenario".to_string(),
    }
}

fn candidate(origin: SourceOrigin, confidence: f32, document: ExtractedDocument) -> ExtractionCandidate {
    ExtractionCandidate::new(origin, confidence, document)
}

fn purchase_invoice() -> ExtractedDocument {
    ExtractedDocument::default()
        .with_field(DocumentField::DocumentNumber, FieldValue::text("F2025-0117"))
        .with_field(DocumentField::IssueDate, date(2025, 3, 3))
        .with_field(DocumentField::DueDate, date(2025, 4, 2))
        .with_field(DocumentField::Currency, FieldValue::text("EUR"))
        .with_field(DocumentField::VendorName, FieldValue::text("Acme Supplies NV"))
        .with_field(DocumentField::VendorVat, FieldValue::text("BE0987654321"))
        .with_field(DocumentField::CustomerName, FieldValue::text("Northwind Consulting BV"))
        .with_field(DocumentField::CustomerVat, FieldValue::text("BE0123456789"))
        .with_field(DocumentField::Subtotal, FieldValue::Amount(Decimal::new(100_000, 2)))
        .with_field(DocumentField::VatAmount, FieldValue::Amount(Decimal::new(21_000, 2)))
        .with_field(DocumentField::TotalAmount, FieldValue::Amount(Decimal::new(121_000, 2)))
        .with_line_item(LineItem {
            description: Some("Implementation days".to_string()),
            quantity: Some(Decimal::new(8, 0)),
            unit_price: Some(Decimal::new(12_500, 2)),
            line_total: Some(Decimal::new(100_000, 2)),
        })
}

fn parking_receipt() -> ExtractedDocument {
    ExtractedDocument::default()
        .with_field(DocumentField::VendorName, FieldValue::text("Interparking"))
        .with_field(DocumentField::IssueDate, date(2025, 3, 12))
        .with_field(DocumentField::TotalAmount, FieldValue::text("14,50"))
}

fn date(year: i32, month: u32, day: u32) -> FieldValue {
    NaiveDate::from_ymd_opt(year, month, day)
        .map(FieldValue::Date)
        .unwrap_or_else(|| FieldValue::text(format!("{year:04}-{month:02}-{day:02}")))
}
