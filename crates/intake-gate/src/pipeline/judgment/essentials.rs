use serde::{Deserialize, Serialize};

use super::super::domain::{DocumentField, DocumentType, ExtractedDocument};

/// Which fields the document type requires, and which of them could not be found.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EssentialFieldsAssessment {
    pub present: bool,
    pub missing: Vec<String>,
}

impl EssentialFieldsAssessment {
    fn satisfied() -> Self {
        Self {
            present: true,
            missing: Vec::new(),
        }
    }

    fn lacking(fields: &[&str]) -> Self {
        Self {
            present: false,
            missing: fields.iter().map(|field| field.to_string()).collect(),
        }
    }
}

pub fn assess_essential_fields(
    document_type: DocumentType,
    document: &ExtractedDocument,
) -> EssentialFieldsAssessment {
    let total = document.has(DocumentField::TotalAmount);
    let subtotal = document.has(DocumentField::Subtotal);
    let vat = document.has(DocumentField::VatAmount);
    let issued = document.has(DocumentField::IssueDate);
    let vendor = document.has(DocumentField::VendorName);

    match document_type {
        DocumentType::Invoice => {
            if total || (subtotal && vat) {
                EssentialFieldsAssessment::satisfied()
            } else if subtotal {
                EssentialFieldsAssessment::lacking(&[DocumentField::VatAmount.label()])
            } else {
                EssentialFieldsAssessment::lacking(&[DocumentField::TotalAmount.label()])
            }
        }
        DocumentType::Bill => {
            if total {
                EssentialFieldsAssessment::satisfied()
            } else {
                EssentialFieldsAssessment::lacking(&[DocumentField::TotalAmount.label()])
            }
        }
        DocumentType::Receipt => match (total, vendor || issued) {
            (true, true) => EssentialFieldsAssessment::satisfied(),
            (true, false) => EssentialFieldsAssessment::lacking(&[
                DocumentField::VendorName.label(),
                DocumentField::IssueDate.label(),
            ]),
            (false, true) => {
                EssentialFieldsAssessment::lacking(&[DocumentField::TotalAmount.label()])
            }
            (false, false) => EssentialFieldsAssessment::lacking(&[
                DocumentField::TotalAmount.label(),
                DocumentField::VendorName.label(),
                DocumentField::IssueDate.label(),
            ]),
        },
        DocumentType::Unclassified => EssentialFieldsAssessment::lacking(&["document_type"]),
    }
}
