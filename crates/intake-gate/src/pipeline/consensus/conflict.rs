use serde::{Deserialize, Serialize};

use super::super::domain::{DocumentField, FieldValue, SourceOrigin};

/// How much a disagreement between sources matters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConflictSeverity {
    Warning,
    Critical,
}

impl ConflictSeverity {
    pub const fn for_field(field: DocumentField) -> Self {
        if field.is_critical() {
            Self::Critical
        } else {
            Self::Warning
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Warning => "WARNING",
            Self::Critical => "CRITICAL",
        }
    }
}

/// A field on which the fast and expert sources disagree after normalization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldConflict {
    pub field: DocumentField,
    /// Value read by the fast source.
    pub value_a: FieldValue,
    /// Value read by the expert source.
    pub value_b: FieldValue,
    pub chosen_value: FieldValue,
    pub chosen_source: SourceOrigin,
    pub severity: ConflictSeverity,
}

impl FieldConflict {
    pub fn describe(&self) -> String {
        format!(
            "{} differs between sources ({} vs {}), kept {} value {}",
            self.field.label(),
            self.value_a,
            self.value_b,
            self.chosen_source.label(),
            self.chosen_value
        )
    }
}

/// Ordered conflicts found while merging two candidates.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConflictReport {
    conflicts: Vec<FieldConflict>,
}

pub(crate) static EMPTY_CONFLICTS: ConflictReport = ConflictReport::EMPTY;

impl ConflictReport {
    pub const EMPTY: ConflictReport = ConflictReport {
        conflicts: Vec::new(),
    };

    pub fn new(conflicts: Vec<FieldConflict>) -> Self {
        Self { conflicts }
    }

    pub fn conflicts(&self) -> &[FieldConflict] {
        &self.conflicts
    }

    pub fn len(&self) -> usize {
        self.conflicts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.conflicts.is_empty()
    }

    pub fn has_conflicts(&self) -> bool {
        !self.conflicts.is_empty()
    }

    pub fn critical_conflicts(&self) -> Vec<&FieldConflict> {
        self.with_severity(ConflictSeverity::Critical)
    }

    pub fn warning_conflicts(&self) -> Vec<&FieldConflict> {
        self.with_severity(ConflictSeverity::Warning)
    }

    pub fn get(&self, field: DocumentField) -> Option<&FieldConflict> {
        self.conflicts.iter().find(|conflict| conflict.field == field)
    }

    fn with_severity(&self, severity: ConflictSeverity) -> Vec<&FieldConflict> {
        self.conflicts
            .iter()
            .filter(|conflict| conflict.severity == severity)
            .collect()
    }
}
