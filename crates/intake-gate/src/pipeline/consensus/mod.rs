//! Merges two extraction candidates of the same document into one.

mod conflict;

pub use conflict::{ConflictReport, ConflictSeverity, FieldConflict};

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::domain::{
    DocumentField, ExtractedDocument, ExtractionCandidate, FieldValue, SourceOrigin,
};
use crate::config::ConsensusConfig;
use conflict::EMPTY_CONFLICTS;

/// Merged document together with the confidence attached to it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MergedExtraction {
    pub document: ExtractedDocument,
    pub confidence: f32,
}

/// Outcome of merging zero, one, or two candidates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ConsensusResult {
    NoData,
    SingleSource {
        data: MergedExtraction,
        source: SourceOrigin,
    },
    Unanimous {
        data: MergedExtraction,
    },
    WithConflicts {
        data: MergedExtraction,
        report: ConflictReport,
    },
}

impl ConsensusResult {
    pub fn has_data(&self) -> bool {
        self.data().is_some()
    }

    pub fn data(&self) -> Option<&MergedExtraction> {
        match self {
            Self::NoData => None,
            Self::SingleSource { data, .. }
            | Self::Unanimous { data }
            | Self::WithConflicts { data, .. } => Some(data),
        }
    }

    /// Conflict report when two sources were compared; `None` otherwise.
    pub fn report(&self) -> Option<&ConflictReport> {
        match self {
            Self::NoData | Self::SingleSource { .. } => None,
            Self::Unanimous { .. } => Some(&EMPTY_CONFLICTS),
            Self::WithConflicts { report, .. } => Some(report),
        }
    }

    pub fn source_name(&self) -> Option<&'static str> {
        match self {
            Self::SingleSource { source, .. } => Some(source.label()),
            Self::NoData | Self::Unanimous { .. } | Self::WithConflicts { .. } => None,
        }
    }

    pub fn confidence(&self) -> f32 {
        self.data().map(|data| data.confidence).unwrap_or(0.0)
    }

    pub fn document(&self) -> Option<&ExtractedDocument> {
        self.data().map(|data| &data.document)
    }
}

/// Stateless merger applying the expert-wins tie-break.
#[derive(Debug, Clone)]
pub struct ConsensusEngine {
    conflict_penalty: f32,
}

impl Default for ConsensusEngine {
    fn default() -> Self {
        Self::new(&ConsensusConfig::default())
    }
}

impl ConsensusEngine {
    pub fn new(config: &ConsensusConfig) -> Self {
        let conflict_penalty = if config.conflict_penalty.is_finite() {
            config.conflict_penalty.max(0.0)
        } else {
            ConsensusConfig::default().conflict_penalty
        };
        Self { conflict_penalty }
    }

    /// Merge two optional candidates. When both carry the same origin tag the second one
    /// plays the expert.
    pub fn merge(
        &self,
        first: Option<&ExtractionCandidate>,
        second: Option<&ExtractionCandidate>,
    ) -> ConsensusResult {
        let (fast, expert) = match (first, second) {
            (None, None) => {
                debug!("no extraction candidates supplied");
                return ConsensusResult::NoData;
            }
            (Some(candidate), None) | (None, Some(candidate)) => {
                debug!(source = candidate.origin.label(), "single extraction source");
                return ConsensusResult::SingleSource {
                    data: MergedExtraction {
                        document: candidate.document.clone(),
                        confidence: candidate.clamped_confidence(),
                    },
                    source: candidate.origin,
                };
            }
            (Some(a), Some(b)) => {
                if a.origin == SourceOrigin::Expert && b.origin != SourceOrigin::Expert {
                    (b, a)
                } else {
                    (a, b)
                }
            }
        };

        let mut fields = BTreeMap::new();
        let mut conflicts = Vec::new();

        for field in DocumentField::ordered() {
            match (readable(&fast.document, field), readable(&expert.document, field)) {
                (None, None) => {}
                (Some(value), None) | (None, Some(value)) => {
                    fields.insert(field, value.clone());
                }
                (Some(fast_value), Some(expert_value)) => {
                    fields.insert(field, expert_value.clone());
                    if !values_agree(field, fast_value, expert_value) {
                        conflicts.push(FieldConflict {
                            field,
                            value_a: fast_value.clone(),
                            value_b: expert_value.clone(),
                            chosen_value: expert_value.clone(),
                            chosen_source: SourceOrigin::Expert,
                            severity: ConflictSeverity::for_field(field),
                        });
                    }
                }
            }
        }

        let line_items = if expert.document.line_items.is_empty() {
            fast.document.line_items.clone()
        } else {
            expert.document.line_items.clone()
        };

        let confidence = self.merged_confidence(
            fast.clamped_confidence(),
            expert.clamped_confidence(),
            conflicts.len(),
        );
        let data = MergedExtraction {
            document: ExtractedDocument { fields, line_items },
            confidence,
        };

        debug!(conflicts = conflicts.len(), confidence, "merged extraction candidates");

        if conflicts.is_empty() {
            ConsensusResult::Unanimous { data }
        } else {
            ConsensusResult::WithConflicts {
                data,
                report: ConflictReport::new(conflicts),
            }
        }
    }

    /// Expert-weighted average, reduced per conflict and floored at zero.
    fn merged_confidence(&self, fast: f32, expert: f32, conflicts: usize) -> f32 {
        let weighted = (fast + 2.0 * expert) / 3.0;
        let penalty = self.conflict_penalty * conflicts as f32;
        (weighted - penalty).clamp(0.0, 1.0)
    }
}

fn readable(document: &ExtractedDocument, field: DocumentField) -> Option<&FieldValue> {
    document
        .get(field)
        .filter(|value| value.is_readable(field.kind()))
}

fn values_agree(field: DocumentField, left: &FieldValue, right: &FieldValue) -> bool {
    let kind = field.kind();
    left.normalized(kind) == right.normalized(kind)
}
