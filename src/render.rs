use intake_gate::error::AppError;
use intake_gate::pipeline::PipelineOutcome;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum OutputFormat {
    Text,
    Json,
}

impl OutputFormat {
    pub(crate) fn from_flag(json: bool) -> Self {
        if json {
            Self::Json
        } else {
            Self::Text
        }
    }
}

pub(crate) fn print_outcome(
    label: &str,
    outcome: &PipelineOutcome,
    format: OutputFormat,
) -> Result<(), AppError> {
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(outcome)?),
        OutputFormat::Text => println!("{}", render_text(label, outcome)),
    }
    Ok(())
}

pub(crate) fn render_text(label: &str, outcome: &PipelineOutcome) -> String {
    let decision = &outcome.decision;
    let mut lines = vec![
        format!("Document: {label}"),
        format!(
            "Verdict: {} (confidence {:.2})",
            decision.outcome.label(),
            decision.confidence
        ),
        format!("Reasoning: {}", decision.reasoning),
    ];

    let conflicts = outcome
        .consensus
        .report()
        .map(|report| report.len())
        .unwrap_or(0);
    match outcome.consensus.source_name() {
        Some(source) => lines.push(format!("Consensus: single source ({source})")),
        None if outcome.consensus.has_data() => {
            lines.push(format!("Consensus: {conflicts} conflict(s)"))
        }
        None => lines.push("Consensus: no extraction data".to_string()),
    }

    if let Some(direction) = &outcome.direction {
        let counterparty = direction
            .counterparty_name
            .as_deref()
            .or(direction.counterparty_vat.as_deref())
            .unwrap_or("unknown");
        lines.push(format!(
            "Direction: {} via {} ({:.2}), counterparty {counterparty}",
            direction.direction.label(),
            direction.source.label(),
            direction.confidence
        ));
    }

    lines.push(format!(
        "Audit: {} ({} passed, {} failed)",
        outcome.audit.overall_status().label(),
        outcome.audit.passed_count(),
        outcome.audit.failed_count()
    ));
    for check in outcome.audit.failures() {
        lines.push(format!("- [{}] {}", check.severity().label(), check.summary()));
    }

    if !outcome.essentials.present {
        lines.push(format!(
            "Missing essentials: {}",
            outcome.essentials.missing.join(", ")
        ));
    }

    if decision.issues_for_user.is_empty() {
        lines.push("Issues: none".to_string());
    } else {
        lines.push("Issues".to_string());
        lines.extend(decision.issues_for_user.iter().map(|issue| format!("- {issue}")));
    }

    lines.join("\n")
}
