use std::fs;
use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand, ValueEnum};
use intake_gate::config::GateConfig;
use intake_gate::error::AppError;
use intake_gate::pipeline::{
    DocumentClassification, DocumentIntake, DocumentType, ExtractionCandidate, IntakePipeline,
    PaymentValidation, RetryResult, TenantIdentity,
};
use intake_gate::telemetry;
use serde::de::DeserializeOwned;
use tracing::info;

use crate::demo::{run_demo, DemoArgs};
use crate::render::{print_outcome, OutputFormat};

#[derive(Parser, Debug)]
#[command(
    name = "intake-gate",
    about = "Reconcile, audit and judge extracted financial documents",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Judge one document from extraction candidates stored as JSON files
    Judge(JudgeArgs),
    /// Run the built-in scenarios and print their verdicts
    Demo(DemoArgs),
}

#[derive(Args, Debug)]
pub(crate) struct JudgeArgs {
    /// Extraction candidate produced by the expert pass
    #[arg(long)]
    pub(crate) expert: PathBuf,
    /// Extraction candidate produced by the fast pass
    #[arg(long)]
    pub(crate) fast: Option<PathBuf>,
    /// Identity of the tenant that owns the document
    #[arg(long)]
    pub(crate) tenant: PathBuf,
    /// Document class reported by the classifier
    #[arg(long, value_enum)]
    pub(crate) document_type: DocumentTypeArg,
    /// IBAN and payment reference checksum results
    #[arg(long)]
    pub(crate) payments: Option<PathBuf>,
    /// Outcome of a self-correction pass over the failing fields
    #[arg(long)]
    pub(crate) retry: Option<PathBuf>,
    /// Print the full pipeline outcome as JSON
    #[arg(long)]
    pub(crate) json: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub(crate) enum DocumentTypeArg {
    Invoice,
    Bill,
    Receipt,
    Unclassified,
}

impl From<DocumentTypeArg> for DocumentType {
    fn from(value: DocumentTypeArg) -> Self {
        match value {
            DocumentTypeArg::Invoice => DocumentType::Invoice,
            DocumentTypeArg::Bill => DocumentType::Bill,
            DocumentTypeArg::Receipt => DocumentType::Receipt,
            DocumentTypeArg::Unclassified => DocumentType::Unclassified,
        }
    }
}

pub(crate) async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let config = GateConfig::load()?;
    telemetry::init(&config.telemetry)?;
    info!(environment = ?config.environment, "intake gate starting");

    let pipeline = IntakePipeline::new(&config);
    match cli.command {
        Command::Judge(args) => run_judge(&pipeline, args).await,
        Command::Demo(args) => run_demo(&pipeline, args).await,
    }
}

async fn run_judge(pipeline: &IntakePipeline, args: JudgeArgs) -> Result<(), AppError> {
    let intake = load_intake(&args)?;
    let outcome = pipeline.process_with_arbitration(&intake).await;
    let format = OutputFormat::from_flag(args.json);
    print_outcome(args.expert.display().to_string().as_str(), &outcome, format)
}

pub(crate) fn load_intake(args: &JudgeArgs) -> Result<DocumentIntake, AppError> {
    let expert: ExtractionCandidate = read_json(&args.expert)?;
    let fast = args
        .fast
        .as_deref()
        .map(read_json::<ExtractionCandidate>)
        .transpose()?;
    let tenant: TenantIdentity = read_json(&args.tenant)?;
    let payments = args
        .payments
        .as_deref()
        .map(read_json::<PaymentValidation>)
        .transpose()?
        .unwrap_or_default();
    let retry = args
        .retry
        .as_deref()
        .map(read_json::<RetryResult>)
        .transpose()?;

    let classification = DocumentClassification {
        document_type: args.document_type.into(),
        confidence: 1.0,
        language: None,
        reasoning: "supplied on the command line".to_string(),
    };

    let mut intake = DocumentIntake::new(classification, tenant)
        .with_expert(expert)
        .with_payments(payments);
    intake.fast = fast;
    intake.retry = retry;
    Ok(intake)
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, AppError> {
    let raw = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&raw)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use std::env;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn judge_arguments_parse() {
        let cli = Cli::try_parse_from([
            "intake-gate",
            "judge",
            "--expert",
            "expert.json",
            "--tenant",
            "tenant.json",
            "--document-type",
            "receipt",
            "--json",
        ])
        .expect("arguments parse");

        match cli.command {
            Command::Judge(args) => {
                assert_eq!(args.document_type, DocumentTypeArg::Receipt);
                assert!(args.fast.is_none());
                assert!(args.json);
            }
            other => panic!("expected judge command, got {other:?}"),
        }
    }

    #[test]
    fn missing_input_file_is_an_io_error() {
        let args = JudgeArgs {
            expert: env::temp_dir().join("intake-gate-missing-expert.json"),
            fast: None,
            tenant: env::temp_dir().join("intake-gate-missing-tenant.json"),
            document_type: DocumentTypeArg::Invoice,
            payments: None,
            retry: None,
            json: false,
        };

        let err = load_intake(&args).expect_err("files do not exist");
        assert!(matches!(err, AppError::Io(_)));
    }

    #[test]
    fn intake_is_assembled_from_json_files() {
        let dir = env::temp_dir().join(format!("intake-gate-cli-{}", std::process::id()));
        fs::create_dir_all(&dir).expect("temp dir");
        let expert = dir.join("expert.json");
        let tenant = dir.join("tenant.json");
        fs::write(
            &expert,
            r#"{"origin": "expert", "confidence": 0.9, "fields": {"total_amount": "121.00"}}"#,
        )
        .expect("write expert");
        fs::write(&tenant, r#"{"legal_name": "Northwind Consulting BV"}"#).expect("write tenant");

        let args = JudgeArgs {
            expert,
            fast: None,
            tenant,
            document_type: DocumentTypeArg::Bill,
            payments: None,
            retry: None,
            json: true,
        };
        let intake = load_intake(&args).expect("intake loads");
        fs::remove_dir_all(&dir).ok();

        assert_eq!(intake.document_type(), DocumentType::Bill);
        assert!(intake.expert.is_some());
        assert_eq!(intake.payments, PaymentValidation::default());
        assert!(intake.retry.is_none());
    }

    #[test]
    fn retry_outcome_is_read_from_json() {
        let dir = env::temp_dir().join(format!("intake-gate-retry-{}", std::process::id()));
        fs::create_dir_all(&dir).expect("temp dir");
        let expert = dir.join("expert.json");
        let tenant = dir.join("tenant.json");
        let retry = dir.join("retry.json");
        fs::write(&expert, r#"{"origin": "expert", "confidence": 0.9}"#).expect("write expert");
        fs::write(&tenant, r#"{"legal_name": "Northwind Consulting BV"}"#).expect("write tenant");
        fs::write(
            &retry,
            r#"{"kind": "corrected_on_retry", "attempt": 2, "corrected_fields": ["total_amount"]}"#,
        )
        .expect("write retry");

        let args = JudgeArgs {
            expert,
            fast: None,
            tenant,
            document_type: DocumentTypeArg::Invoice,
            payments: None,
            retry: Some(retry),
            json: false,
        };
        let intake = load_intake(&args).expect("intake loads");
        fs::remove_dir_all(&dir).ok();

        assert_eq!(
            intake.retry,
            Some(RetryResult::CorrectedOnRetry {
                attempt: 2,
                corrected_fields: vec!["total_amount".to_string()],
            })
        );
    }
}
