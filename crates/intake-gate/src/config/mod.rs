use std::env;
use std::fmt;
use std::str::FromStr;

use rust_decimal::Decimal;

/// Distinguishes runtime behavior for different stages of the gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateEnvironment {
    Development,
    Test,
    Production,
}

impl GateEnvironment {
    fn from_str(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "prod" | "production" => Self::Production,
            "test" | "ci" => Self::Test,
            _ => Self::Development,
        }
    }
}

/// Top-level configuration for the intake gate.
#[derive(Debug, Clone, PartialEq)]
pub struct GateConfig {
    pub environment: GateEnvironment,
    pub consensus: ConsensusConfig,
    pub audit: AuditConfig,
    pub judgment: JudgmentConfig,
    pub telemetry: TelemetryConfig,
}

impl Default for GateConfig {
    fn default() -> Self {
        Self {
            environment: GateEnvironment::Development,
            consensus: ConsensusConfig::default(),
            audit: AuditConfig::default(),
            judgment: JudgmentConfig::default(),
            telemetry: TelemetryConfig::default(),
        }
    }
}

impl GateConfig {
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let environment = GateEnvironment::from_str(
            &env::var("INTAKE_ENV").unwrap_or_else(|_| "development".to_string()),
        );
        let log_level = env::var("INTAKE_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        let defaults = Self::default();

        let amount_tolerance = parse_var("INTAKE_AMOUNT_TOLERANCE", |raw| {
            Decimal::from_str(raw.trim())
                .ok()
                .filter(|value| !value.is_sign_negative())
        })?
        .unwrap_or(defaults.audit.amount_tolerance);

        let conflict_penalty = parse_var("INTAKE_CONFLICT_PENALTY", |raw| {
            raw.trim()
                .parse::<f32>()
                .ok()
                .filter(|value| (0.0..=1.0).contains(value))
        })?
        .unwrap_or(defaults.consensus.conflict_penalty);

        let arbitration_enabled = parse_var("INTAKE_ARBITRATION_ENABLED", parse_flag)?
            .unwrap_or(defaults.judgment.arbitration_enabled);

        let arbitration_timeout_ms = parse_var("INTAKE_ARBITRATION_TIMEOUT_MS", |raw| {
            raw.trim().parse::<u64>().ok().filter(|value| *value > 0)
        })?
        .unwrap_or(defaults.judgment.arbitration_timeout_ms);

        Ok(Self {
            environment,
            consensus: ConsensusConfig { conflict_penalty },
            audit: AuditConfig { amount_tolerance },
            judgment: JudgmentConfig {
                arbitration_enabled,
                arbitration_timeout_ms,
                ..defaults.judgment
            },
            telemetry: TelemetryConfig { log_level },
        })
    }
}

/// Confidence bookkeeping for the consensus merge.
#[derive(Debug, Clone, PartialEq)]
pub struct ConsensusConfig {
    /// Subtracted from the merged confidence once per conflicting field.
    pub conflict_penalty: f32,
}

impl Default for ConsensusConfig {
    fn default() -> Self {
        Self {
            conflict_penalty: 0.05,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AuditConfig {
    /// Inclusive absolute tolerance for every amount comparison.
    pub amount_tolerance: Decimal,
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            amount_tolerance: Decimal::new(2, 2),
        }
    }
}

/// Thresholds and arbitration controls for the judgment gate.
#[derive(Debug, Clone, PartialEq)]
pub struct JudgmentConfig {
    pub reject_below: f32,
    pub auto_approve_at: f32,
    pub clear_cut_approve_at: f32,
    pub clear_cut_review_below: f32,
    pub arbitration_enabled: bool,
    pub arbitration_timeout_ms: u64,
}

impl Default for JudgmentConfig {
    fn default() -> Self {
        Self {
            reject_below: 0.50,
            auto_approve_at: 0.80,
            clear_cut_approve_at: 0.85,
            clear_cut_review_below: 0.60,
            arbitration_enabled: false,
            arbitration_timeout_ms: 500,
        }
    }
}

/// Tracing controls.
#[derive(Debug, Clone, PartialEq)]
pub struct TelemetryConfig {
    pub log_level: String,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
        }
    }
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidValue { key: &'static str, value: String },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidValue { key, value } => {
                write!(f, "{key} has an invalid value '{value}'")
            }
        }
    }
}

impl std::error::Error for ConfigError {}

fn parse_var<T>(
    key: &'static str,
    parse: impl Fn(&str) -> Option<T>,
) -> Result<Option<T>, ConfigError> {
    match env::var(key) {
        Ok(raw) if raw.trim().is_empty() => Ok(None),
        Ok(raw) => parse(&raw)
            .map(Some)
            .ok_or(ConfigError::InvalidValue { key, value: raw }),
        Err(_) => Ok(None),
    }
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
