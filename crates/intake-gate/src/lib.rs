//! Decision core for financial document intake.
//!
//! Two independently produced extractions of the same document are reconciled, audited,
//! placed relative to the owning tenant, and judged. See [`pipeline::IntakePipeline`] for the
//! end-to-end entry point.

pub mod config;
pub mod error;
pub mod pipeline;
pub mod telemetry;
