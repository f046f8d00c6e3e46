//! Photo triage pipeline for files recovered from damaged media
//!
//! Three stages over a batch of recovered images:
//! - Multi-tool integrity validation (magic bytes, decode-and-verify,
//!   optional host CLI validators) with per-file panic isolation
//! - A rule-based repair decision computed once per batch from aggregate
//!   statistics and empirical per-corruption success priors
//! - Structural JPEG repair on working copies (footer, header, segment
//!   chain rebuild, partial-decode re-encode) with post-repair
//!   re-validation
//!
//! Originals are treated as evidence and never modified.

pub mod classifier;
pub mod cli;
pub mod error;
pub mod magic;
pub mod pipeline;
pub mod planner;
pub mod repair;
pub mod report;
pub mod types;
pub mod validator;

// Re-export commonly used types
pub use error::{Result, TriageError};
pub use pipeline::{Orchestrator, RunMode};
pub use planner::{decide, estimate_success_percent};
pub use repair::{RepairOutcome, StructuralRepairEngine};
pub use report::{summarize_repairs, summarize_validation, TriageReport};
pub use types::{
    BatchStats, Confidence, CorruptionTag, Decision, FileRecord, FileVerdict, FinalStatus,
    ImageFormat, RepairAttempt, RepairTechnique, RepairableEntry, Repairability, Strategy,
    ToolResult, Verdict, VerdictStatus,
};
pub use validator::{CommandValidator, DecodeValidator, ExternalValidator, Validator};
