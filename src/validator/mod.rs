//! Multi-tool integrity validation.
//!
//! Combines the magic-byte sniff with every registered external capability
//! into a single verdict per file:
//!
//!   all tools pass + valid magic  -> valid
//!   at least one tool passes      -> corrupted (classification follows)
//!   all tools fail                -> unrecoverable

pub mod capability;

pub use capability::{CommandValidator, DecodeValidator, ExternalValidator};

use crate::classifier;
use crate::error::{Result, TriageError};
use crate::magic;
use crate::types::{CorruptionTag, FileRecord, ToolResult, Verdict, VerdictStatus};

pub struct Validator {
    capabilities: Vec<Box<dyn ExternalValidator>>,
}

impl Validator {
    /// Build a validator from registered capabilities.
    ///
    /// At least one capability (the decode-and-verify check) must be
    /// registered; running a batch with zero validators would make every
    /// verdict vacuously unrecoverable, so that is a fatal configuration
    /// error caught before any file is touched.
    pub fn new(capabilities: Vec<Box<dyn ExternalValidator>>) -> Result<Self> {
        if capabilities.is_empty() {
            return Err(TriageError::MissingDecodeCapability);
        }
        Ok(Self { capabilities })
    }

    pub fn capability_names(&self) -> Vec<&str> {
        self.capabilities.iter().map(|c| c.name()).collect()
    }

    /// Validate one file. Read-only; never fails the batch. A file that
    /// cannot be inspected at all gets an unrecoverable verdict with an
    /// explicit error string.
    pub fn validate(&self, record: &FileRecord) -> Verdict {
        let size = match std::fs::metadata(&record.path) {
            Ok(meta) => meta.len(),
            Err(e) => {
                return Verdict::Unrecoverable {
                    tool_results: Vec::new(),
                    corruption: CorruptionTag::FalsePositive,
                    error: Some(format!("file not found: {}", e)),
                };
            }
        };
        if size == 0 {
            return Verdict::Unrecoverable {
                tool_results: Vec::new(),
                corruption: CorruptionTag::FalsePositive,
                error: Some("empty file (0 bytes)".to_string()),
            };
        }

        let magic_valid = magic::sniff(&record.path, record.declared_format);

        let tool_results: Vec<ToolResult> = self
            .capabilities
            .iter()
            .map(|cap| cap.check(&record.path))
            .collect();

        Self::verdict_from(magic_valid, tool_results)
    }

    /// Apply the status decision rule and classification to raw signals
    fn verdict_from(magic_valid: bool, tool_results: Vec<ToolResult>) -> Verdict {
        let passed = tool_results.iter().filter(|r| r.passed).count();
        let total = tool_results.len();

        if passed == total && magic_valid {
            Verdict::Valid { tool_results }
        } else if passed > 0 {
            let corruption =
                classifier::classify(VerdictStatus::Corrupted, magic_valid, &tool_results);
            Verdict::Corrupted {
                magic_valid,
                tool_results,
                corruption,
            }
        } else {
            let corruption =
                classifier::classify(VerdictStatus::Unrecoverable, magic_valid, &tool_results);
            Verdict::Unrecoverable {
                tool_results,
                corruption,
                error: None,
            }
        }
    }
}
