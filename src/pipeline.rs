//! Batch orchestration: validate, decide, repair, re-validate.
//!
//! Validation fans out across a rayon pool with per-file panic isolation,
//! so one pathological file cannot take down the batch. Repair is a
//! sequential pass over the planner's candidates; every technique runs on
//! a working copy and the evidence original is never opened for writing.

use crate::error::Result;
use crate::planner;
use crate::repair::StructuralRepairEngine;
use crate::report::{self, TriageReport};
use crate::types::{
    CorruptionTag, FileRecord, FileVerdict, FinalStatus, RepairAttempt, RepairTechnique,
    RepairableEntry, Strategy, Verdict,
};
use crate::validator::Validator;
use rayon::prelude::*;
use std::path::{Path, PathBuf};

/// How the repair phase is gated
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunMode {
    /// Follow the planner's decision
    Auto,
    /// Compute the decision, never repair
    DecideOnly,
    /// Repair all candidates regardless of the decision
    ForceRepair,
}

pub struct Orchestrator {
    validator: Validator,
    engine: StructuralRepairEngine,
    output_dir: PathBuf,
    quiet: bool,
}

impl Orchestrator {
    pub fn new(validator: Validator, output_dir: PathBuf, quiet: bool) -> Self {
        Self {
            validator,
            engine: StructuralRepairEngine::new(),
            output_dir,
            quiet,
        }
    }

    fn working_dir(&self) -> PathBuf {
        self.output_dir.join("working")
    }

    fn repaired_dir(&self) -> PathBuf {
        self.output_dir.join("repaired")
    }

    fn failed_dir(&self) -> PathBuf {
        self.output_dir.join("failed")
    }

    /// Validate every record in parallel. A panic inside a validator is
    /// contained to its file and surfaces as an unrecoverable verdict.
    pub fn validate_batch(&self, records: &[FileRecord]) -> Vec<FileVerdict> {
        records
            .par_iter()
            .map(|record| {
                let verdict = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
                    self.validator.validate(record)
                }))
                .unwrap_or_else(|_| Verdict::Unrecoverable {
                    tool_results: Vec::new(),
                    corruption: CorruptionTag::FalsePositive,
                    error: Some("validator panicked on this file".to_string()),
                });
                FileVerdict {
                    record: record.clone(),
                    verdict,
                }
            })
            .collect()
    }

    /// Attempt repair for every candidate, sequentially
    pub fn repair_batch(&self, candidates: &[RepairableEntry]) -> Vec<RepairAttempt> {
        candidates
            .iter()
            .map(|entry| self.repair_one(entry))
            .collect()
    }

    fn repair_one(&self, entry: &RepairableEntry) -> RepairAttempt {
        let file_name = entry
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| "unnamed.jpg".into());

        if !entry.path.exists() {
            return RepairAttempt {
                path: entry.path.clone(),
                corruption: entry.corruption,
                technique: None,
                repair_succeeded: false,
                message: "source file not found".to_string(),
                post_verdict: None,
                final_status: FinalStatus::Skipped,
            };
        }

        let working_copy = self.working_dir().join(&file_name);
        if let Err(e) = std::fs::copy(&entry.path, &working_copy) {
            return RepairAttempt {
                path: entry.path.clone(),
                corruption: entry.corruption,
                technique: None,
                repair_succeeded: false,
                message: format!("cannot create working copy: {}", e),
                post_verdict: None,
                final_status: FinalStatus::Skipped,
            };
        }

        // The missing-trailer fix runs before tag dispatch; when it alone
        // makes the copy validate there is no need for a heavier technique
        let mut messages: Vec<String> = Vec::new();
        if !self.engine.has_footer(&working_copy) {
            let outcome = self.engine.repair_footer(&working_copy);
            if outcome.success {
                messages.push(format!("footer: {}", outcome.message));
                let post = self.revalidate(&working_copy, entry).verdict;
                if post.tools_passed() > 0 {
                    return self.finalize(
                        entry,
                        RepairTechnique::Footer,
                        true,
                        messages.join("; "),
                        post,
                        &working_copy,
                        &file_name,
                    );
                }
            }
        }

        let technique = StructuralRepairEngine::technique_for(entry.corruption);
        let outcome = self.engine.repair(&working_copy, entry.corruption);
        messages.push(format!("{}: {}", technique, outcome.message));

        // Attempted-and-failed copies are kept in failed/ for manual review,
        // so every attempt lands in exactly one outcome directory
        let post = self.revalidate(&working_copy, entry).verdict;
        self.finalize(
            entry,
            technique,
            outcome.success,
            messages.join("; "),
            post,
            &working_copy,
            &file_name,
        )
    }

    /// Route the working copy to its terminal location and build the record
    #[allow(clippy::too_many_arguments)]
    fn finalize(
        &self,
        entry: &RepairableEntry,
        technique: RepairTechnique,
        repair_succeeded: bool,
        message: String,
        post: Verdict,
        working_copy: &Path,
        file_name: &std::ffi::OsStr,
    ) -> RepairAttempt {
        let validated = post.tools_passed() > 0;
        let (dest_dir, final_status) = if repair_succeeded && validated {
            (self.repaired_dir(), FinalStatus::FullyRepaired)
        } else if repair_succeeded {
            (self.failed_dir(), FinalStatus::RepairFailedValidation)
        } else {
            (self.failed_dir(), FinalStatus::RepairFailed)
        };

        let dest = unique_destination(&dest_dir, file_name);
        let message = match std::fs::rename(working_copy, &dest) {
            Ok(()) => message,
            Err(e) => format!("{}; move to {} failed: {}", message, dest.display(), e),
        };

        RepairAttempt {
            path: entry.path.clone(),
            corruption: entry.corruption,
            technique: Some(technique),
            repair_succeeded,
            message,
            post_verdict: Some(post),
            final_status,
        }
    }

    fn revalidate(&self, working_copy: &Path, entry: &RepairableEntry) -> FileVerdict {
        let record = FileRecord {
            path: working_copy.to_path_buf(),
            declared_format: crate::types::ImageFormat::from_path(&entry.path),
            size_bytes: std::fs::metadata(working_copy).map(|m| m.len()).unwrap_or(0),
        };
        let verdict = self.validator.validate(&record);
        FileVerdict { record, verdict }
    }

    /// Full pipeline: validate, summarize, decide, optionally repair,
    /// assemble the report
    pub fn run(&self, records: &[FileRecord], mode: RunMode) -> Result<TriageReport> {
        for dir in [self.working_dir(), self.repaired_dir(), self.failed_dir()] {
            std::fs::create_dir_all(dir)?;
        }

        if !self.quiet {
            println!(
                "Validating {} file(s) with {} tool(s): {}",
                records.len(),
                self.validator.capability_names().len(),
                self.validator.capability_names().join(", ")
            );
        }

        let verdicts = self.validate_batch(records);
        let validation = report::summarize_validation(&verdicts);
        let stats = report::batch_stats(&verdicts);
        let decision = planner::decide(&stats);

        if !self.quiet {
            println!(
                "Validation complete: {} valid, {} corrupted, {} unrecoverable ({}% integrity)",
                validation.valid_files,
                validation.corrupted_files,
                validation.unrecoverable_files,
                validation.integrity_score_percent
            );
            for line in &decision.reasoning {
                println!("  - {}", line);
            }
        }

        let should_repair = match mode {
            RunMode::DecideOnly => false,
            RunMode::ForceRepair => !stats.repairable.is_empty(),
            RunMode::Auto => decision.strategy == Strategy::PerformRepair,
        };

        let (attempts, repairs) = if should_repair {
            if !self.quiet {
                println!("Repairing {} candidate file(s)...", stats.repairable.len());
            }
            let attempts = self.repair_batch(&stats.repairable);
            let summary = report::summarize_repairs(&attempts);
            if !self.quiet {
                println!(
                    "Repair complete: {}/{} fully repaired ({}%)",
                    summary.successful_repairs, summary.total_attempted, summary.success_rate_percent
                );
            }
            (attempts, Some(summary))
        } else {
            (Vec::new(), None)
        };

        let _ = std::fs::remove_dir_all(self.working_dir());

        Ok(TriageReport::new(
            validation, decision, repairs, verdicts, attempts,
        ))
    }
}

/// First free destination path: `name.jpg`, then `name_1.jpg`, `name_2.jpg`
fn unique_destination(dir: &Path, file_name: &std::ffi::OsStr) -> PathBuf {
    let candidate = dir.join(file_name);
    if !candidate.exists() {
        return candidate;
    }
    let base = Path::new(file_name);
    let stem = base.file_stem().and_then(|s| s.to_str()).unwrap_or("file");
    let ext = base.extension().and_then(|e| e.to_str());
    for i in 1.. {
        let name = match ext {
            Some(ext) => format!("{}_{}.{}", stem, i, ext),
            None => format!("{}_{}", stem, i),
        };
        let candidate = dir.join(name);
        if !candidate.exists() {
            return candidate;
        }
    }
    unreachable!()
}
