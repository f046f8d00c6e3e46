//! Batch report assembly.
//!
//! Aggregate statistics are computed by folding over the completed per-file
//! records; no counters are mutated while the batch runs. The JSON report
//! carries a checksum over its headline numbers so downstream consumers can
//! detect tampering or truncation.

use crate::error::{Result, TriageError};
use crate::types::{
    BatchStats, Decision, FileVerdict, FinalStatus, RepairAttempt, RepairableEntry, VerdictStatus,
};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::path::Path;

pub const TOOL_NAME: &str = "photo-triage";
pub const TOOL_VERSION: &str = env!("CARGO_PKG_VERSION");

fn round2(x: f64) -> f64 {
    (x * 100.0).round() / 100.0
}

/// Per-format validation breakdown
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FormatBreakdown {
    pub total: usize,
    pub valid: usize,
    pub corrupted: usize,
    pub unrecoverable: usize,
}

/// Aggregate validation statistics for one batch
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationSummary {
    pub total_files: usize,
    pub valid_files: usize,
    pub corrupted_files: usize,
    pub unrecoverable_files: usize,
    pub integrity_score_percent: f64,
    pub integrity_assessment: String,
    pub corruption_histogram: BTreeMap<String, usize>,
    pub by_format: BTreeMap<String, FormatBreakdown>,
    pub files_needing_repair: usize,
}

/// Integrity score interpretation band
pub fn assess_integrity(percent: f64) -> &'static str {
    if percent >= 95.0 {
        "excellent - ready for delivery"
    } else if percent >= 85.0 {
        "good - most photos usable"
    } else if percent >= 70.0 {
        "fair - significant corruption, repair recommended"
    } else {
        "poor - heavy corruption, source media badly damaged"
    }
}

/// Fold completed verdicts into the validation summary
pub fn summarize_validation(verdicts: &[FileVerdict]) -> ValidationSummary {
    let mut summary = ValidationSummary {
        total_files: verdicts.len(),
        valid_files: 0,
        corrupted_files: 0,
        unrecoverable_files: 0,
        integrity_score_percent: 0.0,
        integrity_assessment: String::new(),
        corruption_histogram: BTreeMap::new(),
        by_format: BTreeMap::new(),
        files_needing_repair: 0,
    };

    for fv in verdicts {
        let format_key = fv
            .record
            .declared_format
            .map(|f| f.as_str().to_string())
            .unwrap_or_else(|| "unknown".to_string());
        let bucket = summary.by_format.entry(format_key).or_default();
        bucket.total += 1;

        match fv.verdict.status() {
            VerdictStatus::Valid => {
                summary.valid_files += 1;
                bucket.valid += 1;
            }
            VerdictStatus::Corrupted => {
                summary.corrupted_files += 1;
                bucket.corrupted += 1;
            }
            VerdictStatus::Unrecoverable => {
                summary.unrecoverable_files += 1;
                bucket.unrecoverable += 1;
            }
        }

        if let Some(tag) = fv.verdict.corruption() {
            *summary
                .corruption_histogram
                .entry(tag.as_str().to_string())
                .or_insert(0) += 1;
            if fv.verdict.status() == VerdictStatus::Corrupted && tag.is_repair_candidate() {
                summary.files_needing_repair += 1;
            }
        }
    }

    summary.integrity_score_percent = round2(
        summary.valid_files as f64 / summary.total_files.max(1) as f64 * 100.0,
    );
    summary.integrity_assessment = assess_integrity(summary.integrity_score_percent).to_string();
    summary
}

/// Derive the planner input from completed verdicts
pub fn batch_stats(verdicts: &[FileVerdict]) -> BatchStats {
    let repairable: Vec<RepairableEntry> = verdicts
        .iter()
        .filter(|fv| fv.verdict.status() == VerdictStatus::Corrupted)
        .filter_map(|fv| {
            fv.verdict.corruption().filter(|tag| tag.is_repair_candidate()).map(|tag| {
                RepairableEntry {
                    path: fv.record.path.clone(),
                    corruption: tag,
                }
            })
        })
        .collect();

    BatchStats {
        total_files: verdicts.len(),
        valid_files: verdicts
            .iter()
            .filter(|fv| fv.verdict.status() == VerdictStatus::Valid)
            .count(),
        corrupted_files: verdicts
            .iter()
            .filter(|fv| fv.verdict.status() == VerdictStatus::Corrupted)
            .count(),
        unrecoverable_files: verdicts
            .iter()
            .filter(|fv| fv.verdict.status() == VerdictStatus::Unrecoverable)
            .count(),
        repairable,
    }
}

/// Per-corruption-type repair breakdown
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RepairTypeBreakdown {
    pub attempted: usize,
    pub successful: usize,
    pub failed: usize,
}

/// Aggregate repair statistics for one batch
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RepairSummary {
    pub total_attempted: usize,
    pub successful_repairs: usize,
    pub failed_repairs: usize,
    pub success_rate_percent: f64,
    pub by_corruption_type: BTreeMap<String, RepairTypeBreakdown>,
}

/// Fold completed repair attempts into the repair summary
pub fn summarize_repairs(attempts: &[RepairAttempt]) -> RepairSummary {
    let mut by_type: BTreeMap<String, RepairTypeBreakdown> = BTreeMap::new();
    let mut successful = 0usize;

    for attempt in attempts {
        let bucket = by_type.entry(attempt.corruption.as_str().to_string()).or_default();
        bucket.attempted += 1;
        if attempt.final_status == FinalStatus::FullyRepaired {
            bucket.successful += 1;
            successful += 1;
        } else {
            bucket.failed += 1;
        }
    }

    RepairSummary {
        total_attempted: attempts.len(),
        successful_repairs: successful,
        failed_repairs: attempts.len() - successful,
        success_rate_percent: round2(successful as f64 / attempts.len().max(1) as f64 * 100.0),
        by_corruption_type: by_type,
    }
}

/// Report metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportMetadata {
    pub timestamp: String,
    pub tool_name: String,
    pub tool_version: String,
}

impl ReportMetadata {
    pub fn now() -> Self {
        Self {
            timestamp: chrono::Utc::now().to_rfc3339(),
            tool_name: TOOL_NAME.to_string(),
            tool_version: TOOL_VERSION.to_string(),
        }
    }
}

/// Machine-readable batch report
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TriageReport {
    pub metadata: ReportMetadata,
    pub validation: ValidationSummary,
    pub decision: Decision,
    pub repairs: Option<RepairSummary>,
    pub verdicts: Vec<FileVerdict>,
    pub repair_attempts: Vec<RepairAttempt>,
    pub report_checksum: String,
}

impl TriageReport {
    pub fn new(
        validation: ValidationSummary,
        decision: Decision,
        repairs: Option<RepairSummary>,
        verdicts: Vec<FileVerdict>,
        repair_attempts: Vec<RepairAttempt>,
    ) -> Self {
        let metadata = ReportMetadata::now();
        let report_checksum = Self::checksum(&metadata, &validation, repairs.as_ref());
        Self {
            metadata,
            validation,
            decision,
            repairs,
            verdicts,
            repair_attempts,
            report_checksum,
        }
    }

    /// Checksum over the headline numbers for report integrity
    fn checksum(
        metadata: &ReportMetadata,
        validation: &ValidationSummary,
        repairs: Option<&RepairSummary>,
    ) -> String {
        let mut hasher = Sha256::new();
        hasher.update(metadata.timestamp.as_bytes());
        hasher.update(validation.total_files.to_le_bytes());
        hasher.update(validation.valid_files.to_le_bytes());
        hasher.update(validation.integrity_score_percent.to_le_bytes());
        if let Some(r) = repairs {
            hasher.update(r.total_attempted.to_le_bytes());
            hasher.update(r.successful_repairs.to_le_bytes());
        }
        format!("{:x}", hasher.finalize())
    }

    /// Write the report as pretty JSON
    pub fn write_json(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)
            .map_err(|e| TriageError::Report(e.to_string()))?;
        std::fs::write(path, json)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{
        CorruptionTag, FileRecord, ImageFormat, RepairTechnique, ToolResult, Verdict,
    };
    use std::path::PathBuf;

    fn fv(name: &str, format: Option<ImageFormat>, verdict: Verdict) -> FileVerdict {
        FileVerdict {
            record: FileRecord {
                path: PathBuf::from(name),
                declared_format: format,
                size_bytes: 1024,
            },
            verdict,
        }
    }

    fn valid() -> Verdict {
        Verdict::Valid {
            tool_results: vec![ToolResult::pass("decode")],
        }
    }

    fn corrupted(tag: CorruptionTag) -> Verdict {
        Verdict::Corrupted {
            magic_valid: true,
            tool_results: vec![ToolResult::pass("file"), ToolResult::fail("decode", "x")],
            corruption: tag,
        }
    }

    fn unrecoverable() -> Verdict {
        Verdict::Unrecoverable {
            tool_results: vec![ToolResult::fail("decode", "x")],
            corruption: CorruptionTag::FalsePositive,
            error: None,
        }
    }

    #[test]
    fn test_summary_fold() {
        let verdicts = vec![
            fv("a.jpg", Some(ImageFormat::Jpeg), valid()),
            fv("b.jpg", Some(ImageFormat::Jpeg), corrupted(CorruptionTag::Truncated)),
            fv("c.png", Some(ImageFormat::Png), corrupted(CorruptionTag::Fragmented)),
            fv("d.bin", None, unrecoverable()),
        ];
        let s = summarize_validation(&verdicts);
        assert_eq!(s.total_files, 4);
        assert_eq!(s.valid_files, 1);
        assert_eq!(s.corrupted_files, 2);
        assert_eq!(s.unrecoverable_files, 1);
        assert_eq!(s.integrity_score_percent, 25.0);
        assert_eq!(s.corruption_histogram["truncated"], 1);
        assert_eq!(s.corruption_histogram["false_positive"], 1);
        assert_eq!(s.by_format["jpeg"].total, 2);
        assert_eq!(s.by_format["jpeg"].valid, 1);
        // Fragmented is corrupted but not a repair candidate
        assert_eq!(s.files_needing_repair, 1);
    }

    #[test]
    fn test_batch_stats_excludes_unrepairable() {
        let verdicts = vec![
            fv("a.jpg", Some(ImageFormat::Jpeg), corrupted(CorruptionTag::Truncated)),
            fv("b.jpg", Some(ImageFormat::Jpeg), corrupted(CorruptionTag::Fragmented)),
            fv("c.jpg", Some(ImageFormat::Jpeg), unrecoverable()),
        ];
        let stats = batch_stats(&verdicts);
        assert_eq!(stats.corrupted_files, 2);
        assert_eq!(stats.unrecoverable_files, 1);
        assert_eq!(stats.repairable.len(), 1);
        assert_eq!(stats.repairable[0].corruption, CorruptionTag::Truncated);
    }

    #[test]
    fn test_assessment_bands() {
        assert!(assess_integrity(97.0).contains("excellent"));
        assert!(assess_integrity(90.0).contains("good"));
        assert!(assess_integrity(75.0).contains("fair"));
        assert!(assess_integrity(10.0).contains("poor"));
    }

    #[test]
    fn test_repair_summary() {
        let attempts = vec![
            RepairAttempt {
                path: PathBuf::from("a.jpg"),
                corruption: CorruptionTag::Truncated,
                technique: Some(RepairTechnique::Footer),
                repair_succeeded: true,
                message: "ok".into(),
                post_verdict: None,
                final_status: FinalStatus::FullyRepaired,
            },
            RepairAttempt {
                path: PathBuf::from("b.jpg"),
                corruption: CorruptionTag::Truncated,
                technique: Some(RepairTechnique::TruncatedReencode),
                repair_succeeded: true,
                message: "still broken".into(),
                post_verdict: None,
                final_status: FinalStatus::RepairFailedValidation,
            },
            RepairAttempt {
                path: PathBuf::from("c.jpg"),
                corruption: CorruptionTag::InvalidHeader,
                technique: None,
                repair_succeeded: false,
                message: "not found".into(),
                post_verdict: None,
                final_status: FinalStatus::Skipped,
            },
        ];
        let s = summarize_repairs(&attempts);
        assert_eq!(s.total_attempted, 3);
        assert_eq!(s.successful_repairs, 1);
        assert_eq!(s.failed_repairs, 2);
        assert_eq!(s.by_corruption_type["truncated"].attempted, 2);
        assert_eq!(s.by_corruption_type["truncated"].successful, 1);
        assert_eq!(round2(s.success_rate_percent), 33.33);
    }

    #[test]
    fn test_empty_batch_summary() {
        let s = summarize_validation(&[]);
        assert_eq!(s.integrity_score_percent, 0.0);
        let r = summarize_repairs(&[]);
        assert_eq!(r.success_rate_percent, 0.0);
    }
}
