//! Batch repair decision engine.
//!
//! Pure function over aggregate validation statistics, no I/O. Five rules
//! evaluated in priority order, first match wins:
//!
//!   R1: corrupted == 0          -> skip_repair    (high confidence)
//!   R2: no repairable entries   -> skip_repair    (high confidence)
//!   R3: valid < 50              -> perform_repair (high confidence)
//!   R4: estimate >= 50%         -> perform_repair (high if >= 70%)
//!   R5: default                 -> skip_repair    (medium confidence)

use crate::types::{BatchStats, Confidence, Decision, ExpectedOutcome, RepairableEntry, Strategy};

/// Rule 3: every photo counts while the valid set is this small
pub const LOW_VALID_THRESHOLD: usize = 50;
/// Rule 4/5 boundary, percent
pub const HIGH_ESTIMATE_THRESHOLD: f64 = 50.0;
/// Rule 4 high-confidence sub-threshold, percent
pub const HIGH_CONFIDENCE_ESTIMATE: f64 = 70.0;

fn round1(x: f64) -> f64 {
    (x * 10.0).round() / 10.0
}

fn round2(x: f64) -> f64 {
    (x * 100.0).round() / 100.0
}

/// Mean repair success prior over the repairable entries, in percent.
/// Zero when there is nothing to repair.
pub fn estimate_success_percent(entries: &[RepairableEntry]) -> f64 {
    if entries.is_empty() {
        return 0.0;
    }
    let total: f64 = entries
        .iter()
        .map(|e| e.corruption.success_rate_estimate())
        .sum();
    round1(total / entries.len() as f64 * 100.0)
}

/// Compute the batch repair decision from aggregate statistics
pub fn decide(stats: &BatchStats) -> Decision {
    let repairable = stats.repairable.len();
    let estimate = estimate_success_percent(&stats.repairable);
    let integrity = round2(stats.valid_files as f64 / stats.total_files.max(1) as f64 * 100.0);

    let (strategy, confidence, reasoning) = if stats.corrupted_files == 0 {
        (
            Strategy::SkipRepair,
            Confidence::High,
            vec![
                "No corrupted files detected - all recovered photos are valid".to_string(),
                "Repair phase is unnecessary".to_string(),
            ],
        )
    } else if repairable == 0 {
        (
            Strategy::SkipRepair,
            Confidence::High,
            vec![
                format!(
                    "All {} corrupted file(s) are classified as unrecoverable (false positives / fragmented)",
                    stats.corrupted_files
                ),
                "No candidates for repair - proceeding with current valid set".to_string(),
            ],
        )
    } else if stats.valid_files < LOW_VALID_THRESHOLD {
        (
            Strategy::PerformRepair,
            Confidence::High,
            vec![
                format!(
                    "Only {} valid file(s) recovered - every file counts",
                    stats.valid_files
                ),
                format!(
                    "{} file(s) are candidates for repair (estimated {}% success)",
                    repairable, estimate
                ),
                "Repair is justified regardless of success rate when the valid count is low"
                    .to_string(),
            ],
        )
    } else if estimate >= HIGH_ESTIMATE_THRESHOLD {
        let confidence = if estimate >= HIGH_CONFIDENCE_ESTIMATE {
            Confidence::High
        } else {
            Confidence::Medium
        };
        (
            Strategy::PerformRepair,
            confidence,
            vec![
                format!(
                    "{} file(s) can be repaired with an estimated {}% success rate",
                    repairable, estimate
                ),
                "Cost-benefit analysis favours repair - expected improvement justifies the effort"
                    .to_string(),
                format!(
                    "Estimated additional files: +{}",
                    (repairable as f64 * estimate / 100.0) as usize
                ),
            ],
        )
    } else {
        (
            Strategy::SkipRepair,
            Confidence::Medium,
            vec![
                format!(
                    "{} file(s) potentially repairable, but the success estimate is low ({}%)",
                    repairable, estimate
                ),
                format!(
                    "Already have {} valid file(s) ({}% integrity score)",
                    stats.valid_files, integrity
                ),
                "Low expected yield, already acceptable valid count - skipping repair".to_string(),
            ],
        )
    };

    let expected_additional = match strategy {
        Strategy::PerformRepair => (repairable as f64 * estimate / 100.0) as usize,
        Strategy::SkipRepair => 0,
    };
    let final_count = stats.valid_files + expected_additional;
    let final_percent = round2(final_count as f64 / stats.total_files.max(1) as f64 * 100.0);

    Decision {
        strategy,
        confidence,
        reasoning,
        success_estimate_percent: estimate,
        expected: ExpectedOutcome {
            current_valid: stats.valid_files,
            expected_additional,
            final_count,
            final_percent,
            improvement_points: round2(final_percent - integrity),
        },
    }
}
