use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Image format declared by the upstream recovery step (usually from the
/// file extension the carver or filesystem walk assigned).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageFormat {
    Jpeg,
    Png,
    Gif,
    Tiff,
    Bmp,
    Webp,
}

impl ImageFormat {
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "jpg" | "jpeg" => Some(Self::Jpeg),
            "png" => Some(Self::Png),
            "gif" => Some(Self::Gif),
            "tif" | "tiff" => Some(Self::Tiff),
            "bmp" => Some(Self::Bmp),
            "webp" => Some(Self::Webp),
            _ => None,
        }
    }

    pub fn from_path(path: &std::path::Path) -> Option<Self> {
        path.extension()
            .and_then(|e| e.to_str())
            .and_then(Self::from_extension)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Jpeg => "jpeg",
            Self::Png => "png",
            Self::Gif => "gif",
            Self::Tiff => "tiff",
            Self::Bmp => "bmp",
            Self::Webp => "webp",
        }
    }
}

impl std::fmt::Display for ImageFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Immutable descriptor of one candidate file, produced by the upstream
/// recovery step. Never mutated by this subsystem.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileRecord {
    pub path: PathBuf,
    /// `None` when the upstream step could not assign a format; the magic
    /// check then passes by benefit of the doubt.
    pub declared_format: Option<ImageFormat>,
    pub size_bytes: u64,
}

/// Result of one external validator invocation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolResult {
    pub tool_name: String,
    pub passed: bool,
    pub diagnostic: Option<String>,
}

impl ToolResult {
    pub fn pass(tool_name: impl Into<String>) -> Self {
        Self {
            tool_name: tool_name.into(),
            passed: true,
            diagnostic: None,
        }
    }

    pub fn fail(tool_name: impl Into<String>, diagnostic: impl Into<String>) -> Self {
        Self {
            tool_name: tool_name.into(),
            passed: false,
            diagnostic: Some(diagnostic.into()),
        }
    }
}

/// Corruption taxonomy. Each tag carries an empirical repair success prior
/// and a repairability flag; fragmented and false-positive files are never
/// repair candidates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CorruptionTag {
    Truncated,
    InvalidHeader,
    CorruptSegments,
    CorruptData,
    Fragmented,
    FalsePositive,
    Unknown,
}

/// Whether automated repair can be expected to help for a corruption tag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Repairability {
    Yes,
    Partial,
    No,
}

impl CorruptionTag {
    /// Empirical probability of a successful automated repair (0.0 - 1.0)
    pub fn success_rate_estimate(&self) -> f64 {
        match self {
            Self::Truncated => 0.85,
            Self::InvalidHeader => 0.70,
            Self::CorruptSegments => 0.60,
            Self::CorruptData => 0.40,
            Self::Fragmented => 0.15,
            Self::FalsePositive => 0.00,
            Self::Unknown => 0.50,
        }
    }

    pub fn repairability(&self) -> Repairability {
        match self {
            Self::Truncated | Self::InvalidHeader | Self::CorruptSegments => Repairability::Yes,
            Self::CorruptData | Self::Unknown => Repairability::Partial,
            Self::Fragmented | Self::FalsePositive => Repairability::No,
        }
    }

    /// Severity level, 1 = easiest to repair, 5 = impossible
    pub fn level(&self) -> u8 {
        match self {
            Self::Truncated => 1,
            Self::InvalidHeader | Self::CorruptSegments => 2,
            Self::CorruptData | Self::Unknown => 3,
            Self::Fragmented => 4,
            Self::FalsePositive => 5,
        }
    }

    /// Human-readable repair approach for reports
    pub fn technique_hint(&self) -> &'static str {
        match self {
            Self::Truncated => "Add missing footer bytes",
            Self::InvalidHeader => "Fix/rebuild file header",
            Self::CorruptSegments => "Remove/skip corrupt segments",
            Self::CorruptData => "Partial pixel recovery possible",
            Self::Fragmented => "Manual defragmentation needed",
            Self::FalsePositive => "Not an image - discard",
            Self::Unknown => "Manual inspection needed",
        }
    }

    pub fn is_repair_candidate(&self) -> bool {
        self.repairability() != Repairability::No
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Truncated => "truncated",
            Self::InvalidHeader => "invalid_header",
            Self::CorruptSegments => "corrupt_segments",
            Self::CorruptData => "corrupt_data",
            Self::Fragmented => "fragmented",
            Self::FalsePositive => "false_positive",
            Self::Unknown => "unknown",
        }
    }
}

impl std::fmt::Display for CorruptionTag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Verdict for one file. Modeled as a sum type so a valid verdict cannot
/// carry a corruption tag and an unrecoverable verdict cannot claim passing
/// tools. Produced once per file; a post-repair re-validation produces a
/// new verdict rather than updating this one.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Verdict {
    Valid {
        tool_results: Vec<ToolResult>,
    },
    Corrupted {
        magic_valid: bool,
        tool_results: Vec<ToolResult>,
        corruption: CorruptionTag,
    },
    Unrecoverable {
        tool_results: Vec<ToolResult>,
        corruption: CorruptionTag,
        /// Set when the file could not be inspected at all (missing, empty)
        error: Option<String>,
    },
}

/// Status discriminant of a [`Verdict`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VerdictStatus {
    Valid,
    Corrupted,
    Unrecoverable,
}

impl Verdict {
    pub fn status(&self) -> VerdictStatus {
        match self {
            Self::Valid { .. } => VerdictStatus::Valid,
            Self::Corrupted { .. } => VerdictStatus::Corrupted,
            Self::Unrecoverable { .. } => VerdictStatus::Unrecoverable,
        }
    }

    pub fn magic_valid(&self) -> bool {
        match self {
            Self::Valid { .. } => true,
            Self::Corrupted { magic_valid, .. } => *magic_valid,
            Self::Unrecoverable { .. } => false,
        }
    }

    pub fn tool_results(&self) -> &[ToolResult] {
        match self {
            Self::Valid { tool_results }
            | Self::Corrupted { tool_results, .. }
            | Self::Unrecoverable { tool_results, .. } => tool_results,
        }
    }

    pub fn tools_passed(&self) -> usize {
        self.tool_results().iter().filter(|r| r.passed).count()
    }

    pub fn tools_total(&self) -> usize {
        self.tool_results().len()
    }

    pub fn corruption(&self) -> Option<CorruptionTag> {
        match self {
            Self::Valid { .. } => None,
            Self::Corrupted { corruption, .. } | Self::Unrecoverable { corruption, .. } => {
                Some(*corruption)
            }
        }
    }
}

/// One file's validation outcome, pairing the immutable input record with
/// its verdict
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileVerdict {
    pub record: FileRecord,
    pub verdict: Verdict,
}

/// Repair candidate: a corrupted file whose tag is repairable
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RepairableEntry {
    pub path: PathBuf,
    pub corruption: CorruptionTag,
}

/// Aggregate validation statistics fed to the repair planner
#[derive(Debug, Clone, Default)]
pub struct BatchStats {
    pub total_files: usize,
    pub valid_files: usize,
    pub corrupted_files: usize,
    pub unrecoverable_files: usize,
    pub repairable: Vec<RepairableEntry>,
}

/// Repair strategy chosen by the planner
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    SkipRepair,
    PerformRepair,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Confidence {
    High,
    Medium,
}

/// Projected batch outcome if the chosen strategy is followed
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExpectedOutcome {
    pub current_valid: usize,
    pub expected_additional: usize,
    pub final_count: usize,
    pub final_percent: f64,
    pub improvement_points: f64,
}

/// Batch-level repair decision, computed once from aggregate statistics
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Decision {
    pub strategy: Strategy,
    pub confidence: Confidence,
    pub reasoning: Vec<String>,
    pub success_estimate_percent: f64,
    pub expected: ExpectedOutcome,
}

/// Byte-level repair technique applied to a working copy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RepairTechnique {
    Footer,
    Header,
    Segments,
    TruncatedReencode,
}

impl RepairTechnique {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Footer => "footer",
            Self::Header => "header",
            Self::Segments => "segments",
            Self::TruncatedReencode => "truncated_reencode",
        }
    }
}

impl std::fmt::Display for RepairTechnique {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Terminal state of one repair attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FinalStatus {
    FullyRepaired,
    RepairFailedValidation,
    RepairFailed,
    Skipped,
}

/// Record of one repair attempt; terminal once written
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RepairAttempt {
    pub path: PathBuf,
    pub corruption: CorruptionTag,
    pub technique: Option<RepairTechnique>,
    pub repair_succeeded: bool,
    pub message: String,
    pub post_verdict: Option<Verdict>,
    pub final_status: FinalStatus,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_from_extension() {
        assert_eq!(ImageFormat::from_extension("JPG"), Some(ImageFormat::Jpeg));
        assert_eq!(ImageFormat::from_extension("jpeg"), Some(ImageFormat::Jpeg));
        assert_eq!(ImageFormat::from_extension("png"), Some(ImageFormat::Png));
        assert_eq!(ImageFormat::from_extension("tif"), Some(ImageFormat::Tiff));
        assert_eq!(ImageFormat::from_extension("xyz"), None);
    }

    #[test]
    fn test_tag_repairability() {
        assert!(CorruptionTag::Truncated.is_repair_candidate());
        assert!(CorruptionTag::CorruptData.is_repair_candidate());
        assert!(!CorruptionTag::Fragmented.is_repair_candidate());
        assert!(!CorruptionTag::FalsePositive.is_repair_candidate());
        assert_eq!(CorruptionTag::FalsePositive.success_rate_estimate(), 0.0);
    }

    #[test]
    fn test_verdict_accessors() {
        let v = Verdict::Corrupted {
            magic_valid: false,
            tool_results: vec![
                ToolResult::pass("decode"),
                ToolResult::fail("jpeginfo", "corrupt data"),
            ],
            corruption: CorruptionTag::InvalidHeader,
        };
        assert_eq!(v.status(), VerdictStatus::Corrupted);
        assert_eq!(v.tools_passed(), 1);
        assert_eq!(v.tools_total(), 2);
        assert_eq!(v.corruption(), Some(CorruptionTag::InvalidHeader));
        assert!(!v.magic_valid());
    }

    #[test]
    fn test_valid_verdict_carries_no_tag() {
        let v = Verdict::Valid {
            tool_results: vec![ToolResult::pass("decode")],
        };
        assert!(v.corruption().is_none());
        assert!(v.magic_valid());
    }
}
