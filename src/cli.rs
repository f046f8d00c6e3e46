//! Command-line interface.

use crate::error::{Result, TriageError};
use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug, Clone)]
#[command(
    name = "photo-triage",
    about = "Validate recovered photos, decide whether repair pays off, and repair what it can",
    version
)]
pub struct Args {
    /// Directory of recovered image files to triage
    #[arg(short, long)]
    pub input: PathBuf,

    /// Output directory (repaired/, failed/ and the JSON report land here)
    #[arg(short, long, default_value = "./triage-output")]
    pub output: PathBuf,

    /// Per-file timeout for external validator commands, in seconds
    #[arg(long, default_value_t = 30)]
    pub timeout_secs: u64,

    /// Worker threads for the validation phase (0 = all cores)
    #[arg(short, long, default_value_t = 0)]
    pub threads: usize,

    /// Validate and print the repair decision without repairing anything
    #[arg(long)]
    pub decide_only: bool,

    /// Repair every candidate even when the decision says to skip
    #[arg(long, conflicts_with = "decide_only")]
    pub force_repair: bool,

    /// Use only the built-in decoder, skip host CLI tools like jpeginfo
    #[arg(long)]
    pub no_external_tools: bool,

    /// Suppress progress output
    #[arg(short, long)]
    pub quiet: bool,
}

impl Args {
    pub fn validate(&self) -> Result<()> {
        if !self.input.exists() {
            return Err(TriageError::InvalidArgument(format!(
                "input directory does not exist: {}",
                self.input.display()
            )));
        }
        if !self.input.is_dir() {
            return Err(TriageError::InvalidArgument(format!(
                "input path is not a directory: {}",
                self.input.display()
            )));
        }
        if self.timeout_secs == 0 {
            return Err(TriageError::InvalidArgument(
                "timeout must be at least 1 second".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_defaults() {
        let args = Args::parse_from(["photo-triage", "--input", "/tmp"]);
        assert_eq!(args.timeout_secs, 30);
        assert_eq!(args.threads, 0);
        assert!(!args.decide_only);
        assert!(!args.force_repair);
        assert!(!args.quiet);
    }

    #[test]
    fn test_decide_only_conflicts_with_force() {
        let result = Args::try_parse_from([
            "photo-triage",
            "--input",
            "/tmp",
            "--decide-only",
            "--force-repair",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_validate_rejects_missing_input() {
        let args = Args::parse_from(["photo-triage", "--input", "/no/such/dir-4821"]);
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_file_input() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("x.jpg");
        std::fs::write(&file, b"x").unwrap();

        let args = Args::parse_from(["photo-triage", "--input", file.to_str().unwrap()]);
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_zero_timeout() {
        let dir = tempfile::tempdir().unwrap();
        let args = Args::parse_from([
            "photo-triage",
            "--input",
            dir.path().to_str().unwrap(),
            "--timeout-secs",
            "0",
        ]);
        assert!(args.validate().is_err());
    }
}
