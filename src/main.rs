use clap::Parser;
use photo_triage::cli::Args;
use photo_triage::error::Result;
use photo_triage::pipeline::{Orchestrator, RunMode};
use photo_triage::types::{FileRecord, ImageFormat};
use photo_triage::validator::{CommandValidator, DecodeValidator, ExternalValidator, Validator};
use std::path::Path;
use std::time::Duration;

fn main() {
    if let Err(e) = run() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let args = Args::parse();

    if let Err(e) = args.validate() {
        eprintln!("Invalid arguments: {}", e);
        std::process::exit(1);
    }

    if args.threads > 0 {
        rayon::ThreadPoolBuilder::new()
            .num_threads(args.threads)
            .build_global()
            .map_err(|e| photo_triage::TriageError::Config(e.to_string()))?;
    }

    if !args.quiet {
        println!("Photo Triage v{}", env!("CARGO_PKG_VERSION"));
        println!("{}", "=".repeat(60));
        println!();
        println!("Configuration:");
        println!("  Input directory:    {}", args.input.display());
        println!("  Output directory:   {}", args.output.display());
        println!("  Tool timeout:       {}s", args.timeout_secs);
        println!(
            "  Threads:            {}",
            if args.threads == 0 {
                "all cores".to_string()
            } else {
                args.threads.to_string()
            }
        );
        println!("  External tools:     {}", !args.no_external_tools);
        println!("  Decide only:        {}", args.decide_only);
        println!("  Force repair:       {}", args.force_repair);
        println!();
    }

    let records = collect_records(&args.input)?;
    if records.is_empty() {
        if !args.quiet {
            println!("No image files found in {}", args.input.display());
        }
        return Ok(());
    }

    let validator = Validator::new(build_capabilities(&args))?;
    let orchestrator = Orchestrator::new(validator, args.output.clone(), args.quiet);

    let mode = if args.decide_only {
        RunMode::DecideOnly
    } else if args.force_repair {
        RunMode::ForceRepair
    } else {
        RunMode::Auto
    };

    let report = orchestrator.run(&records, mode)?;

    std::fs::create_dir_all(&args.output)?;
    let report_path = args.output.join("triage_report.json");
    report.write_json(&report_path)?;

    if let Some(summary) = render_summary(&report, &report_path, args.quiet) {
        println!("{}", summary);
    }

    Ok(())
}

/// Human-readable closing summary; suppressed entirely in quiet mode
fn render_summary(
    report: &photo_triage::TriageReport,
    report_path: &Path,
    quiet: bool,
) -> Option<String> {
    use std::fmt::Write;

    if quiet {
        return None;
    }

    let mut out = String::new();
    let rule = "=".repeat(60);
    writeln!(out).ok();
    writeln!(out, "{}", rule).ok();
    writeln!(out, "Triage Summary").ok();
    writeln!(out, "{}", rule).ok();
    writeln!(out, "  Files examined:     {}", report.validation.total_files).ok();
    writeln!(out, "  Valid:              {}", report.validation.valid_files).ok();
    writeln!(
        out,
        "  Corrupted:          {}",
        report.validation.corrupted_files
    )
    .ok();
    writeln!(
        out,
        "  Unrecoverable:      {}",
        report.validation.unrecoverable_files
    )
    .ok();
    writeln!(
        out,
        "  Integrity score:    {}% ({})",
        report.validation.integrity_score_percent, report.validation.integrity_assessment
    )
    .ok();
    if let Some(repairs) = &report.repairs {
        writeln!(
            out,
            "  Repairs:            {}/{} succeeded ({}%)",
            repairs.successful_repairs, repairs.total_attempted, repairs.success_rate_percent
        )
        .ok();
    }
    write!(out, "  Report:             {}", report_path.display()).ok();
    Some(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use photo_triage::planner;
    use photo_triage::report::{summarize_validation, TriageReport};
    use photo_triage::types::BatchStats;

    fn empty_report() -> TriageReport {
        TriageReport::new(
            summarize_validation(&[]),
            planner::decide(&BatchStats::default()),
            None,
            Vec::new(),
            Vec::new(),
        )
    }

    #[test]
    fn test_summary_suppressed_in_quiet_mode() {
        let report = empty_report();
        assert!(render_summary(&report, Path::new("r.json"), true).is_none());
    }

    #[test]
    fn test_summary_rendered_otherwise() {
        let report = empty_report();
        let text = render_summary(&report, Path::new("r.json"), false).unwrap();
        assert!(text.contains("Triage Summary"));
        assert!(text.contains("Files examined:     0"));
        assert!(text.contains("r.json"));
        assert!(!text.contains("Repairs:"));
    }
}

/// Walk the input directory (one level) and describe every file with an
/// image extension
fn collect_records(input: &Path) -> Result<Vec<FileRecord>> {
    let mut records = Vec::new();
    for entry in std::fs::read_dir(input)? {
        let entry = entry?;
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        let declared_format = ImageFormat::from_path(&path);
        if declared_format.is_none() {
            continue;
        }
        let size_bytes = entry.metadata().map(|m| m.len()).unwrap_or(0);
        records.push(FileRecord {
            path,
            declared_format,
            size_bytes,
        });
    }
    records.sort_by(|a, b| a.path.cmp(&b.path));
    Ok(records)
}

/// Register the built-in decoder plus whichever host CLI validators are
/// actually installed
fn build_capabilities(args: &Args) -> Vec<Box<dyn ExternalValidator>> {
    let mut capabilities: Vec<Box<dyn ExternalValidator>> = vec![Box::new(DecodeValidator::new())];
    if args.no_external_tools {
        return capabilities;
    }

    let timeout = Duration::from_secs(args.timeout_secs);
    let candidates = [
        CommandValidator::new("jpeginfo", "jpeginfo", &["-c"], timeout),
        CommandValidator::new("identify", "identify", &[], timeout),
    ];
    for tool in candidates {
        if tool.is_available() {
            if !args.quiet {
                println!("Found external validator: {}", tool.name());
            }
            capabilities.push(Box::new(tool));
        }
    }
    capabilities
}
