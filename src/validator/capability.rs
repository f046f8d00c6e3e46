//! Pluggable external validation capabilities.
//!
//! Every capability exposes the same pass/fail + diagnostic contract, so
//! the validator treats a decode library and a CLI linter identically. The
//! decode-and-verify capability is mandatory for a batch; CLI adapters are
//! optional extras registered when the tool is present on the host.

use crate::types::ToolResult;
use std::io::ErrorKind;
use std::path::Path;
use std::process::{Command, Stdio};
use std::time::{Duration, Instant};

/// Diagnostic strings are capped so a noisy tool cannot bloat the report
const DIAGNOSTIC_LIMIT: usize = 200;

/// Poll interval while waiting for an external command
const WAIT_POLL: Duration = Duration::from_millis(25);

/// A single external validation capability
pub trait ExternalValidator: Send + Sync {
    fn name(&self) -> &str;

    /// Run the check against one file. Must never panic; every failure mode
    /// (unreadable file, tool crash, timeout) is a failed [`ToolResult`].
    fn check(&self, path: &Path) -> ToolResult;
}

fn truncate_diagnostic(mut text: String) -> String {
    if text.len() > DIAGNOSTIC_LIMIT {
        let mut end = DIAGNOSTIC_LIMIT;
        while !text.is_char_boundary(end) {
            end -= 1;
        }
        text.truncate(end);
    }
    text
}

/// Mandatory decode-and-verify capability backed by the `image` crate.
///
/// Decode errors are normalised onto the diagnostic vocabulary the
/// classifier matches on, so the corruption taxonomy does not depend on
/// the codec library's exact wording.
#[derive(Debug, Default)]
pub struct DecodeValidator;

impl DecodeValidator {
    pub fn new() -> Self {
        Self
    }

    fn normalise_error(err: &image::ImageError) -> String {
        use image::ImageError;
        match err {
            ImageError::Unsupported(e) => {
                format!("cannot identify image file: {}", e)
            }
            ImageError::IoError(e) if e.kind() == ErrorKind::UnexpectedEof => {
                format!("truncated file: premature end of stream: {}", e)
            }
            ImageError::IoError(e) => format!("cannot decode image file: {}", e),
            ImageError::Decoding(e) => {
                let text = e.to_string();
                let lower = text.to_lowercase();
                if lower.contains("eof") || lower.contains("end of") || lower.contains("truncat") {
                    format!("premature end of image data: {}", text)
                } else {
                    format!("corrupt image data: {}", text)
                }
            }
            ImageError::Limits(e) => format!("corrupt image data: {}", e),
            other => other.to_string(),
        }
    }
}

impl ExternalValidator for DecodeValidator {
    fn name(&self) -> &str {
        "decode"
    }

    fn check(&self, path: &Path) -> ToolResult {
        let data = match std::fs::read(path) {
            Ok(d) => d,
            Err(e) => {
                return ToolResult::fail(self.name(), format!("cannot read file: {}", e));
            }
        };

        match image::load_from_memory(&data) {
            Ok(img) if img.width() > 0 && img.height() > 0 => ToolResult::pass(self.name()),
            Ok(_) => ToolResult::fail(self.name(), "corrupt image data: zero dimensions"),
            Err(e) => ToolResult::fail(
                self.name(),
                truncate_diagnostic(Self::normalise_error(&e)),
            ),
        }
    }
}

/// Adapter over an external command-line validator (`jpeginfo -c`,
/// `identify`, `pngcheck` and the like). Pass/fail follows the exit code;
/// the diagnostic is the tool's combined output. Each invocation is bounded
/// by a timeout and a timeout counts as a failed check, never a batch error.
#[derive(Debug, Clone)]
pub struct CommandValidator {
    name: String,
    program: String,
    args: Vec<String>,
    timeout: Duration,
}

impl CommandValidator {
    pub fn new(
        name: impl Into<String>,
        program: impl Into<String>,
        args: &[&str],
        timeout: Duration,
    ) -> Self {
        Self {
            name: name.into(),
            program: program.into(),
            args: args.iter().map(|s| s.to_string()).collect(),
            timeout,
        }
    }

    /// Whether the underlying program can be launched on this host
    pub fn is_available(&self) -> bool {
        match Command::new(&self.program)
            .arg("--version")
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
        {
            Ok(mut child) => {
                let _ = child.wait();
                true
            }
            Err(e) => e.kind() != ErrorKind::NotFound,
        }
    }

    /// Spawn the command and wait up to the timeout, killing on expiry
    fn run(&self, path: &Path) -> ToolResult {
        let mut child = match Command::new(&self.program)
            .args(&self.args)
            .arg(path)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
        {
            Ok(c) => c,
            Err(e) => {
                return ToolResult::fail(&self.name, format!("failed to launch {}: {}", self.program, e));
            }
        };

        let deadline = Instant::now() + self.timeout;
        loop {
            match child.try_wait() {
                Ok(Some(_)) => break,
                Ok(None) => {
                    if Instant::now() >= deadline {
                        let _ = child.kill();
                        let _ = child.wait();
                        return ToolResult::fail(
                            &self.name,
                            format!("timed out after {}s", self.timeout.as_secs()),
                        );
                    }
                    std::thread::sleep(WAIT_POLL);
                }
                Err(e) => {
                    return ToolResult::fail(&self.name, format!("wait failed: {}", e));
                }
            }
        }

        let output = match child.wait_with_output() {
            Ok(o) => o,
            Err(e) => return ToolResult::fail(&self.name, format!("wait failed: {}", e)),
        };

        if output.status.success() {
            ToolResult::pass(&self.name)
        } else {
            let mut detail = String::from_utf8_lossy(&output.stdout).trim().to_string();
            let stderr = String::from_utf8_lossy(&output.stderr);
            if !stderr.trim().is_empty() {
                if !detail.is_empty() {
                    detail.push(' ');
                }
                detail.push_str(stderr.trim());
            }
            if detail.is_empty() {
                detail = format!("{} exited with {}", self.program, output.status);
            }
            ToolResult::fail(&self.name, truncate_diagnostic(detail))
        }
    }
}

impl ExternalValidator for CommandValidator {
    fn name(&self) -> &str {
        &self.name
    }

    fn check(&self, path: &Path) -> ToolResult {
        self.run(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_validator_rejects_garbage() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("garbage.jpg");
        std::fs::write(&path, b"definitely not an image").unwrap();

        let result = DecodeValidator::new().check(&path);
        assert!(!result.passed);
        let diag = result.diagnostic.unwrap();
        assert!(diag.contains("cannot identify") || diag.contains("corrupt"));
    }

    #[test]
    fn test_decode_validator_missing_file() {
        let result = DecodeValidator::new().check(Path::new("/nonexistent/file.jpg"));
        assert!(!result.passed);
        assert!(result.diagnostic.unwrap().contains("cannot read file"));
    }

    #[test]
    fn test_command_validator_exit_codes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("x");
        std::fs::write(&path, b"x").unwrap();

        let ok = CommandValidator::new("true", "true", &[], Duration::from_secs(5));
        assert!(ok.check(&path).passed);

        let bad = CommandValidator::new("false", "false", &[], Duration::from_secs(5));
        let result = bad.check(&path);
        assert!(!result.passed);
        assert!(result.diagnostic.is_some());
    }

    #[test]
    fn test_command_validator_timeout() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("x");
        std::fs::write(&path, b"x").unwrap();

        let slow = CommandValidator::new("slow", "sh", &["-c", "sleep 5", "--"], Duration::from_millis(100));
        let result = slow.check(&path);
        assert!(!result.passed);
        assert!(result.diagnostic.unwrap().contains("timed out"));
    }

    #[test]
    fn test_missing_program_is_failed_result() {
        let gone = CommandValidator::new(
            "ghost",
            "definitely-not-a-real-binary-9472",
            &[],
            Duration::from_secs(1),
        );
        assert!(!gone.is_available());
        let result = gone.check(Path::new("/tmp/x"));
        assert!(!result.passed);
        assert!(result.diagnostic.unwrap().contains("failed to launch"));
    }

    #[test]
    fn test_diagnostic_truncation() {
        let long = "x".repeat(500);
        assert_eq!(truncate_diagnostic(long).len(), DIAGNOSTIC_LIMIT);
    }
}
