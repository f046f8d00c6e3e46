//! Structural repair engine.
//!
//! Four byte-level techniques routed by corruption tag. Every technique
//! operates on a working copy the orchestrator made beforehand; the
//! evidence original is never opened for writing. Malformed input yields a
//! failed outcome with a descriptive message, never a panic.

pub mod jpeg;

use crate::types::{CorruptionTag, RepairTechnique};
use std::io::Cursor;
use std::path::Path;

/// Outcome of one repair technique invocation
#[derive(Debug, Clone)]
pub struct RepairOutcome {
    pub success: bool,
    pub message: String,
}

impl RepairOutcome {
    fn ok(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
        }
    }

    fn failed(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
        }
    }
}

#[derive(Debug, Default)]
pub struct StructuralRepairEngine;

impl StructuralRepairEngine {
    pub fn new() -> Self {
        Self
    }

    /// Technique routing. Unknown or unclassified tags default to the
    /// header technique, which is the most forgiving entry point.
    pub fn technique_for(tag: CorruptionTag) -> RepairTechnique {
        match tag {
            CorruptionTag::Truncated | CorruptionTag::CorruptData => {
                RepairTechnique::TruncatedReencode
            }
            CorruptionTag::CorruptSegments => RepairTechnique::Segments,
            CorruptionTag::InvalidHeader
            | CorruptionTag::Unknown
            | CorruptionTag::Fragmented
            | CorruptionTag::FalsePositive => RepairTechnique::Header,
        }
    }

    /// Apply the tag-routed technique to a working copy in place
    pub fn repair(&self, working_copy: &Path, tag: CorruptionTag) -> RepairOutcome {
        match Self::technique_for(tag) {
            RepairTechnique::TruncatedReencode => self.repair_truncated(working_copy),
            RepairTechnique::Segments => self.apply_buffer_technique(working_copy, jpeg::repair_segments),
            RepairTechnique::Header => self.apply_buffer_technique(working_copy, jpeg::repair_header),
            RepairTechnique::Footer => self.repair_footer(working_copy),
        }
    }

    /// Separate entry point for the missing-trailer fix, applied before
    /// tag-routed dispatch when the working copy lacks an end-of-image
    /// marker
    pub fn repair_footer(&self, working_copy: &Path) -> RepairOutcome {
        self.apply_buffer_technique(working_copy, jpeg::repair_footer)
    }

    /// Whether the working copy already carries the end-of-image trailer
    pub fn has_footer(&self, working_copy: &Path) -> bool {
        std::fs::read(working_copy)
            .map(|d| jpeg::has_footer(&d))
            .unwrap_or(false)
    }

    fn apply_buffer_technique(
        &self,
        working_copy: &Path,
        technique: fn(&[u8]) -> Result<(Vec<u8>, String), String>,
    ) -> RepairOutcome {
        let data = match std::fs::read(working_copy) {
            Ok(d) => d,
            Err(e) => return RepairOutcome::failed(format!("cannot read working copy: {}", e)),
        };
        match technique(&data) {
            Ok((repaired, message)) => match std::fs::write(working_copy, repaired) {
                Ok(()) => RepairOutcome::ok(message),
                Err(e) => RepairOutcome::failed(format!("cannot write working copy: {}", e)),
            },
            Err(message) => RepairOutcome::failed(message),
        }
    }

    /// Best-effort decode of an incomplete byte stream, then a full
    /// re-encode of whatever pixel data decoded. The permissive pass
    /// retries once with an end-of-image marker appended, which lets the
    /// decoder run to the end of a truncated entropy stream. Success only
    /// when the decoded dimensions are non-zero.
    fn repair_truncated(&self, working_copy: &Path) -> RepairOutcome {
        let data = match std::fs::read(working_copy) {
            Ok(d) => d,
            Err(e) => return RepairOutcome::failed(format!("cannot read working copy: {}", e)),
        };

        let decoded = image::load_from_memory(&data).or_else(|first_err| {
            if jpeg::has_footer(&data) {
                Err(first_err)
            } else {
                let mut padded = data.clone();
                padded.extend_from_slice(&jpeg::EOI);
                image::load_from_memory(&padded)
            }
        });

        let img = match decoded {
            Ok(img) => img,
            Err(e) => return RepairOutcome::failed(format!("partial decode failed: {}", e)),
        };

        let (w, h) = (img.width(), img.height());
        if w == 0 || h == 0 {
            return RepairOutcome::failed("image has zero dimensions after load");
        }

        // JPEG encoding needs an RGB buffer; alpha and exotic layouts are
        // flattened first
        let rgb = image::DynamicImage::ImageRgb8(img.to_rgb8());
        let mut encoded = Cursor::new(Vec::new());
        if let Err(e) = rgb.write_to(&mut encoded, image::ImageFormat::Jpeg) {
            return RepairOutcome::failed(format!("re-encode failed: {}", e));
        }

        match std::fs::write(working_copy, encoded.into_inner()) {
            Ok(()) => RepairOutcome::ok(format!(
                "re-encoded partial decode ({}x{} px - trailing rows may be missing)",
                w, h
            )),
            Err(e) => RepairOutcome::failed(format!("cannot write working copy: {}", e)),
        }
    }
}
