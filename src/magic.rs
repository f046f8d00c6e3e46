//! Magic-byte signature check against a declared format.
//!
//! In-process and deterministic: reads at most the first 16 bytes of the
//! candidate file and compares them against the signature table for the
//! format the upstream recovery step declared.

use crate::types::ImageFormat;
use std::fs::File;
use std::io::Read;
use std::path::Path;

/// Longest signature is PNG's 8 bytes; 16 gives slack for future entries
pub const SNIFF_LEN: usize = 16;

/// Accepted byte prefixes per format, most specific first
pub fn signatures_for(format: ImageFormat) -> &'static [&'static [u8]] {
    match format {
        ImageFormat::Jpeg => &[
            b"\xff\xd8\xff\xe0",
            b"\xff\xd8\xff\xe1",
            b"\xff\xd8\xff\xe2",
            b"\xff\xd8\xff\xe8",
            b"\xff\xd8\xff",
        ],
        ImageFormat::Png => &[b"\x89PNG\r\n\x1a\n"],
        ImageFormat::Gif => &[b"GIF87a", b"GIF89a"],
        ImageFormat::Tiff => &[b"\x49\x49\x2a\x00", b"\x4d\x4d\x00\x2a"],
        ImageFormat::Bmp => &[b"BM"],
        ImageFormat::Webp => &[b"RIFF"],
    }
}

/// Check a header buffer against the declared format's signatures.
///
/// An undeclared format passes: the upstream step could not assign one, so
/// the magic check gives benefit of the doubt and lets the external
/// validators decide.
pub fn matches(header: &[u8], declared: Option<ImageFormat>) -> bool {
    let Some(format) = declared else {
        return true;
    };
    signatures_for(format)
        .iter()
        .any(|sig| header.starts_with(sig))
}

/// Read-only sniff of the file's leading bytes. Unreadable files fail the
/// check; the validator records the real cause separately.
pub fn sniff(path: &Path, declared: Option<ImageFormat>) -> bool {
    let mut header = [0u8; SNIFF_LEN];
    let n = match File::open(path).and_then(|mut f| f.read(&mut header)) {
        Ok(n) => n,
        Err(_) => return false,
    };
    matches(&header[..n], declared)
}
