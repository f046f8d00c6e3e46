//! Byte-level JPEG structure repair.
//!
//! All functions operate on an in-memory buffer and return either the
//! repaired bytes with a description or a descriptive failure. They never
//! panic on malformed input, and the scan-data region (start-of-scan
//! through end of file) is preserved byte-identical wherever it exists.

/// Start of Image
pub const SOI: [u8; 2] = [0xFF, 0xD8];
/// End of Image
pub const EOI: [u8; 2] = [0xFF, 0xD9];
/// Start of Scan
pub const SOS: [u8; 2] = [0xFF, 0xDA];
/// Start of Frame (baseline DCT)
pub const SOF0: [u8; 2] = [0xFF, 0xC0];
/// Define Quantization Table
pub const DQT: [u8; 2] = [0xFF, 0xDB];
/// Define Huffman Table
pub const DHT: [u8; 2] = [0xFF, 0xC4];

/// Minimal valid JFIF APP0 segment: marker plus 16-byte body
pub const JFIF_APP0: [u8; 18] = [
    0xFF, 0xE0, 0x00, 0x10, b'J', b'F', b'I', b'F', 0x00, 0x01, 0x01, 0x00, 0x00, 0x01, 0x00,
    0x01, 0x00, 0x00,
];

/// Markers whose segments must survive a segment rebuild: frame header,
/// quantization tables, Huffman tables
const CRITICAL_MARKERS: [[u8; 2]; 3] = [SOF0, DQT, DHT];

fn find_marker(data: &[u8], marker: [u8; 2]) -> Option<usize> {
    data.windows(2).position(|w| w == marker)
}

/// Whether the buffer already ends with the end-of-image marker
pub fn has_footer(data: &[u8]) -> bool {
    data.ends_with(&EOI)
}

/// Restore a missing end-of-image trailer.
///
/// Fails without mutation when the trailer is already present (the second
/// call on a repaired buffer is a no-op failure). A dangling single `FF`
/// byte is treated as a half-written marker and replaced.
pub fn repair_footer(data: &[u8]) -> Result<(Vec<u8>, String), String> {
    if has_footer(data) {
        return Err("end-of-image marker already present - no repair needed".to_string());
    }

    if data.last() == Some(&0xFF) {
        let mut out = data[..data.len() - 1].to_vec();
        out.extend_from_slice(&EOI);
        return Ok((
            out,
            "replaced incomplete trailing marker with end-of-image".to_string(),
        ));
    }

    let mut out = data.to_vec();
    out.extend_from_slice(&EOI);
    Ok((out, "appended missing end-of-image marker".to_string()))
}

/// Rebuild a corrupt or missing start-of-image header.
///
/// When the start-of-image marker exists at a non-zero offset the leading
/// garbage is dropped. When it is absent entirely, a minimal
/// SOI + JFIF APP0 header is synthesized in front of the first
/// start-of-scan marker. Fails when the header is already intact or when
/// neither marker exists.
pub fn repair_header(data: &[u8]) -> Result<(Vec<u8>, String), String> {
    match find_marker(data, SOI) {
        Some(0) => Err("start-of-image already at offset 0 - header intact".to_string()),
        Some(pos) => Ok((
            data[pos..].to_vec(),
            format!("removed {} leading garbage bytes before start-of-image", pos),
        )),
        None => {
            let sos = find_marker(data, SOS)
                .ok_or_else(|| "no start-of-image or start-of-scan marker found - cannot reconstruct".to_string())?;
            let mut out = Vec::with_capacity(SOI.len() + JFIF_APP0.len() + data.len() - sos);
            out.extend_from_slice(&SOI);
            out.extend_from_slice(&JFIF_APP0);
            out.extend_from_slice(&data[sos..]);
            Ok((
                out,
                "synthesized start-of-image and JFIF header before start-of-scan".to_string(),
            ))
        }
    }
}

/// Rebuild the marker-segment chain, keeping only critical segments.
///
/// Walks `(marker, big-endian length)` pairs between start-of-image and
/// start-of-scan, retains frame header / quantization / Huffman segments
/// byte-for-byte, and splices them between a synthesized minimal header
/// and the untouched start-of-scan-to-end-of-file region. Disposable
/// application, comment and thumbnail segments are dropped; entropy-coded
/// scan data is never rewritten.
pub fn repair_segments(data: &[u8]) -> Result<(Vec<u8>, String), String> {
    let sos = find_marker(data, SOS)
        .ok_or_else(|| "no start-of-scan marker - cannot isolate scan data".to_string())?;

    let mut critical: Vec<u8> = Vec::new();
    let mut i = SOI.len();
    while i < sos {
        if data[i] != 0xFF {
            i += 1;
            continue;
        }
        if i + 4 > data.len() {
            break;
        }
        let marker = [data[i], data[i + 1]];
        let seg_len = u16::from_be_bytes([data[i + 2], data[i + 3]]) as usize;
        let seg_end = i + 2 + seg_len;
        if seg_end > data.len() || seg_end <= i {
            break;
        }
        if CRITICAL_MARKERS.contains(&marker) {
            critical.extend_from_slice(&data[i..seg_end]);
        }
        i = seg_end;
    }

    let mut out = Vec::with_capacity(SOI.len() + JFIF_APP0.len() + critical.len() + data.len() - sos);
    out.extend_from_slice(&SOI);
    out.extend_from_slice(&JFIF_APP0);
    out.extend_from_slice(&critical);
    out.extend_from_slice(&data[sos..]);

    let removed = (data.len() as i64) - (out.len() as i64);
    Ok((
        out,
        format!(
            "rebuilt segment chain: kept {} critical bytes, removed {} bytes of disposable segments",
            critical.len(),
            removed.max(0)
        ),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Minimal structural JPEG: SOI, APP0, DQT, COM, SOF0, DHT, SOS, data, EOI
    fn sample_jpeg() -> Vec<u8> {
        let mut d = Vec::new();
        d.extend_from_slice(&SOI);
        d.extend_from_slice(&JFIF_APP0);
        // DQT segment: marker + len 0x0005 + 3 payload bytes
        d.extend_from_slice(&[0xFF, 0xDB, 0x00, 0x05, 1, 2, 3]);
        // COM segment (disposable)
        d.extend_from_slice(&[0xFF, 0xFE, 0x00, 0x06, b'j', b'u', b'n', b'k']);
        // SOF0 segment
        d.extend_from_slice(&[0xFF, 0xC0, 0x00, 0x05, 4, 5, 6]);
        // DHT segment
        d.extend_from_slice(&[0xFF, 0xC4, 0x00, 0x04, 7, 8]);
        // SOS and entropy-coded data
        d.extend_from_slice(&SOS);
        d.extend_from_slice(&[0x00, 0x0C, 0xAA, 0xBB, 0xCC, 0xDD]);
        d.extend_from_slice(&EOI);
        d
    }

    #[test]
    fn test_footer_appends_when_missing() {
        // Scenario A: header present, no trailer
        let data = b"\xff\xd8\xff\xe0payload".to_vec();
        let (out, msg) = repair_footer(&data).unwrap();
        assert!(out.ends_with(&EOI));
        assert_eq!(&out[..data.len()], &data[..]);
        assert!(msg.contains("appended"));
    }

    #[test]
    fn test_footer_replaces_dangling_ff() {
        let data = b"\xff\xd8\xff\xe0payload\xff".to_vec();
        let (out, msg) = repair_footer(&data).unwrap();
        assert!(out.ends_with(&EOI));
        assert_eq!(out.len(), data.len() + 1);
        assert!(msg.contains("replaced"));
    }

    #[test]
    fn test_footer_is_idempotent() {
        let data = b"\xff\xd8payload".to_vec();
        let (repaired, _) = repair_footer(&data).unwrap();
        let err = repair_footer(&repaired).unwrap_err();
        assert!(err.contains("already present"));
    }

    #[test]
    fn test_header_strips_garbage_prefix() {
        // Scenario B: 40 garbage bytes before the real start-of-image
        let mut data = vec![0x42u8; 40];
        data.extend_from_slice(b"\xff\xd8\xff\xe0rest of file");
        let (out, msg) = repair_header(&data).unwrap();
        assert_eq!(out.len(), data.len() - 40);
        assert!(out.starts_with(&SOI));
        assert_eq!(&out[..], &data[40..]);
        assert!(msg.contains("40"));
    }

    #[test]
    fn test_header_noop_when_intact() {
        let err = repair_header(b"\xff\xd8\xff\xe0rest").unwrap_err();
        assert!(err.contains("already at offset 0"));
    }

    #[test]
    fn test_header_synthesis_before_sos() {
        let mut data = b"no markers here ".to_vec();
        data.extend_from_slice(&SOS);
        data.extend_from_slice(b"scan bytes");
        let (out, _) = repair_header(&data).unwrap();
        assert!(out.starts_with(&SOI));
        assert_eq!(&out[2..2 + JFIF_APP0.len()], &JFIF_APP0);
        assert!(out.ends_with(b"scan bytes"));
    }

    #[test]
    fn test_header_fails_without_any_marker() {
        let err = repair_header(b"nothing useful at all").unwrap_err();
        assert!(err.contains("cannot reconstruct"));
    }

    #[test]
    fn test_segments_keeps_critical_drops_disposable() {
        let data = sample_jpeg();
        let (out, _) = repair_segments(&data).unwrap();

        // Critical segments survive byte-for-byte
        assert!(out
            .windows(7)
            .any(|w| w == [0xFF, 0xDB, 0x00, 0x05, 1, 2, 3]));
        assert!(out
            .windows(7)
            .any(|w| w == [0xFF, 0xC0, 0x00, 0x05, 4, 5, 6]));
        assert!(out.windows(6).any(|w| w == [0xFF, 0xC4, 0x00, 0x04, 7, 8]));
        // Disposable comment segment is gone
        assert!(!out.windows(4).any(|w| w == *b"junk"));
    }

    #[test]
    fn test_segments_scan_region_byte_identical() {
        let data = sample_jpeg();
        let sos_in = data.windows(2).position(|w| w == SOS).unwrap();
        let (out, _) = repair_segments(&data).unwrap();
        let sos_out = out.windows(2).position(|w| w == SOS).unwrap();
        assert_eq!(&out[sos_out..], &data[sos_in..]);
    }

    #[test]
    fn test_segments_fails_without_sos() {
        let err = repair_segments(b"\xff\xd8\xff\xe0no scan marker").unwrap_err();
        assert!(err.contains("no start-of-scan"));
    }

    #[test]
    fn test_segments_tolerates_malformed_lengths() {
        // Segment length pointing past the end of the buffer must not panic
        let mut data = Vec::new();
        data.extend_from_slice(&SOI);
        data.extend_from_slice(&[0xFF, 0xDB, 0xFF, 0xFF, 1]);
        data.extend_from_slice(&SOS);
        data.extend_from_slice(&[0xAA]);
        let result = repair_segments(&data);
        assert!(result.is_ok());
    }
}
