//! # Image Dimension Probing
//!
//! Recovers intrinsic pixel dimensions for photos and logos whose snapshot
//! entries arrived without them (the producing app stores null dimensions
//! when the browser failed to decode an upload). Only the image header is
//! read; pixels are never decoded, because layout needs aspect ratio and
//! nothing else.
//!
//! Probing is strictly best-effort. Every failure path returns `None` and
//! the caller falls back to the fixed box policy in [`crate::fit`].

use std::io::Cursor;

/// Probe the intrinsic `(width, height)` of an image payload.
///
/// Supported payload forms:
/// - Data URI (`data:image/...;base64,...`)
/// - File path (absolute or relative), read from disk on native targets only
/// - Raw base64-encoded image data
pub fn probe_dimensions(payload: &str) -> Option<(u32, u32)> {
    let bytes = read_payload_bytes(payload).ok()?;
    dimensions_from_bytes(&bytes)
}

/// Resolve the payload string to raw image bytes.
fn read_payload_bytes(payload: &str) -> Result<Vec<u8>, String> {
    // Data URI: data:image/jpeg;base64,/9j/4AAQ...
    if payload.starts_with("data:image/") {
        let comma_pos = payload
            .find(',')
            .ok_or_else(|| "invalid data URI: missing comma".to_string())?;
        return base64_decode(&payload[comma_pos + 1..]);
    }

    // File path. Only explicit path prefixes, so base64 strings (which
    // contain '/') are never mistaken for paths.
    if payload.starts_with('/') || payload.starts_with("./") || payload.starts_with("../") {
        #[cfg(not(target_arch = "wasm32"))]
        {
            return std::fs::read(payload)
                .map_err(|e| format!("failed to read image file '{}': {}", payload, e));
        }
        #[cfg(target_arch = "wasm32")]
        {
            return Err(format!(
                "file path images not supported in WASM: '{}'",
                payload
            ));
        }
    }

    base64_decode(payload)
}

fn base64_decode(input: &str) -> Result<Vec<u8>, String> {
    use base64::Engine;
    base64::engine::general_purpose::STANDARD
        .decode(input)
        .map_err(|e| format!("base64 decode error: {}", e))
}

/// Sniff the format from magic bytes, then read dimensions from the header.
fn dimensions_from_bytes(data: &[u8]) -> Option<(u32, u32)> {
    if data.len() < 12 || !(is_jpeg(data) || is_png(data) || is_webp(data)) {
        return None;
    }
    image::io::Reader::new(Cursor::new(data))
        .with_guessed_format()
        .ok()?
        .into_dimensions()
        .ok()
}

fn is_jpeg(data: &[u8]) -> bool {
    data.len() >= 2 && data[0] == 0xFF && data[1] == 0xD8
}

fn is_png(data: &[u8]) -> bool {
    data.len() >= 4 && data[0] == 0x89 && data[1] == 0x50 && data[2] == 0x4E && data[3] == 0x47
}

fn is_webp(data: &[u8]) -> bool {
    data.len() >= 12 && &data[0..4] == b"RIFF" && &data[8..12] == b"WEBP"
}
