//! Mime type resolution for generated thumbnails.

/// Used when the model declares no type and the bytes match no known format.
pub const FALLBACK_THUMBNAIL_MIME: &str = "image/png";

const PREFIX_SIGNATURES: &[(&[u8], &str)] = &[
    (&[0xFF, 0xD8, 0xFF], "image/jpeg"),
    (&[0x89, 0x50, 0x4E, 0x47], "image/png"),
];

/// Recognize JPEG, PNG, or WebP from leading bytes.
pub fn sniff_image_mime(bytes: &[u8]) -> Option<&'static str> {
    if bytes.len() >= 12 && bytes.starts_with(b"RIFF") && &bytes[8..12] == b"WEBP" {
        return Some("image/webp");
    }

    PREFIX_SIGNATURES
        .iter()
        .find(|(magic, _)| bytes.starts_with(magic))
        .map(|(_, mime)| *mime)
}

/// The mime type a thumbnail's data URI should carry.
///
/// A type declared by the model wins; otherwise the payload is sniffed.
pub fn resolve_thumbnail_mime(declared: &str, bytes: &[u8]) -> String {
    let declared = declared.trim();
    if !declared.is_empty() {
        return declared.to_string();
    }

    match sniff_image_mime(bytes) {
        Some(mime) => mime.to_string(),
        None => {
            tracing::warn!(
                "Thumbnail has no declared type and unknown leading bytes {:02X?}; using {}",
                &bytes[..bytes.len().min(4)],
                FALLBACK_THUMBNAIL_MIME
            );
            FALLBACK_THUMBNAIL_MIME.to_string()
        }
    }
}
