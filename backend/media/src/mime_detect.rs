//! Upload type checks.
//!
//! The declared filename decides whether an upload is even attempted; the
//! decoder decides afterwards whether the bytes really are an image.

/// Extensions accepted for upload, lowercase.
pub const ALLOWED_EXTENSIONS: [&str; 3] = ["jpg", "jpeg", "png"];

/// Whether a filename carries one of the allowed image extensions.
///
/// Only the text after the last `.` counts; comparison ignores case.
pub fn is_allowed_filename(filename: &str) -> bool {
    match filename.rsplit_once('.') {
        Some((_, ext)) => {
            let ext = ext.to_ascii_lowercase();
            ALLOWED_EXTENSIONS.contains(&ext.as_str())
        }
        None => false,
    }
}

/// Sniff the container from magic bytes, independent of the declared name.
pub fn sniff_mime(bytes: &[u8]) -> Option<&'static str> {
    if bytes.starts_with(&[0xFF, 0xD8, 0xFF]) {
        Some("image/jpeg")
    } else if bytes.starts_with(b"\x89PNG\r\n\x1a\n") {
        Some("image/png")
    } else {
        None
    }
}
