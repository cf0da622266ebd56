//! Input eligibility by file extension.

use std::path::Path;

/// Extensions accepted as conversion input, compared case-insensitively.
pub const ELIGIBLE_EXTENSIONS: [&str; 14] = [
    "jpg", "jpeg", "png", "tiff", "tif", "nef", "cr2", "cr3", "raw", "dng", "heic", "arw", "orf",
    "pef",
];

/// Check whether a path names an eligible image input.
///
/// Returns false for paths with no extension or an unrecognized one.
/// Purely lexical; the filesystem is not consulted.
pub fn is_eligible(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| {
            ELIGIBLE_EXTENSIONS
                .iter()
                .any(|allowed| allowed.eq_ignore_ascii_case(ext))
        })
        .unwrap_or(false)
}
