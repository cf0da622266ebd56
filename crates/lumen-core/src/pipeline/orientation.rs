//! EXIF orientation handling.
//!
//! Cameras record rotation as an EXIF tag instead of rotating pixels; the
//! converter bakes the rotation in so output is visually upright.

use exif::{In, Reader, Tag, Value};
use image::DynamicImage;
use std::io::Cursor;

/// Read the EXIF orientation value (1-8) from raw image bytes.
///
/// Returns `None` when the container has no EXIF segment or no orientation
/// tag — both common and not an error.
pub fn from_bytes(bytes: &[u8]) -> Option<u32> {
    let mut cursor = Cursor::new(bytes);
    let exif = Reader::new().read_from_container(&mut cursor).ok()?;
    exif.get_field(Tag::Orientation, In::PRIMARY)
        .and_then(|f| match &f.value {
            Value::Short(v) => v.first().map(|&x| x as u32),
            Value::Long(v) => v.first().copied(),
            _ => None,
        })
}

/// Apply an EXIF orientation to a decoded image, producing upright pixels.
///
/// Values outside 2-8 (including the upright 1) return the image unchanged.
pub fn apply(image: DynamicImage, orientation: u32) -> DynamicImage {
    match orientation {
        2 => image.fliph(),
        3 => image.rotate180(),
        4 => image.flipv(),
        5 => image.rotate90().fliph(),
        6 => image.rotate90(),
        7 => image.rotate270().fliph(),
        8 => image.rotate270(),
        _ => image,
    }
}
