//! Output formats and their encoder configuration.
//!
//! The format set is closed: every run converts all of its jobs into one of
//! these, selected once per run. Encoder parameters live here as one record
//! per format rather than branching at the call sites.

use serde::{Deserialize, Serialize};

/// Target format for a conversion run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Lossy JPEG, quality 90
    Jpeg,
    /// Lossless 8-bit RGBA PNG
    Png,
    /// Lossless 8-bit RGBA TIFF
    Tiff,
    /// Lossy AVIF, quality 85 (the high-efficiency HEIF-family format)
    Avif,
}

/// Encoder parameters for one output format.
///
/// All formats encode in the sRGB working space at 8 bits per channel;
/// `quality` is `None` for the lossless formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EncodeSettings {
    /// Lossy quality factor (0-100), `None` for lossless output
    pub quality: Option<u8>,

    /// Encoder effort/speed knob (AVIF only, 1 = slowest)
    pub speed: Option<u8>,
}

impl OutputFormat {
    /// All formats, in presentation order.
    pub const ALL: [OutputFormat; 4] = [
        OutputFormat::Jpeg,
        OutputFormat::Png,
        OutputFormat::Tiff,
        OutputFormat::Avif,
    ];

    /// Canonical file extension for this format.
    pub fn extension(self) -> &'static str {
        match self {
            OutputFormat::Jpeg => "jpg",
            OutputFormat::Png => "png",
            OutputFormat::Tiff => "tiff",
            OutputFormat::Avif => "avif",
        }
    }

    /// Encoder configuration for this format.
    pub fn settings(self) -> EncodeSettings {
        match self {
            OutputFormat::Jpeg => EncodeSettings {
                quality: Some(90),
                speed: None,
            },
            OutputFormat::Png | OutputFormat::Tiff => EncodeSettings {
                quality: None,
                speed: None,
            },
            OutputFormat::Avif => EncodeSettings {
                quality: Some(85),
                speed: Some(6),
            },
        }
    }

    /// Whether this format encodes losslessly.
    pub fn is_lossless(self) -> bool {
        self.settings().quality.is_none()
    }

    /// Parse a format name as it appears in config files.
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "jpeg" | "jpg" => Some(OutputFormat::Jpeg),
            "png" => Some(OutputFormat::Png),
            "tiff" | "tif" => Some(OutputFormat::Tiff),
            "avif" => Some(OutputFormat::Avif),
            _ => None,
        }
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            OutputFormat::Jpeg => "jpeg",
            OutputFormat::Png => "png",
            OutputFormat::Tiff => "tiff",
            OutputFormat::Avif => "avif",
        };
        f.write_str(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extensions() {
        assert_eq!(OutputFormat::Jpeg.extension(), "jpg");
        assert_eq!(OutputFormat::Png.extension(), "png");
        assert_eq!(OutputFormat::Tiff.extension(), "tiff");
        assert_eq!(OutputFormat::Avif.extension(), "avif");
    }

    #[test]
    fn test_lossy_quality_factors() {
        assert_eq!(OutputFormat::Jpeg.settings().quality, Some(90));
        assert_eq!(OutputFormat::Avif.settings().quality, Some(85));
    }

    #[test]
    fn test_lossless_formats_have_no_quality() {
        assert!(OutputFormat::Png.is_lossless());
        assert!(OutputFormat::Tiff.is_lossless());
        assert!(!OutputFormat::Jpeg.is_lossless());
        assert!(!OutputFormat::Avif.is_lossless());
    }

    #[test]
    fn test_from_name() {
        assert_eq!(OutputFormat::from_name("jpeg"), Some(OutputFormat::Jpeg));
        assert_eq!(OutputFormat::from_name("JPG"), Some(OutputFormat::Jpeg));
        assert_eq!(OutputFormat::from_name("tif"), Some(OutputFormat::Tiff));
        assert_eq!(OutputFormat::from_name("webp"), None);
    }
}
