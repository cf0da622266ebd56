//! The converter: one decode + encode + write cycle per call.
//!
//! Each call is self-contained: every intermediate buffer (source bytes,
//! decoded pixels, encoder state) is function-local and dropped before the
//! call returns, whatever the outcome. The runner awaits each call to
//! completion, so processing arbitrarily many large sources never
//! accumulates memory.

use image::{GenericImageView, ImageFormat, ImageReader};
use std::ffi::OsStr;
use std::io::{BufWriter, Cursor, Seek, Write};
use std::path::{Path, PathBuf};

use crate::config::LimitsConfig;
use crate::error::{ConvertError, ConvertResult};
use crate::format::OutputFormat;

use super::orientation;

/// Converts single source images into a target format.
pub struct ImageConverter {
    limits: LimitsConfig,
}

impl ImageConverter {
    /// Create a new converter with the given limits.
    pub fn new(limits: LimitsConfig) -> Self {
        Self { limits }
    }

    /// Convert one source file into `dest_dir` as `<stem>.<extension>`.
    ///
    /// The cycle runs on the blocking pool and is awaited to completion.
    /// An existing destination file is replaced; the output is written to a
    /// temp file first and renamed into place, so a failed encode leaves no
    /// partial file behind.
    pub async fn convert(
        &self,
        source: &Path,
        dest_dir: &Path,
        format: OutputFormat,
    ) -> ConvertResult<PathBuf> {
        let limits = self.limits.clone();
        let source_owned = source.to_path_buf();
        let dest_dir = dest_dir.to_path_buf();
        let join_path = source.to_path_buf();

        tokio::task::spawn_blocking(move || {
            Self::convert_sync(&limits, &source_owned, &dest_dir, format)
        })
        .await
        .map_err(|e| ConvertError::Decode {
            path: join_path,
            message: format!("task join error: {e}"),
        })?
    }

    /// Synchronous conversion cycle (runs in `spawn_blocking`).
    fn convert_sync(
        limits: &LimitsConfig,
        source: &Path,
        dest_dir: &Path,
        format: OutputFormat,
    ) -> ConvertResult<PathBuf> {
        let metadata = std::fs::metadata(source).map_err(|e| ConvertError::Decode {
            path: source.to_path_buf(),
            message: format!("cannot stat source: {e}"),
        })?;
        let max_bytes = limits.max_file_size_mb * 1024 * 1024;
        if metadata.len() > max_bytes {
            return Err(ConvertError::FileTooLarge {
                path: source.to_path_buf(),
                size_mb: metadata.len() / (1024 * 1024),
                max_mb: limits.max_file_size_mb,
            });
        }

        let bytes = std::fs::read(source).map_err(|e| ConvertError::Decode {
            path: source.to_path_buf(),
            message: format!("cannot read source: {e}"),
        })?;

        // Orientation comes from the raw bytes; decoding drops the EXIF
        // segment
        let orientation_tag = orientation::from_bytes(&bytes);

        let mut reader = ImageReader::new(Cursor::new(bytes))
            .with_guessed_format()
            .map_err(|e| ConvertError::Decode {
                path: source.to_path_buf(),
                message: format!("cannot sniff image format: {e}"),
            })?;
        if reader.format().is_none() {
            // Content sniffing failed; fall back to the extension
            match ImageFormat::from_path(source) {
                Ok(fallback) => reader.set_format(fallback),
                Err(_) => {
                    return Err(ConvertError::Decode {
                        path: source.to_path_buf(),
                        message: "cannot determine image format".to_string(),
                    })
                }
            }
        }
        let decoded = reader.decode().map_err(|e| ConvertError::Decode {
            path: source.to_path_buf(),
            message: e.to_string(),
        })?;

        let (width, height) = decoded.dimensions();
        if width > limits.max_image_dimension || height > limits.max_image_dimension {
            return Err(ConvertError::ImageTooLarge {
                path: source.to_path_buf(),
                width,
                height,
                max_dim: limits.max_image_dimension,
            });
        }

        let upright = match orientation_tag {
            Some(tag) => orientation::apply(decoded, tag),
            None => decoded,
        };

        let stem = source
            .file_stem()
            .and_then(OsStr::to_str)
            .unwrap_or("converted");
        let dest_path = dest_dir.join(format!("{stem}.{}", format.extension()));

        let mut tmp = tempfile::Builder::new()
            .prefix(".lumen-")
            .tempfile_in(dest_dir)
            .map_err(|e| ConvertError::Encode {
                path: dest_path.clone(),
                message: format!("cannot create temp file: {e}"),
            })?;
        {
            let mut writer = BufWriter::new(tmp.as_file_mut());
            encode_into(&mut writer, &upright, format).map_err(|e| ConvertError::Encode {
                path: dest_path.clone(),
                message: e.to_string(),
            })?;
            writer.flush().map_err(|e| ConvertError::Encode {
                path: dest_path.clone(),
                message: format!("cannot flush output: {e}"),
            })?;
        }
        tmp.persist(&dest_path).map_err(|e| ConvertError::Encode {
            path: dest_path.clone(),
            message: format!("cannot persist output: {e}"),
        })?;

        Ok(dest_path)
    }
}

/// Encode upright pixels in the sRGB working space at 8 bits per channel.
///
/// The `image` stack decodes into sRGB-coded buffers, so conversion to
/// `rgb8`/`rgba8` is the canonical-space normalization.
fn encode_into<W: Write + Seek>(
    writer: &mut W,
    image: &image::DynamicImage,
    format: OutputFormat,
) -> image::ImageResult<()> {
    use image::codecs::avif::AvifEncoder;
    use image::codecs::jpeg::JpegEncoder;
    use image::codecs::png::PngEncoder;
    use image::codecs::tiff::TiffEncoder;
    use image::{ExtendedColorType, ImageEncoder};

    let settings = format.settings();
    match format {
        OutputFormat::Jpeg => {
            // JPEG has no alpha channel
            let rgb = image.to_rgb8();
            JpegEncoder::new_with_quality(&mut *writer, settings.quality.unwrap_or(90))
                .write_image(rgb.as_raw(), rgb.width(), rgb.height(), ExtendedColorType::Rgb8)
        }
        OutputFormat::Png => {
            let rgba = image.to_rgba8();
            PngEncoder::new(&mut *writer).write_image(
                rgba.as_raw(),
                rgba.width(),
                rgba.height(),
                ExtendedColorType::Rgba8,
            )
        }
        OutputFormat::Tiff => {
            let rgba = image.to_rgba8();
            TiffEncoder::new(&mut *writer).write_image(
                rgba.as_raw(),
                rgba.width(),
                rgba.height(),
                ExtendedColorType::Rgba8,
            )
        }
        OutputFormat::Avif => {
            let rgba = image.to_rgba8();
            AvifEncoder::new_with_speed_quality(
                &mut *writer,
                settings.speed.unwrap_or(6),
                settings.quality.unwrap_or(85),
            )
            .write_image(
                rgba.as_raw(),
                rgba.width(),
                rgba.height(),
                ExtendedColorType::Rgba8,
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    fn write_png(dir: &Path, name: &str, width: u32, height: u32) -> PathBuf {
        let path = dir.join(name);
        image::RgbImage::from_pixel(width, height, Rgb([120, 60, 200]))
            .save(&path)
            .unwrap();
        path
    }

    #[test]
    fn test_png_to_jpeg() {
        let src_dir = tempfile::tempdir().unwrap();
        let dest_dir = tempfile::tempdir().unwrap();
        let source = write_png(src_dir.path(), "shot.png", 32, 24);

        let dest = ImageConverter::convert_sync(
            &LimitsConfig::default(),
            &source,
            dest_dir.path(),
            OutputFormat::Jpeg,
        )
        .unwrap();

        assert_eq!(dest, dest_dir.path().join("shot.jpg"));
        let output = image::open(&dest).unwrap();
        assert_eq!(output.dimensions(), (32, 24));
    }

    #[test]
    fn test_stem_with_inner_dots() {
        let src_dir = tempfile::tempdir().unwrap();
        let dest_dir = tempfile::tempdir().unwrap();
        let source = write_png(src_dir.path(), "holiday.trip.png", 8, 8);

        let dest = ImageConverter::convert_sync(
            &LimitsConfig::default(),
            &source,
            dest_dir.path(),
            OutputFormat::Tiff,
        )
        .unwrap();

        assert_eq!(dest.file_name().unwrap(), "holiday.trip.tiff");
    }

    #[test]
    fn test_corrupt_source_is_decode_error() {
        let src_dir = tempfile::tempdir().unwrap();
        let dest_dir = tempfile::tempdir().unwrap();
        let source = src_dir.path().join("broken.jpg");
        std::fs::write(&source, b"not an image at all").unwrap();

        let err = ImageConverter::convert_sync(
            &LimitsConfig::default(),
            &source,
            dest_dir.path(),
            OutputFormat::Png,
        )
        .unwrap_err();

        assert!(matches!(err, ConvertError::Decode { .. }));
        // No partial output left behind
        assert!(!dest_dir.path().join("broken.png").exists());
    }

    #[test]
    fn test_file_size_limit() {
        let src_dir = tempfile::tempdir().unwrap();
        let dest_dir = tempfile::tempdir().unwrap();
        let source = write_png(src_dir.path(), "big.png", 16, 16);

        let limits = LimitsConfig {
            max_file_size_mb: 0,
            ..LimitsConfig::default()
        };
        let err =
            ImageConverter::convert_sync(&limits, &source, dest_dir.path(), OutputFormat::Jpeg)
                .unwrap_err();
        assert!(matches!(err, ConvertError::FileTooLarge { .. }));
    }

    #[test]
    fn test_dimension_limit() {
        let src_dir = tempfile::tempdir().unwrap();
        let dest_dir = tempfile::tempdir().unwrap();
        let source = write_png(src_dir.path(), "wide.png", 64, 4);

        let limits = LimitsConfig {
            max_image_dimension: 32,
            ..LimitsConfig::default()
        };
        let err =
            ImageConverter::convert_sync(&limits, &source, dest_dir.path(), OutputFormat::Jpeg)
                .unwrap_err();
        assert!(matches!(err, ConvertError::ImageTooLarge { .. }));
    }

    #[test]
    fn test_existing_destination_overwritten() {
        let src_dir = tempfile::tempdir().unwrap();
        let dest_dir = tempfile::tempdir().unwrap();
        let source = write_png(src_dir.path(), "shot.png", 16, 16);

        let dest = dest_dir.path().join("shot.png");
        std::fs::write(&dest, b"stale garbage").unwrap();

        ImageConverter::convert_sync(
            &LimitsConfig::default(),
            &source,
            dest_dir.path(),
            OutputFormat::Png,
        )
        .unwrap();

        // Replaced with a decodable image
        assert!(image::open(&dest).is_ok());
    }

    #[test]
    fn test_misnamed_extension_decoded_by_content() {
        // PNG bytes behind a .jpg name decode fine via content sniffing
        let src_dir = tempfile::tempdir().unwrap();
        let dest_dir = tempfile::tempdir().unwrap();
        let png = write_png(src_dir.path(), "real.png", 8, 8);
        let misnamed = src_dir.path().join("misnamed.jpg");
        std::fs::copy(&png, &misnamed).unwrap();

        let dest = ImageConverter::convert_sync(
            &LimitsConfig::default(),
            &misnamed,
            dest_dir.path(),
            OutputFormat::Png,
        )
        .unwrap();
        assert!(image::open(&dest).is_ok());
    }

    #[tokio::test]
    async fn test_async_wrapper() {
        let src_dir = tempfile::tempdir().unwrap();
        let dest_dir = tempfile::tempdir().unwrap();
        let source = write_png(src_dir.path(), "shot.png", 16, 16);

        let converter = ImageConverter::new(LimitsConfig::default());
        let dest = converter
            .convert(&source, dest_dir.path(), OutputFormat::Jpeg)
            .await
            .unwrap();
        assert!(dest.exists());
    }
}
