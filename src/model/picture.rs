//! Inline pictures: image bytes plus their display size.

use std::io::Cursor;
use std::sync::Arc;

use image::ImageReader;

use crate::error::{DocxServerError, Result};

/// English Metric Units per inch.
pub const EMU_PER_INCH: f64 = 914_400.0;
/// EMU per pixel at 96 DPI.
const EMU_PER_PIXEL: u64 = 9_525;
/// Longest side Word accepts for a picture, in inches.
pub const MAX_PICTURE_INCHES: f64 = 22.0;

/// Image encodings a document can embed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ImageFormat {
    Png,
    Jpeg,
    Gif,
    Bmp,
}

impl ImageFormat {
    fn from_image(format: image::ImageFormat) -> Option<Self> {
        match format {
            image::ImageFormat::Png => Some(Self::Png),
            image::ImageFormat::Jpeg => Some(Self::Jpeg),
            image::ImageFormat::Gif => Some(Self::Gif),
            image::ImageFormat::Bmp => Some(Self::Bmp),
            _ => None,
        }
    }

    /// Format from the file signature.
    pub fn detect(data: &[u8]) -> Option<Self> {
        image::guess_format(data).ok().and_then(Self::from_image)
    }

    pub fn extension(self) -> &'static str {
        match self {
            Self::Png => "png",
            Self::Jpeg => "jpeg",
            Self::Gif => "gif",
            Self::Bmp => "bmp",
        }
    }

    pub fn content_type(self) -> &'static str {
        match self {
            Self::Png => "image/png",
            Self::Jpeg => "image/jpeg",
            Self::Gif => "image/gif",
            Self::Bmp => "image/bmp",
        }
    }
}

/// A picture shown as its own paragraph.
#[derive(Debug, Clone, PartialEq)]
pub struct Picture {
    data: Arc<[u8]>,
    format: ImageFormat,
    width_emu: u64,
    height_emu: u64,
}

impl Picture {
    /// Picture from image file bytes.
    ///
    /// Without a width or height the picture keeps its pixel size at 96 DPI.
    /// When only one side is given the other is scaled to keep the aspect ratio.
    pub fn from_image(
        data: Vec<u8>,
        width_inches: Option<f64>,
        height_inches: Option<f64>,
    ) -> Result<Self> {
        let reader = ImageReader::new(Cursor::new(data.as_slice())).with_guessed_format()?;
        let format = reader
            .format()
            .and_then(ImageFormat::from_image)
            .ok_or_else(|| {
                DocxServerError::validation("unsupported image format (expected PNG, JPEG, GIF or BMP)")
            })?;
        let (px_width, px_height) = reader
            .into_dimensions()
            .map_err(|e| DocxServerError::validation(format!("cannot read image: {e}")))?;
        if px_width == 0 || px_height == 0 {
            return Err(DocxServerError::validation("image has no pixels"));
        }

        let (width_emu, height_emu) = match (width_inches, height_inches) {
            (None, None) => (
                u64::from(px_width) * EMU_PER_PIXEL,
                u64::from(px_height) * EMU_PER_PIXEL,
            ),
            (Some(width), None) => {
                let width = inches_to_emu("width", width)?;
                (width, scale(width, px_height, px_width))
            }
            (None, Some(height)) => {
                let height = inches_to_emu("height", height)?;
                (scale(height, px_width, px_height), height)
            }
            (Some(width), Some(height)) => (
                inches_to_emu("width", width)?,
                inches_to_emu("height", height)?,
            ),
        };

        Ok(Self {
            data: Arc::from(data),
            format,
            width_emu,
            height_emu,
        })
    }

    /// Picture read back from a package, keeping its stored extent.
    ///
    /// `None` for an empty extent or an encoding that cannot be embedded.
    pub(crate) fn from_stored(data: Vec<u8>, width_emu: u64, height_emu: u64) -> Option<Self> {
        if width_emu == 0 || height_emu == 0 {
            return None;
        }
        let format = ImageFormat::detect(&data)?;
        Some(Self {
            data: Arc::from(data),
            format,
            width_emu,
            height_emu,
        })
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn format(&self) -> ImageFormat {
        self.format
    }

    pub fn width_emu(&self) -> u64 {
        self.width_emu
    }

    pub fn height_emu(&self) -> u64 {
        self.height_emu
    }

    pub fn width_inches(&self) -> f64 {
        self.width_emu as f64 / EMU_PER_INCH
    }

    pub fn height_inches(&self) -> f64 {
        self.height_emu as f64 / EMU_PER_INCH
    }
}

fn inches_to_emu(side: &str, inches: f64) -> Result<u64> {
    if !(inches > 0.0 && inches <= MAX_PICTURE_INCHES) {
        return Err(DocxServerError::validation(format!(
            "{side} must be between 0 and {MAX_PICTURE_INCHES} inches, got {inches}"
        )));
    }
    Ok((inches * EMU_PER_INCH).round() as u64)
}

/// `length * numerator / denominator`, never zero.
fn scale(length: u64, numerator: u32, denominator: u32) -> u64 {
    (length * u64::from(numerator) / u64::from(denominator)).max(1)
}
