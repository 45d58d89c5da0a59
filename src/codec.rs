//! Image measuring, compositing and encoding.
//!
//! The sprite builder talks to images only through [`ImageCodec`]. The
//! production implementation, [`RasterCodec`], is backed by the `image`
//! crate.

use crate::layout::SpritePlacement;
use image::{DynamicImage, ImageFormat, RgbaImage};
use std::fmt;
use std::fs;
use std::io::Cursor;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use thiserror::Error;

/// Error from an image codec.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum CodecError {
    #[error("Failed to read image {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to decode image {}: {source}", path.display())]
    Decode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
    #[error("Failed to encode {format} image: {source}")]
    Encode {
        format: SpriteFormat,
        #[source]
        source: image::ImageError,
    },
    #[error("Unsupported sprite format '{0}' (expected PNG, JPG, JPEG, BMP or GIF)")]
    UnsupportedFormat(String),
}

/// Sheet formats a sprite can be written in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SpriteFormat {
    Png,
    Jpg,
    Jpeg,
    Bmp,
    Gif,
}

impl SpriteFormat {
    pub const ALL: [SpriteFormat; 5] = [
        SpriteFormat::Png,
        SpriteFormat::Jpg,
        SpriteFormat::Jpeg,
        SpriteFormat::Bmp,
        SpriteFormat::Gif,
    ];

    /// Upper-case name, also used as the sheet file extension.
    pub fn as_str(&self) -> &'static str {
        match self {
            SpriteFormat::Png => "PNG",
            SpriteFormat::Jpg => "JPG",
            SpriteFormat::Jpeg => "JPEG",
            SpriteFormat::Bmp => "BMP",
            SpriteFormat::Gif => "GIF",
        }
    }

    pub fn image_format(&self) -> ImageFormat {
        match self {
            SpriteFormat::Png => ImageFormat::Png,
            SpriteFormat::Jpg | SpriteFormat::Jpeg => ImageFormat::Jpeg,
            SpriteFormat::Bmp => ImageFormat::Bmp,
            SpriteFormat::Gif => ImageFormat::Gif,
        }
    }

    /// Map a detected `image` format back to a sprite format.
    pub fn from_image_format(format: ImageFormat) -> Option<Self> {
        match format {
            ImageFormat::Png => Some(SpriteFormat::Png),
            ImageFormat::Jpeg => Some(SpriteFormat::Jpeg),
            ImageFormat::Bmp => Some(SpriteFormat::Bmp),
            ImageFormat::Gif => Some(SpriteFormat::Gif),
            _ => None,
        }
    }
}

impl FromStr for SpriteFormat {
    type Err = CodecError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SpriteFormat::ALL
            .into_iter()
            .find(|f| f.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| CodecError::UnsupportedFormat(s.to_string()))
    }
}

impl fmt::Display for SpriteFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Image operations needed to build a sprite sheet.
pub trait ImageCodec {
    /// In-memory sheet produced by [`compose`](ImageCodec::compose).
    type Image;

    /// Width and height of the image at `path`.
    fn dimensions(&self, path: &Path) -> Result<(u32, u32), CodecError>;

    /// Sniff the encoding of the image at `path`. `None` when it is not one
    /// of the supported sheet formats.
    fn detect_format(&self, path: &Path) -> Result<Option<SpriteFormat>, CodecError>;

    /// Draw every placement onto a transparent `width` x `height` canvas.
    fn compose(
        &self,
        placements: &[SpritePlacement],
        width: u32,
        height: u32,
    ) -> Result<Self::Image, CodecError>;

    /// Encode `image` as `format`.
    fn encode(&self, image: &Self::Image, format: SpriteFormat) -> Result<Vec<u8>, CodecError>;
}

/// [`ImageCodec`] backed by the `image` crate.
#[derive(Debug, Clone, Copy, Default)]
pub struct RasterCodec;

impl RasterCodec {
    pub fn new() -> Self {
        Self
    }

    fn open(&self, path: &Path) -> Result<DynamicImage, CodecError> {
        image::open(path).map_err(|source| CodecError::Decode { path: path.to_path_buf(), source })
    }
}

impl ImageCodec for RasterCodec {
    type Image = RgbaImage;

    fn dimensions(&self, path: &Path) -> Result<(u32, u32), CodecError> {
        image::image_dimensions(path)
            .map_err(|source| CodecError::Decode { path: path.to_path_buf(), source })
    }

    fn detect_format(&self, path: &Path) -> Result<Option<SpriteFormat>, CodecError> {
        let bytes =
            fs::read(path).map_err(|source| CodecError::Read { path: path.to_path_buf(), source })?;
        Ok(image::guess_format(&bytes).ok().and_then(SpriteFormat::from_image_format))
    }

    fn compose(
        &self,
        placements: &[SpritePlacement],
        width: u32,
        height: u32,
    ) -> Result<RgbaImage, CodecError> {
        let mut sheet = RgbaImage::new(width, height);
        for placement in placements {
            let tile = self.open(&placement.path)?.to_rgba8();
            image::imageops::replace(&mut sheet, &tile, i64::from(placement.x), i64::from(placement.y));
        }
        Ok(sheet)
    }

    fn encode(&self, image: &RgbaImage, format: SpriteFormat) -> Result<Vec<u8>, CodecError> {
        let encode_err = |source| CodecError::Encode { format, source };
        let mut buffer = Cursor::new(Vec::new());
        match format.image_format() {
            // JPEG has no alpha channel
            ImageFormat::Jpeg => DynamicImage::ImageRgba8(image.clone())
                .to_rgb8()
                .write_to(&mut buffer, ImageFormat::Jpeg)
                .map_err(encode_err)?,
            other => image.write_to(&mut buffer, other).map_err(encode_err)?,
        }
        Ok(buffer.into_inner())
    }
}
