//! Sprite sheet layout.
//!
//! Images are stacked along one axis in the order given, separated by a
//! 1 px gap. The sheet is as wide (or tall) as the largest image on the
//! cross axis.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use thiserror::Error;

/// Error computing a layout.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum LayoutError {
    #[error("Unrecognized sprite orientation '{0}' (expected 'vertically' or 'horizontaly')")]
    UnrecognizedOrientation(String),
}

/// Stacking direction of a sprite sheet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Orientation {
    Vertical,
    Horizontal,
}

impl Orientation {
    /// Configuration spelling of the orientation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Orientation::Vertical => "vertically",
            Orientation::Horizontal => "horizontaly",
        }
    }
}

impl FromStr for Orientation {
    type Err = LayoutError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "vertically" => Ok(Orientation::Vertical),
            "horizontaly" => Ok(Orientation::Horizontal),
            other => Err(LayoutError::UnrecognizedOrientation(other.to_string())),
        }
    }
}

impl fmt::Display for Orientation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A measured source image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceImage {
    pub path: PathBuf,
    pub width: u32,
    pub height: u32,
}

impl SourceImage {
    pub fn new(path: impl Into<PathBuf>, width: u32, height: u32) -> Self {
        Self { path: path.into(), width, height }
    }
}

/// Where an image sits inside the sheet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpritePlacement {
    pub path: PathBuf,
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

/// A computed sheet.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SpriteLayout {
    pub placements: Vec<SpritePlacement>,
    pub width: u32,
    pub height: u32,
}

impl SpriteLayout {
    /// True when there is nothing to draw.
    pub fn is_empty(&self) -> bool {
        self.placements.is_empty()
    }
}

/// Lay out `images` in order.
///
/// `None` yields an empty 0x0 layout. An unknown orientation string is an
/// error.
pub fn layout(images: &[SourceImage], orientation: Option<&str>) -> Result<SpriteLayout, LayoutError> {
    let Some(orientation) = orientation else {
        return Ok(SpriteLayout::default());
    };
    Ok(layout_with(images, orientation.parse()?))
}

/// Lay out `images` along a parsed orientation.
pub fn layout_with(images: &[SourceImage], orientation: Orientation) -> SpriteLayout {
    let mut placements = Vec::with_capacity(images.len());
    let mut offset = 0u32;
    let mut cross = 0u32;

    for (i, image) in images.iter().enumerate() {
        if i > 0 {
            offset += 1;
        }
        let (x, y, along, across) = match orientation {
            Orientation::Vertical => (0, offset, image.height, image.width),
            Orientation::Horizontal => (offset, 0, image.width, image.height),
        };
        placements.push(SpritePlacement {
            path: image.path.clone(),
            x,
            y,
            width: image.width,
            height: image.height,
        });
        offset += along;
        cross = cross.max(across);
    }

    let (width, height) = match orientation {
        Orientation::Vertical => (cross, offset),
        Orientation::Horizontal => (offset, cross),
    };

    SpriteLayout { placements, width, height }
}
