//! Sprite sheet generation.

use super::context::BuildContext;
use super::error::BuildError;
use crate::codec::{ImageCodec, SpriteFormat};
use crate::config::SpriteConfig;
use crate::finder::find_package_files;
use crate::layout::{layout, SourceImage, SpriteLayout};
use crate::output::write_atomic;
use crate::store::{MetadataStore, PlacementRecord};
use std::path::PathBuf;

/// A sheet written by [`build_sprite`].
#[derive(Debug, Clone)]
pub struct SpriteOutput {
    pub sheet: PathBuf,
    pub format: SpriteFormat,
    pub layout: SpriteLayout,
}

/// Sheet location: `<out>/<name>.<FORMAT>`.
pub fn sprite_output_path(ctx: &BuildContext, name: &str, format: SpriteFormat) -> PathBuf {
    ctx.out_dir().join(format!("{}.{}", name, format))
}

/// Pick the sheet format of a sprite.
///
/// An explicit `format` must name a supported format. Without one, every
/// member must be encoded in the same detectable format.
pub fn resolve_format<C: ImageCodec>(
    codec: &C,
    name: &str,
    sprite: &SpriteConfig,
    members: &[PathBuf],
) -> Result<SpriteFormat, BuildError> {
    let unrecognized = |reason: String| BuildError::UnrecognizedImageFormat {
        sprite: name.to_string(),
        reason,
    };

    if let Some(format) = &sprite.format {
        return format.parse().map_err(|_| {
            unrecognized(format!("'{}' is not one of PNG, JPG, JPEG, BMP, GIF", format))
        });
    }

    let mut common: Option<SpriteFormat> = None;
    for member in members {
        let Some(format) = codec.detect_format(member)? else {
            return Err(unrecognized(format!(
                "{} is not a PNG, JPEG, BMP or GIF image",
                member.display()
            )));
        };
        match common {
            None => common = Some(format),
            Some(seen) if seen != format => {
                return Err(unrecognized(format!("members mix {} and {} images", seen, format)));
            }
            Some(_) => {}
        }
    }

    common.ok_or_else(|| unrecognized("no member images to infer it from".to_string()))
}

/// Build the sheet of sprite `name` and record its placements.
///
/// Returns `Ok(None)` without touching the filesystem when the sprite has no
/// orientation or no members.
pub fn build_sprite<C: ImageCodec>(
    ctx: &BuildContext,
    store: &mut dyn MetadataStore,
    codec: &C,
    name: &str,
) -> Result<Option<SpriteOutput>, BuildError> {
    let sprite = ctx.sprite(name)?;
    let members = find_package_files(&sprite.files, &ctx.src_dir())?;

    let mut images = Vec::with_capacity(members.len());
    for path in &members {
        let (width, height) = codec.dimensions(path)?;
        images.push(SourceImage::new(path.clone(), width, height));
    }

    let sheet_layout = layout(&images, sprite.orientation.as_deref())?;
    if sheet_layout.is_empty() {
        tracing::info!(sprite = name, "Nothing to lay out, skipping sheet");
        return Ok(None);
    }

    let format = resolve_format(codec, name, sprite, &members)?;
    let image = codec.compose(&sheet_layout.placements, sheet_layout.width, sheet_layout.height)?;
    let bytes = codec.encode(&image, format)?;

    let sheet = sprite_output_path(ctx, name, format);
    write_atomic(&sheet, &bytes)?;

    store.upsert_sprite(name, sprite.orientation_key(), format.as_str());
    for placement in &sheet_layout.placements {
        store.upsert_placement(PlacementRecord {
            sprite: name.to_string(),
            path: placement.path.clone(),
            x: placement.x,
            y: placement.y,
            width: placement.width,
            height: placement.height,
        });
    }
    for former in store.list_placements(name) {
        if !members.contains(&former.path) {
            tracing::debug!(sprite = name, path = %former.path.display(), "Dropping former member");
            store.remove_placement(name, &former.path);
        }
    }
    store.flush()?;

    tracing::info!(
        sprite = name,
        sheet = %sheet.display(),
        width = sheet_layout.width,
        height = sheet_layout.height,
        images = sheet_layout.placements.len(),
        "Built sprite sheet"
    );

    Ok(Some(SpriteOutput { sheet, format, layout: sheet_layout }))
}
