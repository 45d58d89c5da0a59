//! Rebuild decisions based on file timestamps and stored sprite metadata.

use super::context::BuildContext;
use super::error::BuildError;
use super::sprite::sprite_output_path;
use crate::codec::SpriteFormat;
use crate::finder::find_package_files;
use crate::store::MetadataStore;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

fn modified(path: &Path) -> Option<SystemTime> {
    fs::metadata(path).and_then(|m| m.modified()).ok()
}

/// Check whether a package output must be regenerated.
///
/// True when `output` is missing or any of `members` was modified after it.
pub fn package_needs_rebuild(output: &Path, members: &[PathBuf]) -> bool {
    let Some(built) = modified(output) else {
        return true;
    };
    members.iter().any(|m| modified(m).map_or(true, |t| t > built))
}

/// Check whether the sheet of sprite `name` reflects its current sources.
///
/// The sprite is stale when it has never been recorded, its sheet is gone,
/// its orientation changed, a recorded member was removed or modified after
/// the sheet, or a newly matched source has no placement yet.
pub fn is_sprite_up_to_date(
    ctx: &BuildContext,
    store: &dyn MetadataStore,
    name: &str,
) -> Result<bool, BuildError> {
    let sprite = ctx.sprite(name)?;

    let Some(record) = store.get_sprite(name) else {
        return Ok(false);
    };

    let format = match record.format.parse::<SpriteFormat>() {
        Ok(format) => Some(format),
        Err(_) => sprite.format.as_deref().and_then(|f| f.parse().ok()),
    };
    let Some(format) = format else {
        return Ok(false);
    };

    let sheet = sprite_output_path(ctx, name, format);
    let Some(built) = modified(&sheet) else {
        return Ok(false);
    };

    if sprite.orientation_key() != record.orientation {
        return Ok(false);
    }

    for placement in store.list_placements(name) {
        match modified(&placement.path) {
            None => return Ok(false),
            Some(t) if t > built => return Ok(false),
            Some(_) => {}
        }
    }

    let current = find_package_files(&sprite.files, &ctx.src_dir())?;
    if current.iter().any(|path| store.get_placement(name, path).is_none()) {
        return Ok(false);
    }

    Ok(true)
}
