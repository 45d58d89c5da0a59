//! Build pipeline orchestration.
//!
//! The pipeline owns a [`BuildContext`] and borrows the metadata store for
//! the duration of a build. Packages and sprites can be built one at a time
//! or all together through [`Pipeline::build_all`], which keeps going past
//! failing targets and reports every outcome in a [`BuildResult`].

use super::context::BuildContext;
use super::error::BuildError;
use super::package::{build_order, concatenate, dependency_closure};
use super::result::{BuildResult, TargetResult};
use super::sprite::{self, sprite_output_path, SpriteOutput};
use super::staleness::{self, package_needs_rebuild};
use super::target::{BuildPlan, BuildTarget, TargetKind};
use crate::codec::{ImageCodec, SpriteFormat};
use crate::finder::find_package_files;
use crate::output::write_atomic;
use crate::rewrite::{apply_sprites, embed_images, join_url, sprite_images, SpriteReference};
use crate::store::MetadataStore;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

/// Outcome of [`Pipeline::build_package`].
#[derive(Debug, Clone)]
pub struct PackageOutput {
    pub path: PathBuf,
    /// False when the existing output was already current
    pub rebuilt: bool,
    /// Sprite rules that could not be resolved
    pub warnings: Vec<String>,
}

/// Build pipeline for packages and sprites.
pub struct Pipeline<'a, C: ImageCodec> {
    context: BuildContext,
    store: &'a mut dyn MetadataStore,
    codec: C,
}

impl<'a, C: ImageCodec> Pipeline<'a, C> {
    pub fn new(context: BuildContext, store: &'a mut dyn MetadataStore, codec: C) -> Self {
        Self { context, store, codec }
    }

    pub fn context(&self) -> &BuildContext {
        &self.context
    }

    pub fn store(&self) -> &dyn MetadataStore {
        &*self.store
    }

    /// Concatenate package `name` into `<out>/<name>.<package_extension>`.
    ///
    /// Skipped when the output is newer than every member and every sprite
    /// sheet its `2sprite` rules point into, unless the context forces a
    /// rebuild.
    pub fn build_package(&mut self, name: &str) -> Result<PackageOutput, BuildError> {
        let src = self.context.src_dir();
        let seeds = find_package_files(self.context.package(name)?, &src)?;
        let map = dependency_closure(&seeds, &src)?;
        let output = self.context.package_output(name);

        let order = build_order(&map)?;
        let content = concatenate(&order)?;
        let media_url = self.context.media_url().to_string();

        let mut inputs: Vec<PathBuf> = map.files().map(Path::to_path_buf).collect();
        inputs.extend(self.referenced_sheets(&content, &media_url));
        if !self.context.is_force() && !package_needs_rebuild(&output, &inputs) {
            tracing::debug!(package = name, "Package is up to date");
            return Ok(PackageOutput { path: output, rebuilt: false, warnings: vec![] });
        }

        let mut warnings = Vec::new();
        let content = apply_sprites(&content, &media_url, |image| {
            let reference = self.sprite_reference(image);
            if reference.is_none() {
                warnings.push(format!("{}: no sprite for {}", name, image));
            }
            reference
        });
        let content = embed_images(&content, &media_url, &self.context.media_root())?;

        write_atomic(&output, content.as_bytes())?;
        tracing::info!(package = name, output = %output.display(), files = order.len(), "Built package");

        Ok(PackageOutput { path: output, rebuilt: true, warnings })
    }

    /// Sheets the `2sprite` rules of `content` point into, each built first
    /// when stale.
    fn referenced_sheets(&mut self, content: &str, media_url: &str) -> Vec<PathBuf> {
        let src = self.context.src_dir();
        let mut names: Vec<String> = Vec::new();
        for image in sprite_images(content, media_url) {
            if let Ok(Some(name)) = self.find_sprite_for_path(&src.join(image)) {
                if !names.contains(&name) {
                    names.push(name);
                }
            }
        }

        let mut sheets = Vec::with_capacity(names.len());
        for name in names {
            if let Err(err) = self.ensure_sprite(&name) {
                tracing::warn!(sprite = %name, error = %err, "Failed to build sprite");
                continue;
            }
            let format = self.store.get_sprite(&name).and_then(|r| r.format.parse::<SpriteFormat>().ok());
            if let Some(format) = format {
                sheets.push(sprite_output_path(&self.context, &name, format));
            }
        }
        sheets
    }

    /// Build the sheet of sprite `name` unconditionally.
    pub fn build_sprite(&mut self, name: &str) -> Result<Option<SpriteOutput>, BuildError> {
        sprite::build_sprite(&self.context, &mut *self.store, &self.codec, name)
    }

    /// Build sprite `name` if its sheet is stale. Returns whether it was built.
    pub fn ensure_sprite(&mut self, name: &str) -> Result<bool, BuildError> {
        if self.is_sprite_up_to_date(name)? {
            return Ok(false);
        }
        Ok(self.build_sprite(name)?.is_some())
    }

    pub fn is_sprite_up_to_date(&self, name: &str) -> Result<bool, BuildError> {
        staleness::is_sprite_up_to_date(&self.context, &*self.store, name)
    }

    /// Name of the first sprite, in name order, whose patterns match `path`.
    pub fn find_sprite_for_path(&self, path: &Path) -> Result<Option<String>, BuildError> {
        let src = self.context.src_dir();
        for (name, sprite) in &self.context.config().sprites {
            if find_package_files(&sprite.files, &src)?.iter().any(|p| p == path) {
                return Ok(Some(name.clone()));
            }
        }
        Ok(None)
    }

    /// Resolve an image path relative to the source root to its sheet
    /// location, building the sheet first when stale.
    pub fn sprite_reference(&mut self, image: &str) -> Option<SpriteReference> {
        let path = self.context.src_dir().join(image);

        let name = match self.find_sprite_for_path(&path) {
            Ok(Some(name)) => name,
            Ok(None) => {
                tracing::debug!(image, "Image belongs to no sprite");
                return None;
            }
            Err(err) => {
                tracing::warn!(image, error = %err, "Failed to search sprites");
                return None;
            }
        };

        if let Err(err) = self.ensure_sprite(&name) {
            tracing::warn!(sprite = %name, error = %err, "Failed to build sprite");
            return None;
        }

        if !path.exists() {
            tracing::warn!(image, "Sprite member does not exist");
            return None;
        }

        let placement = self.store.get_placement(&name, &path)?;
        let record = self.store.get_sprite(&name)?;
        Some(SpriteReference {
            url: join_url(self.context.media_url(), &format!("{}.{}", name, record.format)),
            x: placement.x,
            y: placement.y,
        })
    }

    /// Build one target, turning errors into a failed result.
    pub fn build_target(&mut self, target: &BuildTarget) -> TargetResult {
        let start = Instant::now();
        let outcome = match target.kind {
            TargetKind::Sprite => self.run_sprite(&target.name),
            TargetKind::Package => self.run_package(&target.name),
        };

        match outcome {
            Ok(Some((outputs, warnings))) => {
                TargetResult::success(&target.id, outputs, start.elapsed()).with_warnings(warnings)
            }
            Ok(None) => TargetResult::skipped(&target.id),
            Err(err) => {
                tracing::error!(target = %target.id, error = %err, "Target failed");
                TargetResult::failed(&target.id, err, start.elapsed())
            }
        }
    }

    fn run_sprite(&mut self, name: &str) -> Result<Option<(Vec<PathBuf>, Vec<String>)>, BuildError> {
        if !self.context.is_force() && self.is_sprite_up_to_date(name)? {
            tracing::debug!(sprite = name, "Sprite is up to date");
            return Ok(None);
        }
        Ok(self.build_sprite(name)?.map(|out| (vec![out.sheet], vec![])))
    }

    fn run_package(&mut self, name: &str) -> Result<Option<(Vec<PathBuf>, Vec<String>)>, BuildError> {
        let out = self.build_package(name)?;
        Ok(out.rebuilt.then(|| (vec![out.path], out.warnings)))
    }

    /// Build every configured target matching the context filter: sprites
    /// first, then packages, each in name order.
    ///
    /// An exact `package:NAME` or `sprite:NAME` filter naming nothing in the
    /// config is reported as a failed target ahead of the built ones.
    pub fn build_all(&mut self) -> BuildResult {
        let plan = BuildPlan::from_config(self.context.config());
        let (plan, unknown) = match self.context.target_filter() {
            Some(filter) => (plan.filter(filter), self.unknown_targets(filter)),
            None => (plan, Vec::new()),
        };
        let mut result = self.build_plan(plan);
        result.targets.splice(0..0, unknown);
        result
    }

    fn unknown_targets(&self, filters: &[String]) -> Vec<TargetResult> {
        filters
            .iter()
            .filter_map(|filter| BuildTarget::from_filter(filter))
            .filter_map(|target| {
                let lookup = match target.kind {
                    TargetKind::Sprite => self.context.sprite(&target.name).err(),
                    TargetKind::Package => self.context.package(&target.name).err(),
                };
                lookup.map(|err| {
                    tracing::error!(target = %target.id, error = %err, "Target failed");
                    TargetResult::failed(&target.id, err, Duration::ZERO)
                })
            })
            .collect()
    }

    /// Build the targets of `plan` in order.
    pub fn build_plan(&mut self, plan: BuildPlan) -> BuildResult {
        let start = Instant::now();
        let mut result = BuildResult::new();

        if self.context.is_verbose() {
            tracing::info!(targets = plan.len(), "Starting build");
        }

        for target in plan {
            tracing::debug!(target = %target.id, "Building target");
            result.add_result(self.build_target(&target));
        }

        result.with_duration(start.elapsed())
    }
}
