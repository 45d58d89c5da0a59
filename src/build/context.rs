//! Build context containing configuration and state for a build.

use super::error::BuildError;
use crate::config::{AssetConfig, SpriteConfig};
use std::path::{Path, PathBuf};

/// Build context containing configuration and paths for a build operation.
///
/// The context provides access to all information needed to execute a build,
/// including the configuration, project root, and output directories.
#[derive(Debug, Clone)]
pub struct BuildContext {
    /// The loaded configuration
    config: AssetConfig,
    /// Project root directory (where assetpack.toml is located)
    project_root: PathBuf,
    /// Rebuild packages even when their output is newer than every member
    force: bool,
    /// Whether to run in verbose mode
    verbose: bool,
    /// Optional filter to build specific targets only
    target_filter: Option<Vec<String>>,
}

impl BuildContext {
    /// Create a new build context.
    pub fn new(config: AssetConfig, project_root: PathBuf) -> Self {
        Self { config, project_root, force: false, verbose: false, target_filter: None }
    }

    /// Get the configuration.
    pub fn config(&self) -> &AssetConfig {
        &self.config
    }

    /// Get the project root directory.
    pub fn project_root(&self) -> &Path {
        &self.project_root
    }

    /// Root for package and sprite patterns.
    pub fn src_dir(&self) -> PathBuf {
        self.resolve_path(&self.config.project.src)
    }

    /// Directory packages and sprite sheets are written to.
    pub fn out_dir(&self) -> PathBuf {
        self.resolve_path(&self.config.project.out)
    }

    /// Directory `media_url` is served from.
    pub fn media_root(&self) -> PathBuf {
        self.resolve_path(self.config.project.media_root())
    }

    /// URL prefix for `media_root`.
    pub fn media_url(&self) -> &str {
        &self.config.project.media_url
    }

    pub fn is_force(&self) -> bool {
        self.force
    }

    /// Whether verbose mode is enabled.
    pub fn is_verbose(&self) -> bool {
        self.verbose
    }

    /// Set force mode.
    pub fn with_force(mut self, force: bool) -> Self {
        self.force = force;
        self
    }

    /// Set verbose mode.
    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    /// Set target filter to build only specific targets.
    pub fn with_filter(mut self, targets: Vec<String>) -> Self {
        self.target_filter = Some(targets);
        self
    }

    /// Get the target filter.
    pub fn target_filter(&self) -> Option<&[String]> {
        self.target_filter.as_deref()
    }

    /// Resolve a path relative to the project root.
    pub fn resolve_path(&self, path: &Path) -> PathBuf {
        crate::config::resolve_path(&self.project_root, path)
    }

    /// Pattern list of a configured package.
    pub fn package(&self, name: &str) -> Result<&[String], BuildError> {
        self.config
            .packages
            .get(name)
            .map(Vec::as_slice)
            .ok_or_else(|| BuildError::UnknownPackage(name.to_string()))
    }

    /// Definition of a configured sprite.
    pub fn sprite(&self, name: &str) -> Result<&SpriteConfig, BuildError> {
        self.config.sprites.get(name).ok_or_else(|| BuildError::UnknownSprite(name.to_string()))
    }

    /// Output file of a package: `<out>/<name>.<package_extension>`.
    pub fn package_output(&self, name: &str) -> PathBuf {
        self.out_dir().join(format!("{}.{}", name, self.config.project.package_extension))
    }
}
