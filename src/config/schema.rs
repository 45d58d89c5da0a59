//! Configuration schema types for `assetpack.toml`
//!
//! Defines the structure and validation rules for package and sprite
//! definitions.

use crate::codec::SpriteFormat;
use crate::layout::Orientation;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Project metadata section
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectConfig {
    /// Project name (required)
    pub name: String,
    /// Root for package and sprite patterns
    #[serde(default = "default_src")]
    pub src: PathBuf,
    /// Build output directory
    #[serde(default = "default_out")]
    pub out: PathBuf,
    /// Extension of concatenated package files
    #[serde(default = "default_package_extension")]
    pub package_extension: String,
    /// URL prefix under which `media_root` is served
    #[serde(default = "default_media_url")]
    pub media_url: String,
    /// Directory served at `media_url` (defaults to `out`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub media_root: Option<PathBuf>,
}

fn default_src() -> PathBuf {
    PathBuf::from("src")
}

fn default_out() -> PathBuf {
    PathBuf::from("build")
}

fn default_package_extension() -> String {
    "css".to_string()
}

fn default_media_url() -> String {
    "/".to_string()
}

impl ProjectConfig {
    /// Effective media root: `media_root` if set, otherwise `out`.
    pub fn media_root(&self) -> &Path {
        self.media_root.as_deref().unwrap_or(&self.out)
    }
}

/// One sprite sheet definition
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SpriteConfig {
    /// Patterns selecting member images, relative to `project.src`
    pub files: Vec<String>,
    /// `"vertically"` or `"horizontaly"`; without it the sprite is not built
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub orientation: Option<String>,
    /// Sheet format; detected from the members when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
}

impl SpriteConfig {
    /// Orientation as stored in build state.
    pub fn orientation_key(&self) -> &str {
        self.orientation.as_deref().unwrap_or("default")
    }
}

/// Complete assetpack.toml configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssetConfig {
    /// Project metadata (required)
    pub project: ProjectConfig,
    /// Package name to ordered pattern list
    #[serde(default)]
    pub packages: BTreeMap<String, Vec<String>>,
    /// Sprite definitions
    #[serde(default)]
    pub sprites: BTreeMap<String, SpriteConfig>,
}

/// Configuration validation error
#[derive(Debug, Clone)]
pub struct ConfigValidationError {
    /// Path to the invalid field (e.g., "sprites.icons.orientation")
    pub field: String,
    /// Error message
    pub message: String,
}

impl std::fmt::Display for ConfigValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "assetpack.toml: '{}' {}", self.field, self.message)
    }
}

impl AssetConfig {
    /// Validate the configuration and return any errors
    pub fn validate(&self) -> Vec<ConfigValidationError> {
        let mut errors = Vec::new();
        let mut push = |field: String, message: &str| {
            errors.push(ConfigValidationError { field, message: message.to_string() });
        };

        if self.project.name.is_empty() {
            push("project.name".to_string(), "must be a non-empty string");
        }

        let ext = &self.project.package_extension;
        if ext.is_empty() || ext.starts_with('.') || ext.contains('/') {
            push(
                "project.package_extension".to_string(),
                "must be a bare extension such as \"css\" or \"js\"",
            );
        }

        for (name, patterns) in &self.packages {
            if patterns.is_empty() {
                push(format!("packages.{}", name), "must contain at least one pattern");
            }
        }

        for (name, sprite) in &self.sprites {
            if sprite.files.is_empty() {
                push(format!("sprites.{}.files", name), "must contain at least one pattern");
            }

            if let Some(orientation) = &sprite.orientation {
                if orientation.parse::<Orientation>().is_err() {
                    push(
                        format!("sprites.{}.orientation", name),
                        "must be \"vertically\" or \"horizontaly\"",
                    );
                }
            }

            if let Some(format) = &sprite.format {
                if format.parse::<SpriteFormat>().is_err() {
                    push(format!("sprites.{}.format", name), "must be one of PNG, JPG, JPEG, BMP, GIF");
                }
            }
        }

        errors
    }

    /// Check if validation passed
    pub fn is_valid(&self) -> bool {
        self.validate().is_empty()
    }
}
