//! Build error type.

use crate::codec::CodecError;
use crate::finder::FinderError;
use crate::graph::GraphError;
use crate::layout::LayoutError;
use crate::output::OutputError;
use crate::rewrite::RewriteError;
use crate::store::StoreError;
use std::path::PathBuf;
use thiserror::Error;

/// Error while building a package or a sprite.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum BuildError {
    /// No package with this name is configured
    #[error("Unknown package: {0}")]
    UnknownPackage(String),
    /// No sprite with this name is configured
    #[error("Unknown sprite: {0}")]
    UnknownSprite(String),
    /// A `require` directive points at a file that does not exist
    #[error("File {} which is required by {} cannot be found", path.display(), required_by.display())]
    MissingDependency { path: PathBuf, required_by: PathBuf },
    /// The package files require each other in a loop
    #[error("Dependency graph has at least one cycle (involving {})", remaining.join(", "))]
    CycleDetected { remaining: Vec<String> },
    /// The sprite orientation is neither `vertically` nor `horizontaly`
    #[error("Unrecognized orientation: {0}")]
    UnrecognizedOrientation(String),
    /// The sprite format is invalid or cannot be inferred from its members
    #[error("Unrecognized image format for sprite {sprite}: {reason}")]
    UnrecognizedImageFormat { sprite: String, reason: String },
    /// A source file could not be read
    #[error("Failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error(transparent)]
    Finder(#[from] FinderError),
    #[error(transparent)]
    Codec(#[from] CodecError),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Output(#[from] OutputError),
    #[error(transparent)]
    Rewrite(#[from] RewriteError),
}

impl From<GraphError> for BuildError {
    fn from(err: GraphError) -> Self {
        match err {
            GraphError::CycleDetected { remaining } => BuildError::CycleDetected { remaining },
        }
    }
}

impl From<LayoutError> for BuildError {
    fn from(err: LayoutError) -> Self {
        match err {
            LayoutError::UnrecognizedOrientation(o) => BuildError::UnrecognizedOrientation(o),
        }
    }
}
