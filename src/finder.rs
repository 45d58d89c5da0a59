//! Source file discovery.
//!
//! Walks a directory tree applying a `/`-separated pattern of tokens (see
//! [`crate::pattern`]). Every token but the last one selects directories;
//! the last token selects files.
//!
//! # Example
//!
//! ```ignore
//! // every stylesheet in an immediate subdirectory of `assets`
//! let files = find("**/.*\\.css", Path::new("assets"))?;
//!
//! // every image at any depth, including `assets` itself
//! let images = find("***/.*\\.(png|gif)", Path::new("assets"))?;
//! ```

use crate::pattern::{PatternError, Token, DEEP};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Error during file discovery.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum FinderError {
    /// A token in the pattern failed to compile
    #[error(transparent)]
    Pattern(#[from] PatternError),
    /// A directory could not be listed
    #[error("Failed to list directory {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Entries of one directory that matched a token.
#[derive(Debug, Default)]
struct DirMatches {
    files: Vec<String>,
    dirs: Vec<String>,
}

/// Find files under `root` matching `pattern`.
///
/// Paths are returned joined onto `root`, in directory-listing order (names
/// sorted) with shallower matches first for `***` patterns.
pub fn find(pattern: &str, root: &Path) -> Result<Vec<PathBuf>, FinderError> {
    let sections: Vec<&str> = pattern.split('/').collect();
    find_sections(&sections, root)
}

fn find_sections(sections: &[&str], root: &Path) -> Result<Vec<PathBuf>, FinderError> {
    let mut results = Vec::new();

    let Some((first, rest)) = sections.split_first() else {
        return Ok(results);
    };

    if *first == DEEP && !rest.is_empty() {
        // Apply the remainder here, then the whole pattern one level down.
        results.extend(find_sections(rest, root)?);
        let token = Token::parse(first)?;
        for dir in list_matches(&token, root, true)?.dirs {
            results.extend(find_sections(sections, &root.join(dir))?);
        }
        return Ok(results);
    }

    let token = Token::parse(first)?;
    let only_dirs = !rest.is_empty();
    let matches = list_matches(&token, root, only_dirs)?;

    if rest.is_empty() {
        results.extend(matches.files.into_iter().map(|name| root.join(name)));
    } else {
        for dir in matches.dirs {
            results.extend(find_sections(rest, &root.join(dir))?);
        }
    }

    Ok(results)
}

/// List `dir` and split the entries matching `token` into files and
/// directories.
fn list_matches(token: &Token, dir: &Path, only_dirs: bool) -> Result<DirMatches, FinderError> {
    let io_err = |source| FinderError::Io { path: dir.to_path_buf(), source };

    let mut names = Vec::new();
    for entry in fs::read_dir(dir).map_err(io_err)? {
        let entry = entry.map_err(io_err)?;
        names.push(entry.file_name().to_string_lossy().into_owned());
    }
    names.sort();

    let mut matches = DirMatches::default();
    for name in names {
        let is_dir = dir.join(&name).is_dir();
        if !is_dir && only_dirs {
            continue;
        }
        if !token.matches(&name, dir) {
            continue;
        }
        if is_dir {
            matches.dirs.push(name);
        } else {
            matches.files.push(name);
        }
    }

    Ok(matches)
}

/// Find the files for a list of patterns.
///
/// Results are concatenated in pattern order. Files matched by more than one
/// pattern appear more than once.
pub fn find_package_files<S: AsRef<str>>(
    patterns: &[S],
    root: &Path,
) -> Result<Vec<PathBuf>, FinderError> {
    let mut files = Vec::new();
    for pattern in patterns {
        files.extend(find(pattern.as_ref(), root)?);
    }
    Ok(files)
}
