//! Package assembly: dependency discovery, ordering and concatenation.
//!
//! A package file may start with any number of `require` lines:
//!
//! ```text
//! // require reset.css
//! // require widgets/button.css
//! ```
//!
//! Paths are relative to the source root. Scanning stops at the first line
//! that is not a `require` directive.

use super::error::BuildError;
use crate::graph::{topological_sort, DependencyGraph};
use regex::Regex;
use std::collections::{HashMap, HashSet, VecDeque};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

/// `// require <path>` at the start of a line
static REQUIRE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^// *require (?P<file>.*)").unwrap());

/// Insertion-ordered map from a file to the files it directly requires.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DependencyMap {
    entries: Vec<(PathBuf, Vec<PathBuf>)>,
    index: HashMap<PathBuf, usize>,
}

impl DependencyMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace the requirements of `path`. Replacing keeps the
    /// original position.
    pub fn insert(&mut self, path: PathBuf, requires: Vec<PathBuf>) {
        match self.index.get(&path) {
            Some(&i) => self.entries[i].1 = requires,
            None => {
                self.index.insert(path.clone(), self.entries.len());
                self.entries.push((path, requires));
            }
        }
    }

    pub fn get(&self, path: &Path) -> Option<&[PathBuf]> {
        self.index.get(path).map(|&i| self.entries[i].1.as_slice())
    }

    pub fn contains(&self, path: &Path) -> bool {
        self.index.contains_key(path)
    }

    /// Entries in discovery order.
    pub fn iter(&self) -> impl Iterator<Item = (&Path, &[PathBuf])> {
        self.entries.iter().map(|(k, v)| (k.as_path(), v.as_slice()))
    }

    /// Every file in the map, in discovery order.
    pub fn files(&self) -> impl Iterator<Item = &Path> {
        self.entries.iter().map(|(k, _)| k.as_path())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Read the `require` header of `path`.
///
/// Each directive resolves against `root`. A directive naming a file that
/// is not an existing regular file is a [`BuildError::MissingDependency`].
pub fn file_dependencies(path: &Path, root: &Path) -> Result<Vec<PathBuf>, BuildError> {
    let content = fs::read_to_string(path)
        .map_err(|source| BuildError::Read { path: path.to_path_buf(), source })?;

    let mut requires = Vec::new();
    for line in content.lines() {
        let Some(caps) = REQUIRE_RE.captures(line) else {
            break;
        };
        let relative = caps["file"].trim_end();
        let required = root.join(relative);
        if !required.is_file() {
            return Err(BuildError::MissingDependency {
                path: required,
                required_by: path.to_path_buf(),
            });
        }
        requires.push(required);
    }

    Ok(requires)
}

/// Collect `seeds` and everything they transitively require.
///
/// Files are visited breadth-first; each is read once.
pub fn dependency_closure(seeds: &[PathBuf], root: &Path) -> Result<DependencyMap, BuildError> {
    let mut map = DependencyMap::new();
    let mut queue: VecDeque<PathBuf> = seeds.iter().cloned().collect();
    let mut queued: HashSet<PathBuf> = seeds.iter().cloned().collect();

    while let Some(file) = queue.pop_front() {
        if map.contains(&file) {
            continue;
        }
        let requires = file_dependencies(&file, root)?;
        for dep in &requires {
            if !map.contains(dep) && queued.insert(dep.clone()) {
                queue.push_back(dep.clone());
            }
        }
        map.insert(file, requires);
    }

    Ok(map)
}

/// Build the graph for a dependency map.
///
/// Files without requirements become isolated nodes, added first in map
/// order. Every other file contributes one edge per requirement.
pub fn dependency_graph(map: &DependencyMap) -> DependencyGraph {
    let pairs: Vec<(String, Vec<String>)> = map
        .iter()
        .map(|(file, deps)| (path_id(file), deps.iter().map(|d| path_id(d)).collect()))
        .collect();

    DependencyGraph::from_dependencies(pairs.iter().map(|(k, v)| (k.as_str(), v.as_slice())))
}

fn path_id(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}

/// Order the files of a dependency map so requirements come first.
pub fn build_order(map: &DependencyMap) -> Result<Vec<PathBuf>, BuildError> {
    let order = topological_sort(dependency_graph(map))?;
    Ok(order.into_iter().map(PathBuf::from).collect())
}

/// Join the contents of `files` with a single newline between them.
pub fn concatenate(files: &[PathBuf]) -> Result<String, BuildError> {
    let mut parts = Vec::with_capacity(files.len());
    for file in files {
        let content = fs::read_to_string(file)
            .map_err(|source| BuildError::Read { path: file.clone(), source })?;
        parts.push(content);
    }
    Ok(parts.join("\n"))
}
