//! Build target definitions.
//!
//! A build target is one configured package or sprite. Targets are
//! addressed as `kind:name` (`sprite:icons`, `package:main`).

use crate::config::AssetConfig;

/// Type of build target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TargetKind {
    /// Sprite sheet
    Sprite,
    /// Concatenated package
    Package,
}

impl std::fmt::Display for TargetKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TargetKind::Sprite => write!(f, "sprite"),
            TargetKind::Package => write!(f, "package"),
        }
    }
}

/// A named unit of work.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildTarget {
    /// Unique identifier for this target (e.g., "package:main")
    pub id: String,
    pub kind: TargetKind,
    /// Name under `[packages]` or `[sprites]`
    pub name: String,
}

impl BuildTarget {
    pub fn sprite(name: impl Into<String>) -> Self {
        Self::new(TargetKind::Sprite, name.into())
    }

    pub fn package(name: impl Into<String>) -> Self {
        Self::new(TargetKind::Package, name.into())
    }

    fn new(kind: TargetKind, name: String) -> Self {
        Self { id: format!("{}:{}", kind, name), kind, name }
    }

    /// The single target an exact `sprite:NAME` or `package:NAME` filter
    /// names. Kind-only and wildcard filters name no particular target.
    pub fn from_filter(filter: &str) -> Option<Self> {
        let (kind, name) = filter.split_once(':')?;
        if name.is_empty() || name == "*" {
            return None;
        }
        match kind {
            "sprite" => Some(Self::sprite(name)),
            "package" => Some(Self::package(name)),
            _ => None,
        }
    }

    /// Check if this target matches a filter string.
    ///
    /// Supports patterns like:
    /// - Exact match: "package:main"
    /// - Kind match: "sprite:*" or just "sprite"
    /// - Name match: "*:icons"
    pub fn matches_filter(&self, filter: &str) -> bool {
        if self.id == filter || self.kind.to_string() == filter {
            return true;
        }

        if let Some((kind_pat, name_pat)) = filter.split_once(':') {
            let kind_matches = kind_pat == "*" || kind_pat == self.kind.to_string();
            let name_matches = name_pat == "*" || name_pat == self.name;
            return kind_matches && name_matches;
        }

        false
    }
}

/// The ordered list of targets a build will run.
#[derive(Debug, Default)]
pub struct BuildPlan {
    targets: Vec<BuildTarget>,
}

impl BuildPlan {
    /// Every configured sprite, then every configured package, each in name
    /// order.
    ///
    /// Sprites come first so stylesheet rewriting finds fresh sheets.
    pub fn from_config(config: &AssetConfig) -> Self {
        let sprites = config.sprites.keys().map(BuildTarget::sprite);
        let packages = config.packages.keys().map(BuildTarget::package);
        Self { targets: sprites.chain(packages).collect() }
    }

    pub fn add_target(&mut self, target: BuildTarget) {
        self.targets.push(target);
    }

    pub fn targets(&self) -> &[BuildTarget] {
        &self.targets
    }

    pub fn len(&self) -> usize {
        self.targets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }

    /// Keep only targets matching at least one pattern. No patterns keeps
    /// everything.
    pub fn filter(mut self, patterns: &[String]) -> Self {
        if patterns.is_empty() {
            return self;
        }

        self.targets.retain(|t| patterns.iter().any(|p| t.matches_filter(p)));
        self
    }
}

impl IntoIterator for BuildPlan {
    type Item = BuildTarget;
    type IntoIter = std::vec::IntoIter<BuildTarget>;

    fn into_iter(self) -> Self::IntoIter {
        self.targets.into_iter()
    }
}
