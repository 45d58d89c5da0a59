//! Configuration loading and discovery for `assetpack.toml`
//!
//! Provides functions to find, load, and merge configuration.

use super::schema::{AssetConfig, ProjectConfig};
use std::collections::BTreeMap;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Name of the configuration file.
pub const CONFIG_FILENAME: &str = "assetpack.toml";

/// Configuration loading error
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ConfigError {
    /// File I/O error
    #[error("Failed to read config: {0}")]
    Io(#[from] std::io::Error),
    /// TOML parsing error
    #[error("Failed to parse assetpack.toml: {0}")]
    Parse(#[from] toml::de::Error),
    /// Validation error
    #[error("Config validation failed:\n{}", .0.iter().map(|e| format!("  - {}", e)).collect::<Vec<_>>().join("\n"))]
    Validation(Vec<String>),
}

/// CLI arguments that can override config values
#[derive(Debug, Default, Clone)]
pub struct CliOverrides {
    /// Override output directory
    pub out: Option<PathBuf>,
    /// Override source directory
    pub src: Option<PathBuf>,
}

/// Find assetpack.toml by walking up from the current working directory.
pub fn find_config() -> Option<PathBuf> {
    env::current_dir().ok().and_then(find_config_from)
}

/// Find assetpack.toml by walking up from a specific directory.
pub fn find_config_from(start: PathBuf) -> Option<PathBuf> {
    let mut current = start;

    loop {
        let config_path = current.join(CONFIG_FILENAME);
        if config_path.exists() {
            return Some(config_path);
        }

        if !current.pop() {
            return None;
        }
    }
}

/// Load configuration from an assetpack.toml file.
///
/// If a path is provided, loads from that file. Otherwise, uses
/// [`find_config`] to locate the config file. If no config file is found,
/// returns [`default_config`].
///
/// # Example
/// ```ignore
/// let config = load_config(None)?;
/// let config = load_config(Some(Path::new("site/assetpack.toml")))?;
/// ```
pub fn load_config(path: Option<&Path>) -> Result<AssetConfig, ConfigError> {
    let config_path = match path {
        Some(p) => Some(p.to_path_buf()),
        None => find_config(),
    };

    match config_path {
        Some(p) => load_config_file(&p),
        None => Ok(default_config()),
    }
}

/// Load and validate configuration from a specific file path.
pub fn load_config_file(path: &Path) -> Result<AssetConfig, ConfigError> {
    let contents = fs::read_to_string(path)?;
    let config: AssetConfig = toml::from_str(&contents)?;

    let errors = config.validate();
    if !errors.is_empty() {
        return Err(ConfigError::Validation(errors.into_iter().map(|e| e.to_string()).collect()));
    }

    tracing::debug!(path = %path.display(), "Loaded configuration");
    Ok(config)
}

/// Create a default configuration when no assetpack.toml is found.
///
/// The project is named after the current directory and defines no
/// packages or sprites.
pub fn default_config() -> AssetConfig {
    let project_name = env::current_dir()
        .ok()
        .and_then(|p| p.file_name().map(|n| n.to_string_lossy().into_owned()))
        .unwrap_or_else(|| "unnamed".to_string());

    AssetConfig {
        project: ProjectConfig {
            name: project_name,
            src: PathBuf::from("src"),
            out: PathBuf::from("build"),
            package_extension: "css".to_string(),
            media_url: "/".to_string(),
            media_root: None,
        },
        packages: BTreeMap::new(),
        sprites: BTreeMap::new(),
    }
}

/// Merge CLI overrides into a configuration.
///
/// CLI arguments take precedence over config file values.
pub fn merge_cli_overrides(config: &mut AssetConfig, overrides: &CliOverrides) {
    if let Some(ref out) = overrides.out {
        config.project.out = out.clone();
    }

    if let Some(ref src) = overrides.src {
        config.project.src = src.clone();
    }
}

/// Get the project root directory from a config file path.
///
/// Returns the parent directory of the assetpack.toml file.
pub fn project_root(config_path: &Path) -> Option<&Path> {
    config_path.parent()
}

/// Resolve a path relative to the project root.
///
/// If the path is absolute, returns it unchanged.
/// If relative, joins it with the project root.
pub fn resolve_path(project_root: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        project_root.join(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write_config(dir: &Path, content: &str) -> PathBuf {
        let path = dir.join(CONFIG_FILENAME);
        fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_find_config_in_current_dir() {
        let temp = TempDir::new().unwrap();
        let config_path = write_config(temp.path(), "[project]\nname = \"test\"");

        assert_eq!(find_config_from(temp.path().to_path_buf()), Some(config_path));
    }

    #[test]
    fn test_find_config_in_parent_dir() {
        let temp = TempDir::new().unwrap();
        let config_path = write_config(temp.path(), "[project]\nname = \"test\"");

        let subdir = temp.path().join("src").join("css");
        fs::create_dir_all(&subdir).unwrap();

        assert_eq!(find_config_from(subdir), Some(config_path));
    }

    #[test]
    fn test_find_config_not_found() {
        let temp = TempDir::new().unwrap();
        assert_eq!(find_config_from(temp.path().to_path_buf()), None);
    }

    #[test]
    fn test_load_config_from_file() {
        let temp = TempDir::new().unwrap();
        let path = write_config(
            temp.path(),
            r#"
[project]
name = "site"
out = "dist"

[packages]
main = ["a.css"]
"#,
        );

        let config = load_config(Some(&path)).unwrap();
        assert_eq!(config.project.name, "site");
        assert_eq!(config.project.out, PathBuf::from("dist"));
        assert_eq!(config.packages["main"], vec!["a.css"]);
    }

    #[test]
    fn test_load_config_parse_error() {
        let temp = TempDir::new().unwrap();
        let path = write_config(temp.path(), "[project\nname = ");
        assert!(matches!(load_config(Some(&path)), Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_load_config_validation_error() {
        let temp = TempDir::new().unwrap();
        let path = write_config(
            temp.path(),
            r#"
[project]
name = "site"

[sprites.icons]
files = ["icons/.*"]
orientation = "sideways"
"#,
        );

        match load_config(Some(&path)) {
            Err(ConfigError::Validation(errors)) => {
                assert_eq!(errors.len(), 1);
                assert!(errors[0].contains("sprites.icons.orientation"));
            }
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[test]
    fn test_load_config_missing_file() {
        let temp = TempDir::new().unwrap();
        let result = load_config(Some(&temp.path().join(CONFIG_FILENAME)));
        assert!(matches!(result, Err(ConfigError::Io(_))));
    }

    #[test]
    fn test_default_config() {
        let config = default_config();
        assert!(!config.project.name.is_empty());
        assert_eq!(config.project.src, PathBuf::from("src"));
        assert!(config.is_valid());
    }

    #[test]
    fn test_merge_cli_overrides() {
        let mut config = default_config();
        let overrides =
            CliOverrides { out: Some(PathBuf::from("dist")), src: None };
        merge_cli_overrides(&mut config, &overrides);

        assert_eq!(config.project.out, PathBuf::from("dist"));
        assert_eq!(config.project.src, PathBuf::from("src"));
    }

    #[test]
    fn test_resolve_path() {
        let root = Path::new("/project");
        assert_eq!(resolve_path(root, Path::new("src")), PathBuf::from("/project/src"));
        assert_eq!(resolve_path(root, Path::new("/abs")), PathBuf::from("/abs"));
        assert_eq!(project_root(Path::new("/project/assetpack.toml")), Some(root));
    }
}
