//! Persisted sprite metadata.
//!
//! The sprite builder records, per sprite, the orientation and format it was
//! last built with and where each member image was placed. Staleness checks
//! and stylesheet rewriting read these records back.
//!
//! # State File Format
//!
//! [`JsonStore`] keeps the records in `.assetpack-state.json` in the output
//! directory:
//!
//! ```json
//! {
//!   "version": 1,
//!   "updated_at": "2024-01-15T10:35:00Z",
//!   "sprites": {
//!     "icons": { "name": "icons", "orientation": "vertically", "format": "PNG" }
//!   },
//!   "placements": {
//!     "icons": {
//!       "src/icons/home.png": {
//!         "sprite": "icons", "path": "src/icons/home.png",
//!         "x": 0, "y": 0, "width": 16, "height": 16
//!       }
//!     }
//!   }
//! }
//! ```

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use thiserror::Error;

/// Current state file format version.
const STATE_VERSION: u32 = 1;

/// Default state filename.
pub const STATE_FILENAME: &str = ".assetpack-state.json";

/// Error while loading or saving metadata.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StoreError {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    /// JSON parsing error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    /// Version mismatch
    #[error("State file version mismatch: expected {expected}, found {found}")]
    VersionMismatch { expected: u32, found: u32 },
    /// The temporary state file could not be moved into place
    #[error("Failed to replace {}: {source}", path.display())]
    Persist {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// How a sprite was last built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpriteRecord {
    pub name: String,
    /// Orientation string, `"default"` when none was configured
    pub orientation: String,
    /// Upper-case sheet format, e.g. `"PNG"`
    pub format: String,
}

/// Where one source image sits in a sprite sheet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlacementRecord {
    pub sprite: String,
    pub path: PathBuf,
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

/// Keyed storage for sprite and placement records.
pub trait MetadataStore {
    fn get_sprite(&self, name: &str) -> Option<SpriteRecord>;

    /// Create or update the record for `name`.
    fn upsert_sprite(&mut self, name: &str, orientation: &str, format: &str);

    fn get_placement(&self, sprite: &str, path: &Path) -> Option<PlacementRecord>;

    /// Create or update the placement keyed by `(record.sprite, record.path)`.
    fn upsert_placement(&mut self, record: PlacementRecord);

    /// All placements of `sprite`, ordered by path.
    fn list_placements(&self, sprite: &str) -> Vec<PlacementRecord>;

    /// Drop one placement. Returns whether it existed.
    fn remove_placement(&mut self, sprite: &str, path: &Path) -> bool;

    /// Persist pending changes.
    fn flush(&mut self) -> Result<(), StoreError> {
        Ok(())
    }
}

/// Record tables shared by the store implementations.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
struct Records {
    #[serde(default)]
    sprites: BTreeMap<String, SpriteRecord>,
    #[serde(default)]
    placements: BTreeMap<String, BTreeMap<String, PlacementRecord>>,
}

fn path_key(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}

impl MetadataStore for Records {
    fn get_sprite(&self, name: &str) -> Option<SpriteRecord> {
        self.sprites.get(name).cloned()
    }

    fn upsert_sprite(&mut self, name: &str, orientation: &str, format: &str) {
        let record = SpriteRecord {
            name: name.to_string(),
            orientation: orientation.to_string(),
            format: format.to_string(),
        };
        self.sprites.insert(name.to_string(), record);
    }

    fn get_placement(&self, sprite: &str, path: &Path) -> Option<PlacementRecord> {
        self.placements.get(sprite)?.get(&path_key(path)).cloned()
    }

    fn upsert_placement(&mut self, record: PlacementRecord) {
        self.placements
            .entry(record.sprite.clone())
            .or_default()
            .insert(path_key(&record.path), record);
    }

    fn list_placements(&self, sprite: &str) -> Vec<PlacementRecord> {
        self.placements
            .get(sprite)
            .map(|by_path| by_path.values().cloned().collect())
            .unwrap_or_default()
    }

    fn remove_placement(&mut self, sprite: &str, path: &Path) -> bool {
        let Some(by_path) = self.placements.get_mut(sprite) else {
            return false;
        };
        let removed = by_path.remove(&path_key(path)).is_some();
        if by_path.is_empty() {
            self.placements.remove(sprite);
        }
        removed
    }
}

/// Store that lives only as long as the process.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    records: Records,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl MetadataStore for MemoryStore {
    fn get_sprite(&self, name: &str) -> Option<SpriteRecord> {
        self.records.get_sprite(name)
    }

    fn upsert_sprite(&mut self, name: &str, orientation: &str, format: &str) {
        self.records.upsert_sprite(name, orientation, format)
    }

    fn get_placement(&self, sprite: &str, path: &Path) -> Option<PlacementRecord> {
        self.records.get_placement(sprite, path)
    }

    fn upsert_placement(&mut self, record: PlacementRecord) {
        self.records.upsert_placement(record)
    }

    fn list_placements(&self, sprite: &str) -> Vec<PlacementRecord> {
        self.records.list_placements(sprite)
    }

    fn remove_placement(&mut self, sprite: &str, path: &Path) -> bool {
        self.records.remove_placement(sprite, path)
    }
}

/// On-disk layout of the state file.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct StateFile {
    version: u32,
    #[serde(default)]
    updated_at: String,
    #[serde(flatten)]
    records: Records,
}

/// Store backed by a JSON state file.
///
/// Records are read once on [`open`](JsonStore::open) and written back on
/// [`flush`](MetadataStore::flush). The file is replaced atomically.
#[derive(Debug, Clone)]
pub struct JsonStore {
    path: PathBuf,
    records: Records,
    dirty: bool,
}

impl JsonStore {
    /// Open the state file at `path`, starting empty if it does not exist.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        let records = match Self::load(&path)? {
            Some(state) => state.records,
            None => Records::default(),
        };
        Ok(Self { path, records, dirty: false })
    }

    /// Open the default state file in an output directory.
    pub fn open_in_dir(out_dir: &Path) -> Result<Self, StoreError> {
        Self::open(out_dir.join(STATE_FILENAME))
    }

    /// Path of the backing state file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether there are changes not yet flushed.
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    fn load(path: &Path) -> Result<Option<StateFile>, StoreError> {
        if !path.exists() {
            return Ok(None);
        }

        let reader = BufReader::new(File::open(path)?);
        let state: StateFile = serde_json::from_reader(reader)?;

        if state.version != STATE_VERSION {
            return Err(StoreError::VersionMismatch { expected: STATE_VERSION, found: state.version });
        }

        Ok(Some(state))
    }
}

impl MetadataStore for JsonStore {
    fn get_sprite(&self, name: &str) -> Option<SpriteRecord> {
        self.records.get_sprite(name)
    }

    fn upsert_sprite(&mut self, name: &str, orientation: &str, format: &str) {
        self.records.upsert_sprite(name, orientation, format);
        self.dirty = true;
    }

    fn get_placement(&self, sprite: &str, path: &Path) -> Option<PlacementRecord> {
        self.records.get_placement(sprite, path)
    }

    fn upsert_placement(&mut self, record: PlacementRecord) {
        self.records.upsert_placement(record);
        self.dirty = true;
    }

    fn list_placements(&self, sprite: &str) -> Vec<PlacementRecord> {
        self.records.list_placements(sprite)
    }

    fn remove_placement(&mut self, sprite: &str, path: &Path) -> bool {
        let removed = self.records.remove_placement(sprite, path);
        self.dirty |= removed;
        removed
    }

    fn flush(&mut self) -> Result<(), StoreError> {
        if !self.dirty {
            return Ok(());
        }

        let state = StateFile {
            version: STATE_VERSION,
            updated_at: format_timestamp(SystemTime::now()),
            records: self.records.clone(),
        };
        let json = serde_json::to_vec_pretty(&state)?;

        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        fs::create_dir_all(&dir)?;

        let mut temp = tempfile::NamedTempFile::new_in(&dir)?;
        std::io::Write::write_all(&mut temp, &json)?;
        temp.persist(&self.path)
            .map_err(|e| StoreError::Persist { path: self.path.clone(), source: e.error })?;

        tracing::debug!(path = %self.path.display(), "Saved build state");
        self.dirty = false;
        Ok(())
    }
}

/// Format a time as an ISO 8601 UTC timestamp.
fn format_timestamp(time: SystemTime) -> String {
    let secs = time.duration_since(SystemTime::UNIX_EPOCH).unwrap_or_default().as_secs();
    let (year, month, day) = civil_from_days((secs / 86_400) as i64);
    let rem = secs % 86_400;
    format!(
        "{:04}-{:02}-{:02}T{:02}:{:02}:{:02}Z",
        year,
        month,
        day,
        rem / 3600,
        (rem % 3600) / 60,
        rem % 60
    )
}

/// Days since 1970-01-01 to a proleptic Gregorian date.
fn civil_from_days(days: i64) -> (i64, u32, u32) {
    let z = days + 719_468;
    let era = z.div_euclid(146_097);
    let doe = z.rem_euclid(146_097);
    let yoe = (doe - doe / 1460 + doe / 36_524 - doe / 146_096) / 365;
    let doy = doe - (365 * yoe + yoe / 4 - yoe / 100);
    let mp = (5 * doy + 2) / 153;
    let day = (doy - (153 * mp + 2) / 5 + 1) as u32;
    let month = (if mp < 10 { mp + 3 } else { mp - 9 }) as u32;
    let year = yoe + era * 400 + i64::from(month <= 2);
    (year, month, day)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn placement(sprite: &str, path: &str, y: u32) -> PlacementRecord {
        PlacementRecord { sprite: sprite.to_string(), path: PathBuf::from(path), x: 0, y, width: 4, height: 4 }
    }

    #[test]
    fn test_memory_store_sprite_upsert() {
        let mut store = MemoryStore::new();
        assert!(store.get_sprite("icons").is_none());

        store.upsert_sprite("icons", "vertically", "PNG");
        store.upsert_sprite("icons", "horizontaly", "GIF");

        let record = store.get_sprite("icons").unwrap();
        assert_eq!(record.orientation, "horizontaly");
        assert_eq!(record.format, "GIF");
    }

    #[test]
    fn test_placements_are_keyed_by_sprite_and_path() {
        let mut store = MemoryStore::new();
        store.upsert_placement(placement("icons", "src/a.png", 0));
        store.upsert_placement(placement("icons", "src/a.png", 9));
        store.upsert_placement(placement("other", "src/a.png", 3));

        assert_eq!(store.get_placement("icons", Path::new("src/a.png")).unwrap().y, 9);
        assert_eq!(store.list_placements("icons").len(), 1);
        assert_eq!(store.list_placements("other").len(), 1);
        assert!(store.list_placements("missing").is_empty());
    }

    #[test]
    fn test_remove_placement() {
        let mut store = MemoryStore::new();
        store.upsert_placement(placement("icons", "src/a.png", 0));

        assert!(store.remove_placement("icons", Path::new("src/a.png")));
        assert!(!store.remove_placement("icons", Path::new("src/a.png")));
        assert!(store.get_placement("icons", Path::new("src/a.png")).is_none());
    }

    #[test]
    fn test_json_store_round_trip() {
        let temp = TempDir::new().unwrap();

        let mut store = JsonStore::open_in_dir(temp.path()).unwrap();
        store.upsert_sprite("icons", "vertically", "PNG");
        store.upsert_placement(placement("icons", "src/a.png", 0));
        store.upsert_placement(placement("icons", "src/b.png", 5));
        assert!(store.is_dirty());
        store.flush().unwrap();
        assert!(!store.is_dirty());

        let reopened = JsonStore::open_in_dir(temp.path()).unwrap();
        assert_eq!(reopened.get_sprite("icons").unwrap().format, "PNG");
        let paths: Vec<PathBuf> = reopened.list_placements("icons").into_iter().map(|p| p.path).collect();
        assert_eq!(paths, vec![PathBuf::from("src/a.png"), PathBuf::from("src/b.png")]);
    }

    #[test]
    fn test_json_store_missing_file_is_empty() {
        let temp = TempDir::new().unwrap();
        let store = JsonStore::open(temp.path().join("nested/state.json")).unwrap();
        assert!(store.get_sprite("icons").is_none());
    }

    #[test]
    fn test_flush_creates_parent_directory() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("build/out/state.json");
        let mut store = JsonStore::open(&path).unwrap();
        store.upsert_sprite("icons", "default", "PNG");
        store.flush().unwrap();
        assert!(path.exists());
    }

    #[test]
    fn test_version_mismatch() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join(STATE_FILENAME);
        fs::write(&path, r#"{"version": 99, "sprites": {}, "placements": {}}"#).unwrap();

        let result = JsonStore::open(&path);
        assert!(matches!(result, Err(StoreError::VersionMismatch { expected: 1, found: 99 })));
    }

    #[test]
    fn test_corrupt_state_file() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join(STATE_FILENAME);
        fs::write(&path, "not json").unwrap();
        assert!(matches!(JsonStore::open(&path), Err(StoreError::Json(_))));
    }

    #[test]
    fn test_timestamp_format() {
        assert_eq!(format_timestamp(SystemTime::UNIX_EPOCH), "1970-01-01T00:00:00Z");
        let leap = SystemTime::UNIX_EPOCH + std::time::Duration::from_secs(951_782_400);
        assert_eq!(format_timestamp(leap), "2000-02-29T00:00:00Z");
    }
}
