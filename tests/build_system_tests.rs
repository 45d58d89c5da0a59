//! Build System Test Suite
//!
//! Integration tests for the assetpack build pipeline, driven through a real
//! `assetpack.toml` in a temporary project:
//!
//! - Package assembly and require ordering
//! - Up-to-date detection and forced rebuilds
//! - Sprite sheets, placements and stylesheet rewriting
//! - Persisted build state
//! - Failure isolation in `build_all`

use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};
use tempfile::TempDir;

use assetpack::build::{BuildContext, BuildError, Pipeline};
use assetpack::codec::RasterCodec;
use assetpack::config::{load_config, CONFIG_FILENAME};
use assetpack::store::{JsonStore, MemoryStore, MetadataStore, STATE_FILENAME};
use image::{Rgba, RgbaImage};

// ============================================================================
// Test Utilities
// ============================================================================

const CONFIG: &str = r#"
[project]
name = "site"
media_url = "/static/"
media_root = "src"

[packages]
p1 = ["a.css", "b.css"]
p2 = ["a.css"]
loop = ["loop1.css"]
broken = ["broken.css"]
skin = ["skin.css"]

[sprites.icons]
files = ["icons/.*\\.png"]
orientation = "vertically"

[sprites.flat]
files = ["flat/.*\\.png"]
orientation = "horizontaly"
format = "gif"
"#;

fn create_test_file(root: &Path, rel: &str, content: &str) -> PathBuf {
    let path = root.join(rel);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(&path, content).unwrap();
    path
}

fn write_png(root: &Path, rel: &str, w: u32, h: u32) -> PathBuf {
    let path = root.join(rel);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    RgbaImage::from_pixel(w, h, Rgba([30, 60, 90, 255])).save(&path).unwrap();
    path
}

/// Temporary project with the sample configuration and sources.
fn create_project() -> TempDir {
    let temp = TempDir::new().unwrap();
    let root = temp.path();
    fs::write(root.join(CONFIG_FILENAME), CONFIG).unwrap();

    let src = root.join("src");
    create_test_file(&src, "a.css", "// require b.css\n// require c.css");
    create_test_file(&src, "b.css", "div#b {}");
    create_test_file(&src, "c.css", "div#c {}");
    create_test_file(&src, "loop1.css", "// require loop2.css\n");
    create_test_file(&src, "loop2.css", "// require loop1.css\n");
    create_test_file(&src, "broken.css", "// require nowhere.css\n");
    create_test_file(
        &src,
        "skin.css",
        ".home { background: #fff url(/static/icons/b.png) no-repeat 0 0; /* 2sprite */ }\n\
         .dot { background-image: url(/static/dot.gif); /* 2b64 */ }\n",
    );
    fs::write(src.join("dot.gif"), b"GIF89a").unwrap();

    write_png(&src, "icons/a.png", 10, 50);
    write_png(&src, "icons/b.png", 20, 60);
    write_png(&src, "icons/c.png", 30, 70);
    write_png(&src, "flat/x.png", 4, 8);
    write_png(&src, "flat/y.png", 6, 2);

    temp
}

fn context(root: &Path) -> BuildContext {
    let config = load_config(Some(&root.join(CONFIG_FILENAME))).unwrap();
    BuildContext::new(config, root.to_path_buf())
}

// ============================================================================
// Packages
// ============================================================================

#[test]
fn test_package_requirements_come_first() {
    let temp = create_project();
    let mut store = MemoryStore::new();
    let mut pipeline = Pipeline::new(context(temp.path()), &mut store, RasterCodec);

    let out = pipeline.build_package("p2").unwrap();

    assert_eq!(out.path, temp.path().join("build/p2.css"));
    assert_eq!(
        fs::read_to_string(&out.path).unwrap(),
        "div#b {}\ndiv#c {}\n// require b.css\n// require c.css"
    );
}

#[test]
fn test_package_member_listed_twice_appears_once() {
    let temp = create_project();
    let mut store = MemoryStore::new();
    let mut pipeline = Pipeline::new(context(temp.path()), &mut store, RasterCodec);

    let out = pipeline.build_package("p1").unwrap();
    let content = fs::read_to_string(&out.path).unwrap();
    assert_eq!(content.matches("div#b {}").count(), 1);
    assert!(content.ends_with("// require c.css"));
}

#[test]
fn test_package_skipped_until_member_changes() {
    let temp = create_project();
    let mut store = MemoryStore::new();
    let mut pipeline = Pipeline::new(context(temp.path()), &mut store, RasterCodec);

    assert!(pipeline.build_package("p2").unwrap().rebuilt);
    assert!(!pipeline.build_package("p2").unwrap().rebuilt);

    let c = temp.path().join("src/c.css");
    fs::write(&c, "div#c { color: red }").unwrap();
    let later = fs::metadata(temp.path().join("build/p2.css")).unwrap().modified().unwrap()
        + std::time::Duration::from_secs(5);
    fs::File::options().write(true).open(&c).unwrap().set_modified(later).unwrap();

    let out = pipeline.build_package("p2").unwrap();
    assert!(out.rebuilt);
    assert!(fs::read_to_string(&out.path).unwrap().contains("div#c { color: red }"));
}

#[test]
fn test_force_rebuilds_current_package() {
    let temp = create_project();
    let mut store = MemoryStore::new();
    let ctx = context(temp.path()).with_force(true);
    let mut pipeline = Pipeline::new(ctx, &mut store, RasterCodec);

    assert!(pipeline.build_package("p2").unwrap().rebuilt);
    assert!(pipeline.build_package("p2").unwrap().rebuilt);
}

#[test]
fn test_cyclic_package_fails_without_output() {
    let temp = create_project();
    let mut store = MemoryStore::new();
    let mut pipeline = Pipeline::new(context(temp.path()), &mut store, RasterCodec);

    let result = pipeline.build_package("loop");
    assert!(matches!(result, Err(BuildError::CycleDetected { .. })));
    assert!(!temp.path().join("build/loop.css").exists());
}

#[test]
fn test_missing_dependency_names_both_files() {
    let temp = create_project();
    let mut store = MemoryStore::new();
    let mut pipeline = Pipeline::new(context(temp.path()), &mut store, RasterCodec);

    let err = pipeline.build_package("broken").unwrap_err();
    let message = err.to_string();
    assert!(message.contains("nowhere.css"));
    assert!(message.contains("broken.css"));
}

#[test]
fn test_unknown_names_are_errors() {
    let temp = create_project();
    let mut store = MemoryStore::new();
    let mut pipeline = Pipeline::new(context(temp.path()), &mut store, RasterCodec);

    assert!(matches!(pipeline.build_package("nope"), Err(BuildError::UnknownPackage(_))));
    assert!(matches!(pipeline.build_sprite("nope"), Err(BuildError::UnknownSprite(_))));
    assert!(matches!(pipeline.is_sprite_up_to_date("nope"), Err(BuildError::UnknownSprite(_))));
}

// ============================================================================
// Sprites
// ============================================================================

#[test]
fn test_vertical_sprite_sheet() {
    let temp = create_project();
    let mut store = MemoryStore::new();
    let mut pipeline = Pipeline::new(context(temp.path()), &mut store, RasterCodec);

    let output = pipeline.build_sprite("icons").unwrap().unwrap();
    assert_eq!(output.sheet, temp.path().join("build/icons.PNG"));
    assert_eq!(image::image_dimensions(&output.sheet).unwrap(), (30, 182));

    let ys: Vec<u32> = output.layout.placements.iter().map(|p| p.y).collect();
    assert_eq!(ys, vec![0, 51, 112]);
}

#[test]
fn test_horizontal_sprite_with_explicit_format() {
    let temp = create_project();
    let mut store = MemoryStore::new();
    let mut pipeline = Pipeline::new(context(temp.path()), &mut store, RasterCodec);

    let output = pipeline.build_sprite("flat").unwrap().unwrap();
    assert_eq!(output.sheet, temp.path().join("build/flat.GIF"));
    assert_eq!(image::image_dimensions(&output.sheet).unwrap(), (11, 8));

    let y = pipeline.store().get_placement("flat", &temp.path().join("src/flat/y.png")).unwrap();
    assert_eq!((y.x, y.y), (5, 0));
}

#[test]
fn test_new_source_makes_sprite_stale() {
    let temp = create_project();
    let mut store = MemoryStore::new();
    let mut pipeline = Pipeline::new(context(temp.path()), &mut store, RasterCodec);

    pipeline.build_sprite("icons").unwrap();
    assert!(pipeline.is_sprite_up_to_date("icons").unwrap());

    write_png(&temp.path().join("src"), "icons/d.png", 5, 5);
    assert!(!pipeline.is_sprite_up_to_date("icons").unwrap());

    assert!(pipeline.ensure_sprite("icons").unwrap());
    assert!(pipeline.is_sprite_up_to_date("icons").unwrap());
}

#[test]
fn test_which_sprite_owns_image() {
    let temp = create_project();
    let mut store = MemoryStore::new();
    let pipeline = Pipeline::new(context(temp.path()), &mut store, RasterCodec);
    let src = temp.path().join("src");

    assert_eq!(pipeline.find_sprite_for_path(&src.join("flat/x.png")).unwrap().as_deref(), Some("flat"));
    assert_eq!(pipeline.find_sprite_for_path(&src.join("icons/c.png")).unwrap().as_deref(), Some("icons"));
    assert_eq!(pipeline.find_sprite_for_path(&src.join("dot.gif")).unwrap(), None);
}

// ============================================================================
// Stylesheet rewriting
// ============================================================================

#[test]
fn test_package_uses_sprites_and_inlines_images() {
    let temp = create_project();
    let mut store = MemoryStore::new();
    let mut pipeline = Pipeline::new(context(temp.path()), &mut store, RasterCodec);

    let out = pipeline.build_package("skin").unwrap();
    assert!(out.warnings.is_empty());

    let content = fs::read_to_string(&out.path).unwrap();
    assert_eq!(
        content,
        ".home { background: #fff url(/static/icons.PNG) no-repeat 0px -51px;}\n\
         .dot { background-image: url(\"data:image/gif;base64,R0lGODlh\");}\n"
    );
    // Referencing the sprite built its sheet on demand
    assert!(temp.path().join("build/icons.PNG").exists());
}

#[test]
fn test_failed_embedding_keeps_previous_output() {
    let temp = create_project();
    let mut store = MemoryStore::new();
    let ctx = context(temp.path()).with_force(true);
    let mut pipeline = Pipeline::new(ctx, &mut store, RasterCodec);

    let out = pipeline.build_package("skin").unwrap();
    let before = fs::read_to_string(&out.path).unwrap();

    fs::remove_file(temp.path().join("src/dot.gif")).unwrap();
    assert!(matches!(pipeline.build_package("skin"), Err(BuildError::Rewrite(_))));
    assert_eq!(fs::read_to_string(&out.path).unwrap(), before);
}

// ============================================================================
// Build state and full builds
// ============================================================================

#[test]
fn test_state_survives_between_runs() {
    let temp = create_project();
    let out_dir = temp.path().join("build");

    {
        let mut store = JsonStore::open_in_dir(&out_dir).unwrap();
        let mut pipeline = Pipeline::new(context(temp.path()), &mut store, RasterCodec);
        assert!(pipeline.ensure_sprite("icons").unwrap());
    }
    assert!(out_dir.join(STATE_FILENAME).exists());

    let mut store = JsonStore::open_in_dir(&out_dir).unwrap();
    let mut pipeline = Pipeline::new(context(temp.path()), &mut store, RasterCodec);
    assert!(!pipeline.ensure_sprite("icons").unwrap());
    assert_eq!(pipeline.store().list_placements("icons").len(), 3);
}

#[test]
fn test_build_all_reports_every_target() {
    let temp = create_project();
    let mut store = MemoryStore::new();
    let mut pipeline = Pipeline::new(context(temp.path()), &mut store, RasterCodec);

    let result = pipeline.build_all();

    let ids: Vec<&str> = result.targets.iter().map(|t| t.target_id.as_str()).collect();
    assert_eq!(
        ids,
        vec![
            "sprite:flat",
            "sprite:icons",
            "package:broken",
            "package:loop",
            "package:p1",
            "package:p2",
            "package:skin",
        ]
    );
    assert_eq!(result.failed_count(), 2);
    assert!(!result.is_success());
    assert!(temp.path().join("build/p1.css").exists());
    assert!(temp.path().join("build/skin.css").exists());
}

#[test]
fn test_build_all_with_filter() {
    let temp = create_project();
    let mut store = MemoryStore::new();
    let ctx = context(temp.path()).with_filter(vec!["sprite".to_string(), "package:p2".to_string()]);
    let mut pipeline = Pipeline::new(ctx, &mut store, RasterCodec);

    let result = pipeline.build_all();
    assert!(result.is_success());
    assert_eq!(result.success_count(), 3);

    let again = pipeline.build_all();
    assert_eq!(again.skipped_count(), 3);
}

#[test]
fn test_package_follows_rebuilt_sheet() {
    let temp = create_project();
    let src = temp.path().join("src");
    fs::remove_file(src.join("icons/a.png")).unwrap();

    let mut store = MemoryStore::new();
    let ctx = context(temp.path()).with_filter(vec!["sprite:icons".to_string(), "package:skin".to_string()]);
    let mut pipeline = Pipeline::new(ctx, &mut store, RasterCodec);

    assert_eq!(pipeline.build_all().success_count(), 2);
    let skin = temp.path().join("build/skin.css");
    assert!(fs::read_to_string(&skin).unwrap().contains("no-repeat 0px 0px;"));

    // Sources and output predate the new icon; only the sheet changes
    let earlier = SystemTime::now() - Duration::from_secs(60);
    let set_mtime = |path: &Path| {
        fs::File::options().write(true).open(path).unwrap().set_modified(earlier).unwrap();
    };
    set_mtime(&src.join("skin.css"));
    set_mtime(&skin);
    write_png(&src, "icons/a.png", 10, 50);

    let result = pipeline.build_all();
    assert_eq!(result.success_count(), 2);
    assert!(fs::read_to_string(&skin).unwrap().contains("no-repeat 0px -51px;"));

    let again = pipeline.build_all();
    assert_eq!(again.skipped_count(), 2);
}
