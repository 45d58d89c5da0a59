//! Command implementations (build, check, which)

use std::env;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use super::{EXIT_ERROR, EXIT_SUCCESS};
use crate::build::{BuildContext, Pipeline};
use crate::codec::RasterCodec;
use crate::config::{
    default_config, find_config, load_config, merge_cli_overrides, project_root, CliOverrides,
    ConfigError,
};
use crate::store::JsonStore;

/// Locate and load the configuration, returning it with the project root.
fn load_project(
    config_path: Option<&Path>,
    overrides: &CliOverrides,
    verbose: bool,
) -> Result<BuildContext, ConfigError> {
    let cwd = env::current_dir().map_err(ConfigError::Io)?;
    let config_path = config_path.map(Path::to_path_buf).or_else(find_config);

    let (mut config, root) = match config_path {
        Some(path) => {
            if verbose {
                println!("Using config: {}", path.display());
            }
            let config = load_config(Some(&path))?;
            let root = project_root(&path)
                .filter(|p| !p.as_os_str().is_empty())
                .map_or_else(|| cwd.clone(), |p| cwd.join(p));
            (config, root)
        }
        None => {
            if verbose {
                println!("No assetpack.toml found, using defaults");
            }
            (default_config(), cwd)
        }
    };

    merge_cli_overrides(&mut config, overrides);
    Ok(BuildContext::new(config, root).with_verbose(verbose))
}

fn open_store(ctx: &BuildContext) -> Option<JsonStore> {
    match JsonStore::open_in_dir(&ctx.out_dir()) {
        Ok(store) => Some(store),
        Err(e) => {
            eprintln!("Error opening build state: {}", e);
            None
        }
    }
}

/// Run the build command
pub fn run_build(
    config: Option<&Path>,
    out: Option<PathBuf>,
    src: Option<PathBuf>,
    filters: Vec<String>,
    force: bool,
    verbose: bool,
) -> ExitCode {
    let overrides = CliOverrides { out, src };
    let mut ctx = match load_project(config, &overrides, verbose) {
        Ok(ctx) => ctx.with_force(force),
        Err(e) => {
            eprintln!("Error loading config: {}", e);
            return ExitCode::from(EXIT_ERROR);
        }
    };
    if !filters.is_empty() {
        ctx = ctx.with_filter(filters);
    }

    let src_dir = ctx.src_dir();
    if !src_dir.exists() {
        eprintln!("Error: Source directory not found: {}", src_dir.display());
        eprintln!("Create the directory or specify a different path with --src");
        return ExitCode::from(EXIT_ERROR);
    }

    let Some(mut store) = open_store(&ctx) else {
        return ExitCode::from(EXIT_ERROR);
    };

    if force {
        println!("Building (force rebuild)...");
    } else {
        println!("Building...");
    }

    let mut pipeline = Pipeline::new(ctx, &mut store, RasterCodec);
    let result = pipeline.build_all();

    if verbose {
        for path in result.all_outputs() {
            println!("  wrote {}", path.display());
        }
    }

    if result.is_success() {
        println!("{}", result.summary());
        ExitCode::from(EXIT_SUCCESS)
    } else {
        eprintln!("{}", result.summary());
        ExitCode::from(EXIT_ERROR)
    }
}

/// Run the check command
pub fn run_check(config: Option<&Path>, verbose: bool) -> ExitCode {
    let ctx = match load_project(config, &CliOverrides::default(), verbose) {
        Ok(ctx) => ctx,
        Err(e) => {
            eprintln!("{}", e);
            return ExitCode::from(EXIT_ERROR);
        }
    };

    println!(
        "Config OK: {} package(s), {} sprite(s)",
        ctx.config().packages.len(),
        ctx.config().sprites.len()
    );

    let Some(mut store) = open_store(&ctx) else {
        return ExitCode::from(EXIT_ERROR);
    };
    let names: Vec<String> = ctx.config().sprites.keys().cloned().collect();
    let pipeline = Pipeline::new(ctx, &mut store, RasterCodec);

    let mut failed = false;
    for name in names {
        match pipeline.is_sprite_up_to_date(&name) {
            Ok(true) => println!("  sprite:{} up to date", name),
            Ok(false) => println!("  sprite:{} stale", name),
            Err(e) => {
                eprintln!("  sprite:{} error: {}", name, e);
                failed = true;
            }
        }
    }

    ExitCode::from(if failed { EXIT_ERROR } else { EXIT_SUCCESS })
}

/// Run the which command
pub fn run_which(config: Option<&Path>, path: &Path) -> ExitCode {
    let ctx = match load_project(config, &CliOverrides::default(), false) {
        Ok(ctx) => ctx,
        Err(e) => {
            eprintln!("Error loading config: {}", e);
            return ExitCode::from(EXIT_ERROR);
        }
    };

    let image = match env::current_dir() {
        Ok(cwd) if cwd.join(path).exists() => cwd.join(path),
        _ => ctx.src_dir().join(path),
    };

    let mut store = crate::store::MemoryStore::new();
    let pipeline = Pipeline::new(ctx, &mut store, RasterCodec);

    match pipeline.find_sprite_for_path(&image) {
        Ok(Some(name)) => {
            println!("{}", name);
            ExitCode::from(EXIT_SUCCESS)
        }
        Ok(None) => {
            eprintln!("{} does not belong to any sprite", path.display());
            ExitCode::from(EXIT_ERROR)
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::from(EXIT_ERROR)
        }
    }
}
