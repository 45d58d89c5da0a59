//! Build pipeline for packages and sprite sheets.
//!
//! # Overview
//!
//! A build runs in two phases:
//! - **Sprites**: lay out each configured sprite's images into one sheet and
//!   record every image's placement in the metadata store
//! - **Packages**: resolve `require` directives, concatenate the files in
//!   dependency order and rewrite marked stylesheet rules
//!
//! # Example
//!
//! ```ignore
//! use assetpack::build::{BuildContext, Pipeline};
//! use assetpack::codec::RasterCodec;
//! use assetpack::config::load_config;
//! use assetpack::store::JsonStore;
//!
//! let config = load_config(None)?;
//! let context = BuildContext::new(config, project_root);
//! let mut store = JsonStore::open_in_dir(&context.out_dir())?;
//! let mut pipeline = Pipeline::new(context, &mut store, RasterCodec);
//!
//! let result = pipeline.build_all();
//! println!("{}", result.summary());
//! ```

pub mod context;
pub mod error;
pub mod package;
pub mod pipeline;
pub mod result;
pub mod sprite;
pub mod staleness;
pub mod target;

pub use context::*;
pub use error::*;
pub use package::*;
pub use pipeline::*;
pub use result::*;
pub use sprite::*;
pub use staleness::*;
pub use target::*;
