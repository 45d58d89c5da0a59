//! assetpack - Asset packaging and CSS sprite generation
//!
//! This library provides functionality to:
//! - Find source files with regex-per-segment path patterns
//! - Order files by their `// require` directives and concatenate them
//! - Lay out images into sprite sheets and record each image's placement
//! - Rewrite marked stylesheet rules to use sprites or inline data URIs
//! - Skip packages and sprites whose outputs are already current

pub mod build;
pub mod cli;
pub mod codec;
pub mod config;
pub mod finder;
pub mod graph;
pub mod layout;
pub mod logging;
pub mod output;
pub mod pattern;
pub mod rewrite;
pub mod store;
