//! Tracing subscriber setup for the command line.
//!
//! `ASSETPACK_LOG` takes an [`EnvFilter`] directive string and overrides the
//! default level. `ASSETPACK_LOG_FORMAT=json` switches from compact text to
//! one JSON object per event. Events go to stderr.

use std::env;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Environment variable holding filter directives.
pub const LOG_ENV: &str = "ASSETPACK_LOG";
/// Environment variable selecting `compact` or `json` output.
pub const LOG_FORMAT_ENV: &str = "ASSETPACK_LOG_FORMAT";

/// Default filter directives when `ASSETPACK_LOG` is unset.
pub fn default_directives(verbose: bool) -> &'static str {
    if verbose {
        "assetpack=debug,info"
    } else {
        "assetpack=info,warn"
    }
}

/// Install the global subscriber. A second call leaves the first in place.
pub fn init_tracing(verbose: bool) {
    let filter = EnvFilter::try_from_env(LOG_ENV)
        .unwrap_or_else(|_| EnvFilter::new(default_directives(verbose)));

    let format = env::var(LOG_FORMAT_ENV).unwrap_or_else(|_| "compact".to_string());

    let registry = tracing_subscriber::registry().with(filter);

    let installed = match format.as_str() {
        "json" => registry
            .with(fmt::layer().json().with_ansi(false).with_writer(std::io::stderr))
            .try_init(),
        _ => registry.with(fmt::layer().compact().with_writer(std::io::stderr)).try_init(),
    };

    if installed.is_err() {
        tracing::debug!("Tracing subscriber already installed");
    }
}
