//! assetpack - Command-line tool for building asset packages and sprite sheets

use std::process::ExitCode;

use assetpack::cli;

fn main() -> ExitCode {
    cli::run()
}
