//! orspr - Command-line tool for converting PNG images to MSX2 OR-color sprites

use std::process::ExitCode;

use orsprites::cli;

fn main() -> ExitCode {
    env_logger::init();
    cli::run()
}
