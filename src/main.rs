//! CLI entry point for the catalog curation tool

use clap::Parser;
use partcurate::io::cli::{Cli, CurationRunner};
use partcurate::io::logging::init_logging;

fn main() -> partcurate::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);
    CurationRunner::new(cli).run()
}
