//! Command-line interface for reading genealogy files and numbering people.

use clap::Parser;

mod cli;

fn main() -> anyhow::Result<()> {
    cli::Cli::parse().run()
}
