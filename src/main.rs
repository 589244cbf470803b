use clap::Parser;
use gdd_timelapse::cli::{run, Cli};
use gdd_timelapse::error::Result;

fn main() -> Result<()> {
    let cli = Cli::parse();
    run(cli)
}
