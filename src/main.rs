use clap::Parser;
use gcodescarf::{init_logging, run, Cli};

fn main() -> anyhow::Result<()> {
    init_logging()?;

    let cli = Cli::parse();
    run(&cli)?;

    Ok(())
}
