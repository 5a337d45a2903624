use clap::Parser;
use tracing_subscriber::EnvFilter;

mod catalog;
mod cli;
mod core;
mod matching;
mod parsing;
mod utils;

fn main() -> anyhow::Result<()> {
    let cli = cli::Cli::parse();

    // Initialize logging based on verbosity flag
    let filter = if cli.verbose {
        EnvFilter::new("sequin_qc=debug,info")
    } else {
        EnvFilter::new("sequin_qc=warn")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .without_time()
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        cli::Commands::Discover(args) => {
            cli::discover::run(args, cli.format, cli.verbose)?;
        }
        cli::Commands::Reference(args) => {
            cli::reference::run(args, cli.format, cli.verbose)?;
        }
    }

    Ok(())
}
