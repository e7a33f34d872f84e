use clap::Parser;
use tracing_subscriber::EnvFilter;

use seq_aligner::cli;

fn main() -> anyhow::Result<()> {
    let cli = cli::Cli::parse();

    // Initialize logging based on verbosity flag
    let filter = if cli.verbose {
        EnvFilter::new("seq_aligner=debug,info")
    } else {
        EnvFilter::new("seq_aligner=warn")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .without_time()
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        cli::Commands::Global(args) => {
            cli::global::run(args, cli.format, cli.verbose)?;
        }
        cli::Commands::Local(args) => {
            cli::local::run(args, cli.format, cli.verbose)?;
        }
        cli::Commands::Search(args) => {
            cli::search::run(args, cli.format, cli.verbose)?;
        }
        cli::Commands::Dotplot(args) => {
            cli::dotplot::run(args, cli.format, cli.verbose)?;
        }
    }

    Ok(())
}
