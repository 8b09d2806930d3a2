use bankrec::cli;
use clap::Parser;
use tracing_subscriber::EnvFilter;

fn main() -> anyhow::Result<()> {
    let cli = cli::Cli::parse();

    // Initialize logging based on verbosity flag
    let filter = if cli.verbose {
        EnvFilter::new("bankrec=debug,info")
    } else {
        EnvFilter::new("bankrec=warn")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .without_time()
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        cli::Commands::Inspect(args) => {
            cli::inspect::run(args, cli.format, cli.verbose)?;
        }
        cli::Commands::Paired(args) => {
            cli::paired::run(args, cli.format, cli.verbose)?;
        }
        cli::Commands::Match(args) => {
            cli::create::run(args, cli.format, cli.verbose)?;
        }
        cli::Commands::Unmatch(args) => {
            cli::unmatch::run(args, cli.format, cli.verbose)?;
        }
        cli::Commands::Replay(args) => {
            cli::replay::run(args, cli.format, cli.verbose)?;
        }
    }

    Ok(())
}
