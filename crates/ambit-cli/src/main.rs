use anyhow::{Context, Result, bail};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use ambit_cli::commands::{agenda, batch, check, util};
use ambit_cli::{Cli, Commands, Config};
use ambit_core::{CalendarEvent, ConflictDetector};

/// Load config, apply command-line overrides and read the events collection.
fn open_calendar(cli: &Cli) -> Result<(ConflictDetector, Vec<CalendarEvent>)> {
    let mut config =
        Config::load_from(cli.config.as_deref()).context("failed to load configuration")?;
    if let Some(events) = &cli.events {
        config.events_path.clone_from(events);
    }
    if let Some(timezone) = &cli.timezone {
        config.timezone = Some(timezone.clone());
    }
    tracing::debug!(?config, "loaded configuration");

    let timezone = config.viewer_timezone();
    tracing::debug!(%timezone, "using viewer timezone");

    let events = util::load_events(&config.events_path)?;
    Ok((ConflictDetector::with_timezone(timezone), events))
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing with verbose flag support
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::from_default_env()
    };
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();

    let mut stdout = std::io::stdout().lock();

    match &cli.command {
        Some(Commands::Check(args)) => {
            let (detector, events) = open_calendar(&cli)?;
            check::run(&mut stdout, args, &detector, &events)?;
        }
        Some(Commands::Batch(args)) => {
            let (detector, events) = open_calendar(&cli)?;
            let stdin = std::io::stdin().lock();
            let rejected = batch::run(stdin, &mut stdout, args, &detector, &events)?;
            if rejected > 0 {
                bail!("{rejected} draft(s) rejected");
            }
        }
        Some(Commands::Agenda(args)) => {
            let (detector, events) = open_calendar(&cli)?;
            agenda::run(&mut stdout, args, &detector, &events)?;
        }
        None => {
            // No subcommand, show help
            use clap::CommandFactory;
            Cli::command().print_help()?;
            println!();
        }
    }

    Ok(())
}
