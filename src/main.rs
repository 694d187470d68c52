mod calculator;
mod catalog;
mod cli;
mod db;
mod error;
mod fmt;
mod forecast;
mod importer;
mod models;
mod reports;
mod settings;
mod store;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use cli::{Cli, Commands, FactorsCommands, ReportCommands};

/// Log filter, e.g. `CARBONIQ_LOG=info` or `CARBONIQ_LOG=carboniq=debug`.
const LOG_ENV: &str = "CARBONIQ_LOG";

fn init_tracing() {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() {
    init_tracing();
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Init {
            data_dir,
            factors_file,
        } => cli::init::run(data_dir, factors_file),
        Commands::Import { file } => cli::import::run(&file),
        Commands::Factors { command } => match command {
            FactorsCommands::List { json } => cli::factors::list(json),
            FactorsCommands::Set {
                category,
                unit,
                factor,
            } => cli::factors::set(&category, &unit, factor),
            FactorsCommands::Load { file } => cli::factors::load(&file),
            FactorsCommands::Lookup { category, unit } => cli::factors::lookup(&category, &unit),
        },
        Commands::Transactions { unmatched, json } => cli::transactions::list(unmatched, json),
        Commands::Report { command } => match command {
            ReportCommands::Summary { json } => cli::report::summary(json),
            ReportCommands::Trends { json } => cli::report::trends(json),
            ReportCommands::Scopes { json } => cli::report::scopes(json),
            ReportCommands::Forecast { json } => cli::report::forecast(json),
            ReportCommands::Insights { json } => cli::report::insights(json),
        },
        Commands::Reset { yes } => cli::reset::run(yes),
        Commands::Export { output } => cli::export::run(output),
        Commands::Demo => cli::demo::run(),
        Commands::Load { path } => cli::load::run(&path),
        Commands::Backup { output } => cli::backup::run(output),
        Commands::Status => cli::status::run(),
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
