pub mod backup;
pub mod demo;
pub mod export;
pub mod factors;
pub mod import;
pub mod init;
pub mod load;
pub mod report;
pub mod reset;
pub mod status;
pub mod transactions;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use serde::Serialize;

use crate::catalog::seed_defaults_if_empty;
use crate::error::Result;
use crate::settings::{get_db_path, load_settings};
use crate::store::Store;

/// Open the configured store, creating tables and seeding default factors
/// into an empty catalog.
pub(crate) fn open_store() -> Result<Store> {
    let settings = load_settings();
    let data_dir = PathBuf::from(&settings.data_dir);
    std::fs::create_dir_all(&data_dir)?;
    let mut store = Store::open(&get_db_path())?;
    let factors_file = settings.factors_file.as_deref().map(PathBuf::from);
    seed_defaults_if_empty(&mut store, factors_file.as_deref())?;
    Ok(store)
}

pub(crate) fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[derive(Parser)]
#[command(name = "carboniq", version, about = "Turn activity CSVs into kgCO2e summaries, trends and forecasts.")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Set up CarbonIQ: choose a data directory and initialize the database.
    Init {
        /// Path for CarbonIQ data (default: ~/Documents/carboniq)
        #[arg(long = "data-dir")]
        data_dir: Option<String>,
        /// JSON file of default emission factors for an empty catalog
        #[arg(long = "factors-file")]
        factors_file: Option<String>,
    },
    /// Upload an activity CSV and compute emissions for every row.
    Import {
        /// Path to CSV file with date, description, category, unit, quantity columns
        file: String,
    },
    /// Manage emission factors.
    Factors {
        #[command(subcommand)]
        command: FactorsCommands,
    },
    /// List stored transactions with their computed emissions.
    Transactions {
        /// Only show rows with no matching emission factor
        #[arg(long)]
        unmatched: bool,
        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },
    /// Emission reports.
    Report {
        #[command(subcommand)]
        command: ReportCommands,
    },
    /// Delete all transactions (emission factors are kept).
    Reset {
        /// Skip the confirmation prompt
        #[arg(long)]
        yes: bool,
    },
    /// Export all transactions to CSV.
    Export {
        /// Output path (default: <data_dir>/exports/transactions-YYYY-MM-DD.csv)
        #[arg(long)]
        output: Option<String>,
    },
    /// Load twelve months of sample activity data.
    Demo,
    /// Switch to an existing CarbonIQ data directory.
    Load {
        /// Path to data directory containing carboniq.db
        path: String,
    },
    /// Back up the database.
    Backup {
        /// Output path (default: <data_dir>/backups/carboniq-YYYYMMDD-HHMMSS.db)
        #[arg(long)]
        output: Option<String>,
    },
    /// Show current database and summary statistics.
    Status,
}

#[derive(Subcommand)]
pub enum FactorsCommands {
    /// List all emission factors.
    List {
        #[arg(long)]
        json: bool,
    },
    /// Insert or update a factor (kgCO2e per unit).
    Set {
        /// Activity category, e.g. 'Electricity'
        category: String,
        /// Activity unit, e.g. 'kWh'
        unit: String,
        /// kgCO2e per unit, must be greater than zero
        #[arg(allow_negative_numbers = true)]
        factor: f64,
    },
    /// Upsert every factor in a JSON file of {category, unit, factor} objects.
    Load {
        file: String,
    },
    /// Show the factor that would apply to a category/unit pair.
    Lookup {
        category: String,
        unit: String,
    },
}

#[derive(Subcommand)]
pub enum ReportCommands {
    /// Emissions grouped by scope and category.
    Summary {
        #[arg(long)]
        json: bool,
    },
    /// Monthly emission totals.
    Trends {
        #[arg(long)]
        json: bool,
    },
    /// Emissions grouped by scope.
    Scopes {
        #[arg(long)]
        json: bool,
    },
    /// Linear projection of the next three months.
    Forecast {
        #[arg(long)]
        json: bool,
    },
    /// Headline findings.
    Insights {
        #[arg(long)]
        json: bool,
    },
}
