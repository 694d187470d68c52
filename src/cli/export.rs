use std::path::{Path, PathBuf};

use crate::cli::open_store;
use crate::error::Result;
use crate::models::TransactionRecord;
use crate::settings::get_data_dir;

const EXPORT_HEADER: &[&str] = &[
    "date",
    "description",
    "amount",
    "category",
    "unit",
    "quantity",
    "emission_scope",
    "emission_kgco2e",
];

fn default_path() -> PathBuf {
    let date = chrono::Local::now().format("%Y-%m-%d").to_string();
    get_data_dir()
        .join("exports")
        .join(format!("transactions-{date}.csv"))
}

/// Write records using the upload column names, so an export can be re-imported.
pub fn write_csv(records: &[TransactionRecord], path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let mut wtr = csv::Writer::from_path(path)?;
    wtr.write_record(EXPORT_HEADER)?;
    for r in records {
        wtr.write_record([
            r.date.format("%Y-%m-%d").to_string(),
            r.description.clone(),
            r.amount.map(|a| a.to_string()).unwrap_or_default(),
            r.category.clone(),
            r.unit.clone(),
            r.quantity.to_string(),
            r.emission_scope.clone().unwrap_or_default(),
            r.emission_kgco2e.map(|e| e.to_string()).unwrap_or_default(),
        ])?;
    }
    wtr.flush()?;
    Ok(())
}

pub fn run(output: Option<String>) -> Result<()> {
    let store = open_store()?;
    let records = store.all()?;
    let path = output.map(PathBuf::from).unwrap_or_else(default_path);
    write_csv(&records, &path)?;
    println!("Wrote {} transactions to {}", records.len(), path.display());
    Ok(())
}
