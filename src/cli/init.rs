use std::path::PathBuf;

use crate::catalog::seed_defaults_if_empty;
use crate::db::DB_FILE;
use crate::error::{CarbonError, Result};
use crate::settings::{load_settings, save_settings, shellexpand_path};
use crate::store::{Store, StoreTable};

pub fn run(data_dir: Option<String>, factors_file: Option<String>) -> Result<()> {
    let mut settings = load_settings();

    if let Some(dir) = data_dir {
        settings.data_dir = shellexpand_path(&dir);
    }
    if let Some(file) = factors_file {
        let expanded = shellexpand_path(&file);
        if !PathBuf::from(&expanded).exists() {
            return Err(CarbonError::Settings(format!("factors file not found: {expanded}")));
        }
        settings.factors_file = Some(expanded);
    }

    save_settings(&settings)?;

    let resolved = PathBuf::from(&settings.data_dir);
    std::fs::create_dir_all(&resolved)?;
    std::fs::create_dir_all(resolved.join("exports"))?;

    let mut store = Store::open(&resolved.join(DB_FILE))?;
    let factors_file = settings.factors_file.as_deref().map(PathBuf::from);
    let seeded = seed_defaults_if_empty(&mut store, factors_file.as_deref())?;

    println!("Initialized carboniq at {}", resolved.display());
    if seeded > 0 {
        println!("Loaded {seeded} default emission factors");
    } else {
        println!("{} emission factors in catalog", store.count(StoreTable::Factors)?);
    }
    Ok(())
}
