use std::path::PathBuf;

use comfy_table::{Cell, Table};

use crate::catalog;
use crate::cli::{open_store, print_json};
use crate::error::Result;

pub fn list(json: bool) -> Result<()> {
    let store = open_store()?;
    let factors = catalog::list_all(&store)?;
    if json {
        return print_json(&factors);
    }

    let mut table = Table::new();
    table.set_header(vec!["ID", "Category", "Unit", "kgCO2e / unit"]);
    for f in &factors {
        table.add_row(vec![
            Cell::new(f.id.unwrap_or_default()),
            Cell::new(&f.category),
            Cell::new(&f.unit),
            Cell::new(f.factor),
        ]);
    }
    println!("Emission Factors\n{table}");
    Ok(())
}

pub fn set(category: &str, unit: &str, factor: f64) -> Result<()> {
    let mut store = open_store()?;
    let stored = catalog::upsert(&mut store, category, unit, factor)?;
    println!(
        "Set factor: {} / {} \u{2192} {} kgCO2e per unit",
        stored.category, stored.unit, stored.factor
    );
    Ok(())
}

pub fn load(file: &str) -> Result<()> {
    let mut store = open_store()?;
    let applied = catalog::load_file(&mut store, &PathBuf::from(file))?;
    println!("{applied} factors loaded from {file}");
    Ok(())
}

pub fn lookup(category: &str, unit: &str) -> Result<()> {
    let store = open_store()?;
    match catalog::lookup(&store, category, unit)? {
        Some(f) => println!("{} / {} \u{2192} {} kgCO2e per unit", f.category, f.unit, f.factor),
        None => println!("No factor for {category:?} / {unit:?}; matching rows get no emission."),
    }
    Ok(())
}
