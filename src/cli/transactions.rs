use comfy_table::{Cell, Table};

use crate::cli::{open_store, print_json};
use crate::error::Result;
use crate::fmt::kg_opt;
use crate::models::TransactionRecord;

pub fn list(unmatched_only: bool, json: bool) -> Result<()> {
    let store = open_store()?;
    let records: Vec<TransactionRecord> = store
        .all()?
        .into_iter()
        .filter(|r| !unmatched_only || r.emission_kgco2e.is_none())
        .collect();
    if json {
        return print_json(&records);
    }

    let mut table = Table::new();
    table.set_header(vec![
        "Date", "Description", "Category", "Quantity", "Unit", "Scope", "Amount", "Emissions",
    ]);
    for r in &records {
        table.add_row(vec![
            Cell::new(r.date),
            Cell::new(&r.description),
            Cell::new(&r.category),
            Cell::new(r.quantity),
            Cell::new(&r.unit),
            Cell::new(r.emission_scope.as_deref().unwrap_or("")),
            Cell::new(r.amount.map(|a| format!("{a:.2}")).unwrap_or_default()),
            Cell::new(kg_opt(r.emission_kgco2e)),
        ]);
    }
    let title = if unmatched_only {
        "Unmatched Transactions"
    } else {
        "Transactions"
    };
    println!("{title} ({})\n{table}", records.len());
    Ok(())
}
