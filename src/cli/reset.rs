use std::io::Write;

use crate::cli::open_store;
use crate::error::Result;

pub fn run(yes: bool) -> Result<()> {
    if !yes {
        print!("Delete ALL transactions? Emission factors are kept. [y/N]: ");
        std::io::stdout().flush()?;
        let mut input = String::new();
        std::io::stdin().read_line(&mut input)?;
        if !matches!(input.trim(), "y" | "Y" | "yes") {
            println!("Aborted.");
            return Ok(());
        }
    }

    let mut store = open_store()?;
    let deleted = store.delete_all()?;
    tracing::info!(deleted, "transactions reset");
    println!("All transactions deleted ({deleted} rows)");
    Ok(())
}
