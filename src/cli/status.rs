use crate::error::Result;
use crate::fmt::format_bytes;
use crate::settings::{get_db_path, load_settings};
use crate::store::{Store, StoreTable};

pub fn run() -> Result<()> {
    let settings = load_settings();
    let db_path = get_db_path();

    println!("Data dir:   {}", settings.data_dir);
    println!("Database:   {}", db_path.display());
    println!(
        "Factors:    {}",
        settings.factors_file.as_deref().unwrap_or("(bundled defaults)")
    );

    if db_path.exists() {
        let size = std::fs::metadata(&db_path)?.len();
        println!("DB size:    {}", format_bytes(size));

        let store = Store::open(&db_path)?;
        println!();
        println!("Emission factors:  {}", store.count(StoreTable::Factors)?);
        println!("Transactions:      {}", store.count(StoreTable::Transactions)?);
        println!("Unmatched:         {}", store.count(StoreTable::Unmatched)?);
        println!("Imports:           {}", store.count(StoreTable::Imports)?);
    } else {
        println!();
        println!("Database not found. Run `carboniq init` to set up.");
    }

    Ok(())
}
