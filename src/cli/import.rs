use std::path::PathBuf;

use colored::Colorize;

use crate::cli::open_store;
use crate::error::Result;
use crate::importer::import_file;

pub fn run(file: &str) -> Result<()> {
    let file_path = PathBuf::from(file);
    let mut store = open_store()?;

    let result = import_file(&mut store, &file_path)?;

    if result.duplicate_checksum {
        println!(
            "{}",
            "Note: a file with identical contents was imported before.".yellow()
        );
    }
    println!(
        "{} inserted ({} matched, {} without a matching factor)",
        result.inserted, result.matched, result.unmatched
    );
    if result.unmatched > 0 {
        println!("Run `carboniq transactions --unmatched` to see them.");
    }
    Ok(())
}
