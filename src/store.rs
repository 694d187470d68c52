use std::path::Path;

use rusqlite::{params, Connection, OptionalExtension};

use crate::catalog::{normalize, validate_factor};
use crate::db::{get_connection, init_db};
use crate::error::Result;
use crate::models::{EmissionFactor, ImportBatch, TransactionRecord};

/// Record store backed by SQLite. Every multi-row write runs inside a single
/// transaction so a failed batch leaves nothing behind.
pub struct Store {
    conn: Connection,
}

impl Store {
    pub fn open(db_path: &Path) -> Result<Self> {
        let conn = get_connection(db_path)?;
        init_db(&conn)?;
        Ok(Self { conn })
    }

    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys=ON;")?;
        init_db(&conn)?;
        Ok(Self { conn })
    }

    pub fn conn(&self) -> &Connection {
        &self.conn
    }

    // -----------------------------------------------------------------------
    // Transactions
    // -----------------------------------------------------------------------

    /// Write a ledger row for `batch` and all of its records atomically.
    pub fn insert_import(&mut self, batch: &ImportBatch, records: &[TransactionRecord]) -> Result<i64> {
        let tx = self.conn.transaction()?;
        tx.execute(
            "INSERT INTO imports (filename, record_count, matched_count, unmatched_count, \
             date_range_start, date_range_end, checksum) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                batch.filename,
                batch.record_count as i64,
                batch.matched_count as i64,
                batch.unmatched_count as i64,
                batch.date_range_start,
                batch.date_range_end,
                batch.checksum,
            ],
        )?;
        let import_id = tx.last_insert_rowid();
        insert_records(&tx, Some(import_id), records)?;
        tx.commit()?;
        Ok(import_id)
    }

    pub fn all(&self) -> Result<Vec<TransactionRecord>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, date, description, amount, category, unit, quantity, emission_scope, emission_kgco2e \
             FROM transactions ORDER BY id",
        )?;
        let rows = stmt
            .query_map([], |row| {
                Ok(TransactionRecord {
                    id: row.get(0)?,
                    date: row.get(1)?,
                    description: row.get(2)?,
                    amount: row.get(3)?,
                    category: row.get(4)?,
                    unit: row.get(5)?,
                    quantity: row.get(6)?,
                    emission_scope: row.get(7)?,
                    emission_kgco2e: row.get(8)?,
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    /// Delete every transaction and the import ledger. Factors are untouched.
    pub fn delete_all(&mut self) -> Result<usize> {
        let tx = self.conn.transaction()?;
        let deleted = tx.execute("DELETE FROM transactions", [])?;
        tx.execute("DELETE FROM imports", [])?;
        tx.commit()?;
        Ok(deleted)
    }

    pub fn checksum_seen(&self, checksum: &str) -> Result<bool> {
        let mut stmt = self.conn.prepare("SELECT 1 FROM imports WHERE checksum = ?1")?;
        Ok(stmt.exists([checksum])?)
    }

    // -----------------------------------------------------------------------
    // Factors
    // -----------------------------------------------------------------------

    pub fn factors_all(&self) -> Result<Vec<EmissionFactor>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, category, unit, factor_kgco2e_per_unit FROM emission_factors ORDER BY id",
        )?;
        let rows = stmt
            .query_map([], factor_from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    pub fn factor_upsert(&mut self, category: &str, unit: &str, factor: f64) -> Result<EmissionFactor> {
        write_factor(&self.conn, category, unit, factor)
    }

    /// Upsert a list of factors in one transaction; one invalid entry rejects them all.
    pub fn factor_upsert_many(&mut self, factors: &[EmissionFactor]) -> Result<usize> {
        let tx = self.conn.transaction()?;
        for f in factors {
            write_factor(&tx, &f.category, &f.unit, f.factor)?;
        }
        tx.commit()?;
        Ok(factors.len())
    }

    /// Look up by already-normalized key.
    pub fn factor_by_key(&self, category_key: &str, unit_key: &str) -> Result<Option<EmissionFactor>> {
        let found = self
            .conn
            .query_row(
                "SELECT id, category, unit, factor_kgco2e_per_unit FROM emission_factors \
                 WHERE category_key = ?1 AND unit_key = ?2",
                [category_key, unit_key],
                factor_from_row,
            )
            .optional()?;
        Ok(found)
    }

    // -----------------------------------------------------------------------
    // Counts
    // -----------------------------------------------------------------------

    pub fn count(&self, table: StoreTable) -> Result<i64> {
        let sql = match table {
            StoreTable::Factors => "SELECT count(*) FROM emission_factors",
            StoreTable::Transactions => "SELECT count(*) FROM transactions",
            StoreTable::Unmatched => "SELECT count(*) FROM transactions WHERE emission_kgco2e IS NULL",
            StoreTable::Imports => "SELECT count(*) FROM imports",
        };
        Ok(self.conn.query_row(sql, [], |r| r.get(0))?)
    }
}

#[derive(Debug, Clone, Copy)]
pub enum StoreTable {
    Factors,
    Transactions,
    Unmatched,
    Imports,
}

fn factor_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<EmissionFactor> {
    Ok(EmissionFactor {
        id: row.get(0)?,
        category: row.get(1)?,
        unit: row.get(2)?,
        factor: row.get(3)?,
    })
}

fn write_factor(conn: &Connection, category: &str, unit: &str, factor: f64) -> Result<EmissionFactor> {
    validate_factor(category, unit, factor)?;
    let category_key = normalize(category);
    let unit_key = normalize(unit);
    // The first stored spelling is kept; only the factor value is overwritten.
    conn.execute(
        "INSERT INTO emission_factors (category, unit, category_key, unit_key, factor_kgco2e_per_unit) \
         VALUES (?1, ?2, ?3, ?4, ?5) \
         ON CONFLICT(category_key, unit_key) DO UPDATE SET \
         factor_kgco2e_per_unit = excluded.factor_kgco2e_per_unit, updated_at = datetime('now')",
        params![category.trim(), unit.trim(), category_key, unit_key, factor],
    )?;
    let stored = conn.query_row(
        "SELECT id, category, unit, factor_kgco2e_per_unit FROM emission_factors \
         WHERE category_key = ?1 AND unit_key = ?2",
        [&category_key, &unit_key],
        factor_from_row,
    )?;
    tracing::debug!(category = %stored.category, unit = %stored.unit, factor = stored.factor, "factor upserted");
    Ok(stored)
}

fn insert_records(conn: &Connection, import_id: Option<i64>, records: &[TransactionRecord]) -> Result<usize> {
    let mut stmt = conn.prepare_cached(
        "INSERT INTO transactions (date, description, amount, category, unit, quantity, \
         emission_scope, emission_kgco2e, import_id) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
    )?;
    for r in records {
        stmt.execute(params![
            r.date,
            r.description,
            r.amount,
            r.category,
            r.unit,
            r.quantity,
            r.emission_scope,
            r.emission_kgco2e,
            import_id,
        ])?;
    }
    Ok(records.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn record(date: &str, category: &str, emission: Option<f64>) -> TransactionRecord {
        TransactionRecord {
            id: None,
            date: NaiveDate::parse_from_str(date, "%Y-%m-%d").unwrap(),
            description: format!("{category} usage"),
            amount: Some(12.5),
            category: category.to_string(),
            unit: "kWh".to_string(),
            quantity: 10.0,
            emission_scope: Some("scope2".to_string()),
            emission_kgco2e: emission,
        }
    }

    fn insert_plain(store: &mut Store, records: &[TransactionRecord]) -> usize {
        let tx = store.conn.transaction().unwrap();
        let inserted = insert_records(&tx, None, records).unwrap();
        tx.commit().unwrap();
        inserted
    }

    #[test]
    fn test_insert_records_and_all_preserve_order() {
        let mut store = Store::open_in_memory().unwrap();
        let records = vec![
            record("2025-02-01", "Electricity", Some(4.2)),
            record("2025-01-01", "Heating", None),
        ];
        assert_eq!(insert_plain(&mut store, &records), 2);
        let all = store.all().unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].category, "Electricity");
        assert_eq!(all[0].date, NaiveDate::from_ymd_opt(2025, 2, 1).unwrap());
        assert_eq!(all[1].emission_kgco2e, None);
        assert!(all.iter().all(|r| r.id.is_some()));
    }

    #[test]
    fn test_insert_import_writes_ledger() {
        let mut store = Store::open_in_memory().unwrap();
        let batch = ImportBatch {
            filename: "jan.csv".to_string(),
            record_count: 1,
            matched_count: 1,
            unmatched_count: 0,
            date_range_start: NaiveDate::from_ymd_opt(2025, 1, 1),
            date_range_end: NaiveDate::from_ymd_opt(2025, 1, 1),
            checksum: "abc".to_string(),
        };
        store.insert_import(&batch, &[record("2025-01-01", "Electricity", Some(1.0))]).unwrap();
        assert_eq!(store.count(StoreTable::Imports).unwrap(), 1);
        assert!(store.checksum_seen("abc").unwrap());
        assert!(!store.checksum_seen("def").unwrap());
    }

    #[test]
    fn test_delete_all_keeps_factors() {
        let mut store = Store::open_in_memory().unwrap();
        store.factor_upsert("Electricity", "kWh", 0.42).unwrap();
        insert_plain(&mut store, &[record("2025-01-01", "Electricity", Some(4.2))]);
        assert_eq!(store.delete_all().unwrap(), 1);
        assert!(store.all().unwrap().is_empty());
        assert_eq!(store.factors_all().unwrap().len(), 1);
    }

    #[test]
    fn test_factor_upsert_overwrites_by_normalized_key() {
        let mut store = Store::open_in_memory().unwrap();
        store.factor_upsert("Electricity", "kWh", 0.42).unwrap();
        let updated = store.factor_upsert(" ELECTRICITY ", "KWH", 0.5).unwrap();
        assert_eq!(updated.category, "Electricity");
        assert_eq!(updated.factor, 0.5);
        let all = store.factors_all().unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].factor, 0.5);
    }

    #[test]
    fn test_factor_upsert_many_is_all_or_nothing() {
        let mut store = Store::open_in_memory().unwrap();
        let factors = vec![
            EmissionFactor { id: None, category: "Diesel".into(), unit: "litre".into(), factor: 2.68 },
            EmissionFactor { id: None, category: "Petrol".into(), unit: "litre".into(), factor: -1.0 },
        ];
        assert!(store.factor_upsert_many(&factors).is_err());
        assert_eq!(store.count(StoreTable::Factors).unwrap(), 0);
    }

    #[test]
    fn test_count_unmatched() {
        let mut store = Store::open_in_memory().unwrap();
        insert_plain(
            &mut store,
            &[
                record("2025-01-01", "Electricity", Some(4.2)),
                record("2025-01-02", "Mystery", None),
            ],
        );
        assert_eq!(store.count(StoreTable::Transactions).unwrap(), 2);
        assert_eq!(store.count(StoreTable::Unmatched).unwrap(), 1);
    }
}
