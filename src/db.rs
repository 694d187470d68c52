use std::path::Path;

use rusqlite::Connection;

use crate::error::Result;

pub const DB_FILE: &str = "carboniq.db";

pub const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS emission_factors (
    id INTEGER PRIMARY KEY,
    category TEXT NOT NULL,
    unit TEXT NOT NULL,
    category_key TEXT NOT NULL,
    unit_key TEXT NOT NULL,
    factor_kgco2e_per_unit REAL NOT NULL CHECK (factor_kgco2e_per_unit > 0),
    updated_at TEXT DEFAULT (datetime('now')),
    UNIQUE (category_key, unit_key)
);

CREATE TABLE IF NOT EXISTS imports (
    id INTEGER PRIMARY KEY,
    filename TEXT NOT NULL,
    import_date TEXT DEFAULT (datetime('now')),
    record_count INTEGER NOT NULL,
    matched_count INTEGER NOT NULL,
    unmatched_count INTEGER NOT NULL,
    date_range_start TEXT,
    date_range_end TEXT,
    checksum TEXT
);

CREATE TABLE IF NOT EXISTS transactions (
    id INTEGER PRIMARY KEY,
    date TEXT NOT NULL,
    description TEXT NOT NULL,
    amount REAL,
    category TEXT NOT NULL,
    unit TEXT NOT NULL,
    quantity REAL NOT NULL,
    emission_scope TEXT,
    emission_kgco2e REAL,
    import_id INTEGER,
    created_at TEXT DEFAULT (datetime('now')),
    FOREIGN KEY (import_id) REFERENCES imports(id)
);

CREATE INDEX IF NOT EXISTS idx_transactions_date ON transactions(date);
";

pub fn get_connection(db_path: &Path) -> Result<Connection> {
    let conn = Connection::open(db_path)?;
    conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA foreign_keys=ON;")?;
    Ok(conn)
}

pub fn init_db(conn: &Connection) -> Result<()> {
    conn.execute_batch(SCHEMA)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_db() -> (tempfile::TempDir, Connection) {
        let dir = tempfile::tempdir().unwrap();
        let conn = get_connection(&dir.path().join("test.db")).unwrap();
        init_db(&conn).unwrap();
        (dir, conn)
    }

    #[test]
    fn test_init_db_creates_tables() {
        let (_dir, conn) = test_db();
        let tables: Vec<String> = conn
            .prepare("SELECT name FROM sqlite_master WHERE type='table' AND name NOT LIKE 'sqlite_%'")
            .unwrap()
            .query_map([], |row| row.get(0))
            .unwrap()
            .collect::<std::result::Result<Vec<_>, _>>()
            .unwrap();
        for expected in &["emission_factors", "imports", "transactions"] {
            assert!(tables.contains(&expected.to_string()), "missing table: {expected}");
        }
    }

    #[test]
    fn test_init_db_is_idempotent() {
        let (_dir, conn) = test_db();
        init_db(&conn).unwrap();
    }

    #[test]
    fn test_factor_table_rejects_non_positive_factor() {
        let (_dir, conn) = test_db();
        let result = conn.execute(
            "INSERT INTO emission_factors (category, unit, category_key, unit_key, factor_kgco2e_per_unit) \
             VALUES ('Gas', 'm3', 'gas', 'm3', 0)",
            [],
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_factor_keys_are_unique() {
        let (_dir, conn) = test_db();
        let insert = "INSERT INTO emission_factors (category, unit, category_key, unit_key, factor_kgco2e_per_unit) \
                      VALUES (?1, ?2, 'electricity', 'kwh', 0.4)";
        conn.execute(insert, ["Electricity", "kWh"]).unwrap();
        assert!(conn.execute(insert, ["ELECTRICITY", "KWH"]).is_err());
    }
}
