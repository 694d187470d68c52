use std::path::Path;

use chrono::NaiveDate;
use sha2::{Digest, Sha256};

use crate::calculator::compute_all;
use crate::catalog::FactorCatalog;
use crate::error::{CarbonError, Result};
use crate::models::{ImportBatch, ParsedRow, TransactionRecord};
use crate::store::Store;

pub const REQUIRED_COLUMNS: &[&str] = &["date", "description", "category", "unit", "quantity"];

/// Tried in order; the first format that parses wins. `01/02/2024` is therefore
/// always January 2nd.
pub const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%m/%d/%Y", "%d-%m-%Y"];

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(raw, fmt).ok())
}

/// Optional currency amount. Blank or unparseable input becomes `None`.
pub fn parse_amount(raw: &str) -> Option<f64> {
    let s = raw.replace(',', "").replace('"', "").replace('$', "");
    let s = s.trim();
    if s.is_empty() {
        return None;
    }
    let value = if let Some(inner) = s.strip_prefix('(').and_then(|v| v.strip_suffix(')')) {
        -inner.trim().parse::<f64>().ok()?
    } else {
        s.parse::<f64>().ok()?
    };
    value.is_finite().then_some(value)
}

pub fn parse_quantity(raw: &str) -> Option<f64> {
    let value = raw.trim().parse::<f64>().ok()?;
    (value.is_finite() && value > 0.0).then_some(value)
}

fn compute_checksum(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hex::encode(hasher.finalize())
}

fn non_blank(raw: Option<&str>) -> Option<String> {
    raw.map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

// ---------------------------------------------------------------------------
// CSV parsing
// ---------------------------------------------------------------------------

struct Columns {
    date: usize,
    description: usize,
    category: usize,
    unit: usize,
    quantity: usize,
    amount: Option<usize>,
    emission_scope: Option<usize>,
}

impl Columns {
    fn from_headers(headers: &csv::StringRecord) -> Result<Self> {
        let index_of = |name: &str| headers.iter().position(|h| h == name);
        let missing: Vec<String> = REQUIRED_COLUMNS
            .iter()
            .filter(|c| index_of(c).is_none())
            .map(|c| c.to_string())
            .collect();
        if !missing.is_empty() {
            return Err(CarbonError::MissingColumns(missing));
        }
        let required = |name: &str| index_of(name).ok_or_else(|| CarbonError::MissingColumns(vec![name.to_string()]));
        Ok(Self {
            date: required("date")?,
            description: required("description")?,
            category: required("category")?,
            unit: required("unit")?,
            quantity: required("quantity")?,
            amount: index_of("amount"),
            emission_scope: index_of("emission_scope"),
        })
    }
}

/// Decode and validate an uploaded CSV. Any bad row rejects the whole file.
pub fn parse_csv(bytes: &[u8]) -> Result<Vec<ParsedRow>> {
    let text = std::str::from_utf8(bytes)
        .map_err(|e| CarbonError::Validation(format!("file is not valid UTF-8: {e}")))?;
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);

    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::Headers)
        .from_reader(text.as_bytes());
    let cols = Columns::from_headers(rdr.headers()?)?;

    let mut rows = Vec::new();
    for result in rdr.records() {
        let record = result?;
        let line = record.position().map(|p| p.line()).unwrap_or(0);
        let field = |idx: usize| record.get(idx).unwrap_or("");

        let raw_date = field(cols.date);
        let date = parse_date(raw_date).ok_or_else(|| CarbonError::BadDate {
            line,
            raw: raw_date.to_string(),
        })?;
        let raw_quantity = field(cols.quantity);
        let quantity = parse_quantity(raw_quantity).ok_or_else(|| CarbonError::BadQuantity {
            line,
            raw: raw_quantity.to_string(),
        })?;

        rows.push(ParsedRow {
            line,
            date,
            description: field(cols.description).trim().to_string(),
            amount: cols.amount.and_then(|i| parse_amount(field(i))),
            category: field(cols.category).trim().to_string(),
            unit: field(cols.unit).trim().to_string(),
            quantity,
            emission_scope: non_blank(cols.emission_scope.map(field)),
        });
    }
    Ok(rows)
}

// ---------------------------------------------------------------------------
// Upload pipeline
// ---------------------------------------------------------------------------

#[derive(Debug)]
pub struct ImportResult {
    pub inserted: usize,
    pub matched: usize,
    pub unmatched: usize,
    pub duplicate_checksum: bool,
}

fn check_extension(filename: &str) -> Result<()> {
    let is_csv = Path::new(filename)
        .extension()
        .map_or(false, |e| e.eq_ignore_ascii_case("csv"));
    if is_csv {
        Ok(())
    } else {
        Err(CarbonError::Validation(format!(
            "please upload a CSV file (got {filename:?})"
        )))
    }
}

/// Parse, compute and store one upload. Nothing is written unless every row
/// parses; records and the ledger entry are committed together.
pub fn import_bytes(store: &mut Store, filename: &str, bytes: &[u8]) -> Result<ImportResult> {
    check_extension(filename)?;
    let rows = parse_csv(bytes)?;
    if rows.is_empty() {
        return Ok(ImportResult {
            inserted: 0,
            matched: 0,
            unmatched: 0,
            duplicate_checksum: false,
        });
    }

    let checksum = compute_checksum(bytes);
    let duplicate_checksum = store.checksum_seen(&checksum)?;
    if duplicate_checksum {
        tracing::warn!(filename, "a file with identical contents was imported before");
    }

    let catalog = FactorCatalog::load(store)?;
    if catalog.is_empty() {
        tracing::warn!("factor catalog is empty; every row will be unmatched");
    } else {
        tracing::debug!(factors = catalog.len(), "factor catalog snapshot loaded");
    }
    let computed = compute_all(&rows, &catalog);

    let batch = ImportBatch {
        filename: filename.to_string(),
        record_count: rows.len(),
        matched_count: computed.matched,
        unmatched_count: computed.unmatched,
        date_range_start: rows.iter().map(|r| r.date).min(),
        date_range_end: rows.iter().map(|r| r.date).max(),
        checksum,
    };
    let records: Vec<TransactionRecord> = rows
        .into_iter()
        .zip(computed.emissions)
        .map(|(row, emission)| TransactionRecord::from_parsed(row, emission))
        .collect();

    store.insert_import(&batch, &records)?;
    tracing::info!(
        filename,
        inserted = records.len(),
        matched = computed.matched,
        unmatched = computed.unmatched,
        "import complete"
    );

    Ok(ImportResult {
        inserted: records.len(),
        matched: computed.matched,
        unmatched: computed.unmatched,
        duplicate_checksum,
    })
}

pub fn import_file(store: &mut Store, file_path: &Path) -> Result<ImportResult> {
    let bytes = std::fs::read(file_path)?;
    let filename = file_path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or_default();
    import_bytes(store, filename, &bytes)
}
