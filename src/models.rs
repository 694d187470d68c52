use std::fmt;

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize, Serializer};

/// Conversion constant from an activity unit to kgCO2e.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmissionFactor {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    pub category: String,
    pub unit: String,
    #[serde(alias = "factor_kgco2e_per_unit")]
    pub factor: f64,
}

/// A stored activity record. `emission_kgco2e` is the value computed at ingestion
/// time and is never recomputed when the catalog changes afterwards.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TransactionRecord {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    pub date: NaiveDate,
    pub description: String,
    pub amount: Option<f64>,
    pub category: String,
    pub unit: String,
    pub quantity: f64,
    pub emission_scope: Option<String>,
    pub emission_kgco2e: Option<f64>,
}

impl TransactionRecord {
    pub fn from_parsed(row: ParsedRow, emission: Emission) -> Self {
        Self {
            id: None,
            date: row.date,
            description: row.description,
            amount: row.amount,
            category: row.category,
            unit: row.unit,
            quantity: row.quantity,
            emission_scope: row.emission_scope,
            emission_kgco2e: emission.kg(),
        }
    }
}

/// Intermediate representation from the CSV parser before emissions are computed.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedRow {
    /// 1-based line number in the uploaded file (the header is line 1).
    pub line: u64,
    pub date: NaiveDate,
    pub description: String,
    pub amount: Option<f64>,
    pub category: String,
    pub unit: String,
    pub quantity: f64,
    pub emission_scope: Option<String>,
}

/// Outcome of matching a row against the factor catalog.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Emission {
    Computed(f64),
    Unmatched,
}

impl Emission {
    pub fn kg(&self) -> Option<f64> {
        match self {
            Self::Computed(kg) => Some(*kg),
            Self::Unmatched => None,
        }
    }

    pub fn is_matched(&self) -> bool {
        matches!(self, Self::Computed(_))
    }
}

/// Calendar month, ordered chronologically and rendered as `YYYY-MM`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct YearMonth {
    pub year: i32,
    pub month: u32,
}

impl YearMonth {
    pub fn of(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }

    pub fn next(self) -> Self {
        if self.month == 12 {
            Self { year: self.year + 1, month: 1 }
        } else {
            Self { year: self.year, month: self.month + 1 }
        }
    }
}

impl fmt::Display for YearMonth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

impl Serialize for YearMonth {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// One uploaded file, written to the import ledger alongside its records.
#[derive(Debug, Clone)]
pub struct ImportBatch {
    pub filename: String,
    pub record_count: usize,
    pub matched_count: usize,
    pub unmatched_count: usize,
    pub date_range_start: Option<NaiveDate>,
    pub date_range_end: Option<NaiveDate>,
    pub checksum: String,
}
