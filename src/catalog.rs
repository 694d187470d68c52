use std::collections::HashMap;
use std::path::Path;

use crate::error::{CarbonError, Result};
use crate::models::EmissionFactor;
use crate::store::{Store, StoreTable};

/// Factors shipped with the binary, used when no `factors_file` is configured.
pub const DEFAULT_FACTORS_JSON: &str = include_str!("../data/emission_factors.json");

/// Lookup key form of a category or unit: trimmed and lowercased.
pub fn normalize(raw: &str) -> String {
    raw.trim().to_lowercase()
}

pub fn validate_factor(category: &str, unit: &str, factor: f64) -> Result<()> {
    if category.trim().is_empty() || unit.trim().is_empty() {
        return Err(CarbonError::Validation(
            "factor category and unit must not be blank".to_string(),
        ));
    }
    if !factor.is_finite() || factor <= 0.0 {
        return Err(CarbonError::Validation(format!(
            "factor for {}/{} must be greater than zero (got {factor})",
            category.trim(),
            unit.trim()
        )));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// In-memory snapshot
// ---------------------------------------------------------------------------

/// Point-in-time copy of the catalog keyed by normalized (category, unit).
#[derive(Debug, Default, Clone)]
pub struct FactorCatalog {
    entries: HashMap<(String, String), EmissionFactor>,
}

impl FactorCatalog {
    /// Build from factors in storage order. If two entries collide after
    /// normalization the first one is kept.
    pub fn from_factors(factors: impl IntoIterator<Item = EmissionFactor>) -> Self {
        let mut entries = HashMap::new();
        for f in factors {
            entries
                .entry((normalize(&f.category), normalize(&f.unit)))
                .or_insert(f);
        }
        Self { entries }
    }

    pub fn load(store: &Store) -> Result<Self> {
        Ok(Self::from_factors(store.factors_all()?))
    }

    pub fn lookup(&self, category: &str, unit: &str) -> Option<&EmissionFactor> {
        self.entries.get(&(normalize(category), normalize(unit)))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Store-backed operations
// ---------------------------------------------------------------------------

pub fn upsert(store: &mut Store, category: &str, unit: &str, factor: f64) -> Result<EmissionFactor> {
    store.factor_upsert(category, unit, factor)
}

pub fn lookup(store: &Store, category: &str, unit: &str) -> Result<Option<EmissionFactor>> {
    let (category_key, unit_key) = (normalize(category), normalize(unit));
    if category_key.is_empty() || unit_key.is_empty() {
        return Ok(None);
    }
    store.factor_by_key(&category_key, &unit_key)
}

pub fn list_all(store: &Store) -> Result<Vec<EmissionFactor>> {
    store.factors_all()
}

pub fn parse_factors(json: &str) -> Result<Vec<EmissionFactor>> {
    Ok(serde_json::from_str(json)?)
}

/// Upsert every factor in a JSON file. Returns the number of entries applied.
pub fn load_file(store: &mut Store, path: &Path) -> Result<usize> {
    let content = std::fs::read_to_string(path)?;
    let factors = parse_factors(&content)?;
    store.factor_upsert_many(&factors)
}

/// Populate an empty catalog from `factors_file` (or the bundled defaults).
/// A catalog that already has entries is left alone.
pub fn seed_defaults_if_empty(store: &mut Store, factors_file: Option<&Path>) -> Result<usize> {
    let count = store.count(StoreTable::Factors)?;
    if count > 0 {
        return Ok(0);
    }

    let (source, content) = match factors_file {
        Some(path) => {
            if !path.exists() {
                tracing::warn!(path = %path.display(), "default factors file not found; catalog left empty");
                return Ok(0);
            }
            (path.display().to_string(), std::fs::read_to_string(path)?)
        }
        None => ("bundled defaults".to_string(), DEFAULT_FACTORS_JSON.to_string()),
    };

    let factors = parse_factors(&content)?;
    let loaded = store.factor_upsert_many(&factors)?;
    tracing::info!(count = loaded, source = %source, "loaded default emission factors");
    Ok(loaded)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn factor(category: &str, unit: &str, value: f64) -> EmissionFactor {
        EmissionFactor {
            id: None,
            category: category.to_string(),
            unit: unit.to_string(),
            factor: value,
        }
    }

    #[test]
    fn test_lookup_ignores_case_and_whitespace() {
        let mut store = Store::open_in_memory().unwrap();
        upsert(&mut store, "Electricity", "kWh", 0.42).unwrap();
        let a = lookup(&store, "Electricity", "kWh").unwrap();
        let b = lookup(&store, " electricity ", "KWH").unwrap();
        assert!(a.is_some());
        assert_eq!(a, b);
    }

    #[test]
    fn test_lookup_blank_key_is_none() {
        let mut store = Store::open_in_memory().unwrap();
        upsert(&mut store, "Electricity", "kWh", 0.42).unwrap();
        assert!(lookup(&store, "  ", "kWh").unwrap().is_none());
        assert!(lookup(&store, "Electricity", "").unwrap().is_none());
    }

    #[test]
    fn test_upsert_twice_keeps_one_with_latest_value() {
        let mut store = Store::open_in_memory().unwrap();
        upsert(&mut store, "Diesel", "litre", 2.5).unwrap();
        upsert(&mut store, "Diesel", "litre", 2.68).unwrap();
        let all = list_all(&store).unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].factor, 2.68);
    }

    #[test]
    fn test_upsert_rejects_non_positive_factor() {
        let mut store = Store::open_in_memory().unwrap();
        for bad in [0.0, -1.5, f64::NAN, f64::INFINITY] {
            let err = upsert(&mut store, "Diesel", "litre", bad).unwrap_err();
            assert!(matches!(err, CarbonError::Validation(_)), "got: {err}");
        }
        assert!(list_all(&store).unwrap().is_empty());
    }

    #[test]
    fn test_upsert_rejects_blank_key() {
        let mut store = Store::open_in_memory().unwrap();
        assert!(upsert(&mut store, " ", "litre", 1.0).is_err());
    }

    #[test]
    fn test_snapshot_first_encountered_wins() {
        let catalog = FactorCatalog::from_factors(vec![
            factor("Electricity", "kWh", 0.42),
            factor("ELECTRICITY", "kwh", 0.99),
        ]);
        assert_eq!(catalog.len(), 1);
        assert_eq!(catalog.lookup("electricity", " KWH ").unwrap().factor, 0.42);
        assert!(catalog.lookup("Water", "m3").is_none());
    }

    #[test]
    fn test_seed_defaults_only_when_empty() {
        let mut store = Store::open_in_memory().unwrap();
        let bundled = parse_factors(DEFAULT_FACTORS_JSON).unwrap();
        let loaded = seed_defaults_if_empty(&mut store, None).unwrap();
        assert_eq!(loaded, bundled.len());
        assert_eq!(seed_defaults_if_empty(&mut store, None).unwrap(), 0);
        assert_eq!(list_all(&store).unwrap().len(), bundled.len());
    }

    #[test]
    fn test_seed_defaults_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("factors.json");
        std::fs::write(
            &path,
            r#"[{"category": "Steam", "unit": "kg", "factor_kgco2e_per_unit": 0.19}]"#,
        )
        .unwrap();
        let mut store = Store::open_in_memory().unwrap();
        assert_eq!(seed_defaults_if_empty(&mut store, Some(&path)).unwrap(), 1);
        assert_eq!(lookup(&store, "steam", "KG").unwrap().unwrap().factor, 0.19);
    }

    #[test]
    fn test_seed_defaults_missing_file_leaves_catalog_empty() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = Store::open_in_memory().unwrap();
        let loaded = seed_defaults_if_empty(&mut store, Some(&dir.path().join("nope.json"))).unwrap();
        assert_eq!(loaded, 0);
        assert!(list_all(&store).unwrap().is_empty());
    }

    #[test]
    fn test_load_file_upserts_over_existing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("factors.json");
        std::fs::write(
            &path,
            r#"[{"category": "electricity", "unit": "KWH", "factor": 0.3},
                {"category": "Water", "unit": "m3", "factor": 0.344}]"#,
        )
        .unwrap();
        let mut store = Store::open_in_memory().unwrap();
        upsert(&mut store, "Electricity", "kWh", 0.42).unwrap();
        assert_eq!(load_file(&mut store, &path).unwrap(), 2);
        let all = list_all(&store).unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(lookup(&store, "Electricity", "kWh").unwrap().unwrap().factor, 0.3);
    }
}
