use crate::catalog::{normalize, FactorCatalog};
use crate::models::{Emission, ParsedRow};

/// Derive kgCO2e for one row against a catalog snapshot.
///
/// Blank category/unit and a missing factor both yield `Emission::Unmatched`;
/// neither is an error.
pub fn compute(row: &ParsedRow, catalog: &FactorCatalog) -> Emission {
    let category = normalize(&row.category);
    let unit = normalize(&row.unit);
    if category.is_empty() || unit.is_empty() {
        return Emission::Unmatched;
    }
    match catalog.lookup(&category, &unit) {
        Some(f) => Emission::Computed(row.quantity * f.factor),
        None => Emission::Unmatched,
    }
}

pub struct ComputeResult {
    pub emissions: Vec<Emission>,
    pub matched: usize,
    pub unmatched: usize,
}

/// Compute every row, logging each unmatched one.
pub fn compute_all(rows: &[ParsedRow], catalog: &FactorCatalog) -> ComputeResult {
    let mut matched = 0usize;
    let mut unmatched = 0usize;
    let emissions = rows
        .iter()
        .map(|row| {
            let emission = compute(row, catalog);
            if emission.is_matched() {
                matched += 1;
            } else {
                unmatched += 1;
                tracing::warn!(
                    line = row.line,
                    category = %row.category,
                    unit = %row.unit,
                    "no emission factor found"
                );
            }
            emission
        })
        .collect();
    ComputeResult {
        emissions,
        matched,
        unmatched,
    }
}
