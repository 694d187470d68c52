use std::collections::BTreeMap;

use serde::Serialize;

use crate::forecast::{LinearTrend, TrendModel};
use crate::models::{TransactionRecord, YearMonth};

pub const UNSPECIFIED_SCOPE: &str = "unspecified";
pub const FORECAST_PERIODS: usize = 3;

fn round2(val: f64) -> f64 {
    (val * 100.0).round() / 100.0
}

/// Records that carry a computed emission. Unmatched records never contribute to sums.
fn emitting(records: &[TransactionRecord]) -> impl Iterator<Item = (&TransactionRecord, f64)> {
    records
        .iter()
        .filter_map(|r| r.emission_kgco2e.map(|kg| (r, kg)))
}

fn scope_of(record: &TransactionRecord) -> Option<&str> {
    record
        .emission_scope
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
}

// ---------------------------------------------------------------------------
// Scope x category summary
// ---------------------------------------------------------------------------

/// `{scope: {category: kgCO2e}}`, rounded to 2 dp. Records without a scope are
/// bucketed under "unspecified".
pub type ScopeCategorySummary = BTreeMap<String, BTreeMap<String, f64>>;

pub fn summary(records: &[TransactionRecord]) -> ScopeCategorySummary {
    let mut out: ScopeCategorySummary = BTreeMap::new();
    for (r, kg) in emitting(records) {
        let scope = scope_of(r).unwrap_or(UNSPECIFIED_SCOPE).to_string();
        *out.entry(scope).or_default().entry(r.category.clone()).or_default() += kg;
    }
    for categories in out.values_mut() {
        for total in categories.values_mut() {
            *total = round2(*total);
        }
    }
    out
}

// ---------------------------------------------------------------------------
// Monthly trend
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthTotal {
    pub month: YearMonth,
    pub emissions: f64,
}

/// Emission totals per calendar month, ascending. Iterate as often as needed.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(transparent)]
pub struct MonthlyTrend {
    months: Vec<MonthTotal>,
}

impl MonthlyTrend {
    pub fn iter(&self) -> std::slice::Iter<'_, MonthTotal> {
        self.months.iter()
    }

    pub fn len(&self) -> usize {
        self.months.len()
    }

    pub fn is_empty(&self) -> bool {
        self.months.is_empty()
    }

    pub fn last(&self) -> Option<&MonthTotal> {
        self.months.last()
    }

    pub fn totals(&self) -> Vec<f64> {
        self.iter().map(|m| m.emissions).collect()
    }
}

impl<'a> IntoIterator for &'a MonthlyTrend {
    type Item = &'a MonthTotal;
    type IntoIter = std::slice::Iter<'a, MonthTotal>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

pub fn monthly_trend(records: &[TransactionRecord]) -> MonthlyTrend {
    let mut by_month: BTreeMap<YearMonth, f64> = BTreeMap::new();
    for (r, kg) in emitting(records) {
        *by_month.entry(YearMonth::of(r.date)).or_default() += kg;
    }
    MonthlyTrend {
        months: by_month
            .into_iter()
            .map(|(month, emissions)| MonthTotal { month, emissions })
            .collect(),
    }
}

// ---------------------------------------------------------------------------
// Scope breakdown
// ---------------------------------------------------------------------------

/// `{scope: kgCO2e}`. Unlike `summary`, records with no scope are left out.
pub fn scope_breakdown(records: &[TransactionRecord]) -> BTreeMap<String, f64> {
    let mut out: BTreeMap<String, f64> = BTreeMap::new();
    for (r, kg) in emitting(records) {
        if let Some(scope) = scope_of(r) {
            *out.entry(scope.to_string()).or_default() += kg;
        }
    }
    out
}

// ---------------------------------------------------------------------------
// Forecast
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ForecastPoint {
    pub month: YearMonth,
    pub predicted_emissions: f64,
}

pub fn forecast(trend: &MonthlyTrend) -> Vec<ForecastPoint> {
    forecast_with::<LinearTrend>(trend, FORECAST_PERIODS)
}

/// Fit `M` over the monthly totals (indexed 0..n) and project `periods`
/// consecutive months after the last observed one. Empty trend, empty result.
pub fn forecast_with<M: TrendModel>(trend: &MonthlyTrend, periods: usize) -> Vec<ForecastPoint> {
    let Some(last) = trend.last() else {
        return Vec::new();
    };
    let Some(model) = M::fit(&trend.totals()) else {
        return Vec::new();
    };
    let mut month = last.month;
    model
        .predict(periods)
        .into_iter()
        .map(|predicted_emissions| {
            month = month.next();
            ForecastPoint {
                month,
                predicted_emissions,
            }
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Insights
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryInsight {
    pub category: String,
    pub total_kgco2e: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScopeInsight {
    pub scope: String,
    pub total_kgco2e: f64,
    /// Share of all computed emissions, in percent.
    pub share_pct: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Increased,
    Decreased,
}

impl Direction {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Increased => "increased",
            Self::Decreased => "decreased",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthChange {
    pub previous_month: YearMonth,
    pub current_month: YearMonth,
    pub previous_kgco2e: f64,
    pub current_kgco2e: f64,
    pub pct_change: f64,
    pub direction: Direction,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Insights {
    pub top_category: Option<CategoryInsight>,
    pub dominant_scope: Option<ScopeInsight>,
    pub month_over_month: Option<MonthChange>,
    pub messages: Vec<String>,
}

/// Largest value, ties going to the first key in map order.
fn max_entry(map: &BTreeMap<String, f64>) -> Option<(&String, f64)> {
    let mut best: Option<(&String, f64)> = None;
    for (k, v) in map {
        if best.map_or(true, |(_, b)| *v > b) {
            best = Some((k, *v));
        }
    }
    best
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

pub fn top_category(records: &[TransactionRecord]) -> Option<CategoryInsight> {
    let mut by_category: BTreeMap<String, f64> = BTreeMap::new();
    for (r, kg) in emitting(records) {
        *by_category.entry(r.category.clone()).or_default() += kg;
    }
    max_entry(&by_category).map(|(category, total)| CategoryInsight {
        category: category.clone(),
        total_kgco2e: total,
    })
}

/// Only reported when more than one scope has emissions.
pub fn dominant_scope(records: &[TransactionRecord]) -> Option<ScopeInsight> {
    let scopes = scope_breakdown(records);
    if scopes.len() < 2 {
        return None;
    }
    let grand_total: f64 = emitting(records).map(|(_, kg)| kg).sum();
    max_entry(&scopes).map(|(scope, total)| ScopeInsight {
        scope: scope.clone(),
        total_kgco2e: total,
        share_pct: if grand_total > 0.0 { total / grand_total * 100.0 } else { 0.0 },
    })
}

/// Change between the two most recent months that have emissions.
pub fn month_over_month(trend: &MonthlyTrend) -> Option<MonthChange> {
    let n = trend.len();
    if n < 2 {
        return None;
    }
    let months: Vec<&MonthTotal> = trend.iter().skip(n - 2).collect();
    let (prev, cur) = (months[0], months[1]);
    if prev.emissions == 0.0 {
        return None;
    }
    let pct_change = (cur.emissions - prev.emissions) / prev.emissions * 100.0;
    Some(MonthChange {
        previous_month: prev.month,
        current_month: cur.month,
        previous_kgco2e: prev.emissions,
        current_kgco2e: cur.emissions,
        pct_change,
        direction: if pct_change > 0.0 {
            Direction::Increased
        } else {
            Direction::Decreased
        },
    })
}

pub fn insights(records: &[TransactionRecord]) -> Insights {
    if emitting(records).next().is_none() {
        return Insights {
            messages: vec!["No data available".to_string()],
            ..Insights::default()
        };
    }

    let top_category = top_category(records);
    let dominant_scope = dominant_scope(records);
    let month_over_month = month_over_month(&monthly_trend(records));

    let mut messages = Vec::new();
    if let Some(top) = &top_category {
        messages.push(format!(
            "Your largest emission source is {} ({:.0} kg CO2e).",
            top.category, top.total_kgco2e
        ));
    }
    if let Some(scope) = &dominant_scope {
        messages.push(format!(
            "{} accounts for the highest share of total emissions ({:.1}%).",
            capitalize(&scope.scope),
            scope.share_pct
        ));
    }
    if let Some(change) = &month_over_month {
        messages.push(format!(
            "Emissions {} by {:.1}% last month.",
            change.direction.label(),
            change.pct_change.abs()
        ));
    }

    Insights {
        top_category,
        dominant_scope,
        month_over_month,
        messages,
    }
}
