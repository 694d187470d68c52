use chrono::{Datelike, Local, NaiveDate};

use crate::cli::open_store;
use crate::error::Result;
use crate::importer::{import_bytes, ImportResult};
use crate::store::{Store, StoreTable};

const DEMO_FILENAME: &str = "demo.csv";
const DEMO_MONTHS: u32 = 12;

/// Activity repeated every month, with a small seasonal swing applied to quantity.
struct RecurringActivity {
    day: u32,
    description: &'static str,
    category: &'static str,
    unit: &'static str,
    quantity: f64,
    cost_per_unit: f64,
    scope: &'static str,
}

const RECURRING: &[RecurringActivity] = &[
    RecurringActivity {
        day: 3,
        description: "Grid electricity, head office",
        category: "Electricity",
        unit: "kWh",
        quantity: 4200.0,
        cost_per_unit: 0.28,
        scope: "scope2",
    },
    RecurringActivity {
        day: 6,
        description: "Gas heating",
        category: "Natural Gas",
        unit: "m3",
        quantity: 310.0,
        cost_per_unit: 1.10,
        scope: "scope1",
    },
    RecurringActivity {
        day: 11,
        description: "Fleet diesel",
        category: "Diesel",
        unit: "litre",
        quantity: 520.0,
        cost_per_unit: 1.62,
        scope: "scope1",
    },
    RecurringActivity {
        day: 21,
        description: "Cloud hosting",
        category: "Cloud Compute",
        unit: "hour",
        quantity: 2160.0,
        cost_per_unit: 0.09,
        scope: "scope3",
    },
];

/// One-off travel, each month picks one entry by index.
const TRAVEL: &[(&str, &str, &str, f64)] = &[
    ("Flight LHR-JFK", "Air Travel", "km", 5540.0),
    ("Train to Manchester", "Rail Travel", "km", 320.0),
    ("Client visit, hotel", "Hotel Stay", "night", 3.0),
    ("Taxi to airport", "Taxi", "km", 48.0),
    ("Flight LHR-BER", "Air Travel", "km", 930.0),
];

/// Seasonal multiplier, higher in winter months.
fn seasonal(month: u32) -> f64 {
    match month {
        12 | 1 | 2 => 1.25,
        3 | 4 | 10 | 11 => 1.05,
        _ => 0.85,
    }
}

fn clamp_day(year: i32, month: u32, day: u32) -> NaiveDate {
    (1..=day)
        .rev()
        .find_map(|d| NaiveDate::from_ymd_opt(year, month, d))
        .unwrap_or_default()
}

fn row(date: NaiveDate, description: &str, amount: Option<f64>, category: &str, unit: &str, quantity: f64, scope: &str) -> String {
    let amount = amount.map(|a| format!("{a:.2}")).unwrap_or_default();
    format!(
        "{},\"{description}\",{amount},{category},{unit},{quantity:.1},{scope}\n",
        date.format("%Y-%m-%d")
    )
}

/// Build twelve months of activity ending at the month containing `today`.
fn generate_csv(today: NaiveDate) -> String {
    let mut out = String::from("date,description,amount,category,unit,quantity,emission_scope\n");

    for i in 0..DEMO_MONTHS {
        let months_ago = DEMO_MONTHS - 1 - i;
        let target = today - chrono::Months::new(months_ago);
        let (year, month) = (target.year(), target.month());
        let idx = i as usize;
        let swing = seasonal(month);

        for a in RECURRING {
            let quantity = (a.quantity * swing * 10.0).round() / 10.0;
            out.push_str(&row(
                clamp_day(year, month, a.day),
                a.description,
                Some(quantity * a.cost_per_unit),
                a.category,
                a.unit,
                quantity,
                a.scope,
            ));
        }

        let (description, category, unit, quantity) = TRAVEL[idx % TRAVEL.len()];
        out.push_str(&row(clamp_day(year, month, 15), description, None, category, unit, quantity, "scope3"));

        // No factor for refrigerant top-ups, so these land as unmatched.
        if idx % 4 == 0 {
            out.push_str(&row(clamp_day(year, month, 27), "Refrigerant top-up", Some(180.0), "R-410A", "kg", 1.5, "scope1"));
        }
    }

    out
}

fn load_demo(store: &mut Store, today: NaiveDate) -> Result<ImportResult> {
    let csv = generate_csv(today);
    import_bytes(store, DEMO_FILENAME, csv.as_bytes())
}

pub fn run() -> Result<()> {
    let mut store = open_store()?;

    let existing = store.count(StoreTable::Transactions)?;
    if existing > 0 {
        println!("Store already holds {existing} transactions. Run `carboniq reset` first to load demo data.");
        return Ok(());
    }

    let result = load_demo(&mut store, Local::now().date_naive())?;

    println!("Demo data loaded!");
    println!("  Transactions: {}", result.inserted);
    println!("  Matched:      {}", result.matched);
    println!("  Unmatched:    {}", result.unmatched);
    println!();
    println!("Try these next:");
    println!("  carboniq report summary");
    println!("  carboniq report trends");
    println!("  carboniq report forecast");
    println!("  carboniq report insights");
    println!("  carboniq transactions --unmatched");

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog;
    use crate::importer::parse_csv;
    use crate::reports;

    fn seeded_store() -> Store {
        let mut store = Store::open_in_memory().unwrap();
        catalog::seed_defaults_if_empty(&mut store, None).unwrap();
        store
    }

    #[test]
    fn test_generate_csv_row_count() {
        let today = NaiveDate::from_ymd_opt(2025, 6, 30).unwrap();
        let rows = parse_csv(generate_csv(today).as_bytes()).unwrap();
        // 12 months x (4 recurring + 1 travel) plus a refrigerant row every fourth month
        assert_eq!(rows.len(), 12 * 5 + 3);
    }

    #[test]
    fn test_generate_csv_spans_twelve_months() {
        let today = NaiveDate::from_ymd_opt(2025, 3, 31).unwrap();
        let rows = parse_csv(generate_csv(today).as_bytes()).unwrap();
        let min = rows.iter().map(|r| r.date).min().unwrap();
        let max = rows.iter().map(|r| r.date).max().unwrap();
        assert_eq!((min.year(), min.month()), (2024, 4));
        assert_eq!((max.year(), max.month()), (2025, 3));
    }

    #[test]
    fn test_clamp_day_short_month() {
        assert_eq!(clamp_day(2025, 2, 31), NaiveDate::from_ymd_opt(2025, 2, 28).unwrap());
        assert_eq!(clamp_day(2024, 2, 30), NaiveDate::from_ymd_opt(2024, 2, 29).unwrap());
    }

    #[test]
    fn test_load_demo_matches_defaults() {
        let mut store = seeded_store();
        let today = NaiveDate::from_ymd_opt(2025, 6, 15).unwrap();
        let result = load_demo(&mut store, today).unwrap();

        assert_eq!(result.inserted, 63);
        assert_eq!(result.unmatched, 3);
        assert_eq!(result.matched, 60);
        assert!(!result.duplicate_checksum);

        let records = store.all().unwrap();
        assert_eq!(reports::monthly_trend(&records).len(), 12);
        assert_eq!(reports::forecast(&reports::monthly_trend(&records)).len(), 3);
        assert!(reports::scope_breakdown(&records).contains_key("scope2"));
    }
}
