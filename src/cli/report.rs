use colored::Colorize;
use comfy_table::{Cell, Table};

use crate::cli::{open_store, print_json};
use crate::error::Result;
use crate::fmt::{kg, pct};
use crate::reports::{self, Direction};

pub fn summary(json: bool) -> Result<()> {
    let store = open_store()?;
    let data = reports::summary(&store.all()?);
    if json {
        return print_json(&data);
    }

    let mut table = Table::new();
    table.set_header(vec!["Scope / Category", "Emissions"]);
    let mut grand_total = 0.0f64;
    for (scope, categories) in &data {
        table.add_row(vec![Cell::new(scope.to_uppercase().bold()), Cell::new("")]);
        let mut scope_total = 0.0f64;
        for (category, total) in categories {
            table.add_row(vec![
                Cell::new(format!("  {category}")),
                Cell::new(kg(*total)),
            ]);
            scope_total += total;
        }
        table.add_row(vec![
            Cell::new(format!("Total {scope}").bold()),
            Cell::new(kg(scope_total)),
        ]);
        grand_total += scope_total;
    }
    table.add_row(vec![Cell::new("TOTAL".green().bold()), Cell::new(kg(grand_total))]);
    println!("Emissions by Scope and Category\n{table}");
    Ok(())
}

pub fn trends(json: bool) -> Result<()> {
    let store = open_store()?;
    let trend = reports::monthly_trend(&store.all()?);
    if json {
        return print_json(&trend);
    }

    let mut table = Table::new();
    table.set_header(vec!["Month", "Emissions", "Change"]);
    let mut previous: Option<f64> = None;
    for m in &trend {
        let change = match previous {
            Some(p) if p != 0.0 => pct((m.emissions - p) / p * 100.0),
            _ => String::new(),
        };
        table.add_row(vec![
            Cell::new(m.month),
            Cell::new(kg(m.emissions)),
            Cell::new(change),
        ]);
        previous = Some(m.emissions);
    }
    println!("Monthly Emissions\n{table}");
    Ok(())
}

pub fn scopes(json: bool) -> Result<()> {
    let store = open_store()?;
    let data = reports::scope_breakdown(&store.all()?);
    if json {
        return print_json(&data);
    }

    let total: f64 = data.values().sum();
    let mut table = Table::new();
    table.set_header(vec!["Scope", "Emissions", "%"]);
    for (scope, value) in &data {
        let share = if total > 0.0 { value / total * 100.0 } else { 0.0 };
        table.add_row(vec![
            Cell::new(scope),
            Cell::new(kg(*value)),
            Cell::new(format!("{share:.1}%")),
        ]);
    }
    table.add_row(vec![Cell::new("Total".bold()), Cell::new(kg(total)), Cell::new("")]);
    println!("Emissions by Scope\n{table}");
    Ok(())
}

pub fn forecast(json: bool) -> Result<()> {
    let store = open_store()?;
    let points = reports::forecast(&reports::monthly_trend(&store.all()?));
    if json {
        return print_json(&points);
    }
    if points.is_empty() {
        println!("Not enough data to forecast. Import some activity first.");
        return Ok(());
    }

    let mut table = Table::new();
    table.set_header(vec!["Month", "Predicted Emissions"]);
    for p in &points {
        table.add_row(vec![Cell::new(p.month), Cell::new(kg(p.predicted_emissions))]);
    }
    println!("Forecast (linear trend)\n{table}");
    Ok(())
}

pub fn insights(json: bool) -> Result<()> {
    let store = open_store()?;
    let data = reports::insights(&store.all()?);
    if json {
        return print_json(&data);
    }

    println!("{}", "Insights".bold());
    for message in &data.messages {
        println!("  \u{2022} {message}");
    }
    if let Some(change) = &data.month_over_month {
        let line = format!(
            "  {} \u{2192} {}: {} \u{2192} {}",
            change.previous_month,
            change.current_month,
            kg(change.previous_kgco2e),
            kg(change.current_kgco2e)
        );
        match change.direction {
            Direction::Increased => println!("{}", line.red()),
            Direction::Decreased => println!("{}", line.green()),
        }
    }
    Ok(())
}
