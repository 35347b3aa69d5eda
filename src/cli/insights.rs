use colored::Colorize;
use comfy_table::{Cell, Table};

use crate::error::Result;
use crate::fmt::{money, round_cents};
use crate::insights::load_insights;
use crate::settings::load_settings;
use crate::store::SqliteStore;

use super::{open_db, signed_in};

const BAR_WIDTH: f64 = 30.0;

pub fn run() -> Result<()> {
    let settings = load_settings();
    let conn = open_db(&settings)?;
    let user = signed_in(&conn, &settings)?;
    let insights = load_insights(&SqliteStore::new(&conn), &user)?;

    if insights.categories.is_empty() && insights.cards.is_empty() {
        println!("No spending yet. Run `alphacard import --demo` to load sample data.");
        return Ok(());
    }

    println!(
        "{}  {}    {}  {}",
        "Total spent:".bold(),
        money(round_cents(insights.total_spend)),
        "Estimated rewards:".bold(),
        money(round_cents(insights.total_rewards)).green()
    );
    println!();

    let mut table = Table::new();
    table.set_header(vec!["Category", "Spent", "Rewards (2%)"]);
    for c in &insights.categories {
        table.add_row(vec![
            Cell::new(c.display_name()),
            Cell::new(money(c.total)),
            Cell::new(money(c.rewards)),
        ]);
    }
    println!("Spending by Category\n{table}");

    let mut table = Table::new();
    table.set_header(vec!["#", "Card", "Spent", "Rewards", "Share"]);
    for (i, c) in insights.top_cards().iter().enumerate() {
        table.add_row(vec![
            Cell::new(i + 1),
            Cell::new(format!("{} (…{})", c.name, c.last_four)),
            Cell::new(money(c.total)),
            Cell::new(money(c.rewards)),
            Cell::new(format!("{:.1}%", c.pct)),
        ]);
    }
    println!("\nTop Cards\n{table}");

    if !insights.chart.is_empty() {
        println!("\nSpend by Card");
        let max = insights.chart.iter().map(|b| b.spent).fold(0.0_f64, f64::max);
        let width = insights.chart.iter().map(|b| b.label.chars().count()).max().unwrap_or(0);
        for bar in &insights.chart {
            let len = if max > 0.0 { (bar.spent / max * BAR_WIDTH).round() as usize } else { 0 };
            println!(
                "  {:<width$}  {} {}",
                bar.label,
                "█".repeat(len.max(1)).cyan(),
                money(bar.spent)
            );
        }
    }
    Ok(())
}
