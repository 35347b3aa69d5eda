use colored::Colorize;
use comfy_table::{Cell, Table};

use crate::cards::{self, CardForm};
use crate::error::Result;
use crate::fmt::money;
use crate::models::SUGGESTED_CATEGORIES;
use crate::settings::load_settings;
use crate::store::SqliteStore;
use crate::summary::utilization_pct;

use super::{open_db, signed_in};

pub fn add(form: CardForm) -> Result<()> {
    let settings = load_settings();
    let conn = open_db(&settings)?;
    let user = signed_in(&conn, &settings)?;
    let store = SqliteStore::new(&conn);
    let id = cards::add_card(&store, &user, &form)?;
    println!("Added card: {} ({id})", form.name.trim());
    Ok(())
}

pub fn list() -> Result<()> {
    let settings = load_settings();
    let conn = open_db(&settings)?;
    let user = signed_in(&conn, &settings)?;
    let store = SqliteStore::new(&conn);
    let cards = cards::list_cards(&store, &user)?;

    if cards.is_empty() {
        println!("No cards yet. Add one with `alphacard cards add` or run `alphacard import --demo`.");
        return Ok(());
    }

    let mut table = Table::new();
    table.set_header(vec![
        "ID", "", "Name", "Network", "Last Four", "Balance", "Limit", "Used", "APR", "Rewards", "Due",
    ]);
    for card in &cards {
        table.add_row(vec![
            Cell::new(&card.id),
            Cell::new(if card.is_primary { "*" } else { "" }),
            Cell::new(&card.name),
            Cell::new(&card.network),
            Cell::new(&card.last_four),
            Cell::new(money(card.balance)),
            Cell::new(money(card.credit_limit)),
            Cell::new(format!("{:.0}%", utilization_pct(card.balance, card.credit_limit))),
            Cell::new(format!("{:.2}%", card.apr)),
            Cell::new(card.rewards_type),
            Cell::new(card.due_date.as_deref().unwrap_or("Not set")),
        ]);
    }
    println!("Cards\n{table}");
    println!(
        "{} {}",
        "Categories:".dimmed(),
        SUGGESTED_CATEGORIES.join(", ").dimmed()
    );
    Ok(())
}

pub fn primary(id: &str) -> Result<()> {
    let settings = load_settings();
    let conn = open_db(&settings)?;
    let user = signed_in(&conn, &settings)?;
    cards::set_primary(&SqliteStore::new(&conn), &user, id)?;
    println!("Primary card set: {id}");
    Ok(())
}

pub fn update(id: &str, balance: Option<f64>, limit: Option<f64>) -> Result<()> {
    let settings = load_settings();
    let conn = open_db(&settings)?;
    let user = signed_in(&conn, &settings)?;
    cards::update_amounts(&SqliteStore::new(&conn), &user, id, balance, limit)?;
    println!("Updated card: {id}");
    Ok(())
}

pub fn delete(id: &str) -> Result<()> {
    let settings = load_settings();
    let conn = open_db(&settings)?;
    let user = signed_in(&conn, &settings)?;
    cards::delete_card(&SqliteStore::new(&conn), &user, id)?;
    println!("Deleted card: {id}");
    Ok(())
}
