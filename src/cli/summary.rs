use colored::Colorize;
use comfy_table::{Cell, Table};

use crate::error::Result;
use crate::fmt::money;
use crate::settings::load_settings;
use crate::store::{SqliteStore, Store};
use crate::summary::{
    account_summary, card_reward_estimate, card_status, payment_reminders, utilization_pct,
    CardStatus, Urgency,
};

use super::{open_db, signed_in};

pub fn run() -> Result<()> {
    let settings = load_settings();
    let conn = open_db(&settings)?;
    let user = signed_in(&conn, &settings)?;
    let cards = SqliteStore::new(&conn).cards_for_user(&user)?;

    if cards.is_empty() {
        println!("No cards yet. Add one with `alphacard cards add` or run `alphacard import --demo`.");
        return Ok(());
    }

    let today = chrono::Local::now().date_naive();
    let s = account_summary(&cards);
    println!("{}", "Account Summary".bold());
    println!("  Cards:            {}", s.card_count);
    println!("  Available credit: {}", money(s.available_credit).green());
    println!("  Used:             {} of {}", money(s.total_balance), money(s.total_limit));
    println!("  Utilization:      {}%", s.utilization);
    println!("  Annual fees:      {}", money(s.annual_fees));
    println!("  Cashback earned:  {}", money(s.cashback));
    println!("  Pending dues:     {}", money(s.pending_dues));
    println!();

    let mut table = Table::new();
    table.set_header(vec!["Card", "Balance", "Limit", "Used", "Rewards est.", "Due", "Status"]);
    for card in &cards {
        let status = card_status(card, today);
        let label = match status {
            CardStatus::PaymentDueSoon => status.label().red(),
            CardStatus::HighUtilization => status.label().yellow(),
            CardStatus::Safe => status.label().green(),
        };
        table.add_row(vec![
            Cell::new(format!("{} (…{})", card.name, card.last_four)),
            Cell::new(money(card.balance)),
            Cell::new(money(card.credit_limit)),
            Cell::new(format!("{:.0}%", utilization_pct(card.balance, card.credit_limit))),
            Cell::new(money(card_reward_estimate(card))),
            Cell::new(card.due_date.as_deref().unwrap_or("Not set")),
            Cell::new(label),
        ]);
    }
    println!("Linked Cards\n{table}");

    let reminders = payment_reminders(&cards, today);
    println!();
    if reminders.is_empty() {
        println!("No payments due in the next 7 days");
        return Ok(());
    }
    println!("{}", "Payment Reminders".bold());
    for r in &reminders {
        let when = match r.days_until {
            0 => "today".to_string(),
            1 => "tomorrow".to_string(),
            n => format!("in {n} days"),
        };
        let line = format!(
            "  {} (…{}) due {} {}: {}",
            r.card.name,
            r.card.last_four,
            r.due.format("%Y-%m-%d"),
            when,
            money(r.card.pending_dues)
        );
        match r.urgency {
            Urgency::Critical => println!("{}", line.red()),
            Urgency::Warning => println!("{}", line.yellow()),
            Urgency::Normal => println!("{line}"),
        }
    }
    Ok(())
}
