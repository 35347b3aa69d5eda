use colored::Colorize;

use crate::advisor::{assess_purchase, recommend_card, AssessRequest, GatewayClient, RecommendRequest};
use crate::error::Result;
use crate::fmt::money;
use crate::settings::load_settings;
use crate::store::{SqliteStore, Store};

use super::{open_db, signed_in};

pub fn recommend(category: &str, merchant: Option<&str>) -> Result<()> {
    let req = RecommendRequest::new(category, merchant)?;
    let settings = load_settings();
    let conn = open_db(&settings)?;
    let user = signed_in(&conn, &settings)?;
    let cards = SqliteStore::new(&conn).cards_for_user(&user)?;
    let client = GatewayClient::from_settings(&settings)?;

    let text = recommend_card(&client, &cards, &req)?;
    println!("{}\n{text}", "Recommendation".bold());
    Ok(())
}

pub fn assess(amount: f64, category: &str, description: Option<&str>) -> Result<()> {
    let req = AssessRequest::new(amount, category, description)?;
    let settings = load_settings();
    let conn = open_db(&settings)?;
    let user = signed_in(&conn, &settings)?;
    let cards = SqliteStore::new(&conn).cards_for_user(&user)?;
    let client = GatewayClient::from_settings(&settings)?;

    let assessment = assess_purchase(&client, &cards, &req)?;
    let snap = &assessment.snapshot;
    println!("{}", "Your Credit".bold());
    println!("  Available:          {}", money(snap.available_credit));
    println!(
        "  Utilization:        {:.1}% -> {:.1}%",
        snap.current_utilization, snap.after_utilization
    );
    if let Some(impact) = snap.budget_impact {
        println!("  Share of available: {impact:.1}%");
    }
    println!();
    println!("{}\n{}", "Assessment".bold(), assessment.text);
    Ok(())
}
