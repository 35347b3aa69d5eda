use chrono::NaiveDate;

use crate::auth::Identity;
use crate::error::{AlphaError, Result};
use crate::models::{Card, NewCard, RewardsType};
use crate::store::{SqliteStore, Store};

pub const DEFAULT_CREDIT_LIMIT: f64 = 10_000.0;

/// Card details as entered by the user. Missing numbers default to zero,
/// except the credit limit.
#[derive(Debug, Clone, Default)]
pub struct CardForm {
    pub name: String,
    pub network: String,
    pub last_four: String,
    pub balance: Option<f64>,
    pub credit_limit: Option<f64>,
    pub apr: Option<f64>,
    pub annual_fee: Option<f64>,
    pub cashback: Option<f64>,
    pub pending_dues: Option<f64>,
    pub due_date: Option<String>,
    pub rewards_type: Option<String>,
}

fn invalid(msg: &str) -> AlphaError {
    AlphaError::Validation(msg.to_string())
}

/// Zero-valued and unparsable entries fall back to `default`.
fn amount_or(val: Option<f64>, default: f64) -> f64 {
    val.filter(|v| !v.is_nan() && *v != 0.0).unwrap_or(default)
}

fn non_negative(val: f64, msg: &str) -> Result<f64> {
    if val < 0.0 {
        Err(invalid(msg))
    } else {
        Ok(val)
    }
}

pub fn is_iso_date(s: &str) -> bool {
    s.len() == 10 && NaiveDate::parse_from_str(s, "%Y-%m-%d").is_ok()
}

/// Validate a form into an insert payload owned by `user`.
pub fn validate_card(user: &Identity, form: &CardForm) -> Result<NewCard> {
    let name = form.name.trim();
    if name.chars().count() < 2 {
        return Err(invalid("Card name must be at least 2 characters"));
    }
    let network = form.network.trim();
    if network.is_empty() {
        return Err(invalid("Please select card type"));
    }
    let last_four = form.last_four.trim();
    if last_four.len() != 4 || !last_four.bytes().all(|b| b.is_ascii_digit()) {
        return Err(invalid("Last 4 digits must be exactly 4 digits"));
    }

    let balance = non_negative(amount_or(form.balance, 0.0), "Balance must be positive")?;
    let credit_limit = non_negative(
        amount_or(form.credit_limit, DEFAULT_CREDIT_LIMIT),
        "Credit limit must be positive",
    )?;
    let annual_fee = non_negative(amount_or(form.annual_fee, 0.0), "Annual fee must be positive")?;
    let cashback = non_negative(amount_or(form.cashback, 0.0), "Cashback must be positive")?;
    let pending_dues = non_negative(amount_or(form.pending_dues, 0.0), "Pending dues must be positive")?;
    let apr = non_negative(amount_or(form.apr, 0.0), "APR must be positive")?;
    if apr > 100.0 {
        return Err(invalid("APR cannot exceed 100%"));
    }

    let due_date = match form.due_date.as_deref().map(str::trim) {
        None | Some("") => None,
        Some(d) if is_iso_date(d) => Some(d.to_string()),
        Some(d) => return Err(AlphaError::Validation(format!("Due date must be YYYY-MM-DD: {d}"))),
    };
    let rewards_type = match form.rewards_type.as_deref() {
        None => RewardsType::Cashback,
        Some(raw) => RewardsType::parse(raw).ok_or_else(|| invalid("Please select rewards type"))?,
    };

    Ok(NewCard {
        user_id: user.user_id.clone(),
        name: name.to_string(),
        network: network.to_string(),
        last_four: last_four.to_string(),
        balance,
        credit_limit,
        apr,
        annual_fee,
        cashback,
        pending_dues,
        due_date,
        rewards_type,
        is_primary: false,
    })
}

pub fn add_card(store: &SqliteStore, user: &Identity, form: &CardForm) -> Result<String> {
    let card = validate_card(user, form)?;
    let id = store.insert_card(&card)?;
    tracing::info!(card_id = %id, "card added");
    Ok(id)
}

/// Primary card first, then newest first.
pub fn list_cards(store: &SqliteStore, user: &Identity) -> Result<Vec<Card>> {
    store.cards_for_user(user)
}

pub fn update_amounts(
    store: &SqliteStore,
    user: &Identity,
    card_id: &str,
    balance: Option<f64>,
    credit_limit: Option<f64>,
) -> Result<()> {
    if balance.is_none() && credit_limit.is_none() {
        return Err(invalid("Nothing to update: pass --balance and/or --limit"));
    }
    if let Some(b) = balance {
        if !b.is_finite() {
            return Err(invalid("Balance must be a number"));
        }
        non_negative(b, "Balance must be positive")?;
    }
    if let Some(l) = credit_limit {
        if !l.is_finite() {
            return Err(invalid("Credit limit must be a number"));
        }
        non_negative(l, "Credit limit must be positive")?;
    }
    store.update_card_amounts(user, card_id, balance, credit_limit)
}

pub fn set_primary(store: &SqliteStore, user: &Identity, card_id: &str) -> Result<()> {
    store.set_primary(user, card_id)
}

pub fn delete_card(store: &SqliteStore, user: &Identity, card_id: &str) -> Result<()> {
    store.delete_card(user, card_id)?;
    tracing::info!(card_id, "card deleted");
    Ok(())
}
