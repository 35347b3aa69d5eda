use chrono::NaiveDate;

use crate::models::Card;

pub const DUE_SOON_DAYS: i64 = 7;
pub const HIGH_UTILIZATION_PCT: f64 = 70.0;
const CARD_REWARD_RATE: f64 = 0.02;

/// Missing or NaN amounts count as zero in totals.
fn or_zero(val: f64) -> f64 {
    if val.is_nan() {
        0.0
    } else {
        val
    }
}

/// `balance / limit` as a percentage, 0 when there is no positive limit.
pub fn utilization_pct(balance: f64, limit: f64) -> f64 {
    if limit > 0.0 {
        balance / limit * 100.0
    } else {
        0.0
    }
}

fn parse_due(card: &Card) -> Option<NaiveDate> {
    card.due_date
        .as_deref()
        .and_then(|d| NaiveDate::parse_from_str(d.get(..10).unwrap_or(d), "%Y-%m-%d").ok())
}

pub fn days_until(due: NaiveDate, today: NaiveDate) -> i64 {
    (due - today).num_days()
}

// ---------------------------------------------------------------------------
// Account totals
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct AccountSummary {
    pub card_count: usize,
    pub total_balance: f64,
    pub total_limit: f64,
    pub available_credit: f64,
    /// Whole percent.
    pub utilization: f64,
    pub annual_fees: f64,
    pub cashback: f64,
    pub pending_dues: f64,
}

pub fn account_summary(cards: &[Card]) -> AccountSummary {
    let total_balance: f64 = cards.iter().map(|c| c.balance).sum();
    let total_limit: f64 = cards.iter().map(|c| or_zero(c.credit_limit)).sum();
    AccountSummary {
        card_count: cards.len(),
        total_balance,
        total_limit,
        available_credit: total_limit - total_balance,
        utilization: utilization_pct(total_balance, total_limit).round(),
        annual_fees: cards.iter().map(|c| or_zero(c.annual_fee)).sum(),
        cashback: cards.iter().map(|c| or_zero(c.cashback)).sum(),
        pending_dues: cards.iter().map(|c| or_zero(c.pending_dues)).sum(),
    }
}

// ---------------------------------------------------------------------------
// Per-card status
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CardStatus {
    PaymentDueSoon,
    HighUtilization,
    Safe,
}

impl CardStatus {
    pub fn label(&self) -> &'static str {
        match self {
            Self::PaymentDueSoon => "Payment Due Soon",
            Self::HighUtilization => "High Utilization",
            Self::Safe => "Safe",
        }
    }
}

/// A due date within a week, overdue included, outranks high utilization.
pub fn card_status(card: &Card, today: NaiveDate) -> CardStatus {
    let due_soon = parse_due(card).is_some_and(|d| days_until(d, today) <= DUE_SOON_DAYS);
    if due_soon {
        CardStatus::PaymentDueSoon
    } else if utilization_pct(card.balance, card.credit_limit) > HIGH_UTILIZATION_PCT {
        CardStatus::HighUtilization
    } else {
        CardStatus::Safe
    }
}

pub fn card_reward_estimate(card: &Card) -> f64 {
    card.balance * CARD_REWARD_RATE
}

// ---------------------------------------------------------------------------
// Payment reminders
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Urgency {
    Critical,
    Warning,
    Normal,
}

impl Urgency {
    pub fn for_days(days: i64) -> Self {
        if days <= 2 {
            Self::Critical
        } else if days <= 5 {
            Self::Warning
        } else {
            Self::Normal
        }
    }
}

#[derive(Debug, Clone)]
pub struct Reminder<'a> {
    pub card: &'a Card,
    pub due: NaiveDate,
    pub days_until: i64,
    pub urgency: Urgency,
}

/// Cards due between today and a week from today, soonest first.
pub fn payment_reminders(cards: &[Card], today: NaiveDate) -> Vec<Reminder<'_>> {
    let mut out: Vec<Reminder> = cards
        .iter()
        .filter_map(|card| {
            let due = parse_due(card)?;
            let days = days_until(due, today);
            (0..=DUE_SOON_DAYS).contains(&days).then(|| Reminder {
                card,
                due,
                days_until: days,
                urgency: Urgency::for_days(days),
            })
        })
        .collect();
    out.sort_by_key(|r| r.due);
    out
}
