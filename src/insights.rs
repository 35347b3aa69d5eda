use std::cmp::Ordering;

use crate::auth::Identity;
use crate::error::Result;
use crate::fmt::{round_cents, truncate_label};
use crate::models::Transaction;
use crate::store::Store;

/// Flat reward estimate applied to all spend regardless of card.
pub const REWARD_RATE: f64 = 0.02;
pub const TOP_CATEGORIES: usize = 6;
pub const TOP_CARDS: usize = 3;
pub const CHART_CARDS: usize = 10;
const CHART_LABEL_MAX: usize = 20;

// ---------------------------------------------------------------------------
// Category spend
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct CategorySpend {
    /// Raw label as stored.
    pub category: String,
    pub total: f64,
    pub rewards: f64,
}

impl CategorySpend {
    pub fn display_name(&self) -> String {
        display_category(&self.category)
    }
}

/// "dining_out" -> "Dining Out": underscores become spaces and the first
/// letter of every word is upper-cased.
pub fn display_category(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut prev_word = false;
    for c in raw.chars() {
        let c = if c == '_' { ' ' } else { c };
        let is_word = c.is_alphanumeric();
        if is_word && !prev_word {
            out.extend(c.to_uppercase());
        } else {
            out.push(c);
        }
        prev_word = is_word;
    }
    out
}

fn by_total_desc(a: f64, b: f64) -> Ordering {
    b.partial_cmp(&a).unwrap_or(Ordering::Equal)
}

/// Group by category label and sum, largest first. Ties keep first-seen
/// order. Not truncated.
pub fn category_spend(txns: &[Transaction]) -> Vec<CategorySpend> {
    let mut out: Vec<CategorySpend> = Vec::new();
    for txn in txns {
        match out.iter_mut().find(|c| c.category == txn.category) {
            Some(existing) => existing.total += txn.amount,
            None => out.push(CategorySpend {
                category: txn.category.clone(),
                total: txn.amount,
                rewards: 0.0,
            }),
        }
    }
    for c in &mut out {
        c.rewards = c.total * REWARD_RATE;
    }
    out.sort_by(|a, b| by_total_desc(a.total, b.total));
    out
}

// ---------------------------------------------------------------------------
// Card spend
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct CardSpend {
    pub card_id: String,
    pub name: String,
    pub last_four: String,
    pub total: f64,
    pub rewards: f64,
    /// Share of spend across all cards, 0..=100.
    pub pct: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChartBar {
    pub label: String,
    pub spent: f64,
    pub rewards: f64,
}

/// Fill in each card's share of the combined total and sort largest first.
pub fn rank_cards(mut cards: Vec<CardSpend>) -> Vec<CardSpend> {
    let total: f64 = cards.iter().map(|c| c.total).sum();
    for c in &mut cards {
        c.pct = if total > 0.0 { c.total / total * 100.0 } else { 0.0 };
    }
    cards.sort_by(|a, b| by_total_desc(a.total, b.total));
    cards
}

/// Bars for cards that have any spend, labels shortened, amounts in cents.
pub fn chart_bars(ranked: &[CardSpend]) -> Vec<ChartBar> {
    ranked
        .iter()
        .filter(|c| c.total > 0.0)
        .take(CHART_CARDS)
        .map(|c| ChartBar {
            label: truncate_label(&c.name, CHART_LABEL_MAX),
            spent: round_cents(c.total),
            rewards: round_cents(c.rewards),
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Insights view
// ---------------------------------------------------------------------------

pub struct Insights {
    /// Top categories only.
    pub categories: Vec<CategorySpend>,
    /// Sum over the top categories, as displayed.
    pub total_spend: f64,
    pub total_rewards: f64,
    /// Every card, ranked.
    pub cards: Vec<CardSpend>,
    pub chart: Vec<ChartBar>,
}

impl Insights {
    pub fn top_cards(&self) -> &[CardSpend] {
        &self.cards[..self.cards.len().min(TOP_CARDS)]
    }
}

/// Recompute everything from the store. One read for all transactions,
/// then one read per card.
pub fn load_insights<S: Store>(store: &S, user: &Identity) -> Result<Insights> {
    let mut categories = category_spend(&store.transactions_for_user(user)?);
    categories.truncate(TOP_CATEGORIES);
    let total_spend = categories.iter().map(|c| c.total).sum();
    let total_rewards = categories.iter().map(|c| c.rewards).sum();

    let mut per_card = Vec::new();
    for card in store.cards_for_user(user)? {
        let total: f64 = store
            .transactions_for_card(user, &card.id)?
            .iter()
            .map(|t| t.amount)
            .sum();
        per_card.push(CardSpend {
            card_id: card.id,
            name: card.name,
            last_four: card.last_four,
            total,
            rewards: total * REWARD_RATE,
            pct: 0.0,
        });
    }
    let cards = rank_cards(per_card);
    let chart = chart_bars(&cards);

    tracing::debug!(categories = categories.len(), cards = cards.len(), "insights computed");
    Ok(Insights {
        categories,
        total_spend,
        total_rewards,
        cards,
        chart,
    })
}
