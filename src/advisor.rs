use std::fmt::Write as _;

use serde_json::{json, Value};

use crate::error::{AlphaError, Result};
use crate::fmt::clip;
use crate::models::Card;
use crate::settings::{Settings, AI_KEY_ENV};
use crate::summary::utilization_pct;

pub const MAX_CATEGORY_LEN: usize = 50;
pub const MAX_MERCHANT_LEN: usize = 100;
pub const MAX_DESCRIPTION_LEN: usize = 500;
pub const MAX_AMOUNT: f64 = 1_000_000.0;

// ---------------------------------------------------------------------------
// Completion client
// ---------------------------------------------------------------------------

/// Something that turns a system + user prompt into model text.
pub trait CompletionClient {
    fn complete(&self, system: &str, user: &str) -> Result<String>;
}

/// OpenAI-style chat completion endpoint behind a bearer key.
pub struct GatewayClient {
    client: reqwest::blocking::Client,
    base_url: String,
    model: String,
    api_key: String,
}

impl GatewayClient {
    pub fn new(base_url: &str, model: &str, api_key: &str) -> Self {
        Self {
            client: reqwest::blocking::Client::new(),
            base_url: base_url.to_string(),
            model: model.to_string(),
            api_key: api_key.to_string(),
        }
    }

    /// Gateway and model from settings, key from the environment.
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        let key = std::env::var(AI_KEY_ENV)
            .ok()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| AlphaError::Settings(format!("{AI_KEY_ENV} is not configured")))?;
        Ok(Self::new(&settings.ai_gateway_url, &settings.ai_model, &key))
    }

    fn endpoint(&self) -> String {
        if self.base_url.ends_with('/') {
            format!("{}chat/completions", self.base_url)
        } else {
            format!("{}/chat/completions", self.base_url)
        }
    }
}

impl CompletionClient for GatewayClient {
    fn complete(&self, system: &str, user: &str) -> Result<String> {
        let body = json!({
            "model": self.model,
            "messages": [
                { "role": "system", "content": system },
                { "role": "user", "content": user }
            ],
        });
        tracing::debug!(model = %self.model, url = %self.endpoint(), "requesting completion");

        let response = self
            .client
            .post(self.endpoint())
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().unwrap_or_default();
            tracing::warn!(status = status.as_u16(), "AI gateway returned an error");
            return Err(status_error(status.as_u16(), text));
        }

        let json: Value = response.json()?;
        extract_content(&json)
    }
}

fn status_error(status: u16, body: String) -> AlphaError {
    match status {
        429 => AlphaError::RateLimited,
        402 => AlphaError::CreditsExhausted,
        _ => AlphaError::Gateway { status, body },
    }
}

fn extract_content(json: &Value) -> Result<String> {
    json["choices"][0]["message"]["content"]
        .as_str()
        .map(str::to_string)
        .ok_or_else(|| AlphaError::Other("Invalid response format from AI gateway".to_string()))
}

// ---------------------------------------------------------------------------
// Requests
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct RecommendRequest {
    pub category: String,
    pub merchant: Option<String>,
}

impl RecommendRequest {
    pub fn new(category: &str, merchant: Option<&str>) -> Result<Self> {
        Ok(Self {
            category: clean_category(category)?,
            merchant: clean_optional(merchant, MAX_MERCHANT_LEN),
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AssessRequest {
    pub amount: f64,
    pub category: String,
    pub description: Option<String>,
}

impl AssessRequest {
    pub fn new(amount: f64, category: &str, description: Option<&str>) -> Result<Self> {
        if !amount.is_finite() || amount <= 0.0 || amount > MAX_AMOUNT {
            return Err(AlphaError::Validation(
                "Amount must be a positive number less than 1,000,000".to_string(),
            ));
        }
        Ok(Self {
            amount,
            category: clean_category(category)?,
            description: clean_optional(description, MAX_DESCRIPTION_LEN),
        })
    }
}

fn clean_category(raw: &str) -> Result<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(AlphaError::Validation("Category is required".to_string()));
    }
    Ok(clip(trimmed, MAX_CATEGORY_LEN))
}

fn clean_optional(raw: Option<&str>, max: usize) -> Option<String> {
    raw.map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| clip(s, max))
}

// ---------------------------------------------------------------------------
// Financial snapshot
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct FinancialSnapshot {
    pub total_limit: f64,
    pub total_balance: f64,
    pub available_credit: f64,
    pub current_utilization: f64,
    pub after_utilization: f64,
    /// Purchase as a percentage of available credit; `None` with no credit left.
    pub budget_impact: Option<f64>,
}

fn finite_or_zero(val: f64) -> f64 {
    if val.is_finite() {
        val
    } else {
        0.0
    }
}

pub fn financial_snapshot(cards: &[Card], amount: f64) -> FinancialSnapshot {
    let total_limit: f64 = cards.iter().map(|c| finite_or_zero(c.credit_limit)).sum();
    let total_balance: f64 = cards.iter().map(|c| finite_or_zero(c.balance)).sum();
    let available_credit = total_limit - total_balance;
    FinancialSnapshot {
        total_limit,
        total_balance,
        available_credit,
        current_utilization: utilization_pct(total_balance, total_limit),
        after_utilization: utilization_pct(total_balance + amount, total_limit),
        budget_impact: (available_credit > 0.0).then(|| amount / available_credit * 100.0),
    }
}

// ---------------------------------------------------------------------------
// Prompts
// ---------------------------------------------------------------------------

const RECOMMEND_SYSTEM: &str = "You are an expert credit card advisor. Analyze the user's cards \
and recommend the best one to use for a purchase. Consider rewards type, current utilization \
(avoid cards near their limit), APR and any category bonuses. Give a clear, actionable \
recommendation with brief reasoning.";

const ASSESS_SYSTEM: &str = "You are a financial advisor helping users make smart purchasing \
decisions. Analyze their credit situation and give a verdict: Buy Now, Wait, or Plan to Save. \
Include a short rationale, the card to use if buying now, and one concrete next step.";

fn card_lines(cards: &[Card]) -> String {
    let mut out = String::new();
    for card in cards {
        let _ = writeln!(
            out,
            "- {} ({}): rewards {}, balance ${:.2} of ${:.2} ({:.0}% used), APR {:.2}%, annual fee ${:.2}",
            card.name,
            card.network,
            card.rewards_type,
            card.balance,
            card.credit_limit,
            utilization_pct(card.balance, card.credit_limit),
            card.apr,
            card.annual_fee,
        );
    }
    out
}

fn recommend_prompt(req: &RecommendRequest, cards: &[Card]) -> String {
    let at = req
        .merchant
        .as_deref()
        .map(|m| format!(" at {m}"))
        .unwrap_or_default();
    format!(
        "I want to make a purchase{at} in the {} category.\n\nMy cards:\n{}\nWhich card should I use and why? Keep it brief.",
        req.category,
        card_lines(cards)
    )
}

fn assess_prompt(req: &AssessRequest, snap: &FinancialSnapshot, cards: &[Card]) -> String {
    format!(
        "Should I make this purchase?\n\nAmount: ${:.2}\nCategory: {}\nDescription: {}\n\n\
         Total credit limit: ${:.2}\nCurrent balance: ${:.2}\nAvailable credit: ${:.2}\n\
         Current utilization: {:.1}%\nUtilization after purchase: {:.1}%\n\nMy cards:\n{}",
        req.amount,
        req.category,
        req.description.as_deref().unwrap_or("Not specified"),
        snap.total_limit,
        snap.total_balance,
        snap.available_credit,
        snap.current_utilization,
        snap.after_utilization,
        card_lines(cards)
    )
}

// ---------------------------------------------------------------------------
// Operations
// ---------------------------------------------------------------------------

pub fn recommend_card<C: CompletionClient>(
    client: &C,
    cards: &[Card],
    req: &RecommendRequest,
) -> Result<String> {
    tracing::info!(category = %req.category, cards = cards.len(), "recommend card");
    client.complete(RECOMMEND_SYSTEM, &recommend_prompt(req, cards))
}

pub struct Assessment {
    pub snapshot: FinancialSnapshot,
    pub text: String,
}

pub fn assess_purchase<C: CompletionClient>(
    client: &C,
    cards: &[Card],
    req: &AssessRequest,
) -> Result<Assessment> {
    let snapshot = financial_snapshot(cards, req.amount);
    tracing::info!(amount = req.amount, category = %req.category, "assess purchase");
    let text = client.complete(ASSESS_SYSTEM, &assess_prompt(req, &snapshot, cards))?;
    Ok(Assessment { snapshot, text })
}
