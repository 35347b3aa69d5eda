use std::fmt;

/// Purchase categories offered as suggestions; stored labels are free-form.
pub const SUGGESTED_CATEGORIES: &[&str] = &[
    "Dining",
    "Groceries",
    "Travel",
    "Gas",
    "Entertainment",
    "Shopping",
    "Utilities",
    "Healthcare",
    "Other",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RewardsType {
    Cashback,
    Points,
    Miles,
    None,
}

impl RewardsType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Cashback => "cashback",
            Self::Points => "points",
            Self::Miles => "miles",
            Self::None => "none",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_lowercase().as_str() {
            "cashback" => Some(Self::Cashback),
            "points" => Some(Self::Points),
            "miles" => Some(Self::Miles),
            "none" => Some(Self::None),
            _ => None,
        }
    }

    /// Import heuristic over a free-text rewards summary. Case-sensitive,
    /// and anything unrecognised (including a missing summary) is points.
    pub fn infer_from_summary(summary: Option<&str>) -> Self {
        match summary {
            Some(s) if s.contains("cashback") => Self::Cashback,
            Some(s) if s.contains("miles") => Self::Miles,
            _ => Self::Points,
        }
    }
}

impl fmt::Display for RewardsType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone)]
pub struct Card {
    pub id: String,
    pub user_id: String,
    pub name: String,
    pub network: String,
    pub last_four: String,
    pub balance: f64,
    pub credit_limit: f64,
    pub apr: f64,
    pub annual_fee: f64,
    pub cashback: f64,
    pub pending_dues: f64,
    pub due_date: Option<String>,
    pub rewards_type: RewardsType,
    pub is_primary: bool,
    pub created_at: String,
}

/// Insert payload for a card; the store assigns the id.
#[derive(Debug, Clone)]
pub struct NewCard {
    pub user_id: String,
    pub name: String,
    pub network: String,
    pub last_four: String,
    pub balance: f64,
    pub credit_limit: f64,
    pub apr: f64,
    pub annual_fee: f64,
    pub cashback: f64,
    pub pending_dues: f64,
    pub due_date: Option<String>,
    pub rewards_type: RewardsType,
    pub is_primary: bool,
}

#[derive(Debug, Clone)]
pub struct Transaction {
    pub id: String,
    pub user_id: String,
    pub card_id: String,
    pub merchant_name: String,
    pub amount: f64,
    pub category: String,
    pub transaction_date: String,
    pub rewards_earned: f64,
}

/// Insert payload for a transaction. Text fields mirror the import source
/// and may be absent; the store decides whether that is acceptable.
#[derive(Debug, Clone)]
pub struct NewTransaction {
    pub user_id: String,
    pub card_id: String,
    pub merchant_name: Option<String>,
    pub amount: f64,
    pub category: Option<String>,
    pub transaction_date: Option<String>,
    pub rewards_earned: f64,
}

#[derive(Debug, Clone, Default)]
pub struct Profile {
    pub id: String,
    pub email: String,
    pub full_name: Option<String>,
    pub date_of_birth: Option<String>,
    pub phone_number: Option<String>,
    pub address_line1: Option<String>,
    pub address_line2: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub zip_code: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerificationLevel {
    Unverified,
    Basic,
    Verified,
}

impl VerificationLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Unverified => "unverified",
            Self::Basic => "basic",
            Self::Verified => "verified",
        }
    }

    pub fn parse(raw: &str) -> Self {
        match raw {
            "basic" => Self::Basic,
            "verified" => Self::Verified,
            _ => Self::Unverified,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VerificationStatus {
    pub profile_completed: bool,
    pub ssn_verified: bool,
    pub id_verified: bool,
    pub level: VerificationLevel,
}
