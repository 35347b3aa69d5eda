pub mod advise;
pub mod auth;
pub mod cards;
pub mod demo;
pub mod import;
pub mod init;
pub mod insights;
pub mod profile;
pub mod status;
pub mod summary;
pub mod verify;

use clap::{Parser, Subcommand};
use rusqlite::Connection;

use crate::auth::{current_identity, require_identity, Identity};
use crate::db::get_connection;
use crate::error::{AlphaError, Result};
use crate::settings::Settings;

/// Open the database named by `settings`, refusing to create it implicitly.
pub(crate) fn open_db(settings: &Settings) -> Result<Connection> {
    let db_path = settings.db_path();
    if !db_path.exists() {
        return Err(AlphaError::Other(
            "Database not found. Run `alphacard init` to set up.".to_string(),
        ));
    }
    get_connection(&db_path)
}

/// The signed-in identity, or `NotAuthenticated`.
pub(crate) fn signed_in(conn: &Connection, settings: &Settings) -> Result<Identity> {
    let identity = current_identity(conn, settings)?;
    require_identity(identity.as_ref()).cloned()
}

#[derive(Parser)]
#[command(
    name = "alphacard",
    version,
    about = "Track credit cards, import statements, see where the money goes."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Choose a data directory and initialize the database.
    Init {
        /// Path for alphacard data (default: ~/Documents/alphacard)
        #[arg(long = "data-dir")]
        data_dir: Option<String>,
    },
    /// Sign in with an email address (creates the profile on first use).
    Login {
        email: String,
    },
    /// Sign out.
    Logout,
    /// Show the signed-in user.
    Whoami,
    /// Manage cards.
    Cards {
        #[command(subcommand)]
        command: CardsCommands,
    },
    /// Bulk import cards and transactions from two CSV files, or demo data.
    Import {
        /// Import generated sample data (20 cards, 500 transactions)
        #[arg(long, conflicts_with_all = ["cards", "transactions"])]
        demo: bool,
        /// Card CSV (account_id, nickname, product_name, mask, network, ...)
        #[arg(long, requires = "transactions")]
        cards: Option<String>,
        /// Transaction CSV (account_id, merchant_name, amount, category, date)
        #[arg(long, requires = "cards")]
        transactions: Option<String>,
        /// Transactions per insert batch
        #[arg(long = "batch-size", default_value_t = crate::importer::TRANSACTION_BATCH_SIZE)]
        batch_size: usize,
    },
    /// Spending by category and by card.
    Insights,
    /// Account totals, per-card status and upcoming payments.
    Summary,
    /// View or complete your profile.
    Profile {
        #[command(subcommand)]
        command: ProfileCommands,
    },
    /// Identity verification.
    Verify {
        #[command(subcommand)]
        command: VerifyCommands,
    },
    /// Ask the AI advisor.
    Advise {
        #[command(subcommand)]
        command: AdviseCommands,
    },
    /// Show current database and summary statistics.
    Status,
}

#[derive(Subcommand)]
pub enum CardsCommands {
    /// Add a card.
    Add {
        /// Card name, e.g. 'Sapphire Preferred'
        name: String,
        /// Network: Visa, Mastercard, Amex, Discover
        #[arg(long)]
        network: String,
        /// Last 4 digits of the card number
        #[arg(long = "last-four")]
        last_four: String,
        #[arg(long)]
        balance: Option<f64>,
        /// Credit limit (default 10000)
        #[arg(long)]
        limit: Option<f64>,
        #[arg(long)]
        apr: Option<f64>,
        #[arg(long = "annual-fee")]
        annual_fee: Option<f64>,
        #[arg(long)]
        cashback: Option<f64>,
        #[arg(long = "pending-dues")]
        pending_dues: Option<f64>,
        /// Next payment due date: YYYY-MM-DD
        #[arg(long = "due-date")]
        due_date: Option<String>,
        /// Rewards type: cashback, points, miles, none
        #[arg(long)]
        rewards: Option<String>,
    },
    /// List cards (primary first).
    List,
    /// Make a card the primary card.
    Primary {
        /// Card ID (shown in `alphacard cards list`)
        id: String,
    },
    /// Change a card's balance and/or credit limit.
    Update {
        id: String,
        #[arg(long)]
        balance: Option<f64>,
        #[arg(long)]
        limit: Option<f64>,
    },
    /// Delete a card and its transactions.
    Delete {
        id: String,
    },
}

#[derive(Subcommand)]
pub enum ProfileCommands {
    /// Save profile details.
    Set {
        #[arg(long = "full-name")]
        full_name: String,
        /// YYYY-MM-DD
        #[arg(long)]
        dob: String,
        #[arg(long)]
        phone: String,
        #[arg(long)]
        address: String,
        #[arg(long = "address2")]
        address2: Option<String>,
        #[arg(long)]
        city: String,
        /// Two-letter state code
        #[arg(long)]
        state: String,
        #[arg(long)]
        zip: String,
    },
    /// Show profile and verification status.
    Show,
}

#[derive(Subcommand)]
pub enum VerifyCommands {
    /// Verify your SSN (XXX-XX-XXXX). The number is not stored.
    Ssn {
        ssn: String,
    },
    /// Upload an ID document (JPG, PNG or PDF) for review.
    Id {
        file: String,
        /// Declared content type, e.g. image/png (default: from extension)
        #[arg(long = "type")]
        content_type: Option<String>,
    },
}

#[derive(Subcommand)]
pub enum AdviseCommands {
    /// Which card to use for a purchase category.
    Recommend {
        category: String,
        #[arg(long)]
        merchant: Option<String>,
    },
    /// Should you make this purchase?
    Assess {
        amount: f64,
        category: String,
        #[arg(long)]
        description: Option<String>,
    },
}
