//! Persistence seam used by the importer and the insights aggregator.

use rusqlite::{Connection, OptionalExtension, Row};

use crate::auth::Identity;
use crate::db::{real, real_or_nan};
use crate::error::{AlphaError, Result};
use crate::models::{Card, NewCard, NewTransaction, RewardsType, Transaction};

pub trait Store {
    /// Insert one card and return its generated id.
    fn insert_card(&self, card: &NewCard) -> Result<String>;

    /// Insert a batch of transactions as one unit: either every row lands or
    /// none does. Returns the number of rows written.
    fn insert_transactions(&self, txns: &[NewTransaction]) -> Result<usize>;

    fn cards_for_user(&self, user: &Identity) -> Result<Vec<Card>>;

    fn transactions_for_user(&self, user: &Identity) -> Result<Vec<Transaction>>;

    fn transactions_for_card(&self, user: &Identity, card_id: &str) -> Result<Vec<Transaction>>;
}

const CARD_COLUMNS: &str = "id, user_id, card_name, card_type, last_four, balance, credit_limit, apr, \
     annual_fee, cashback, pending_dues, due_date, rewards_type, is_primary, created_at";

const TXN_COLUMNS: &str =
    "id, user_id, card_id, merchant_name, amount, category, transaction_date, rewards_earned";

fn card_from_row(row: &Row) -> rusqlite::Result<Card> {
    let rewards: Option<String> = row.get(12)?;
    Ok(Card {
        id: row.get(0)?,
        user_id: row.get(1)?,
        name: row.get(2)?,
        network: row.get(3)?,
        last_four: row.get(4)?,
        balance: real_or_nan(row.get(5)?),
        credit_limit: real_or_nan(row.get(6)?),
        apr: real_or_nan(row.get(7)?),
        annual_fee: real_or_nan(row.get(8)?),
        cashback: real_or_nan(row.get(9)?),
        pending_dues: real_or_nan(row.get(10)?),
        due_date: row.get(11)?,
        rewards_type: rewards
            .as_deref()
            .and_then(RewardsType::parse)
            .unwrap_or(RewardsType::Cashback),
        is_primary: row.get::<_, Option<bool>>(13)?.unwrap_or(false),
        created_at: row.get::<_, Option<String>>(14)?.unwrap_or_default(),
    })
}

fn txn_from_row(row: &Row) -> rusqlite::Result<Transaction> {
    Ok(Transaction {
        id: row.get(0)?,
        user_id: row.get(1)?,
        card_id: row.get(2)?,
        merchant_name: row.get(3)?,
        amount: real_or_nan(row.get(4)?),
        category: row.get(5)?,
        transaction_date: row.get(6)?,
        rewards_earned: row.get::<_, Option<f64>>(7)?.unwrap_or(0.0),
    })
}

/// [`Store`] backed by the local SQLite database.
pub struct SqliteStore<'c> {
    conn: &'c Connection,
}

impl<'c> SqliteStore<'c> {
    pub fn new(conn: &'c Connection) -> Self {
        Self { conn }
    }

    pub fn card(&self, user: &Identity, card_id: &str) -> Result<Card> {
        let sql = format!("SELECT {CARD_COLUMNS} FROM cards WHERE id = ?1 AND user_id = ?2");
        self.conn
            .query_row(&sql, [card_id, user.user_id.as_str()], card_from_row)
            .optional()?
            .ok_or_else(|| AlphaError::UnknownCard(card_id.to_string()))
    }

    /// Change balance and/or credit limit. `None` leaves a field untouched.
    pub fn update_card_amounts(
        &self,
        user: &Identity,
        card_id: &str,
        balance: Option<f64>,
        credit_limit: Option<f64>,
    ) -> Result<()> {
        let changed = self.conn.execute(
            "UPDATE cards SET balance = COALESCE(?1, balance), credit_limit = COALESCE(?2, credit_limit) \
             WHERE id = ?3 AND user_id = ?4",
            rusqlite::params![balance, credit_limit, card_id, user.user_id],
        )?;
        if changed == 0 {
            return Err(AlphaError::UnknownCard(card_id.to_string()));
        }
        Ok(())
    }

    /// Make `card_id` the user's only primary card.
    pub fn set_primary(&self, user: &Identity, card_id: &str) -> Result<()> {
        let tx = self.conn.unchecked_transaction()?;
        tx.execute("UPDATE cards SET is_primary = 0 WHERE user_id = ?1", [&user.user_id])?;
        let changed = tx.execute(
            "UPDATE cards SET is_primary = 1 WHERE id = ?1 AND user_id = ?2",
            [card_id, user.user_id.as_str()],
        )?;
        if changed == 0 {
            // dropping `tx` rolls back the reset
            return Err(AlphaError::UnknownCard(card_id.to_string()));
        }
        tx.commit()?;
        Ok(())
    }

    /// Delete a card; its transactions go with it via the foreign key.
    pub fn delete_card(&self, user: &Identity, card_id: &str) -> Result<()> {
        let changed = self.conn.execute(
            "DELETE FROM cards WHERE id = ?1 AND user_id = ?2",
            [card_id, user.user_id.as_str()],
        )?;
        if changed == 0 {
            return Err(AlphaError::UnknownCard(card_id.to_string()));
        }
        Ok(())
    }
}

impl Store for SqliteStore<'_> {
    fn insert_card(&self, card: &NewCard) -> Result<String> {
        let id = uuid::Uuid::new_v4().to_string();
        self.conn.execute(
            "INSERT INTO cards (id, user_id, card_name, card_type, last_four, balance, credit_limit, apr, \
             annual_fee, cashback, pending_dues, due_date, rewards_type, is_primary) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)",
            rusqlite::params![
                id,
                card.user_id,
                card.name,
                card.network,
                card.last_four,
                real(card.balance),
                real(card.credit_limit),
                real(card.apr),
                real(card.annual_fee),
                real(card.cashback),
                real(card.pending_dues),
                card.due_date,
                card.rewards_type.as_str(),
                card.is_primary,
            ],
        )?;
        Ok(id)
    }

    fn insert_transactions(&self, txns: &[NewTransaction]) -> Result<usize> {
        let tx = self.conn.unchecked_transaction()?;
        {
            let mut stmt = tx.prepare_cached(
                "INSERT INTO transactions (id, user_id, card_id, merchant_name, amount, category, \
                 transaction_date, rewards_earned) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, COALESCE(?7, date('now')), ?8)",
            )?;
            for txn in txns {
                stmt.execute(rusqlite::params![
                    uuid::Uuid::new_v4().to_string(),
                    txn.user_id,
                    txn.card_id,
                    txn.merchant_name,
                    real(txn.amount),
                    txn.category,
                    txn.transaction_date,
                    real(txn.rewards_earned),
                ])?;
            }
        }
        tx.commit()?;
        Ok(txns.len())
    }

    fn cards_for_user(&self, user: &Identity) -> Result<Vec<Card>> {
        let sql = format!(
            "SELECT {CARD_COLUMNS} FROM cards WHERE user_id = ?1 \
             ORDER BY is_primary DESC, created_at DESC, rowid DESC"
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let cards = stmt
            .query_map([&user.user_id], card_from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(cards)
    }

    fn transactions_for_user(&self, user: &Identity) -> Result<Vec<Transaction>> {
        let sql = format!("SELECT {TXN_COLUMNS} FROM transactions WHERE user_id = ?1 ORDER BY rowid");
        let mut stmt = self.conn.prepare(&sql)?;
        let txns = stmt
            .query_map([&user.user_id], txn_from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(txns)
    }

    fn transactions_for_card(&self, user: &Identity, card_id: &str) -> Result<Vec<Transaction>> {
        let sql = format!(
            "SELECT {TXN_COLUMNS} FROM transactions WHERE card_id = ?1 AND user_id = ?2 ORDER BY rowid"
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let txns = stmt
            .query_map([card_id, user.user_id.as_str()], txn_from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(txns)
    }
}
