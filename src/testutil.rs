//! Shared fixtures and test doubles.

use std::cell::{Cell, RefCell};

use rusqlite::Connection;

use crate::auth::{sign_in, Identity};
use crate::db::{get_connection, init_db};
use crate::error::{AlphaError, Result};
use crate::models::{Card, NewCard, NewTransaction, RewardsType, Transaction};
use crate::notify::{Notice, Notifier};
use crate::store::Store;

pub fn test_db() -> (tempfile::TempDir, Connection) {
    let dir = tempfile::tempdir().unwrap();
    let conn = get_connection(&dir.path().join("test.db")).unwrap();
    init_db(&conn).unwrap();
    (dir, conn)
}

pub fn test_user(conn: &Connection) -> Identity {
    sign_in(conn, "ana@example.com").unwrap()
}

pub fn new_card(user: &Identity, name: &str) -> NewCard {
    NewCard {
        user_id: user.user_id.clone(),
        name: name.to_string(),
        network: "Visa".to_string(),
        last_four: "4242".to_string(),
        balance: 1000.0,
        credit_limit: 5000.0,
        apr: 19.99,
        annual_fee: 0.0,
        cashback: 0.0,
        pending_dues: 0.0,
        due_date: None,
        rewards_type: RewardsType::Cashback,
        is_primary: false,
    }
}

pub fn new_txn(user: &Identity, card_id: &str, category: &str, amount: f64) -> NewTransaction {
    NewTransaction {
        user_id: user.user_id.clone(),
        card_id: card_id.to_string(),
        merchant_name: Some("Merchant".to_string()),
        amount,
        category: Some(category.to_string()),
        transaction_date: Some("2025-06-15".to_string()),
        rewards_earned: 0.0,
    }
}

/// Collects every notice instead of printing it.
#[derive(Default)]
pub struct RecordingNotifier {
    notices: RefCell<Vec<Notice>>,
}

impl RecordingNotifier {
    pub fn notices(&self) -> Vec<Notice> {
        self.notices.borrow().clone()
    }

    pub fn titles(&self) -> Vec<String> {
        self.notices.borrow().iter().map(|n| n.title.clone()).collect()
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, notice: Notice) {
        self.notices.borrow_mut().push(notice);
    }
}

/// Wraps a store, failing chosen insert calls (1-based) and recording the
/// size of every batch insert attempted.
pub struct FlakyStore<'s, S: Store> {
    inner: &'s S,
    fail_card_at: Option<usize>,
    fail_batch_at: Option<usize>,
    card_calls: Cell<usize>,
    batch_sizes: RefCell<Vec<usize>>,
}

impl<'s, S: Store> FlakyStore<'s, S> {
    pub fn new(inner: &'s S) -> Self {
        Self {
            inner,
            fail_card_at: None,
            fail_batch_at: None,
            card_calls: Cell::new(0),
            batch_sizes: RefCell::new(Vec::new()),
        }
    }

    pub fn fail_card_call(mut self, n: usize) -> Self {
        self.fail_card_at = Some(n);
        self
    }

    pub fn fail_batch_call(mut self, n: usize) -> Self {
        self.fail_batch_at = Some(n);
        self
    }

    pub fn card_calls(&self) -> usize {
        self.card_calls.get()
    }

    pub fn batch_sizes(&self) -> Vec<usize> {
        self.batch_sizes.borrow().clone()
    }
}

impl<S: Store> Store for FlakyStore<'_, S> {
    fn insert_card(&self, card: &NewCard) -> Result<String> {
        let n = self.card_calls.get() + 1;
        self.card_calls.set(n);
        if self.fail_card_at == Some(n) {
            return Err(AlphaError::Other(format!("simulated failure on card insert {n}")));
        }
        self.inner.insert_card(card)
    }

    fn insert_transactions(&self, txns: &[NewTransaction]) -> Result<usize> {
        let n = {
            let mut sizes = self.batch_sizes.borrow_mut();
            sizes.push(txns.len());
            sizes.len()
        };
        if self.fail_batch_at == Some(n) {
            return Err(AlphaError::Other(format!("simulated failure on batch {n}")));
        }
        self.inner.insert_transactions(txns)
    }

    fn cards_for_user(&self, user: &Identity) -> Result<Vec<Card>> {
        self.inner.cards_for_user(user)
    }

    fn transactions_for_user(&self, user: &Identity) -> Result<Vec<Transaction>> {
        self.inner.transactions_for_user(user)
    }

    fn transactions_for_card(&self, user: &Identity, card_id: &str) -> Result<Vec<Transaction>> {
        self.inner.transactions_for_card(user, card_id)
    }
}
