use std::collections::HashMap;
use std::sync::OnceLock;

use regex::Regex;
use tracing::{info, warn};

use crate::auth::{require_identity, Identity};
use crate::error::{AlphaError, Result};
use crate::models::{NewCard, NewTransaction, RewardsType};
use crate::notify::{Notice, Notifier};
use crate::store::Store;
use crate::tabular::{self, Row};

pub const TRANSACTION_BATCH_SIZE: usize = 50;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn float_prefix() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^[+-]?(?:Infinity|(?:\d+\.?\d*|\.\d+)(?:[eE][+-]?\d+)?)")
            .expect("float prefix pattern is valid")
    })
}

/// Lenient float parsing for import sources: leading whitespace is skipped,
/// the longest numeric prefix is used ("12.5abc" is 12.5) and anything
/// without one, including a missing field, is NaN.
pub fn parse_float(raw: Option<&str>) -> f64 {
    let Some(raw) = raw else { return f64::NAN };
    let s = raw.trim_start();
    float_prefix()
        .find(s)
        .and_then(|m| m.as_str().parse().ok())
        .unwrap_or(f64::NAN)
}

/// Build a card payload from one source row. Numeric fields are not
/// validated; a row missing a required text column is rejected.
fn card_from_row(user: &Identity, row: &Row) -> Result<NewCard> {
    let name = row
        .non_empty("nickname")
        .or_else(|| row.get("product_name"))
        .ok_or_else(|| AlphaError::Validation("card row has no nickname or product_name".into()))?;
    let last_four = row
        .get("mask")
        .ok_or_else(|| AlphaError::Validation("card row has no mask".into()))?;
    let network = row
        .get("network")
        .ok_or_else(|| AlphaError::Validation("card row has no network".into()))?;

    Ok(NewCard {
        user_id: user.user_id.clone(),
        name: name.to_string(),
        network: network.to_string(),
        last_four: last_four.to_string(),
        balance: parse_float(row.get("current_balance")),
        credit_limit: parse_float(row.get("credit_limit")),
        apr: parse_float(row.get("apr")),
        annual_fee: parse_float(row.get("annual_fee")),
        cashback: 0.0,
        pending_dues: parse_float(row.get("statement_balance")),
        due_date: row.non_empty("next_payment_due_date").map(str::to_string),
        rewards_type: RewardsType::infer_from_summary(row.get("rewards_summary")),
        is_primary: false,
    })
}

fn transaction_from_row(user: &Identity, card_id: &str, row: &Row) -> NewTransaction {
    NewTransaction {
        user_id: user.user_id.clone(),
        card_id: card_id.to_string(),
        merchant_name: row.get("merchant_name").map(str::to_string),
        amount: parse_float(row.get("amount")),
        category: row.get("category").map(str::to_string),
        transaction_date: row.non_empty("date").map(str::to_string),
        rewards_earned: 0.0,
    }
}

fn account_id(row: &Row) -> &str {
    row.get("account_id").unwrap_or_default()
}

// ---------------------------------------------------------------------------
// Orchestrator
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImportState {
    Idle,
    Importing,
    Completed,
    Failed,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImportReport {
    /// Distinct external account ids mapped to a new card.
    pub cards_imported: usize,
    pub transactions_imported: usize,
    pub card_rows_failed: usize,
    pub batches_failed: usize,
    /// External ids referenced by transactions but never mapped, first-seen order.
    pub skipped_account_ids: Vec<String>,
    pub transactions_skipped: usize,
}

/// Loads a card table and a transaction table into a [`Store`].
///
/// Cards are inserted one at a time so the external-to-internal id mapping
/// is complete before any transaction is considered. Transactions go in
/// fixed-size batches; rows whose account id did not map are dropped. Work
/// already written is never rolled back.
pub struct Importer<'a, S: Store, N: Notifier> {
    store: &'a S,
    notifier: &'a N,
    batch_size: usize,
    state: ImportState,
}

impl<'a, S: Store, N: Notifier> Importer<'a, S, N> {
    pub fn new(store: &'a S, notifier: &'a N) -> Self {
        Self {
            store,
            notifier,
            batch_size: TRANSACTION_BATCH_SIZE,
            state: ImportState::Idle,
        }
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    pub fn state(&self) -> ImportState {
        self.state
    }

    /// Run one import. `on_complete` is called with the final report once
    /// both tables are processed; an error from it fails the run.
    pub fn run<F>(
        &mut self,
        identity: Option<&Identity>,
        cards_text: &str,
        transactions_text: &str,
        on_complete: F,
    ) -> Result<ImportReport>
    where
        F: FnOnce(&ImportReport) -> Result<()>,
    {
        let user = match require_identity(identity) {
            Ok(user) => user,
            Err(e) => {
                self.notifier
                    .notify(Notice::error("Error", "You must be logged in to import data"));
                return Err(e);
            }
        };

        self.state = ImportState::Importing;
        match self.import(user, cards_text, transactions_text, on_complete) {
            Ok(report) => {
                self.state = ImportState::Completed;
                Ok(report)
            }
            Err(e) => {
                warn!(error = %e, "import aborted");
                self.state = ImportState::Failed;
                self.notifier.notify(Notice::error("Import Failed", e.to_string()));
                Err(e)
            }
        }
    }

    fn import<F>(
        &self,
        user: &Identity,
        cards_text: &str,
        transactions_text: &str,
        on_complete: F,
    ) -> Result<ImportReport>
    where
        F: FnOnce(&ImportReport) -> Result<()>,
    {
        let card_rows = tabular::parse(cards_text);
        let txn_rows = tabular::parse(transactions_text);
        let mut report = ImportReport::default();

        let mapping = self.import_cards(user, &card_rows, &mut report);
        report.cards_imported = mapping.len();
        self.notifier.notify(Notice::info(
            "Cards Imported!",
            format!("Imported {} cards successfully!", report.cards_imported),
        ));

        self.import_transactions(user, &txn_rows, &mapping, &mut report);

        info!(
            cards = report.cards_imported,
            transactions = report.transactions_imported,
            failed_cards = report.card_rows_failed,
            failed_batches = report.batches_failed,
            "import finished"
        );
        self.notifier.notify(Notice::info(
            "Import Complete!",
            format!(
                "Imported {} cards and {} transactions.",
                report.cards_imported, report.transactions_imported
            ),
        ));

        on_complete(&report)?;
        Ok(report)
    }

    fn import_cards(
        &self,
        user: &Identity,
        rows: &[Row],
        report: &mut ImportReport,
    ) -> HashMap<String, String> {
        let mut mapping = HashMap::new();
        for (i, row) in rows.iter().enumerate() {
            let inserted = card_from_row(user, row).and_then(|card| self.store.insert_card(&card));
            match inserted {
                Ok(card_id) => {
                    mapping.insert(account_id(row).to_string(), card_id);
                }
                Err(e) => {
                    warn!(row = i + 1, account_id = account_id(row), error = %e, "card insert failed; skipping row");
                    report.card_rows_failed += 1;
                }
            }
        }
        mapping
    }

    fn import_transactions(
        &self,
        user: &Identity,
        rows: &[Row],
        mapping: &HashMap<String, String>,
        report: &mut ImportReport,
    ) {
        for (n, chunk) in rows.chunks(self.batch_size).enumerate() {
            let mut batch = Vec::with_capacity(chunk.len());
            for row in chunk {
                let external = account_id(row);
                match mapping.get(external) {
                    Some(card_id) => batch.push(transaction_from_row(user, card_id, row)),
                    None => {
                        report.transactions_skipped += 1;
                        if !report.skipped_account_ids.iter().any(|id| id == external) {
                            report.skipped_account_ids.push(external.to_string());
                        }
                    }
                }
            }
            if batch.is_empty() {
                continue;
            }
            match self.store.insert_transactions(&batch) {
                Ok(count) => report.transactions_imported += count,
                Err(e) => {
                    warn!(batch = n + 1, rows = batch.len(), error = %e, "transaction batch failed; skipping");
                    report.batches_failed += 1;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::insights::{category_spend, load_insights};
    use crate::store::SqliteStore;
    use crate::testutil::{test_db, test_user, FlakyStore, RecordingNotifier};

    const CARD_HEADER: &str = "account_id,nickname,product_name,mask,network,credit_limit,current_balance,apr,annual_fee,rewards_summary,next_payment_due_date,statement_balance";
    const TXN_HEADER: &str = "account_id,merchant_name,amount,category,date";

    fn cards_csv(n: usize) -> String {
        let mut out = String::from(CARD_HEADER);
        for i in 1..=n {
            out.push_str(&format!(
                "\nacc_{i:03},,Card {i},{:04},Visa,5000,1200.50,19.99,95,2% cashback,2025-07-01,300",
                1000 + i
            ));
        }
        out
    }

    fn txns_csv(n: usize, accounts: usize) -> String {
        let mut out = String::from(TXN_HEADER);
        for i in 0..n {
            out.push_str(&format!(
                "\nacc_{:03},Merchant {i},10.00,Dining,2025-06-{:02}",
                i % accounts + 1,
                i % 28 + 1
            ));
        }
        out
    }

    #[test]
    fn test_parse_float_prefix_semantics() {
        assert_eq!(parse_float(Some("12.5")), 12.5);
        assert_eq!(parse_float(Some("  -3")), -3.0);
        assert_eq!(parse_float(Some("12.5abc")), 12.5);
        assert_eq!(parse_float(Some(".5")), 0.5);
        assert_eq!(parse_float(Some("1e3")), 1000.0);
        assert_eq!(parse_float(Some("Infinity")), f64::INFINITY);
        assert!(parse_float(Some("abc")).is_nan());
        assert!(parse_float(Some("")).is_nan());
        assert!(parse_float(Some("$12")).is_nan());
        assert!(parse_float(None).is_nan());
    }

    #[test]
    fn test_card_row_mapping() {
        let user = Identity {
            user_id: "u1".into(),
            email: "a@b.co".into(),
        };
        let rows = tabular::parse(&format!(
            "{CARD_HEADER}\nacc_1,Daily,Freedom,4242,Visa,n/a,100,,0,3x miles,,45.5"
        ));
        let card = card_from_row(&user, &rows[0]).unwrap();
        assert_eq!(card.name, "Daily");
        assert_eq!(card.last_four, "4242");
        assert_eq!(card.network, "Visa");
        assert!(card.credit_limit.is_nan());
        assert!(card.apr.is_nan());
        assert_eq!(card.balance, 100.0);
        assert_eq!(card.pending_dues, 45.5);
        assert_eq!(card.rewards_type, RewardsType::Miles);
        assert_eq!(card.due_date, None);
        assert!(!card.is_primary);

        let rows = tabular::parse(&format!("{CARD_HEADER}\nacc_2,,Sapphire,12,Visa"));
        let card = card_from_row(&user, &rows[0]).unwrap();
        assert_eq!(card.name, "Sapphire");
        assert_eq!(card.last_four, "12");
        assert_eq!(card.rewards_type, RewardsType::Points);
    }

    #[test]
    fn test_card_row_without_mask_is_rejected() {
        let user = Identity {
            user_id: "u1".into(),
            email: "a@b.co".into(),
        };
        let rows = tabular::parse(&format!("{CARD_HEADER}\nacc_1,Daily,Freedom"));
        assert!(card_from_row(&user, &rows[0]).is_err());
    }

    #[test]
    fn test_failed_card_row_is_skipped_and_rest_attempted() {
        let (_dir, conn) = test_db();
        let user = test_user(&conn);
        let inner = SqliteStore::new(&conn);
        let store = FlakyStore::new(&inner).fail_card_call(7);
        let notifier = RecordingNotifier::default();

        let mut importer = Importer::new(&store, &notifier);
        let report = importer
            .run(Some(&user), &cards_csv(20), &txns_csv(40, 20), |_| Ok(()))
            .unwrap();

        assert_eq!(store.card_calls(), 20);
        assert_eq!(report.cards_imported, 19);
        assert_eq!(report.card_rows_failed, 1);
        assert_eq!(report.skipped_account_ids, vec!["acc_007".to_string()]);
        assert_eq!(report.transactions_skipped, 2);
        assert_eq!(report.transactions_imported, 38);
        assert_eq!(inner.cards_for_user(&user).unwrap().len(), 19);
        assert_eq!(importer.state(), ImportState::Completed);
        assert_eq!(
            notifier.titles(),
            vec!["Cards Imported!".to_string(), "Import Complete!".to_string()]
        );
        assert_eq!(notifier.notices()[0].description, "Imported 19 cards successfully!");
    }

    #[test]
    fn test_transactions_go_in_batches_of_fifty() {
        let (_dir, conn) = test_db();
        let user = test_user(&conn);
        let inner = SqliteStore::new(&conn);
        let store = FlakyStore::new(&inner);
        let notifier = RecordingNotifier::default();

        let report = Importer::new(&store, &notifier)
            .run(Some(&user), &cards_csv(4), &txns_csv(120, 4), |_| Ok(()))
            .unwrap();

        assert_eq!(store.batch_sizes(), vec![50, 50, 20]);
        assert_eq!(report.transactions_imported, 120);
    }

    #[test]
    fn test_unmapped_account_ids_are_excluded_from_batch_and_count() {
        let (_dir, conn) = test_db();
        let user = test_user(&conn);
        let inner = SqliteStore::new(&conn);
        let store = FlakyStore::new(&inner);
        let notifier = RecordingNotifier::default();

        let txns = format!(
            "{TXN_HEADER}\nacc_001,Cafe,4.50,Dining,2025-06-01\nacc_999,Ghost,10,Gas,2025-06-02\nacc_002,Shell,40,Gas,2025-06-03"
        );
        let report = Importer::new(&store, &notifier)
            .run(Some(&user), &cards_csv(2), &txns, |_| Ok(()))
            .unwrap();

        assert_eq!(store.batch_sizes(), vec![2]);
        assert_eq!(report.transactions_imported, 2);
        assert_eq!(report.skipped_account_ids, vec!["acc_999".to_string()]);
        let stored = inner.transactions_for_user(&user).unwrap();
        assert!(stored.iter().all(|t| t.merchant_name != "Ghost"));
    }

    #[test]
    fn test_failed_batch_is_not_counted_and_later_batches_proceed() {
        let (_dir, conn) = test_db();
        let user = test_user(&conn);
        let inner = SqliteStore::new(&conn);
        let store = FlakyStore::new(&inner).fail_batch_call(2);
        let notifier = RecordingNotifier::default();

        let report = Importer::new(&store, &notifier)
            .run(Some(&user), &cards_csv(4), &txns_csv(120, 4), |_| Ok(()))
            .unwrap();

        assert_eq!(store.batch_sizes(), vec![50, 50, 20]);
        assert_eq!(report.batches_failed, 1);
        assert_eq!(report.transactions_imported, 70);
        assert_eq!(inner.transactions_for_user(&user).unwrap().len(), 70);
    }

    #[test]
    fn test_reimport_duplicates_cards_and_transactions() {
        let (_dir, conn) = test_db();
        let user = test_user(&conn);
        let store = SqliteStore::new(&conn);
        let notifier = RecordingNotifier::default();
        let cards = cards_csv(3);
        let txns = txns_csv(10, 3);

        for _ in 0..2 {
            Importer::new(&store, &notifier)
                .run(Some(&user), &cards, &txns, |_| Ok(()))
                .unwrap();
        }
        assert_eq!(store.cards_for_user(&user).unwrap().len(), 6);
        assert_eq!(store.transactions_for_user(&user).unwrap().len(), 20);
    }

    #[test]
    fn test_missing_identity_aborts_before_writes() {
        let (_dir, conn) = test_db();
        let user = test_user(&conn);
        let inner = SqliteStore::new(&conn);
        let store = FlakyStore::new(&inner);
        let notifier = RecordingNotifier::default();

        let mut importer = Importer::new(&store, &notifier);
        let err = importer
            .run(None, &cards_csv(3), &txns_csv(5, 3), |_| Ok(()))
            .unwrap_err();

        assert!(matches!(err, AlphaError::NotAuthenticated));
        assert_eq!(store.card_calls(), 0);
        assert!(store.batch_sizes().is_empty());
        assert!(inner.cards_for_user(&user).unwrap().is_empty());
        assert_eq!(importer.state(), ImportState::Idle);
        assert_eq!(notifier.titles(), vec!["Error".to_string()]);
    }

    #[test]
    fn test_completion_error_fails_run_without_rollback() {
        let (_dir, conn) = test_db();
        let user = test_user(&conn);
        let store = SqliteStore::new(&conn);
        let notifier = RecordingNotifier::default();

        let mut importer = Importer::new(&store, &notifier);
        let result = importer.run(Some(&user), &cards_csv(2), &txns_csv(4, 2), |_| {
            Err(AlphaError::Other("refresh failed".into()))
        });

        assert!(result.is_err());
        assert_eq!(importer.state(), ImportState::Failed);
        assert_eq!(notifier.titles().last().map(String::as_str), Some("Import Failed"));
        assert_eq!(store.cards_for_user(&user).unwrap().len(), 2);
        assert_eq!(store.transactions_for_user(&user).unwrap().len(), 4);
    }

    #[test]
    fn test_completion_callback_sees_final_report() {
        let (_dir, conn) = test_db();
        let user = test_user(&conn);
        let store = SqliteStore::new(&conn);
        let notifier = RecordingNotifier::default();

        let mut seen = None;
        let report = Importer::new(&store, &notifier)
            .run(Some(&user), &cards_csv(2), &txns_csv(3, 2), |r| {
                seen = Some(r.clone());
                Ok(())
            })
            .unwrap();
        assert_eq!(seen, Some(report));
    }

    #[test]
    fn test_import_then_aggregate_matches_direct_sums() {
        let (_dir, conn) = test_db();
        let user = test_user(&conn);
        let store = SqliteStore::new(&conn);
        let notifier = RecordingNotifier::default();

        let fixtures: &[(&str, &str, f64, &str)] = &[
            ("acc_001", "Bistro", 10.0, "Dining"),
            ("acc_001", "Shell", 15.0, "Gas"),
            ("acc_002", "Noodles", 20.0, "Dining"),
            ("acc_002", "Chevron", 25.0, "Gas"),
            ("acc_002", "Diner", 30.0, "Dining"),
            ("acc_001", "Kroger", 12.25, "Groceries"),
        ];
        let mut txns = String::from(TXN_HEADER);
        for (acc, merchant, amount, category) in fixtures {
            txns.push_str(&format!("\n{acc},{merchant},{amount:.2},{category},2025-06-10"));
        }
        Importer::new(&store, &notifier)
            .run(Some(&user), &cards_csv(2), &txns, |_| Ok(()))
            .unwrap();

        let by_category = category_spend(&store.transactions_for_user(&user).unwrap());
        for (category, expected) in [("Dining", 60.0), ("Gas", 40.0), ("Groceries", 12.25)] {
            let found = by_category.iter().find(|c| c.category == category).unwrap();
            assert!((found.total - expected).abs() < 1e-9);
        }

        let insights = load_insights(&store, &user).unwrap();
        let totals: Vec<(String, f64)> = insights
            .cards
            .iter()
            .map(|c| (c.last_four.clone(), c.total))
            .collect();
        assert!(totals.contains(&("1001".to_string(), 37.25)));
        assert!(totals.contains(&("1002".to_string(), 75.0)));
    }
}
