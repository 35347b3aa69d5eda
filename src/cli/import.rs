use crate::error::{AlphaError, Result};
use crate::importer::Importer;
use crate::notify::ConsoleNotifier;
use crate::settings::load_settings;
use crate::store::SqliteStore;

use super::{demo, open_db};

pub fn run(
    use_demo: bool,
    cards: Option<&str>,
    transactions: Option<&str>,
    batch_size: usize,
) -> Result<()> {
    let (cards_text, txns_text) = match (use_demo, cards, transactions) {
        (true, _, _) => demo::generate(demo::DEMO_SEED),
        (false, Some(c), Some(t)) => (std::fs::read_to_string(c)?, std::fs::read_to_string(t)?),
        _ => {
            return Err(AlphaError::Other(
                "Pass --demo, or both --cards and --transactions.".to_string(),
            ))
        }
    };

    let settings = load_settings();
    let conn = open_db(&settings)?;
    let identity = crate::auth::current_identity(&conn, &settings)?;
    let store = SqliteStore::new(&conn);
    let notifier = ConsoleNotifier;

    let mut importer = Importer::new(&store, &notifier).with_batch_size(batch_size);
    let report = importer.run(identity.as_ref(), &cards_text, &txns_text, |report| {
        if report.card_rows_failed > 0 || report.batches_failed > 0 {
            println!(
                "  {} card rows failed, {} transaction batches failed",
                report.card_rows_failed, report.batches_failed
            );
        }
        if !report.skipped_account_ids.is_empty() {
            println!(
                "  {} transactions skipped (unknown accounts: {})",
                report.transactions_skipped,
                report.skipped_account_ids.join(", ")
            );
        }
        Ok(())
    })?;

    if report.cards_imported > 0 {
        println!();
        println!("Try these next:");
        println!("  alphacard cards list");
        println!("  alphacard insights");
        println!("  alphacard summary");
    }
    Ok(())
}
