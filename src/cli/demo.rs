//! Sample source tables for `alphacard import --demo`.

use chrono::{Duration, Local, NaiveDate};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

pub const DEMO_SEED: u64 = 20;
pub const DEMO_CARDS: usize = 20;
pub const DEMO_TRANSACTIONS: usize = 500;

pub const CARD_COLUMNS: &str = "account_id,nickname,product_name,mask,network,credit_limit,current_balance,apr,annual_fee,rewards_summary,next_payment_due_date,statement_balance";
pub const TRANSACTION_COLUMNS: &str = "account_id,merchant_name,amount,category,date";

struct DemoProduct {
    product: &'static str,
    network: &'static str,
    annual_fee: f64,
    rewards: &'static str,
}

const PRODUCTS: &[DemoProduct] = &[
    DemoProduct { product: "Sapphire Preferred", network: "Visa", annual_fee: 95.0, rewards: "3x points on dining and travel" },
    DemoProduct { product: "Freedom Unlimited", network: "Visa", annual_fee: 0.0, rewards: "1.5% cashback on everything" },
    DemoProduct { product: "Venture X", network: "Visa", annual_fee: 395.0, rewards: "2x miles on every purchase" },
    DemoProduct { product: "Gold Card", network: "Amex", annual_fee: 250.0, rewards: "4x points at restaurants" },
    DemoProduct { product: "Blue Cash Everyday", network: "Amex", annual_fee: 0.0, rewards: "3% cashback at supermarkets" },
    DemoProduct { product: "Discover it", network: "Discover", annual_fee: 0.0, rewards: "5% cashback in rotating categories" },
    DemoProduct { product: "Double Cash", network: "Mastercard", annual_fee: 0.0, rewards: "2% cashback when you pay" },
    DemoProduct { product: "SkyMiles Platinum", network: "Amex", annual_fee: 350.0, rewards: "3x miles on flights" },
    DemoProduct { product: "Custom Cash", network: "Mastercard", annual_fee: 0.0, rewards: "5% cashback in top category" },
    DemoProduct { product: "Active Cash", network: "Visa", annual_fee: 0.0, rewards: "2% cashback on purchases" },
];

const NICKNAMES: &[&str] = &["Daily Driver", "Travel", "Groceries", "Backup", "Gas Card"];

const MERCHANTS: &[(&str, &[&str])] = &[
    ("Dining", &["Chipotle", "Olive Garden", "Starbucks", "Shake Shack", "Local Bistro"]),
    ("Groceries", &["Whole Foods", "Trader Joes", "Kroger", "Safeway"]),
    ("Travel", &["Delta Air Lines", "Marriott", "Uber", "Airbnb"]),
    ("Gas", &["Shell", "Chevron", "ExxonMobil"]),
    ("Entertainment", &["Netflix", "AMC Theatres", "Spotify", "Ticketmaster"]),
    ("Shopping", &["Amazon", "Target", "Best Buy", "Nordstrom"]),
    ("Utilities", &["PG&E", "Comcast", "Verizon"]),
    ("Healthcare", &["CVS Pharmacy", "Walgreens", "City Dental"]),
    ("Other", &["USPS", "Etsy", "Petco"]),
];

fn cents(val: f64) -> f64 {
    (val * 100.0).round() / 100.0
}

/// The card table: `acc_001`..`acc_020` with realistic limits and balances.
/// Due dates fall in the next four weeks from `today`.
pub fn cards_csv(rng: &mut StdRng, today: NaiveDate) -> String {
    let mut out = String::from(CARD_COLUMNS);
    for i in 1..=DEMO_CARDS {
        let product = &PRODUCTS[(i - 1) % PRODUCTS.len()];
        let nickname = if rng.gen_bool(0.3) {
            NICKNAMES[rng.gen_range(0..NICKNAMES.len())]
        } else {
            ""
        };
        let limit = f64::from(rng.gen_range(2..=30u32)) * 1000.0;
        let balance = cents(limit * rng.gen_range(0.02..0.85));
        let statement = cents(balance * rng.gen_range(0.3..1.0));
        let apr = cents(rng.gen_range(15.0..29.99));
        let due = today + Duration::days(rng.gen_range(0..28));
        out.push_str(&format!(
            "\nacc_{i:03},{nickname},{},{:04},{},{limit:.2},{balance:.2},{apr:.2},{:.2},{},{},{statement:.2}",
            product.product,
            rng.gen_range(0..10_000u32),
            product.network,
            product.annual_fee,
            product.rewards,
            due.format("%Y-%m-%d"),
        ));
    }
    out
}

/// The transaction table: spread over the last 90 days, every row pointing
/// at one of the demo cards.
pub fn transactions_csv(rng: &mut StdRng, today: NaiveDate) -> String {
    let mut out = String::from(TRANSACTION_COLUMNS);
    for _ in 0..DEMO_TRANSACTIONS {
        let account = rng.gen_range(1..=DEMO_CARDS);
        let (category, merchants) = MERCHANTS[rng.gen_range(0..MERCHANTS.len())];
        let merchant = merchants[rng.gen_range(0..merchants.len())];
        let amount = cents(rng.gen_range(3.5..420.0));
        let date = today - Duration::days(rng.gen_range(0..90));
        out.push_str(&format!(
            "\nacc_{account:03},{merchant},{amount:.2},{category},{}",
            date.format("%Y-%m-%d")
        ));
    }
    out
}

/// Both tables from one seeded generator, relative to today.
pub fn generate(seed: u64) -> (String, String) {
    let today = Local::now().date_naive();
    let mut rng = StdRng::seed_from_u64(seed);
    let cards = cards_csv(&mut rng, today);
    let txns = transactions_csv(&mut rng, today);
    (cards, txns)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::SUGGESTED_CATEGORIES;
    use crate::tabular;

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, 10).unwrap()
    }

    #[test]
    fn test_card_table_shape() {
        let mut rng = StdRng::seed_from_u64(DEMO_SEED);
        let rows = tabular::parse(&cards_csv(&mut rng, day()));
        assert_eq!(rows.len(), DEMO_CARDS);
        assert_eq!(rows[0].get("account_id"), Some("acc_001"));
        assert_eq!(rows[19].get("account_id"), Some("acc_020"));
        for row in &rows {
            assert_eq!(row.len(), CARD_COLUMNS.split(',').count());
            assert_eq!(row.get("mask").map(str::len), Some(4));
            assert!(row.get("credit_limit").unwrap().parse::<f64>().is_ok());
            let due = NaiveDate::parse_from_str(row.get("next_payment_due_date").unwrap(), "%Y-%m-%d").unwrap();
            assert!(due >= day() && due < day() + Duration::days(28));
        }
    }

    #[test]
    fn test_transaction_table_shape() {
        let mut rng = StdRng::seed_from_u64(DEMO_SEED);
        let rows = tabular::parse(&transactions_csv(&mut rng, day()));
        assert_eq!(rows.len(), DEMO_TRANSACTIONS);
        for row in &rows {
            assert!(SUGGESTED_CATEGORIES.contains(&row.get("category").unwrap()));
            let n: usize = row.get("account_id").unwrap()[4..].parse().unwrap();
            assert!((1..=DEMO_CARDS).contains(&n));
            assert!(row.get("amount").unwrap().parse::<f64>().unwrap() > 0.0);
        }
    }

    #[test]
    fn test_same_seed_same_tables() {
        let mut a = StdRng::seed_from_u64(7);
        let mut b = StdRng::seed_from_u64(7);
        assert_eq!(cards_csv(&mut a, day()), cards_csv(&mut b, day()));
        assert_eq!(transactions_csv(&mut a, day()), transactions_csv(&mut b, day()));
    }

    #[test]
    fn test_no_field_contains_a_comma() {
        let (cards, txns) = generate(DEMO_SEED);
        let card_cols = CARD_COLUMNS.split(',').count();
        assert!(cards.lines().all(|l| l.split(',').count() == card_cols));
        assert!(txns.lines().all(|l| l.split(',').count() == 5));
    }
}
