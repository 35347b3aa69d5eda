use std::path::Path;

use rusqlite::Connection;

use crate::error::Result;

pub const DB_FILE: &str = "alphacard.db";

pub const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS profiles (
    id TEXT PRIMARY KEY,
    email TEXT NOT NULL UNIQUE,
    full_name TEXT,
    date_of_birth TEXT,
    phone_number TEXT,
    address_line1 TEXT,
    address_line2 TEXT,
    city TEXT,
    state TEXT,
    zip_code TEXT,
    created_at TEXT DEFAULT (datetime('now')),
    updated_at TEXT
);

CREATE TABLE IF NOT EXISTS verification_status (
    user_id TEXT PRIMARY KEY,
    profile_completed INTEGER DEFAULT 0,
    ssn_verified INTEGER DEFAULT 0,
    id_verified INTEGER DEFAULT 0,
    verification_level TEXT DEFAULT 'unverified',
    updated_at TEXT,
    FOREIGN KEY (user_id) REFERENCES profiles(id) ON DELETE CASCADE
);

CREATE TABLE IF NOT EXISTS cards (
    id TEXT PRIMARY KEY,
    user_id TEXT NOT NULL,
    card_name TEXT NOT NULL,
    card_type TEXT NOT NULL,
    last_four TEXT NOT NULL,
    balance REAL,
    credit_limit REAL,
    apr REAL,
    annual_fee REAL,
    cashback REAL DEFAULT 0,
    pending_dues REAL,
    due_date TEXT,
    rewards_type TEXT DEFAULT 'cashback',
    is_primary INTEGER DEFAULT 0,
    created_at TEXT DEFAULT (strftime('%Y-%m-%d %H:%M:%f', 'now')),
    FOREIGN KEY (user_id) REFERENCES profiles(id)
);

CREATE TABLE IF NOT EXISTS transactions (
    id TEXT PRIMARY KEY,
    user_id TEXT NOT NULL,
    card_id TEXT NOT NULL,
    merchant_name TEXT NOT NULL,
    amount REAL,
    category TEXT NOT NULL,
    transaction_date TEXT NOT NULL,
    rewards_earned REAL DEFAULT 0,
    created_at TEXT DEFAULT (datetime('now')),
    FOREIGN KEY (user_id) REFERENCES profiles(id),
    FOREIGN KEY (card_id) REFERENCES cards(id) ON DELETE CASCADE
);

CREATE INDEX IF NOT EXISTS idx_transactions_user ON transactions(user_id);
CREATE INDEX IF NOT EXISTS idx_transactions_card ON transactions(card_id);

CREATE TABLE IF NOT EXISTS documents (
    id TEXT PRIMARY KEY,
    user_id TEXT NOT NULL,
    kind TEXT NOT NULL,
    original_name TEXT NOT NULL,
    stored_path TEXT NOT NULL,
    size_bytes INTEGER NOT NULL,
    checksum TEXT NOT NULL,
    status TEXT DEFAULT 'pending',
    uploaded_at TEXT DEFAULT (datetime('now')),
    FOREIGN KEY (user_id) REFERENCES profiles(id)
);
";

pub fn get_connection(db_path: &Path) -> Result<Connection> {
    let conn = Connection::open(db_path)?;
    conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA foreign_keys=ON;")?;
    Ok(conn)
}

pub fn init_db(conn: &Connection) -> Result<()> {
    conn.execute_batch(SCHEMA)?;
    Ok(())
}

/// SQLite has no NaN; non-finite values are bound as NULL.
pub(crate) fn real(val: f64) -> Option<f64> {
    val.is_finite().then_some(val)
}

/// Inverse of [`real`]: NULL reads back as NaN.
pub(crate) fn real_or_nan(val: Option<f64>) -> f64 {
    val.unwrap_or(f64::NAN)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_db() -> (tempfile::TempDir, Connection) {
        let dir = tempfile::tempdir().unwrap();
        let conn = get_connection(&dir.path().join("test.db")).unwrap();
        init_db(&conn).unwrap();
        (dir, conn)
    }

    #[test]
    fn test_init_db_creates_tables() {
        let (_dir, conn) = test_db();
        let tables: Vec<String> = conn
            .prepare("SELECT name FROM sqlite_master WHERE type='table' AND name NOT LIKE 'sqlite_%'")
            .unwrap()
            .query_map([], |row| row.get(0))
            .unwrap()
            .collect::<std::result::Result<Vec<_>, _>>()
            .unwrap();
        for expected in &["profiles", "verification_status", "cards", "transactions", "documents"] {
            assert!(tables.contains(&expected.to_string()), "missing table: {expected}");
        }
    }

    #[test]
    fn test_init_db_is_idempotent() {
        let (_dir, conn) = test_db();
        init_db(&conn).unwrap();
    }

    #[test]
    fn test_deleting_card_cascades_to_transactions() {
        let (_dir, conn) = test_db();
        conn.execute("INSERT INTO profiles (id, email) VALUES ('u1', 'a@b.co')", []).unwrap();
        conn.execute(
            "INSERT INTO cards (id, user_id, card_name, card_type, last_four) VALUES ('c1', 'u1', 'Gold', 'Visa', '1234')",
            [],
        )
        .unwrap();
        conn.execute(
            "INSERT INTO transactions (id, user_id, card_id, merchant_name, amount, category, transaction_date) \
             VALUES ('t1', 'u1', 'c1', 'Cafe', 4.5, 'Dining', '2025-01-15')",
            [],
        )
        .unwrap();
        conn.execute("DELETE FROM cards WHERE id = 'c1'", []).unwrap();
        let count: i64 = conn.query_row("SELECT count(*) FROM transactions", [], |r| r.get(0)).unwrap();
        assert_eq!(count, 0);
    }

    #[test]
    fn test_nan_round_trips_through_null() {
        assert_eq!(real(f64::NAN), None);
        assert_eq!(real(12.5), Some(12.5));
        assert!(real_or_nan(None).is_nan());
        assert_eq!(real_or_nan(Some(3.0)), 3.0);
    }
}
