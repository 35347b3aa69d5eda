use crate::auth::current_identity;
use crate::db::get_connection;
use crate::error::Result;
use crate::settings::{load_settings, AI_KEY_ENV};

fn format_bytes(size: u64) -> String {
    match size {
        s if s >= 1024 * 1024 => format!("{:.1} MB", s as f64 / (1024.0 * 1024.0)),
        s if s >= 1024 => format!("{:.1} KB", s as f64 / 1024.0),
        s => format!("{s} B"),
    }
}

pub fn run() -> Result<()> {
    let settings = load_settings();
    let db_path = settings.db_path();

    println!("Data dir:   {}", settings.data_dir);
    println!("Database:   {}", db_path.display());
    println!(
        "AI key:     {}",
        if std::env::var(AI_KEY_ENV).is_ok() { "set" } else { "(not set)" }
    );

    if db_path.exists() {
        let size = std::fs::metadata(&db_path)?.len();
        println!("DB size:    {}", format_bytes(size));

        let conn = get_connection(&db_path)?;
        match current_identity(&conn, &settings)? {
            Some(identity) => {
                println!("User:       {}", identity.email);
                let cards: i64 = conn.query_row(
                    "SELECT count(*) FROM cards WHERE user_id = ?1",
                    [&identity.user_id],
                    |r| r.get(0),
                )?;
                let transactions: i64 = conn.query_row(
                    "SELECT count(*) FROM transactions WHERE user_id = ?1",
                    [&identity.user_id],
                    |r| r.get(0),
                )?;
                println!();
                println!("Cards:         {cards}");
                println!("Transactions:  {transactions}");
            }
            None => println!("User:       (not signed in)"),
        }
    } else {
        println!();
        println!("Database not found. Run `alphacard init` to set up.");
    }

    Ok(())
}
