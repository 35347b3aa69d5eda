use crate::auth::{current_identity, login as sign_in_and_record, logout as clear_session};
use crate::error::Result;
use crate::settings::{load_settings, save_settings};

use super::open_db;

pub fn login(email: &str) -> Result<()> {
    let mut settings = load_settings();
    let conn = open_db(&settings)?;
    let identity = sign_in_and_record(&conn, &mut settings, email)?;
    save_settings(&settings)?;
    println!("Signed in as {}", identity.email);
    Ok(())
}

pub fn logout() -> Result<()> {
    let mut settings = load_settings();
    if clear_session(&mut settings) {
        save_settings(&settings)?;
        println!("Signed out.");
    } else {
        println!("Not signed in.");
    }
    Ok(())
}

pub fn whoami() -> Result<()> {
    let settings = load_settings();
    let conn = open_db(&settings)?;
    match current_identity(&conn, &settings)? {
        Some(identity) => println!("{} ({})", identity.email, identity.user_id),
        None => println!("Not signed in."),
    }
    Ok(())
}
