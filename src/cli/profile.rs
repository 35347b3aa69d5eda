use colored::Colorize;

use crate::documents::list_documents;
use crate::error::Result;
use crate::models::VerificationLevel;
use crate::profile::{load_profile, save_profile, verification_status, ProfileForm};
use crate::settings::load_settings;

use super::{open_db, signed_in};

fn check(done: bool) -> colored::ColoredString {
    if done {
        "done".green()
    } else {
        "pending".yellow()
    }
}

pub fn set(form: ProfileForm) -> Result<()> {
    let settings = load_settings();
    let conn = open_db(&settings)?;
    let user = signed_in(&conn, &settings)?;
    let status = save_profile(&conn, &user, &form)?;
    println!("Profile saved. Verification level: {}", status.level.as_str());
    Ok(())
}

pub fn show() -> Result<()> {
    let settings = load_settings();
    let conn = open_db(&settings)?;
    let user = signed_in(&conn, &settings)?;
    let profile = load_profile(&conn, &user)?;
    let status = verification_status(&conn, &user)?;

    let field = |v: &Option<String>| v.clone().unwrap_or_else(|| "(not set)".to_string());
    println!("Email:      {}", profile.email);
    println!("Name:       {}", field(&profile.full_name));
    println!("Born:       {}", field(&profile.date_of_birth));
    println!("Phone:      {}", field(&profile.phone_number));
    println!("Address:    {}", field(&profile.address_line1));
    if let Some(line2) = &profile.address_line2 {
        println!("            {line2}");
    }
    println!(
        "            {}, {} {}",
        field(&profile.city),
        field(&profile.state),
        field(&profile.zip_code)
    );
    println!();

    let level = match status.level {
        VerificationLevel::Verified => status.level.as_str().green().bold(),
        VerificationLevel::Basic => status.level.as_str().yellow().bold(),
        VerificationLevel::Unverified => status.level.as_str().red().bold(),
    };
    println!("Verification: {level}");
    println!("  Profile:  {}", check(status.profile_completed));
    println!("  SSN:      {}", check(status.ssn_verified));
    println!("  ID:       {}", check(status.id_verified));

    let docs = list_documents(&conn, &user)?;
    if !docs.is_empty() {
        println!();
        println!("Documents:");
        for doc in docs {
            println!(
                "  {} [{}] {} ({} bytes)",
                doc.original_name,
                doc.status,
                doc.doc_type.mime(),
                doc.size_bytes
            );
        }
    }
    Ok(())
}
