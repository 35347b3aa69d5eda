use std::path::{Path, PathBuf};

use crate::documents::upload_id_document;
use crate::error::Result;
use crate::profile::verify_ssn;
use crate::settings::load_settings;

use super::{open_db, signed_in};

pub fn ssn(raw: &str) -> Result<()> {
    let settings = load_settings();
    let conn = open_db(&settings)?;
    let user = signed_in(&conn, &settings)?;
    let status = verify_ssn(&conn, &user, raw)?;
    println!("SSN verified. Verification level: {}", status.level.as_str());
    Ok(())
}

pub fn id(file: &str, content_type: Option<&str>) -> Result<()> {
    let settings = load_settings();
    let conn = open_db(&settings)?;
    let user = signed_in(&conn, &settings)?;
    let doc = upload_id_document(
        &conn,
        &PathBuf::from(&settings.data_dir),
        &user,
        Path::new(file),
        content_type,
    )?;
    println!("ID uploaded successfully.");
    println!("  Stored:   {}", doc.stored_path.display());
    println!("  SHA-256:  {}", doc.checksum);
    println!("Your ID is pending verification. This may take 1-2 business days.");
    Ok(())
}
