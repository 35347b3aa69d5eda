use std::sync::OnceLock;

use regex::Regex;
use rusqlite::{Connection, OptionalExtension};

use crate::auth::Identity;
use crate::cards::is_iso_date;
use crate::error::{AlphaError, Result};
use crate::models::{Profile, VerificationLevel, VerificationStatus};

fn phone_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\+?[\d\s\-()]+$").expect("phone pattern is valid"))
}

fn zip_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\d{5}(-\d{4})?$").expect("zip pattern is valid"))
}

#[derive(Debug, Clone, Default)]
pub struct ProfileForm {
    pub full_name: String,
    pub date_of_birth: String,
    pub phone_number: String,
    pub address_line1: String,
    pub address_line2: Option<String>,
    pub city: String,
    pub state: String,
    pub zip_code: String,
}

fn invalid(msg: &str) -> AlphaError {
    AlphaError::Validation(msg.to_string())
}

/// Check every field, reporting the first problem. Returns the form with
/// the state upper-cased and an empty second address line dropped.
pub fn validate_profile(form: &ProfileForm) -> Result<ProfileForm> {
    if form.full_name.trim().chars().count() < 2 {
        return Err(invalid("Name must be at least 2 characters"));
    }
    if !is_iso_date(form.date_of_birth.trim()) {
        return Err(invalid("Date of birth is required (YYYY-MM-DD)"));
    }
    if !phone_re().is_match(&form.phone_number) {
        return Err(invalid("Invalid phone number"));
    }
    if form.address_line1.trim().chars().count() < 5 {
        return Err(invalid("Address is required"));
    }
    if form.city.trim().chars().count() < 2 {
        return Err(invalid("City is required"));
    }
    let state = form.state.trim();
    if state.len() != 2 || !state.bytes().all(|b| b.is_ascii_alphabetic()) {
        return Err(invalid("State must be 2 characters (e.g., CA)"));
    }
    if !zip_re().is_match(&form.zip_code) {
        return Err(invalid("Invalid ZIP code"));
    }

    Ok(ProfileForm {
        full_name: form.full_name.trim().to_string(),
        date_of_birth: form.date_of_birth.trim().to_string(),
        phone_number: form.phone_number.clone(),
        address_line1: form.address_line1.trim().to_string(),
        address_line2: form
            .address_line2
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string),
        city: form.city.trim().to_string(),
        state: state.to_uppercase(),
        zip_code: form.zip_code.clone(),
    })
}

/// Save profile details and mark the profile step complete.
pub fn save_profile(conn: &Connection, user: &Identity, form: &ProfileForm) -> Result<VerificationStatus> {
    let p = validate_profile(form)?;
    let tx = conn.unchecked_transaction()?;
    tx.execute(
        "UPDATE profiles SET full_name = ?1, date_of_birth = ?2, phone_number = ?3, address_line1 = ?4, \
         address_line2 = ?5, city = ?6, state = ?7, zip_code = ?8, updated_at = datetime('now') \
         WHERE id = ?9",
        rusqlite::params![
            p.full_name,
            p.date_of_birth,
            p.phone_number,
            p.address_line1,
            p.address_line2,
            p.city,
            p.state,
            p.zip_code,
            user.user_id,
        ],
    )?;
    tx.execute(
        "UPDATE verification_status SET profile_completed = 1, verification_level = ?1, \
         updated_at = datetime('now') WHERE user_id = ?2",
        [VerificationLevel::Basic.as_str(), user.user_id.as_str()],
    )?;
    tx.commit()?;
    verification_status(conn, user)
}

pub fn load_profile(conn: &Connection, user: &Identity) -> Result<Profile> {
    conn.query_row(
        "SELECT id, email, full_name, date_of_birth, phone_number, address_line1, address_line2, \
         city, state, zip_code FROM profiles WHERE id = ?1",
        [&user.user_id],
        |row| {
            Ok(Profile {
                id: row.get(0)?,
                email: row.get(1)?,
                full_name: row.get(2)?,
                date_of_birth: row.get(3)?,
                phone_number: row.get(4)?,
                address_line1: row.get(5)?,
                address_line2: row.get(6)?,
                city: row.get(7)?,
                state: row.get(8)?,
                zip_code: row.get(9)?,
            })
        },
    )
    .optional()?
    .ok_or(AlphaError::NotAuthenticated)
}

pub fn verification_status(conn: &Connection, user: &Identity) -> Result<VerificationStatus> {
    let status = conn
        .query_row(
            "SELECT profile_completed, ssn_verified, id_verified, verification_level \
             FROM verification_status WHERE user_id = ?1",
            [&user.user_id],
            |row| {
                let level: Option<String> = row.get(3)?;
                Ok(VerificationStatus {
                    profile_completed: row.get::<_, Option<bool>>(0)?.unwrap_or(false),
                    ssn_verified: row.get::<_, Option<bool>>(1)?.unwrap_or(false),
                    id_verified: row.get::<_, Option<bool>>(2)?.unwrap_or(false),
                    level: VerificationLevel::parse(level.as_deref().unwrap_or_default()),
                })
            },
        )
        .optional()?;
    Ok(status.unwrap_or(VerificationStatus {
        profile_completed: false,
        ssn_verified: false,
        id_verified: false,
        level: VerificationLevel::Unverified,
    }))
}

/// Normalise an SSN to its 9 digits. Dashes are the only separator allowed.
pub fn clean_ssn(raw: &str) -> Result<String> {
    let cleaned: String = raw.trim().chars().filter(|c| *c != '-').collect();
    if cleaned.len() == 9 && cleaned.bytes().all(|b| b.is_ascii_digit()) {
        Ok(cleaned)
    } else {
        Err(invalid("SSN must be 9 digits (format: XXX-XX-XXXX)"))
    }
}

/// Mock identity check: a well-formed SSN is accepted. The number is
/// discarded once validated.
pub fn verify_ssn(conn: &Connection, user: &Identity, raw: &str) -> Result<VerificationStatus> {
    clean_ssn(raw)?;
    let current = verification_status(conn, user)?;
    let level = if current.id_verified {
        VerificationLevel::Verified
    } else {
        VerificationLevel::Basic
    };
    conn.execute(
        "UPDATE verification_status SET ssn_verified = 1, verification_level = ?1, \
         updated_at = datetime('now') WHERE user_id = ?2",
        [level.as_str(), user.user_id.as_str()],
    )?;
    tracing::info!(user_id = %user.user_id, level = level.as_str(), "ssn verified");
    verification_status(conn, user)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::{test_db, test_user};

    fn form() -> ProfileForm {
        ProfileForm {
            full_name: "Ana Lima".into(),
            date_of_birth: "1990-04-12".into(),
            phone_number: "+1 (555) 010-2000".into(),
            address_line1: "12 Main Street".into(),
            address_line2: Some("  ".into()),
            city: "Austin".into(),
            state: "tx".into(),
            zip_code: "78701-1234".into(),
        }
    }

    #[test]
    fn test_validate_profile_normalises() {
        let p = validate_profile(&form()).unwrap();
        assert_eq!(p.state, "TX");
        assert_eq!(p.address_line2, None);
    }

    #[test]
    fn test_validate_profile_rejections() {
        let cases = [
            (ProfileForm { full_name: "A".into(), ..form() }, "Name"),
            (ProfileForm { date_of_birth: "12/04/1990".into(), ..form() }, "Date of birth"),
            (ProfileForm { phone_number: "555-CALL".into(), ..form() }, "phone"),
            (ProfileForm { address_line1: "12 M".into(), ..form() }, "Address"),
            (ProfileForm { city: "A".into(), ..form() }, "City"),
            (ProfileForm { state: "Texas".into(), ..form() }, "State"),
            (ProfileForm { state: "T1".into(), ..form() }, "State"),
            (ProfileForm { zip_code: "7870".into(), ..form() }, "ZIP"),
        ];
        for (f, needle) in cases {
            let msg = validate_profile(&f).unwrap_err().to_string();
            assert!(msg.contains(needle), "{msg} should mention {needle}");
        }
    }

    #[test]
    fn test_save_profile_marks_basic() {
        let (_dir, conn) = test_db();
        let user = test_user(&conn);
        assert_eq!(verification_status(&conn, &user).unwrap().level, VerificationLevel::Unverified);

        let status = save_profile(&conn, &user, &form()).unwrap();
        assert!(status.profile_completed);
        assert_eq!(status.level, VerificationLevel::Basic);

        let profile = load_profile(&conn, &user).unwrap();
        assert_eq!(profile.state.as_deref(), Some("TX"));
        assert_eq!(profile.city.as_deref(), Some("Austin"));
    }

    #[test]
    fn test_clean_ssn() {
        assert_eq!(clean_ssn(" 123-45-6789 ").unwrap(), "123456789");
        assert_eq!(clean_ssn("123456789").unwrap(), "123456789");
        assert!(clean_ssn("12345678").is_err());
        assert!(clean_ssn("123 45 6789").is_err());
        assert!(clean_ssn("12a456789").is_err());
    }

    #[test]
    fn test_verify_ssn_levels() {
        let (_dir, conn) = test_db();
        let user = test_user(&conn);
        let status = verify_ssn(&conn, &user, "123-45-6789").unwrap();
        assert!(status.ssn_verified);
        assert_eq!(status.level, VerificationLevel::Basic);

        conn.execute("UPDATE verification_status SET id_verified = 1 WHERE user_id = ?1", [&user.user_id])
            .unwrap();
        let status = verify_ssn(&conn, &user, "123456789").unwrap();
        assert_eq!(status.level, VerificationLevel::Verified);
    }
}
