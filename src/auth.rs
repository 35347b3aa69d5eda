use rusqlite::{Connection, OptionalExtension};

use crate::error::{AlphaError, Result};
use crate::settings::Settings;

/// The signed-in user, passed explicitly to every operation that writes or
/// reads user-owned rows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub user_id: String,
    pub email: String,
}

/// Precondition gate for user-scoped operations.
pub fn require_identity(identity: Option<&Identity>) -> Result<&Identity> {
    identity.ok_or(AlphaError::NotAuthenticated)
}

/// Normalise an email address: trimmed, lower-cased, `local@domain` with
/// both halves non-empty.
pub fn validate_email(raw: &str) -> Result<String> {
    let email = raw.trim().to_lowercase();
    match email.split_once('@') {
        Some((local, domain)) if !local.is_empty() && !domain.is_empty() && !domain.contains('@') => {
            Ok(email)
        }
        _ => Err(AlphaError::Validation(format!("Invalid email address: {raw}"))),
    }
}

/// Find the profile for `email`, creating it and its verification row on
/// first use.
pub fn sign_in(conn: &Connection, email: &str) -> Result<Identity> {
    let email = validate_email(email)?;
    let existing: Option<String> = conn
        .query_row("SELECT id FROM profiles WHERE email = ?1", [&email], |r| r.get(0))
        .optional()?;
    if let Some(user_id) = existing {
        return Ok(Identity { user_id, email });
    }

    let user_id = uuid::Uuid::new_v4().to_string();
    let tx = conn.unchecked_transaction()?;
    tx.execute(
        "INSERT INTO profiles (id, email) VALUES (?1, ?2)",
        [&user_id, &email],
    )?;
    tx.execute(
        "INSERT INTO verification_status (user_id) VALUES (?1)",
        [&user_id],
    )?;
    tx.commit()?;
    tracing::info!(%user_id, "created profile");
    Ok(Identity { user_id, email })
}

/// Sign in and record the session in `settings`. The caller persists them.
pub fn login(conn: &Connection, settings: &mut Settings, email: &str) -> Result<Identity> {
    let identity = sign_in(conn, email)?;
    settings.session_user = Some(identity.user_id.clone());
    Ok(identity)
}

/// Clear the session. Returns whether anyone was signed in.
pub fn logout(settings: &mut Settings) -> bool {
    settings.session_user.take().is_some()
}

/// Resolve the session recorded in `settings`. A session pointing at a
/// profile that no longer exists resolves to `None`.
pub fn current_identity(conn: &Connection, settings: &Settings) -> Result<Option<Identity>> {
    let Some(user_id) = settings.session_user.as_deref() else {
        return Ok(None);
    };
    let email: Option<String> = conn
        .query_row("SELECT email FROM profiles WHERE id = ?1", [user_id], |r| r.get(0))
        .optional()?;
    Ok(email.map(|email| Identity {
        user_id: user_id.to_string(),
        email,
    }))
}
