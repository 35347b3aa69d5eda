//! ID document intake: checks an uploaded file and files it away for
//! manual review.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

use rusqlite::Connection;
use sha2::{Digest, Sha256};

use crate::auth::Identity;
use crate::error::{AlphaError, Result};

pub const MIN_SIZE: u64 = 10 * 1024;
pub const MAX_SIZE: u64 = 5 * 1024 * 1024;
pub const DOCUMENTS_DIR: &str = "id-documents";
const ALLOWED_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "pdf"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocType {
    Jpeg,
    Png,
    Pdf,
}

impl DocType {
    pub fn from_mime(mime: &str) -> Option<Self> {
        match mime.trim().to_lowercase().as_str() {
            "image/jpeg" | "image/jpg" => Some(Self::Jpeg),
            "image/png" => Some(Self::Png),
            "application/pdf" => Some(Self::Pdf),
            _ => None,
        }
    }

    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "jpg" | "jpeg" => Some(Self::Jpeg),
            "png" => Some(Self::Png),
            "pdf" => Some(Self::Pdf),
            _ => None,
        }
    }

    pub fn mime(&self) -> &'static str {
        match self {
            Self::Jpeg => "image/jpeg",
            Self::Png => "image/png",
            Self::Pdf => "application/pdf",
        }
    }

    fn signature(&self) -> &'static [u8] {
        match self {
            Self::Jpeg => &[0xFF, 0xD8, 0xFF],
            Self::Png => &[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A],
            Self::Pdf => &[0x25, 0x50, 0x44, 0x46],
        }
    }

    /// Whether `bytes` starts with this type's magic number.
    pub fn matches(&self, bytes: &[u8]) -> bool {
        bytes.starts_with(self.signature())
    }
}

/// Replace anything outside `[a-zA-Z0-9.-]` with `_`.
pub fn sanitize_file_name(name: &str) -> String {
    name.chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '.' || c == '-' { c } else { '_' })
        .collect()
}

/// Text after the last dot, lower-cased. A name without a dot is its own
/// extension.
fn extension_of(sanitized: &str) -> String {
    sanitized.rsplit('.').next().unwrap_or_default().to_lowercase()
}

#[derive(Debug, Clone)]
pub struct StoredDocument {
    pub id: String,
    pub doc_type: DocType,
    pub original_name: String,
    pub stored_path: PathBuf,
    pub size_bytes: u64,
    pub checksum: String,
    pub status: String,
}

/// Check a candidate upload. The declared type, when absent, comes from
/// the file extension. Returns the type and the extension to store under.
pub fn validate_upload(
    file_name: &str,
    declared: Option<&str>,
    bytes: &[u8],
) -> Result<(DocType, String)> {
    let sanitized = sanitize_file_name(file_name);
    let ext = extension_of(&sanitized);

    let doc_type = match declared {
        Some(mime) => DocType::from_mime(mime),
        None => DocType::from_extension(&ext),
    }
    .ok_or_else(|| AlphaError::InvalidDocument("Please upload a JPG, PNG, or PDF file.".into()))?;

    let size = bytes.len() as u64;
    if size > MAX_SIZE {
        return Err(AlphaError::InvalidDocument("Please upload a file smaller than 5MB.".into()));
    }
    if size < MIN_SIZE {
        return Err(AlphaError::InvalidDocument(
            "The file appears to be empty or corrupted.".into(),
        ));
    }
    if !ALLOWED_EXTENSIONS.contains(&ext.as_str()) {
        return Err(AlphaError::InvalidDocument(
            "File extension must be jpg, jpeg, png, or pdf.".into(),
        ));
    }
    if !doc_type.matches(bytes) {
        return Err(AlphaError::InvalidDocument(
            "The file content doesn't match its type. Please upload a valid ID document.".into(),
        ));
    }
    Ok((doc_type, ext))
}

fn compute_checksum(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    hex::encode(hasher.finalize())
}

/// Write to `<dir>/id-<millis>.<ext>`, stepping the timestamp forward
/// rather than replacing an existing file.
fn write_new_file(dir: &Path, ext: &str, bytes: &[u8]) -> Result<PathBuf> {
    let mut millis = chrono::Utc::now().timestamp_millis();
    loop {
        let path = dir.join(format!("id-{millis}.{ext}"));
        match OpenOptions::new().write(true).create_new(true).open(&path) {
            Ok(mut file) => {
                file.write_all(bytes)?;
                return Ok(path);
            }
            Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => millis += 1,
            Err(e) => return Err(e.into()),
        }
    }
}

/// Validate and store an ID document for `user`. The upload is recorded
/// as pending; it never marks the user's ID as verified.
pub fn upload_id_document(
    conn: &Connection,
    data_dir: &Path,
    user: &Identity,
    source: &Path,
    declared: Option<&str>,
) -> Result<StoredDocument> {
    let original_name = source
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();
    let bytes = std::fs::read(source)?;
    let (doc_type, ext) = validate_upload(&original_name, declared, &bytes)?;

    let dir = data_dir.join(DOCUMENTS_DIR).join(&user.user_id);
    std::fs::create_dir_all(&dir)?;
    let stored_path = write_new_file(&dir, &ext, &bytes)?;

    let doc = StoredDocument {
        id: uuid::Uuid::new_v4().to_string(),
        doc_type,
        original_name,
        stored_path,
        size_bytes: bytes.len() as u64,
        checksum: compute_checksum(&bytes),
        status: "pending".to_string(),
    };
    conn.execute(
        "INSERT INTO documents (id, user_id, kind, original_name, stored_path, size_bytes, checksum, status) \
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        rusqlite::params![
            doc.id,
            user.user_id,
            doc.doc_type.mime(),
            doc.original_name,
            doc.stored_path.to_string_lossy(),
            doc.size_bytes as i64,
            doc.checksum,
            doc.status,
        ],
    )?;
    tracing::info!(user_id = %user.user_id, path = %doc.stored_path.display(), "id document stored");
    Ok(doc)
}

pub fn list_documents(conn: &Connection, user: &Identity) -> Result<Vec<StoredDocument>> {
    let mut stmt = conn.prepare(
        "SELECT id, kind, original_name, stored_path, size_bytes, checksum, status \
         FROM documents WHERE user_id = ?1 ORDER BY uploaded_at, rowid",
    )?;
    let docs = stmt
        .query_map([&user.user_id], |row| {
            let kind: String = row.get(1)?;
            let path: String = row.get(3)?;
            Ok(StoredDocument {
                id: row.get(0)?,
                doc_type: DocType::from_mime(&kind).unwrap_or(DocType::Pdf),
                original_name: row.get(2)?,
                stored_path: PathBuf::from(path),
                size_bytes: row.get::<_, i64>(4)? as u64,
                checksum: row.get(5)?,
                status: row.get::<_, Option<String>>(6)?.unwrap_or_default(),
            })
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(docs)
}
