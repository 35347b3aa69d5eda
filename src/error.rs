use thiserror::Error;

#[derive(Error, Debug)]
pub enum AlphaError {
    #[error("Database error: {0}")]
    Db(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Not signed in. Run `alphacard login <email>` first.")]
    NotAuthenticated,

    #[error("Unknown card: {0}")]
    UnknownCard(String),

    #[error("{0}")]
    Validation(String),

    #[error("Invalid document: {0}")]
    InvalidDocument(String),

    #[error("Rate limit exceeded. Please try again in a moment.")]
    RateLimited,

    #[error("AI credits depleted. Please add funds to your workspace.")]
    CreditsExhausted,

    #[error("AI gateway error ({status}): {body}")]
    Gateway { status: u16, body: String },

    #[error("Settings error: {0}")]
    Settings(String),

    #[error("{0}")]
    Other(String),
}

pub type Result<T> = std::result::Result<T, AlphaError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_authenticated_points_at_login() {
        let msg = AlphaError::NotAuthenticated.to_string();
        assert!(msg.contains("alphacard login"));
    }

    #[test]
    fn test_gateway_display_carries_status() {
        let err = AlphaError::Gateway { status: 503, body: "upstream down".to_string() };
        assert_eq!(err.to_string(), "AI gateway error (503): upstream down");
    }

    #[test]
    fn test_validation_is_bare_message() {
        let err = AlphaError::Validation("Last 4 digits must be exactly 4 digits".to_string());
        assert_eq!(err.to_string(), "Last 4 digits must be exactly 4 digits");
    }
}
