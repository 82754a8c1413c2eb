use thiserror::Error;

/// Errors raised while obtaining an access token.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Missing OAuth credential: {0}")]
    MissingCredential(&'static str),
    #[error("OAuth error: {0}")]
    Rejected(String),
    #[error("Invalid response: {0}")]
    InvalidResponse(String),
    #[error("Network error: {0}")]
    Network(String),
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<reqwest::Error> for AuthError {
    fn from(error: reqwest::Error) -> Self {
        Self::Network(error.to_string())
    }
}

impl From<serde_json::Error> for AuthError {
    fn from(error: serde_json::Error) -> Self {
        Self::Serialization(error.to_string())
    }
}
