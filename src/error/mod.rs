//! Error types for report fetching.

use thiserror::Error;

use crate::auth::AuthError;

/// Primary error type for all report operations.
#[derive(Error, Debug)]
pub enum ReportError {
    #[error("Not configured: missing {}", missing.join(", "))]
    NotConfigured { missing: Vec<&'static str> },

    #[error("Authentication error: {0}")]
    Auth(#[from] AuthError),

    #[error("Report submission failed: {0}")]
    Submit(String),

    #[error("Report generation failed for request {request_id}")]
    ReportGeneration { request_id: String },

    #[error("Report generation timed out after {attempts} polls")]
    Timeout { attempts: u32 },

    #[error("Downloaded report archive contains no entries")]
    EmptyArchive,

    #[error("Report fetch cancelled")]
    Cancelled,

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("XML error: {0}")]
    Xml(#[from] quick_xml::Error),

    #[error("Archive error: {0}")]
    Archive(#[from] zip::result::ZipError),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Broad error category for routing recovery logic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Authentication,
    Configuration,
    Network,
    Timeout,
    Server,
    Api,
    Report,
    Decoding,
    Cancelled,
}

impl ReportError {
    /// Create an API error.
    pub fn api(status: u16, message: impl Into<String>) -> Self {
        Self::Api {
            status,
            message: message.into(),
        }
    }

    /// Classify this error into a category.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::Auth(_) => ErrorCategory::Authentication,
            Self::NotConfigured { .. } | Self::InvalidArgument(_) => ErrorCategory::Configuration,
            Self::Network(_) => ErrorCategory::Network,
            Self::Timeout { .. } => ErrorCategory::Timeout,
            Self::Submit(_) | Self::ReportGeneration { .. } => ErrorCategory::Report,
            Self::EmptyArchive | Self::Xml(_) | Self::Archive(_) | Self::Csv(_) | Self::Io(_) => {
                ErrorCategory::Decoding
            }
            Self::Cancelled => ErrorCategory::Cancelled,
            Self::Api { status, .. } => match status {
                401 | 403 => ErrorCategory::Authentication,
                500..=599 => ErrorCategory::Server,
                _ => ErrorCategory::Api,
            },
        }
    }

    /// Whether a fresh fetch might succeed where this one failed.
    ///
    /// Nothing inside the crate retries; this is advice for callers.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self.category(),
            ErrorCategory::Network | ErrorCategory::Timeout | ErrorCategory::Server
        )
    }
}

/// Convenience alias.
pub type Result<T> = std::result::Result<T, ReportError>;
