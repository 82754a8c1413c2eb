//! Server-side report job tracking.

use serde::Serialize;
use strum::Display;

use super::soap::PollResponse;

/// Status reported by the reporting service for a job.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq, Display)]
pub enum ReportStatus {
    Pending,
    Success,
    Error,
}

impl ReportStatus {
    /// Map the wire value; anything other than `Success`/`Error` is still pending.
    pub fn from_wire(value: &str) -> Self {
        match value.trim() {
            "Success" => Self::Success,
            "Error" => Self::Error,
            _ => Self::Pending,
        }
    }

    pub fn is_terminal(self) -> bool {
        !matches!(self, Self::Pending)
    }
}

/// A submitted report job.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ReportJob {
    pub request_id: String,
    pub status: ReportStatus,
    pub download_url: Option<String>,
    /// Number of status checks issued so far.
    pub polls: u32,
}

impl ReportJob {
    pub fn submitted(request_id: impl Into<String>) -> Self {
        Self {
            request_id: request_id.into(),
            status: ReportStatus::Pending,
            download_url: None,
            polls: 0,
        }
    }

    /// Record the reply to poll number `attempt`.
    pub fn record_poll(&mut self, attempt: u32, response: PollResponse) {
        self.polls = attempt;
        self.status = response.status;
        if response.status == ReportStatus::Success {
            self.download_url = response.download_url;
        }
    }
}
