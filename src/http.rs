//! Shared HTTP client and SOAP request helpers.

use std::sync::OnceLock;

use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};

use crate::error::ReportError;

static SHARED_CLIENT: OnceLock<reqwest::Client> = OnceLock::new();

/// Get (or create) the shared reqwest client.
pub fn shared_client() -> &'static reqwest::Client {
    SHARED_CLIENT.get_or_init(|| {
        reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(120))
            .pool_max_idle_per_host(10)
            .build()
            .unwrap_or_else(|_| reqwest::Client::new())
    })
}

/// Headers for a SOAP 1.1 call to the reporting service.
pub fn soap_headers(action: &str) -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(
        CONTENT_TYPE,
        HeaderValue::from_static("text/xml; charset=utf-8"),
    );
    if let Ok(val) = HeaderValue::from_str(action) {
        headers.insert("SOAPAction", val);
    }
    headers
}

/// Map a non-success HTTP status to an error.
pub fn status_to_error(status: u16, body: &str) -> ReportError {
    let message = if body.trim().is_empty() {
        format!("HTTP {status}")
    } else {
        truncate(body.trim(), 512).to_string()
    };
    ReportError::api(status, message)
}

fn truncate(text: &str, max: usize) -> &str {
    if text.len() <= max {
        return text;
    }
    let mut end = max;
    while end > 0 && !text.is_char_boundary(end) {
        end -= 1;
    }
    &text[..end]
}
