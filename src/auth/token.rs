use chrono::{DateTime, Duration, Utc};

/// Cached bearer token and the instant it stops being served.
///
/// `expires_at` already has the refresh safety margin subtracted, so a token is
/// usable exactly while `now < expires_at`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TokenState {
    pub access_token: Option<String>,
    pub expires_at: Option<DateTime<Utc>>,
}

impl TokenState {
    /// Seconds shaved off the provider's `expires_in` before caching.
    pub const SAFETY_MARGIN_SECS: i64 = 300;

    /// Build state from a fresh token response received at `now`.
    ///
    /// Returns `None` when the lifetime does not fit in a timestamp.
    pub fn issued(access_token: String, expires_in_secs: i64, now: DateTime<Utc>) -> Option<Self> {
        let lifetime = expires_in_secs
            .checked_sub(Self::SAFETY_MARGIN_SECS)
            .and_then(Duration::try_seconds)?;
        Some(Self {
            access_token: Some(access_token),
            expires_at: Some(now.checked_add_signed(lifetime)?),
        })
    }

    /// Return the token if it is still usable at `now`.
    pub fn valid_at(&self, now: DateTime<Utc>) -> Option<&str> {
        match (&self.access_token, self.expires_at) {
            (Some(token), Some(expires_at)) if now < expires_at => Some(token.as_str()),
            _ => None,
        }
    }

    pub fn clear(&mut self) {
        self.access_token = None;
        self.expires_at = None;
    }
}
