use std::sync::Mutex;

use chrono::Utc;
use serde::Deserialize;

use super::error::AuthError;
use super::token::TokenState;
use crate::config::{Endpoints, ReportingConfig};

/// Refresh-token exchange against the Microsoft identity platform, with an
/// in-memory token cache.
///
/// The cache lock is only taken to read or replace the state and is never held
/// across a request, so two callers racing past an expired token may both
/// refresh. Refreshes are idempotent, which makes that harmless.
///
/// # Example
/// ```no_run
/// use adreport::auth::TokenManager;
///
/// # async fn example() -> Result<(), adreport::auth::AuthError> {
/// let tokens = TokenManager::new("client-id", "client-secret", "refresh-token");
/// let bearer = tokens.access_token().await?;
/// # let _ = bearer;
/// # Ok(())
/// # }
/// ```
pub struct TokenManager {
    client: reqwest::Client,
    token_url: String,
    scope: String,
    client_id: Option<String>,
    client_secret: Option<String>,
    refresh_token: Option<String>,
    state: Mutex<TokenState>,
}

impl std::fmt::Debug for TokenManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenManager")
            .field("token_url", &self.token_url)
            .field("scope", &self.scope)
            .field("client_id", &self.client_id)
            .field("cached", &self.state().access_token.is_some())
            .finish()
    }
}

impl TokenManager {
    pub fn new(
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
        refresh_token: impl Into<String>,
    ) -> Self {
        let endpoints = Endpoints::default();
        Self {
            client: crate::http::shared_client().clone(),
            token_url: endpoints.token_url,
            scope: endpoints.scope,
            client_id: Some(client_id.into()),
            client_secret: Some(client_secret.into()),
            refresh_token: Some(refresh_token.into()),
            state: Mutex::new(TokenState::default()),
        }
    }

    /// Build a manager from layered configuration. Missing credentials are
    /// reported on the first [`access_token`](Self::access_token) call.
    pub fn from_config(config: &ReportingConfig) -> Self {
        let credentials = &config.credentials;
        Self {
            client: crate::http::shared_client().clone(),
            token_url: config.endpoints.token_url.clone(),
            scope: config.endpoints.scope.clone(),
            client_id: credentials.client_id.clone(),
            client_secret: credentials.client_secret.clone(),
            refresh_token: credentials.refresh_token.clone(),
            state: Mutex::new(TokenState::default()),
        }
    }

    pub fn with_token_url(mut self, url: impl Into<String>) -> Self {
        self.token_url = url.into();
        self
    }

    pub fn with_scope(mut self, scope: impl Into<String>) -> Self {
        self.scope = scope.into();
        self
    }

    pub fn with_client(mut self, client: reqwest::Client) -> Self {
        self.client = client;
        self
    }

    /// Return a valid bearer token, refreshing it when the cache is empty or stale.
    pub async fn access_token(&self) -> Result<String, AuthError> {
        if let Some(token) = self.cached() {
            tracing::debug!("Using cached Microsoft Ads access token");
            return Ok(token);
        }
        match self.refresh().await {
            Ok(token) => Ok(token),
            Err(e) => {
                self.invalidate();
                tracing::warn!(error = %e, "Access token refresh failed");
                Err(e)
            }
        }
    }

    /// Drop the cached token so the next call refreshes.
    pub fn invalidate(&self) {
        if let Ok(mut guard) = self.state.lock() {
            guard.clear();
        }
    }

    /// Snapshot of the cache.
    pub fn state(&self) -> TokenState {
        self.state
            .lock()
            .map(|guard| guard.clone())
            .unwrap_or_default()
    }

    fn cached(&self) -> Option<String> {
        let guard = self.state.lock().ok()?;
        guard.valid_at(Utc::now()).map(str::to_string)
    }

    async fn refresh(&self) -> Result<String, AuthError> {
        let client_id = required(&self.client_id, "client_id")?;
        let client_secret = required(&self.client_secret, "client_secret")?;
        let refresh_token = required(&self.refresh_token, "refresh_token")?;

        tracing::info!("Refreshing Microsoft Ads access token");
        let resp = self
            .client
            .post(&self.token_url)
            .header("Accept", "application/json")
            .form(&[
                ("client_id", client_id),
                ("client_secret", client_secret),
                ("refresh_token", refresh_token),
                ("grant_type", "refresh_token"),
                ("scope", self.scope.as_str()),
            ])
            .send()
            .await?;
        let status = resp.status();
        let body = resp.text().await?;
        let payload: TokenResponse = serde_json::from_str(&body).map_err(|e| {
            AuthError::InvalidResponse(format!(
                "token endpoint returned status {status} with unreadable body: {e}"
            ))
        })?;

        if let Some(error) = payload.error {
            return Err(AuthError::Rejected(
                payload.error_description.unwrap_or(error),
            ));
        }
        let access_token = payload.access_token.ok_or_else(|| {
            AuthError::InvalidResponse("token response missing access_token".to_string())
        })?;
        let expires_in = payload.expires_in.ok_or_else(|| {
            AuthError::InvalidResponse("token response missing expires_in".to_string())
        })?;

        let state = TokenState::issued(access_token.clone(), expires_in, Utc::now())
            .ok_or_else(|| {
                AuthError::InvalidResponse(format!("token lifetime out of range: {expires_in}"))
            })?;
        if let Ok(mut guard) = self.state.lock() {
            *guard = state;
        }
        Ok(access_token)
    }
}

fn required<'a>(value: &'a Option<String>, name: &'static str) -> Result<&'a str, AuthError> {
    value
        .as_deref()
        .filter(|v| !v.trim().is_empty())
        .ok_or(AuthError::MissingCredential(name))
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: Option<String>,
    expires_in: Option<i64>,
    error: Option<String>,
    error_description: Option<String>,
}
