//! Submit → poll → download → parse.

use std::sync::Arc;

use reqwest::header::CONTENT_TYPE;
use tokio_util::sync::CancellationToken;

use super::download;
use super::job::{ReportJob, ReportStatus};
use super::request::{ReportKind, ReportRequest};
use super::soap::{self, PollResponse, SoapDocument, SoapHeader, SubmitResponse};
use super::table::ReportTable;
use crate::auth::TokenManager;
use crate::config::{CredentialSet, ReportingConfig};
use crate::error::{ReportError, Result};
use crate::http::{shared_client, soap_headers, status_to_error};
use crate::util::poll::{PollOutcome, PollPolicy};

/// Fetches Microsoft Advertising reports through the asynchronous
/// report-generation workflow.
///
/// Each call runs its own independent job; nothing is shared between calls
/// except the token cache.
///
/// # Example
/// ```no_run
/// use adreport::config::ReportingConfig;
/// use adreport::report::{ReportFetcher, ReportKind};
///
/// # async fn example() -> adreport::error::Result<()> {
/// let fetcher = ReportFetcher::new(ReportingConfig::from_env());
/// let table = fetcher
///     .fetch_report(ReportKind::Account, "2024-01-01", "2024-01-31", &["Spend", "Clicks"])
///     .await?;
/// println!("{} rows", table.len());
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct ReportFetcher {
    client: reqwest::Client,
    config: Arc<ReportingConfig>,
    tokens: Arc<TokenManager>,
    poll: PollPolicy,
}

impl std::fmt::Debug for ReportFetcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReportFetcher")
            .field("config", &self.config)
            .field("tokens", &self.tokens)
            .field("poll", &self.poll)
            .finish()
    }
}

impl ReportFetcher {
    pub fn new(config: ReportingConfig) -> Self {
        let tokens = Arc::new(TokenManager::from_config(&config));
        Self::with_token_manager(config, tokens)
    }

    /// Use an existing token manager, e.g. one shared with other fetchers.
    pub fn with_token_manager(config: ReportingConfig, tokens: Arc<TokenManager>) -> Self {
        Self {
            client: shared_client().clone(),
            poll: config.poll_policy(),
            config: Arc::new(config),
            tokens,
        }
    }

    pub fn with_client(mut self, client: reqwest::Client) -> Self {
        self.client = client;
        self
    }

    pub fn with_poll_policy(mut self, policy: PollPolicy) -> Self {
        self.poll = policy;
        self
    }

    pub fn config(&self) -> &ReportingConfig {
        &self.config
    }

    pub fn token_manager(&self) -> &Arc<TokenManager> {
        &self.tokens
    }

    pub fn poll_policy(&self) -> PollPolicy {
        self.poll
    }

    /// Generate and download a report for `[start, end]` (`YYYY-MM-DD`).
    pub async fn fetch_report<S: AsRef<str>>(
        &self,
        kind: ReportKind,
        start: &str,
        end: &str,
        columns: &[S],
    ) -> Result<ReportTable> {
        self.fetch_report_with_cancel(kind, start, end, columns, &CancellationToken::new())
            .await
    }

    /// Like [`fetch_report`](Self::fetch_report), aborting with
    /// [`ReportError::Cancelled`] once `cancel` fires.
    pub async fn fetch_report_with_cancel<S: AsRef<str>>(
        &self,
        kind: ReportKind,
        start: &str,
        end: &str,
        columns: &[S],
        cancel: &CancellationToken,
    ) -> Result<ReportTable> {
        let credentials = self.config.credentials.require()?;
        let request = ReportRequest::new(kind, start, end, columns)?;
        self.run_cancellable(&credentials, &request, cancel).await
    }

    /// Run a prebuilt request.
    pub async fn fetch_request(
        &self,
        request: &ReportRequest,
        cancel: &CancellationToken,
    ) -> Result<ReportTable> {
        let credentials = self.config.credentials.require()?;
        self.run_cancellable(&credentials, request, cancel).await
    }

    async fn run_cancellable(
        &self,
        credentials: &CredentialSet,
        request: &ReportRequest,
        cancel: &CancellationToken,
    ) -> Result<ReportTable> {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                tracing::info!(kind = %request.kind(), "Report fetch cancelled");
                Err(ReportError::Cancelled)
            }
            result = self.run(credentials, request, cancel) => result,
        }
    }

    async fn run(
        &self,
        credentials: &CredentialSet,
        request: &ReportRequest,
        cancel: &CancellationToken,
    ) -> Result<ReportTable> {
        let token = self.tokens.access_token().await?;
        let header = SoapHeader {
            authentication_token: &token,
            developer_token: &credentials.developer_token,
            customer_id: &credentials.customer_id,
            customer_account_id: &credentials.account_id,
        };

        let job = self.submit(&header, request).await?;
        let job = self.wait_for_completion(&header, job, cancel).await?;

        match job.download_url {
            Some(url) => self.download(&url).await,
            None => {
                tracing::info!(request_id = %job.request_id, "Report completed with no data");
                Ok(ReportTable::default())
            }
        }
    }

    async fn submit(&self, header: &SoapHeader<'_>, request: &ReportRequest) -> Result<ReportJob> {
        let envelope = soap::submit_envelope(header, request)?;
        let (status, body) = self.call(soap::SUBMIT_ACTION, envelope).await?;

        let doc = SoapDocument::parse(&body).map_err(|e| {
            ReportError::Submit(format!("unreadable response (HTTP {status}): {e}"))
        })?;
        let response = SubmitResponse::from_document(&doc).inspect_err(|e| {
            tracing::warn!(http_status = status, error = %e, "Report submission rejected");
        })?;

        tracing::info!(
            request_id = %response.request_id,
            kind = %request.kind(),
            start = %request.start(),
            end = %request.end(),
            "Report submitted"
        );
        Ok(ReportJob::submitted(response.request_id))
    }

    async fn wait_for_completion(
        &self,
        header: &SoapHeader<'_>,
        mut job: ReportJob,
        cancel: &CancellationToken,
    ) -> Result<ReportJob> {
        let request_id = job.request_id.as_str();
        let (attempt, response) = self
            .poll
            .run(cancel, |attempt| async move {
                let response = self.poll_once(header, request_id).await?;
                tracing::debug!(request_id, attempt, status = %response.status, "Report status");
                match response.status {
                    ReportStatus::Success => Ok(PollOutcome::Ready((attempt, response))),
                    ReportStatus::Error => Err(ReportError::ReportGeneration {
                        request_id: request_id.to_string(),
                    }),
                    ReportStatus::Pending => Ok(PollOutcome::Pending),
                }
            })
            .await
            .inspect_err(|e| {
                tracing::warn!(request_id, error = %e, "Report polling ended without a result");
            })?;

        job.record_poll(attempt, response);
        Ok(job)
    }

    async fn poll_once(&self, header: &SoapHeader<'_>, request_id: &str) -> Result<PollResponse> {
        let envelope = soap::poll_envelope(header, request_id)?;
        let (status, body) = self.call(soap::POLL_ACTION, envelope).await?;

        let doc = match SoapDocument::parse(&body) {
            Ok(doc) => doc,
            Err(_) if !(200..300).contains(&status) => return Err(status_to_error(status, &body)),
            Err(e) => return Err(e),
        };
        if let Some(message) = doc.fault_message() {
            return Err(ReportError::api(status, message));
        }
        Ok(PollResponse::from_document(&doc))
    }

    async fn call(&self, action: &str, envelope: String) -> Result<(u16, String)> {
        let resp = self
            .client
            .post(&self.config.endpoints.reporting_url)
            .headers(soap_headers(action))
            .body(envelope)
            .send()
            .await?;
        let status = resp.status().as_u16();
        let body = resp.text().await?;
        Ok((status, body))
    }

    async fn download(&self, url: &str) -> Result<ReportTable> {
        let resp = self.client.get(url).send().await?;
        let status = resp.status();
        let content_type = resp
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let bytes = resp.bytes().await?;
        if !status.is_success() {
            return Err(status_to_error(
                status.as_u16(),
                &String::from_utf8_lossy(&bytes),
            ));
        }

        let text = download::decode(&bytes, content_type.as_deref())?;
        let table = ReportTable::parse(&text)?;
        tracing::info!(rows = table.len(), bytes = bytes.len(), "Report downloaded");
        Ok(table)
    }
}
