//! DNS-filter (Pi-hole) status over its session-based HTTP API.

use crate::error::{Result, StatusError};
use crate::metrics::data::{BlockingState, FilterStats, Reading};
use serde::{Deserialize, Serialize};
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tokio::time;
use tracing::{debug, warn};

/// Header carrying the session id on authenticated requests.
pub const SID_HEADER: &str = "X-FTL-SID";

#[derive(Debug, Serialize)]
struct AuthRequest<'a> {
    password: &'a str,
}

#[derive(Debug, Deserialize)]
pub struct AuthResponse {
    pub session: SessionInfo,
}

#[derive(Debug, Deserialize)]
pub struct SessionInfo {
    pub valid: bool,
    #[serde(default)]
    pub sid: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct BlockingResponse {
    pub blocking: String,
}

#[derive(Debug, Deserialize)]
pub struct SummaryResponse {
    pub queries: QuerySummary,
}

#[derive(Debug, Deserialize)]
pub struct QuerySummary {
    pub total: u64,
    pub blocked: u64,
    pub percent_blocked: f64,
}

/// An authenticated session. `sid` is `None` when the API has no password.
#[derive(Debug, Clone)]
pub struct Session {
    pub sid: Option<String>,
}

/// Client for one DNS-filter instance.
#[derive(Debug, Clone)]
pub struct PiholeClient {
    http: reqwest::Client,
    base_url: String,
    password: Option<String>,
}

impl PiholeClient {
    pub fn new(base_url: impl Into<String>, password: Option<String>, timeout: Duration) -> Result<Self> {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        reqwest::Url::parse(&base_url).map_err(|err| {
            StatusError::config_error(format!("invalid DNS-filter URL {base_url:?}: {err}"))
        })?;
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .no_proxy()
            .build()?;
        Ok(Self {
            http,
            base_url,
            password,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn authed(&self, request: reqwest::RequestBuilder, session: &Session) -> reqwest::RequestBuilder {
        match &session.sid {
            Some(sid) => request.header(SID_HEADER, sid),
            None => request,
        }
    }

    /// Open a session with `POST /api/auth`.
    pub async fn login(&self) -> Result<Session> {
        let password = self.password.as_deref().unwrap_or("");
        let response: AuthResponse = self
            .http
            .post(self.url("/api/auth"))
            .json(&AuthRequest { password })
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        if !response.session.valid {
            let reason = response
                .session
                .message
                .unwrap_or_else(|| "session not valid".to_string());
            return Err(StatusError::auth_error(format!("{}: {}", self.base_url, reason)));
        }
        debug!("Opened DNS-filter session on {}", self.base_url);
        Ok(Session {
            sid: response.session.sid,
        })
    }

    /// Close the session with `DELETE /api/auth`.
    pub async fn logout(&self, session: &Session) -> Result<()> {
        if session.sid.is_none() {
            return Ok(());
        }
        self.authed(self.http.delete(self.url("/api/auth")), session)
            .send()
            .await?
            .error_for_status()?;
        debug!("Closed DNS-filter session on {}", self.base_url);
        Ok(())
    }

    /// `GET /api/dns/blocking`
    pub async fn blocking(&self, session: &Session) -> Result<BlockingState> {
        let response: BlockingResponse = self
            .authed(self.http.get(self.url("/api/dns/blocking")), session)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        Ok(BlockingState::from_api(&response.blocking))
    }

    /// `GET /api/stats/summary`
    pub async fn summary(&self, session: &Session) -> Result<QuerySummary> {
        let response: SummaryResponse = self
            .authed(self.http.get(self.url("/api/stats/summary")), session)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        Ok(response.queries)
    }

    /// Log in, query blocking state and statistics, and log out.
    ///
    /// Never fails: each field falls back to the placeholder independently.
    pub async fn fetch_stats(&self) -> FilterStats {
        let session = match self.login().await {
            Ok(session) => session,
            Err(err) => {
                warn!(url = %self.base_url, error = %err, "DNS-filter login failed");
                return FilterStats::default();
            }
        };

        let (blocking, summary) = tokio::join!(self.blocking(&session), self.summary(&session));

        if let Err(err) = self.logout(&session).await {
            warn!(url = %self.base_url, error = %err, "DNS-filter logout failed");
        }

        let summary = Reading::capture("dns_summary", summary);
        FilterStats {
            blocking: Reading::capture("dns_blocking", blocking),
            blocked_percent: summary.value().map(|s| s.percent_blocked).into(),
            total_queries: summary.value().map(|s| s.total).into(),
            blocked_queries: summary.value().map(|s| s.blocked).into(),
        }
    }
}

/// Blocking state from the local `pihole status` command.
pub async fn local_cli_status(timeout: Duration) -> Result<BlockingState> {
    let mut command = Command::new("pihole");
    command.arg("status");
    cli_status(command, timeout).await
}

async fn cli_status(mut command: Command, timeout: Duration) -> Result<BlockingState> {
    let output = time::timeout(
        timeout,
        command.stdin(Stdio::null()).kill_on_drop(true).output(),
    )
    .await
    .map_err(|_| StatusError::timeout("pihole status"))??;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(StatusError::remote_error(format!(
            "pihole status exited with {}: {}",
            output.status,
            stderr.trim()
        )));
    }
    Ok(parse_cli_status(&String::from_utf8_lossy(&output.stdout)))
}

pub fn parse_cli_status(output: &str) -> BlockingState {
    if output.to_ascii_lowercase().contains("blocking is enabled") {
        BlockingState::Enabled
    } else {
        BlockingState::Disabled
    }
}
