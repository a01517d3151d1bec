//! HTTP client for the broker monitoring endpoints.
//!
//! One [`MonitorClient`] talks to one target. Every call issues exactly one
//! GET bounded by the configured request timeout and decodes the body into
//! the report type implied by the [`ReportKind`]. The client owns its own
//! `reqwest::Client`; nothing is shared with other clients or tests.

use std::time::Duration;

use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use tracing::trace;

use crate::config::{ConnzOptions, TargetConfig};
use crate::error::{ClientError, Result};
use crate::model::{Connz, Varz};
use crate::source::StatsSource;

/// The reports a broker serves on its monitoring port.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReportKind {
    Varz,
    Connz,
}

impl ReportKind {
    /// URL sub-path of the report.
    pub fn path(&self) -> &'static str {
        match self {
            Self::Varz => "varz",
            Self::Connz => "connz",
        }
    }
}

/// A decoded report, tagged by the kind that was requested.
#[derive(Debug, Clone, PartialEq)]
pub enum Report {
    Varz(Varz),
    Connz(Connz),
}

impl Report {
    pub fn kind(&self) -> ReportKind {
        match self {
            Self::Varz(_) => ReportKind::Varz,
            Self::Connz(_) => ReportKind::Connz,
        }
    }

    pub fn into_varz(self) -> Option<Varz> {
        match self {
            Self::Varz(v) => Some(v),
            Self::Connz(_) => None,
        }
    }

    pub fn into_connz(self) -> Option<Connz> {
        match self {
            Self::Connz(c) => Some(c),
            Self::Varz(_) => None,
        }
    }
}

/// Client for a single broker monitoring port.
///
/// Cheap to clone; clones share the connection pool.
#[derive(Debug, Clone)]
pub struct MonitorClient {
    http: reqwest::Client,
    base_url: String,
    connz: ConnzOptions,
    timeout: Duration,
}

impl MonitorClient {
    /// Creates a client for the target described by `config`.
    pub fn new(config: &TargetConfig) -> Result<Self> {
        if config.host.trim().is_empty() {
            return Err(ClientError::invalid_target("empty host"));
        }
        if config.request_timeout.is_zero() {
            return Err(ClientError::invalid_target("request timeout must be positive"));
        }

        let http = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .connect_timeout(config.request_timeout)
            .build()
            .map_err(|e| ClientError::invalid_target(format!("cannot build HTTP client: {}", e)))?;

        let base_url = format!("http://{}", config.authority());
        let parsed = reqwest::Url::parse(&base_url)
            .map_err(|e| ClientError::invalid_target(format!("{}: {}", base_url, e)))?;
        // The host must not spill into userinfo, path, query or fragment.
        if parsed.port_or_known_default() != Some(config.port)
            || parsed.path() != "/"
            || parsed.query().is_some()
            || parsed.fragment().is_some()
            || !parsed.username().is_empty()
            || parsed.password().is_some()
        {
            return Err(ClientError::invalid_target(format!(
                "host {:?} is not a plain host name or address",
                config.host
            )));
        }

        Ok(Self {
            http,
            base_url,
            connz: config.connz.clone(),
            timeout: config.request_timeout,
        })
    }

    /// Base URL of the monitoring port, without trailing slash.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn url_for(&self, kind: ReportKind) -> String {
        format!("{}/{}", self.base_url, kind.path())
    }

    /// Fetches one report.
    ///
    /// `params` are attached to the URL as query parameters, unmodified.
    pub async fn request(&self, kind: ReportKind, params: &[(String, String)]) -> Result<Report> {
        match kind {
            ReportKind::Varz => self.fetch(kind, params).await.map(Report::Varz),
            ReportKind::Connz => self.fetch(kind, params).await.map(Report::Connz),
        }
    }

    /// Fetches `/varz`.
    pub async fn varz(&self) -> Result<Varz> {
        self.fetch(ReportKind::Varz, &[]).await
    }

    /// Fetches `/connz` with the configured [`ConnzOptions`].
    pub async fn connz(&self) -> Result<Connz> {
        self.fetch(ReportKind::Connz, &self.connz.query_pairs()).await
    }

    async fn fetch<T: DeserializeOwned>(
        &self,
        kind: ReportKind,
        params: &[(String, String)],
    ) -> Result<T> {
        let url = self.url_for(kind);
        trace!(url = %url, params = params.len(), timeout_ms = self.timeout.as_millis() as u64, "request");

        let network = |source| ClientError::Network {
            url: url.clone(),
            source,
        };

        let response = self
            .http
            .get(&url)
            .query(params)
            .send()
            .await
            .map_err(network)?;

        let status = response.status();
        if !status.is_success() {
            return Err(ClientError::Status {
                url: url.clone(),
                status,
            });
        }

        let body = response.bytes().await.map_err(network)?;
        decode(kind, status, &body)
    }
}

fn decode<T: DeserializeOwned>(kind: ReportKind, status: StatusCode, body: &[u8]) -> Result<T> {
    serde_json::from_slice(body).map_err(|source| ClientError::Decode {
        path: kind.path(),
        status,
        source,
    })
}

impl StatsSource for MonitorClient {
    async fn varz(&self) -> Result<Varz> {
        MonitorClient::varz(self).await
    }

    async fn connz(&self) -> Result<Connz> {
        MonitorClient::connz(self).await
    }
}
