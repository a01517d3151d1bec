//! Monitoring target configuration.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// Default broker monitoring port.
pub const DEFAULT_MONITOR_PORT: u16 = 8222;

/// Default delay between samples.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(1);

/// Default upper bound for a single HTTP request.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(5);

/// Where and how often to sample.
///
/// Built once by the caller and handed to a sampling loop, which never
/// mutates it.
#[derive(Debug, Clone, PartialEq)]
pub struct TargetConfig {
    pub host: String,
    pub port: u16,
    pub poll_interval: Duration,
    pub request_timeout: Duration,
    pub connz: ConnzOptions,
}

impl Default for TargetConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: DEFAULT_MONITOR_PORT,
            poll_interval: DEFAULT_POLL_INTERVAL,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            connz: ConnzOptions::default(),
        }
    }
}

impl TargetConfig {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            ..Self::default()
        }
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn with_connz(mut self, connz: ConnzOptions) -> Self {
        self.connz = connz;
        self
    }

    /// `host:port`, bracketing IPv6 literals.
    pub fn authority(&self) -> String {
        if self.host.contains(':') && !self.host.starts_with('[') {
            format!("[{}]:{}", self.host, self.port)
        } else {
            format!("{}:{}", self.host, self.port)
        }
    }
}

// ---------------------------------------------------------------------------
// /connz query options
// ---------------------------------------------------------------------------

/// Server-side sort keys accepted by `/connz?sort=`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOpt {
    #[default]
    Cid,
    Subs,
    Pending,
    MsgsTo,
    MsgsFrom,
    BytesTo,
    BytesFrom,
    Last,
    Idle,
    Uptime,
}

impl SortOpt {
    pub const ALL: [SortOpt; 10] = [
        SortOpt::Cid,
        SortOpt::Subs,
        SortOpt::Pending,
        SortOpt::MsgsTo,
        SortOpt::MsgsFrom,
        SortOpt::BytesTo,
        SortOpt::BytesFrom,
        SortOpt::Last,
        SortOpt::Idle,
        SortOpt::Uptime,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Cid => "cid",
            Self::Subs => "subs",
            Self::Pending => "pending",
            Self::MsgsTo => "msgs_to",
            Self::MsgsFrom => "msgs_from",
            Self::BytesTo => "bytes_to",
            Self::BytesFrom => "bytes_from",
            Self::Last => "last",
            Self::Idle => "idle",
            Self::Uptime => "uptime",
        }
    }
}

impl fmt::Display for SortOpt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SortOpt {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|opt| opt.as_str() == s)
            .ok_or_else(|| format!("unknown sort option '{}'", s))
    }
}

/// Query parameters forwarded on every `/connz` request.
///
/// `None` fields are left out so the broker applies its own defaults
/// (including the 1024 connection limit).
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ConnzOptions {
    pub limit: Option<u32>,
    pub offset: Option<u32>,
    pub sort: Option<SortOpt>,
    pub subscriptions: bool,
}

impl ConnzOptions {
    pub fn query_pairs(&self) -> Vec<(String, String)> {
        let mut pairs = Vec::new();
        if let Some(limit) = self.limit {
            pairs.push(("limit".to_string(), limit.to_string()));
        }
        if let Some(offset) = self.offset {
            pairs.push(("offset".to_string(), offset.to_string()));
        }
        if let Some(sort) = self.sort {
            pairs.push(("sort".to_string(), sort.as_str().to_string()));
        }
        if self.subscriptions {
            pairs.push(("subs".to_string(), "1".to_string()));
        }
        pairs
    }
}
