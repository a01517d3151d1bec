//! Broker monitoring reports.
//!
//! Wire shapes of the two JSON documents served by the broker's monitoring
//! port:
//! - `/varz`: server-wide runtime metrics ([`Varz`])
//! - `/connz`: the connection table ([`Connz`], [`ConnInfo`])
//!
//! Counters are cumulative since server start. Fields the dashboard depends
//! on are required; everything else defaults when the server omits it, and
//! unknown fields are ignored.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// Server runtime metrics from `/varz`.
#[derive(Clone, Serialize, Deserialize, Debug, PartialEq)]
pub struct Varz {
    #[serde(default)]
    pub server_id: String,
    #[serde(default)]
    pub version: String,
    /// Go runtime version of the server.
    #[serde(default)]
    pub go: String,
    #[serde(default)]
    pub host: String,
    #[serde(default)]
    pub port: u16,
    #[serde(default)]
    pub auth_required: bool,
    #[serde(default)]
    pub ssl_required: bool,
    #[serde(default)]
    pub max_payload: i64,
    #[serde(default)]
    pub max_connections: i64,

    /// Server start time.
    pub start: DateTime<Utc>,
    /// Server clock when the report was produced.
    #[serde(default)]
    pub now: Option<DateTime<Utc>>,
    /// Human-readable uptime as reported by the server ("1d2h3m4s").
    pub uptime: String,

    /// Resident memory in bytes.
    pub mem: i64,
    pub cores: i32,
    /// CPU usage in percent.
    pub cpu: f64,

    /// Currently open client connections.
    pub connections: i64,
    #[serde(default)]
    pub total_connections: u64,
    #[serde(default)]
    pub routes: i64,
    #[serde(default)]
    pub remotes: i64,

    pub in_msgs: i64,
    pub out_msgs: i64,
    pub in_bytes: i64,
    pub out_bytes: i64,

    #[serde(default)]
    pub slow_consumers: i64,
    #[serde(default)]
    pub subscriptions: u32,
    #[serde(default, deserialize_with = "null_as_default")]
    pub http_req_stats: HashMap<String, u64>,
}

/// Connection table from `/connz`.
#[derive(Clone, Serialize, Deserialize, Debug, PartialEq)]
pub struct Connz {
    #[serde(default)]
    pub now: Option<DateTime<Utc>>,
    pub num_connections: i64,
    #[serde(default)]
    pub total: i64,
    #[serde(default)]
    pub offset: i64,
    /// Connection limit applied by the server (1024 unless overridden).
    pub limit: i64,
    /// Per-connection records, in the server's sort order.
    /// The server sends `null` for an empty table.
    #[serde(default, deserialize_with = "null_as_default")]
    pub connections: Vec<ConnInfo>,
}

/// One row of the connection table.
#[derive(Clone, Serialize, Deserialize, Debug, PartialEq)]
pub struct ConnInfo {
    pub cid: u64,
    #[serde(default)]
    pub ip: String,
    #[serde(default)]
    pub port: u16,
    #[serde(default)]
    pub start: Option<DateTime<Utc>>,
    #[serde(default)]
    pub last_activity: Option<DateTime<Utc>>,
    #[serde(default)]
    pub uptime: String,
    #[serde(default)]
    pub idle: String,
    /// Bytes queued for delivery to this client.
    #[serde(default, alias = "pending_size")]
    pub pending_bytes: i64,
    pub in_msgs: i64,
    pub out_msgs: i64,
    pub in_bytes: i64,
    pub out_bytes: i64,
    /// Number of subscriptions held by this client.
    #[serde(default)]
    pub subscriptions: u32,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub lang: String,
    #[serde(default)]
    pub version: String,
    /// Subject list, only filled when requested with `subs=1`.
    #[serde(default, deserialize_with = "null_as_default")]
    pub subscriptions_list: Vec<String>,
}

impl ConnInfo {
    /// `ip:port` of the client.
    pub fn address(&self) -> String {
        format!("{}:{}", self.ip, self.port)
    }
}

/// Go encodes nil slices and maps as `null`.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}
