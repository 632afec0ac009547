pub mod app;
pub mod client;
pub mod config;
pub mod liveness;
pub mod poller;
pub mod series;
pub mod ui;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// Last known heartbeat of one fleet member, as returned by `GET /servers`.
///
/// `last_seen` is parsed leniently: a missing or unparsable timestamp becomes
/// `None`, which downstream liveness treats as dead rather than an error.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerRecord {
    pub server_id: String,
    #[serde(default, deserialize_with = "lenient_timestamp")]
    pub last_seen: Option<DateTime<Utc>>,
    #[serde(default)]
    pub ip_address: String,
}

/// One immutable metric observation from `GET /metrics/{server_id}`.
///
/// `resource` is the empty string for the server-aggregate reading and names
/// a sub-resource (a core, a mount point) otherwise. `tags` is opaque.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricRecord {
    pub time: DateTime<Utc>,
    pub server_id: String,
    pub metric_type: String,
    #[serde(default)]
    pub resource: String,
    pub value: f64,
    #[serde(default)]
    pub tags: serde_json::Value,
}

/// Latest reported health code of one monitored service on a server.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceStatusRecord {
    pub service_name: String,
    pub status: i64,
    #[serde(default, deserialize_with = "lenient_timestamp")]
    pub last_seen: Option<DateTime<Utc>>,
}

fn lenient_timestamp<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    Ok(raw.and_then(|s| {
        DateTime::parse_from_rfc3339(&s)
            .ok()
            .map(|t| t.with_timezone(&Utc))
    }))
}
