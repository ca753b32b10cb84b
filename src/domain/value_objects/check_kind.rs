use serde::{Deserialize, Serialize};

/// The kind of health check to run against a target.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CheckKind {
    /// TCP reachability: a successful connect within the timeout
    Tcp { addr: String },
    /// HTTP status check: the response status must match `expect_status`
    Http {
        url: String,
        #[serde(default = "default_expect_status")]
        expect_status: u16,
    },
    /// HTTP latency check: the response must arrive within `max_ms`
    Latency { url: String, max_ms: u64 },
    /// JSON reading check: fetch a JSON document, read the number at
    /// `pointer` (RFC 6901), add `offset`, and require the adjusted
    /// reading to stay inside the optional `min`/`max` bounds
    Value {
        url: String,
        pointer: String,
        #[serde(default)]
        offset: f64,
        #[serde(default)]
        min: Option<f64>,
        #[serde(default)]
        max: Option<f64>,
    },
}

const fn default_expect_status() -> u16 {
    200
}

impl std::fmt::Display for CheckKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Tcp { addr } => write!(f, "tcp {addr}"),
            Self::Http { url, expect_status } => write!(f, "http {url} ({expect_status})"),
            Self::Latency { url, max_ms } => write!(f, "latency {url} (<{max_ms}ms)"),
            Self::Value { url, pointer, .. } => write!(f, "value {url} {pointer}"),
        }
    }
}
