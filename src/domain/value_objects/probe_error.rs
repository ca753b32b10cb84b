use serde::{Deserialize, Serialize};

/// Classification of a failed probe.
///
/// Network and timeout conditions are data, not errors: they are carried
/// inside a failed `CheckResult` and never abort the scheduler.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ProbeErrorKind {
    /// The probe did not complete within the target's timeout
    Timeout,
    /// The remote end actively refused the connection
    ConnectionRefused,
    /// The exchange failed below the application level (DNS, TLS, I/O)
    ProtocolError,
    /// The target answered, but not with the expected status
    UnexpectedStatus,
}

impl std::fmt::Display for ProbeErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Timeout => write!(f, "timeout"),
            Self::ConnectionRefused => write!(f, "connection refused"),
            Self::ProtocolError => write!(f, "protocol error"),
            Self::UnexpectedStatus => write!(f, "unexpected status"),
        }
    }
}
