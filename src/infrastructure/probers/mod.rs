pub mod http;
pub mod tcp;

use async_trait::async_trait;

use crate::domain::entities::check::CheckResult;
use crate::domain::entities::target::Target;
use crate::domain::ports::prober::Prober;
use crate::domain::value_objects::check_kind::CheckKind;

pub use http::HttpProber;
pub use tcp::TcpProber;

/// Routes each target to the prober matching its check kind.
pub struct NetworkProber {
    http: HttpProber,
    tcp: TcpProber,
}

impl NetworkProber {
    /// # Errors
    ///
    /// Returns an error if the underlying HTTP client cannot be built
    /// (e.g. TLS backend failure).
    pub fn new() -> anyhow::Result<Self> {
        Ok(Self {
            http: HttpProber::new()?,
            tcp: TcpProber::new(),
        })
    }
}

#[async_trait]
impl Prober for NetworkProber {
    async fn probe(&self, target: &Target) -> CheckResult {
        match &target.check {
            CheckKind::Tcp { .. } => self.tcp.probe(target).await,
            CheckKind::Http { .. } | CheckKind::Latency { .. } | CheckKind::Value { .. } => {
                self.http.probe(target).await
            }
        }
    }
}
