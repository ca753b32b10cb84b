use std::time::Instant;

use async_trait::async_trait;
use tokio::net::TcpStream;

use crate::domain::entities::check::CheckResult;
use crate::domain::entities::target::Target;
use crate::domain::ports::prober::Prober;
use crate::domain::value_objects::check_kind::CheckKind;
use crate::domain::value_objects::probe_error::ProbeErrorKind;

/// Reachability probe: a successful TCP connect within the target's
/// timeout counts as healthy.
#[derive(Default)]
pub struct TcpProber;

impl TcpProber {
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Prober for TcpProber {
    async fn probe(&self, target: &Target) -> CheckResult {
        let CheckKind::Tcp { addr } = &target.check else {
            return CheckResult::failure(
                &target.id,
                std::time::Duration::ZERO,
                ProbeErrorKind::ProtocolError,
                format!("tcp prober cannot run check '{}'", target.check),
            );
        };

        let start = Instant::now();
        let outcome = tokio::time::timeout(target.timeout, TcpStream::connect(addr)).await;
        let latency = start.elapsed();

        match outcome {
            Ok(Ok(_stream)) => CheckResult::success(&target.id, latency),
            Ok(Err(e)) if e.kind() == std::io::ErrorKind::ConnectionRefused => {
                CheckResult::failure(
                    &target.id,
                    latency,
                    ProbeErrorKind::ConnectionRefused,
                    e.to_string(),
                )
            }
            Ok(Err(e)) => CheckResult::failure(
                &target.id,
                latency,
                ProbeErrorKind::ProtocolError,
                e.to_string(),
            ),
            Err(_) => CheckResult::failure(
                &target.id,
                latency,
                ProbeErrorKind::Timeout,
                format!("no connection within {:?}", target.timeout),
            ),
        }
    }
}
