use async_trait::async_trait;

use crate::domain::entities::check::CheckResult;
use crate::domain::entities::target::Target;

/// Executes a single health check against a target.
///
/// Probing is infallible by contract: network and timeout conditions map
/// to a failed [`CheckResult`], never an error. Registry validation is
/// where malformed configuration is rejected; anything that only surfaces
/// at dial time (DNS, bad address syntax the resolver catches) comes back
/// as a `ProtocolError` result.
///
/// Implementations must complete within `target.timeout`; exceeding it
/// yields a `Timeout` result.
#[async_trait]
pub trait Prober: Send + Sync {
    async fn probe(&self, target: &Target) -> CheckResult;
}
