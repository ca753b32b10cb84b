use std::time::{Duration, Instant};

use async_trait::async_trait;

use crate::domain::entities::check::CheckResult;
use crate::domain::entities::target::Target;
use crate::domain::ports::prober::Prober;
use crate::domain::value_objects::check_kind::CheckKind;
use crate::domain::value_objects::probe_error::ProbeErrorKind;

/// HTTP-based probes: status checks, latency checks, and JSON reading
/// checks.
///
/// The client carries no global timeout; every request is bounded by the
/// target's own timeout instead, so two targets with different budgets can
/// share the same connection pool.
pub struct HttpProber {
    client: reqwest::Client,
}

impl HttpProber {
    pub fn new() -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("remonitor/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { client })
    }

    async fn request(&self, target: &Target, url: &str) -> Result<reqwest::Response, CheckResult> {
        let start = Instant::now();
        match tokio::time::timeout(target.timeout, self.client.get(url).send()).await {
            Ok(Ok(response)) => Ok(response),
            Ok(Err(e)) => {
                let kind = if e.is_timeout() {
                    ProbeErrorKind::Timeout
                } else if e.is_connect() {
                    ProbeErrorKind::ConnectionRefused
                } else {
                    ProbeErrorKind::ProtocolError
                };
                Err(CheckResult::failure(
                    &target.id,
                    start.elapsed(),
                    kind,
                    e.to_string(),
                ))
            }
            Err(_) => Err(CheckResult::failure(
                &target.id,
                start.elapsed(),
                ProbeErrorKind::Timeout,
                format!("no response within {:?}", target.timeout),
            )),
        }
    }
}

#[async_trait]
impl Prober for HttpProber {
    async fn probe(&self, target: &Target) -> CheckResult {
        match &target.check {
            CheckKind::Http { url, expect_status } => {
                let start = Instant::now();
                let response = match self.request(target, url).await {
                    Ok(r) => r,
                    Err(failure) => return failure,
                };
                let latency = start.elapsed();
                let status = response.status().as_u16();
                if status == *expect_status {
                    CheckResult::success(&target.id, latency)
                } else {
                    CheckResult::failure(
                        &target.id,
                        latency,
                        ProbeErrorKind::UnexpectedStatus,
                        format!("got {status}, expected {expect_status}"),
                    )
                }
            }
            CheckKind::Latency { url, max_ms } => {
                let start = Instant::now();
                let response = match self.request(target, url).await {
                    Ok(r) => r,
                    Err(failure) => return failure,
                };
                let latency = start.elapsed();
                let status = response.status();
                if !status.is_success() {
                    return CheckResult::failure(
                        &target.id,
                        latency,
                        ProbeErrorKind::UnexpectedStatus,
                        format!("got {}, expected a success status", status.as_u16()),
                    );
                }
                if latency > Duration::from_millis(*max_ms) {
                    CheckResult::failure(
                        &target.id,
                        latency,
                        ProbeErrorKind::Timeout,
                        format!("responded in {}ms, budget is {max_ms}ms", latency.as_millis()),
                    )
                } else {
                    CheckResult::success(&target.id, latency)
                }
            }
            CheckKind::Value {
                url,
                pointer,
                offset,
                min,
                max,
            } => {
                let start = Instant::now();
                let response = match self.request(target, url).await {
                    Ok(r) => r,
                    Err(failure) => return failure,
                };
                let status = response.status();
                if !status.is_success() {
                    return CheckResult::failure(
                        &target.id,
                        start.elapsed(),
                        ProbeErrorKind::UnexpectedStatus,
                        format!("got {}, expected a success status", status.as_u16()),
                    );
                }
                let body: serde_json::Value = match response.json().await {
                    Ok(body) => body,
                    Err(e) => {
                        return CheckResult::failure(
                            &target.id,
                            start.elapsed(),
                            ProbeErrorKind::ProtocolError,
                            format!("response is not valid JSON: {e}"),
                        );
                    }
                };
                let latency = start.elapsed();
                match evaluate_reading(&body, pointer, *offset, *min, *max) {
                    Ok(_) => CheckResult::success(&target.id, latency),
                    Err((kind, detail)) => {
                        CheckResult::failure(&target.id, latency, kind, detail)
                    }
                }
            }
            CheckKind::Tcp { .. } => CheckResult::failure(
                &target.id,
                Duration::ZERO,
                ProbeErrorKind::ProtocolError,
                format!("http prober cannot run check '{}'", target.check),
            ),
        }
    }
}

/// Read the number at `pointer`, apply `offset`, check the bounds.
///
/// A document without a reading at the pointer fails the same way an
/// out-of-range reading does: the endpoint answered, but not with what
/// the check expects.
fn evaluate_reading(
    body: &serde_json::Value,
    pointer: &str,
    offset: f64,
    min: Option<f64>,
    max: Option<f64>,
) -> Result<f64, (ProbeErrorKind, String)> {
    let raw = body
        .pointer(pointer)
        .and_then(serde_json::Value::as_f64)
        .ok_or_else(|| {
            (
                ProbeErrorKind::UnexpectedStatus,
                format!("no numeric reading at '{pointer}'"),
            )
        })?;
    let reading = raw + offset;

    if let Some(min) = min {
        if reading < min {
            return Err((
                ProbeErrorKind::UnexpectedStatus,
                format!("reading {reading} below minimum {min}"),
            ));
        }
    }
    if let Some(max) = max {
        if reading > max {
            return Err((
                ProbeErrorKind::UnexpectedStatus,
                format!("reading {reading} above maximum {max}"),
            ));
        }
    }
    Ok(reading)
}
