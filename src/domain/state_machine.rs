//! Health state machine.
//!
//! The transition function is pure: state + thresholds + result in,
//! optional transition out. No I/O, no clock access beyond the result's
//! own timestamp, so the debounce and escalation rules are testable in
//! isolation.

use crate::domain::entities::alert::Transition;
use crate::domain::entities::check::CheckResult;
use crate::domain::entities::state::TargetState;
use crate::domain::entities::target::Target;
use crate::domain::value_objects::health_status::HealthStatus;

/// Applies one check result to a target's state.
///
/// Streak bookkeeping always happens; a [`Transition`] is returned if and
/// only if the status actually changed. Repeated identical-status updates
/// return `None`.
pub fn apply(state: &mut TargetState, target: &Target, result: &CheckResult) -> Option<Transition> {
    let previous = state.status;

    if result.success {
        state.consecutive_successes += 1;
        state.consecutive_failures = 0;
        if previous != HealthStatus::Healthy
            && state.consecutive_successes >= target.recovery_threshold
        {
            state.status = HealthStatus::Healthy;
        }
    } else {
        state.consecutive_failures += 1;
        state.consecutive_successes = 0;
        if state.consecutive_failures >= target.hard_failure_threshold {
            state.status = HealthStatus::Down;
        } else if state.consecutive_failures >= target.failure_threshold
            && matches!(previous, HealthStatus::Healthy | HealthStatus::Unknown)
        {
            state.status = HealthStatus::Degraded;
        }
    }

    state.last_result = Some(result.clone());

    if state.status == previous {
        return None;
    }

    state.last_transition = Some(result.timestamp);
    Some(Transition {
        target_id: state.target_id.clone(),
        from: previous,
        to: state.status,
        timestamp: result.timestamp,
    })
}
