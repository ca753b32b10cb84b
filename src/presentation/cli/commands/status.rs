use colored::Colorize;
use serde_json::json;

use crate::domain::entities::state::TargetState;
use crate::domain::ports::store::{AlertStore, StatusStore};
use crate::domain::value_objects::delivery_status::DeliveryStatus;
use crate::domain::value_objects::health_status::HealthStatus;

const RECENT_ALERT_COUNT: usize = 10;

/// Print every tracked target's current health and the most recent
/// alerts, as written by a running (or previously run) daemon.
///
/// # Errors
///
/// Returns an error if the store cannot be read or JSON serialization
/// fails.
pub fn run_status(
    status_store: &dyn StatusStore,
    alert_store: &dyn AlertStore,
    json: bool,
) -> anyhow::Result<()> {
    let states = status_store
        .all_states()
        .map_err(|e| anyhow::anyhow!("failed to read target states: {e}"))?;
    let alerts = alert_store
        .recent_alerts(RECENT_ALERT_COUNT)
        .map_err(|e| anyhow::anyhow!("failed to read alerts: {e}"))?;

    if json {
        let output = json!({
            "targets": states,
            "recent_alerts": alerts,
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    if states.is_empty() {
        println!("{}", "no tracked targets — is the daemon running?".dimmed());
        return Ok(());
    }

    for state in &states {
        print_state_line(state);
    }

    if !alerts.is_empty() {
        println!("\n{}", "Recent alerts".bold().underline());
        for alert in &alerts {
            let delivery = match alert.delivery {
                DeliveryStatus::Delivered => "delivered".green(),
                DeliveryStatus::Failed => "FAILED".red().bold(),
                DeliveryStatus::Pending => "pending".dimmed(),
            };
            println!(
                "  {} {} {} \u{2192} {} ({delivery})",
                alert.timestamp.format("%d/%m %H:%M").to_string().dimmed(),
                alert.target_id.bold(),
                status_badge(alert.from),
                status_badge(alert.to),
            );
        }
    }

    Ok(())
}

fn print_state_line(state: &TargetState) {
    let streak = match state.status {
        HealthStatus::Healthy => format!("{} consecutive ok", state.consecutive_successes),
        HealthStatus::Degraded | HealthStatus::Down => {
            format!("{} consecutive failures", state.consecutive_failures)
        }
        HealthStatus::Unknown => "no settled result yet".to_string(),
    };
    let since = state.last_transition.map_or_else(
        || "never transitioned".dimmed(),
        |t| format!("since {}", t.format("%d/%m %H:%M:%S")).dimmed(),
    );
    let detail = state
        .last_result
        .as_ref()
        .and_then(|r| r.error.as_ref())
        .map(|e| format!(" — {}", e.detail).red())
        .unwrap_or_else(|| String::new().normal());

    println!(
        "{} {} {} ({streak}, {since}){detail}",
        state.status.symbol(),
        state.target_id.bold(),
        status_badge(state.status),
    );
}

fn status_badge(status: HealthStatus) -> colored::ColoredString {
    let label = status.to_string();
    match status {
        HealthStatus::Healthy => label.green().bold(),
        HealthStatus::Degraded => label.yellow().bold(),
        HealthStatus::Down => label.red().bold(),
        HealthStatus::Unknown => label.dimmed(),
    }
}
