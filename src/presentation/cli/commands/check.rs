use colored::Colorize;
use serde_json::json;

use crate::application::config::AppConfig;
use crate::domain::entities::check::CheckResult;
use crate::domain::ports::prober::Prober;

/// Probe every configured target once and print the outcome.
///
/// One-shot diagnostic: no scheduling, no state tracking, no alerting.
/// Targets are probed sequentially in registration order.
///
/// # Errors
///
/// Returns an error if the configured target set fails validation.
pub async fn run_check(config: &AppConfig, prober: &dyn Prober, json: bool) -> anyhow::Result<()> {
    let registry = config.build_registry()?;

    let mut results = Vec::with_capacity(registry.len());
    for target in registry.all() {
        results.push(prober.probe(target).await);
    }

    if json {
        print_json(&results)?;
    } else {
        print_table(&results);
    }

    Ok(())
}

fn print_json(results: &[CheckResult]) -> anyhow::Result<()> {
    let entries: Vec<serde_json::Value> = results
        .iter()
        .map(|r| {
            json!({
                "target": r.target_id,
                "success": r.success,
                "latency_ms": u64::try_from(r.latency.as_millis()).unwrap_or(u64::MAX),
                "error": r.error.as_ref().map(|e| json!({
                    "kind": e.kind,
                    "detail": e.detail,
                })),
            })
        })
        .collect();
    println!("{}", serde_json::to_string_pretty(&entries)?);
    Ok(())
}

fn print_table(results: &[CheckResult]) {
    let mut failures = 0usize;
    for result in results {
        let latency = format!("{}ms", result.latency.as_millis()).dimmed();
        match &result.error {
            None => {
                println!("{} {} {latency}", "\u{2713}".green(), result.target_id.bold());
            }
            Some(failure) => {
                failures += 1;
                println!(
                    "{} {} {latency} {} {}",
                    "\u{2717}".red(),
                    result.target_id.bold(),
                    failure.kind.to_string().red(),
                    failure.detail.dimmed()
                );
            }
        }
    }

    let summary = format!("{} target(s), {failures} failing", results.len());
    if failures == 0 {
        println!("\n{}", summary.green());
    } else {
        println!("\n{}", summary.red());
    }
}
