use colored::Colorize;

use crate::application::config::AppConfig;

/// Validate the configured target set without probing anything.
///
/// # Errors
///
/// Returns an error if any target fails validation (duplicate id, zero
/// interval or timeout, inconsistent thresholds).
pub fn run_validate(config: &AppConfig) -> anyhow::Result<()> {
    let registry = config.build_registry()?;

    for target in registry.all() {
        println!(
            "{} {} every {}s, timeout {}s",
            target.id.bold(),
            target.check.to_string().dimmed(),
            target.interval.as_secs(),
            target.timeout.as_secs()
        );
    }
    println!(
        "\n{}",
        format!("configuration valid, {} target(s)", registry.len()).green()
    );
    Ok(())
}
