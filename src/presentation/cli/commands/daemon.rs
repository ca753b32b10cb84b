use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::signal::unix::{SignalKind, signal};
use tokio::sync::{mpsc, watch};

use crate::application::config::AppConfig;
use crate::application::registry_handle::RegistryHandle;
use crate::application::services::{
    AlertDispatcher, DispatchPolicy, Scheduler, SchedulerOptions, StateTracker, run_tracker,
};
use crate::domain::ports::channel::NotificationChannel;
use crate::domain::ports::prober::Prober;
use crate::domain::ports::store::{AlertStore, StatusStore};

const RESULT_CHANNEL_CAPACITY: usize = 1024;
const TRANSITION_CHANNEL_CAPACITY: usize = 256;

/// Run the monitoring pipeline until SIGINT.
///
/// Wires three long-lived tasks together: the scheduler probes targets and
/// feeds results to the state tracker, which feeds confirmed transitions to
/// the alert dispatcher. SIGHUP reloads the configuration from
/// `config_path`; a reload that fails to parse or validate is logged and
/// the running target set is kept.
///
/// Shutdown cascades through the channels: stopping the scheduler closes
/// the result channel, which stops the tracker and closes the transition
/// channel, which lets the dispatcher flush held notifications and drain
/// outstanding deliveries before this function returns.
///
/// # Errors
///
/// Returns an error if the SIGHUP handler cannot be installed.
pub async fn run_daemon(
    config: &AppConfig,
    config_path: PathBuf,
    registry: RegistryHandle,
    prober: Arc<dyn Prober>,
    channel: Arc<dyn NotificationChannel>,
    status_store: Arc<dyn StatusStore>,
    alert_store: Arc<dyn AlertStore>,
) -> anyhow::Result<()> {
    let (results_tx, results_rx) = mpsc::channel(RESULT_CHANNEL_CAPACITY);
    let (transitions_tx, transitions_rx) = mpsc::channel(TRANSITION_CHANNEL_CAPACITY);
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let scheduler = Scheduler::new(
        registry.clone(),
        prober,
        results_tx,
        SchedulerOptions::from(&config.scheduler),
    );
    let dispatcher = AlertDispatcher::new(
        channel,
        alert_store,
        registry.clone(),
        DispatchPolicy::from(&config.dispatcher),
    );

    let scheduler_task = tokio::spawn(scheduler.run(shutdown_rx));
    let tracker_task = tokio::spawn(run_tracker(
        StateTracker::new(),
        registry.clone(),
        results_rx,
        transitions_tx,
        status_store,
    ));
    let dispatcher_task = tokio::spawn(dispatcher.run(transitions_rx));

    tracing::info!(
        "daemon started, monitoring {} target(s)",
        registry.current().len()
    );

    let mut hangup = signal(SignalKind::hangup())?;
    let interrupt = tokio::signal::ctrl_c();
    tokio::pin!(interrupt);

    loop {
        tokio::select! {
            _ = &mut interrupt => {
                tracing::info!("shutdown signal received, stopping");
                break;
            }
            _ = hangup.recv() => {
                reload(&registry, &config_path);
            }
        }
    }

    // Ignoring the send error: receivers only drop once the tasks below
    // have already finished.
    let _ = shutdown_tx.send(true);

    for (name, task) in [
        ("scheduler", scheduler_task),
        ("tracker", tracker_task),
        ("dispatcher", dispatcher_task),
    ] {
        if task.await.is_err() {
            tracing::error!("{name} task panicked during shutdown");
        }
    }

    tracing::info!("daemon stopped");
    Ok(())
}

fn reload(registry: &RegistryHandle, config_path: &Path) {
    tracing::info!("SIGHUP received, reloading configuration");
    let reloaded = AppConfig::load_from(config_path).and_then(|config| {
        config
            .build_registry()
            .map_err(|e| anyhow::anyhow!("invalid target set: {e}"))
    });
    match reloaded {
        Ok(new_registry) => {
            tracing::info!("reload applied, {} target(s)", new_registry.len());
            registry.swap(new_registry);
        }
        Err(e) => {
            tracing::warn!("reload rejected, keeping current targets: {e}");
        }
    }
}
