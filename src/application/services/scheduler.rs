use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{Semaphore, mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::application::config::SchedulerConfig;
use crate::application::registry_handle::RegistryHandle;
use crate::domain::entities::check::CheckResult;
use crate::domain::ports::prober::Prober;

#[derive(Debug, Clone)]
pub struct SchedulerOptions {
    pub max_concurrent_probes: usize,
    pub grace_period: Duration,
}

impl From<&SchedulerConfig> for SchedulerOptions {
    fn from(config: &SchedulerConfig) -> Self {
        Self {
            max_concurrent_probes: config.max_concurrent_probes.max(1),
            grace_period: Duration::from_secs(config.grace_period_secs),
        }
    }
}

/// Drives periodic probing: one tick loop per target, probes bounded by a
/// shared semaphore.
///
/// Each loop follows its own cadence independently of the others. A target
/// whose probe is still outstanding when its next tick fires skips that
/// tick rather than queueing behind itself. Excess due probes across
/// targets queue FIFO on the semaphore.
///
/// On shutdown no new probes start; outstanding ones get the grace period
/// to finish, then are aborted.
pub struct Scheduler {
    registry: RegistryHandle,
    prober: Arc<dyn Prober>,
    results: mpsc::Sender<CheckResult>,
    options: SchedulerOptions,
}

impl Scheduler {
    #[must_use]
    pub fn new(
        registry: RegistryHandle,
        prober: Arc<dyn Prober>,
        results: mpsc::Sender<CheckResult>,
        options: SchedulerOptions,
    ) -> Self {
        Self {
            registry,
            prober,
            results,
            options,
        }
    }

    /// Run until the shutdown signal flips, then drain target loops.
    pub async fn run(self, shutdown: watch::Receiver<bool>) {
        let limit = Arc::new(Semaphore::new(self.options.max_concurrent_probes));
        let mut reloads = self.registry.subscribe();
        let mut stop = shutdown.clone();
        let mut loops: HashMap<String, JoinHandle<()>> = HashMap::new();

        self.spawn_missing(&mut loops, &limit, &shutdown);
        tracing::info!("scheduler started with {} target loop(s)", loops.len());

        loop {
            tokio::select! {
                changed = reloads.changed() => {
                    if changed.is_err() {
                        break;
                    }
                    // Loops whose target disappeared exit at their next
                    // tick; here we only add loops for new targets.
                    loops.retain(|_, handle| !handle.is_finished());
                    self.spawn_missing(&mut loops, &limit, &shutdown);
                    tracing::info!("registry reloaded, {} target loop(s) active", loops.len());
                }
                _ = stop.changed() => {
                    tracing::info!("scheduler stopping, draining in-flight probes");
                    break;
                }
            }
        }

        for (id, handle) in loops {
            if handle.await.is_err() {
                tracing::warn!("target loop for '{id}' panicked");
            }
        }
    }

    fn spawn_missing(
        &self,
        loops: &mut HashMap<String, JoinHandle<()>>,
        limit: &Arc<Semaphore>,
        shutdown: &watch::Receiver<bool>,
    ) {
        for target in self.registry.current().all() {
            if loops.contains_key(&target.id) {
                continue;
            }
            let handle = tokio::spawn(target_loop(
                target.id.clone(),
                self.registry.clone(),
                Arc::clone(&self.prober),
                self.results.clone(),
                Arc::clone(limit),
                shutdown.clone(),
                self.options.grace_period,
            ));
            loops.insert(target.id.clone(), handle);
        }
    }
}

/// Tick loop for one target. Exits when the target disappears from the
/// registry or the shutdown signal flips.
#[allow(clippy::too_many_arguments)]
async fn target_loop(
    id: String,
    registry: RegistryHandle,
    prober: Arc<dyn Prober>,
    results: mpsc::Sender<CheckResult>,
    limit: Arc<Semaphore>,
    mut shutdown: watch::Receiver<bool>,
    grace: Duration,
) {
    let Some(mut interval_len) = registry.current().get(&id).map(|t| t.interval) else {
        return;
    };
    let mut ticker = tokio::time::interval(interval_len);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    let mut in_flight: Option<JoinHandle<()>> = None;

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let snapshot = registry.current();
                let Some(target) = snapshot.get(&id) else {
                    tracing::debug!(target_id = %id, "target removed from registry, stopping loop");
                    break;
                };
                if target.interval != interval_len {
                    interval_len = target.interval;
                    ticker = tokio::time::interval_at(
                        tokio::time::Instant::now() + interval_len,
                        interval_len,
                    );
                    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
                }

                // No overlapping probes for one target: a due tick with the
                // previous probe still outstanding is skipped, not queued.
                if in_flight.as_ref().is_some_and(|h| !h.is_finished()) {
                    tracing::debug!(target_id = %id, "previous probe still running, skipping tick");
                    continue;
                }

                let target = target.clone();
                let prober = Arc::clone(&prober);
                let results = results.clone();
                let limit = Arc::clone(&limit);
                in_flight = Some(tokio::spawn(async move {
                    let Ok(_permit) = limit.acquire_owned().await else {
                        return;
                    };
                    let result = prober.probe(&target).await;
                    if results.send(result).await.is_err() {
                        tracing::debug!(target_id = %target.id, "result channel closed");
                    }
                }));
            }
            _ = shutdown.changed() => break,
        }
    }

    if let Some(mut handle) = in_flight {
        if !handle.is_finished() && tokio::time::timeout(grace, &mut handle).await.is_err() {
            tracing::warn!(target_id = %id, "probe did not finish within grace period, aborting");
            handle.abort();
        }
    }
}
