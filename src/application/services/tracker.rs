use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::mpsc;

use crate::application::registry_handle::RegistryHandle;
use crate::domain::entities::alert::Transition;
use crate::domain::entities::check::CheckResult;
use crate::domain::entities::state::TargetState;
use crate::domain::entities::target::Target;
use crate::domain::ports::store::StatusStore;
use crate::domain::state_machine;

/// Owns the live `TargetState` for every target.
///
/// Single-writer discipline: the tracker is the only component that
/// mutates health state, and it does so through the pure transition
/// function. In the daemon it runs as one consumer task, which serializes
/// updates per target by construction.
#[derive(Default)]
pub struct StateTracker {
    states: HashMap<String, TargetState>,
}

impl StateTracker {
    #[must_use]
    pub fn new() -> Self {
        Self {
            states: HashMap::new(),
        }
    }

    /// Apply one result, returning a transition iff the status changed.
    pub fn update(&mut self, target: &Target, result: &CheckResult) -> Option<Transition> {
        let state = self
            .states
            .entry(target.id.clone())
            .or_insert_with(|| TargetState::new(&target.id));
        state_machine::apply(state, target, result)
    }

    #[must_use]
    pub fn state(&self, target_id: &str) -> Option<&TargetState> {
        self.states.get(target_id)
    }

    /// Drop states for targets that are no longer registered.
    pub fn prune(&mut self, keep: impl Fn(&str) -> bool) {
        self.states.retain(|id, _| keep(id));
    }
}

/// Consumer task: applies probe results to the tracker, mirrors states
/// into the status store, and forwards transitions to the dispatcher.
///
/// Results for targets absent from the current registry are discarded —
/// in-flight probes against removed targets are allowed to finish, their
/// outcome just no longer matters.
///
/// Ends when the result channel closes (the scheduler has drained).
pub async fn run_tracker(
    mut tracker: StateTracker,
    registry: RegistryHandle,
    mut results: mpsc::Receiver<CheckResult>,
    transitions: mpsc::Sender<Transition>,
    status_store: Arc<dyn StatusStore>,
) {
    let mut reloads = registry.subscribe();

    loop {
        tokio::select! {
            maybe_result = results.recv() => {
                let Some(result) = maybe_result else { break };
                handle_result(&mut tracker, &registry, &result, &transitions, &status_store);
            }
            changed = reloads.changed() => {
                if changed.is_err() {
                    continue;
                }
                let snapshot = registry.current();
                tracker.prune(|id| snapshot.get(id).is_some());
                let ids: Vec<String> =
                    snapshot.all().iter().map(|t| t.id.clone()).collect();
                if let Err(e) = status_store.retain(&ids) {
                    tracing::warn!("Failed to prune status store: {e}");
                }
            }
        }
    }
    tracing::debug!("result channel closed, tracker stopping");
}

fn handle_result(
    tracker: &mut StateTracker,
    registry: &RegistryHandle,
    result: &CheckResult,
    transitions: &mpsc::Sender<Transition>,
    status_store: &Arc<dyn StatusStore>,
) {
    let snapshot = registry.current();
    let Some(target) = snapshot.get(&result.target_id) else {
        tracing::debug!(
            target_id = %result.target_id,
            "discarding result for unregistered target"
        );
        return;
    };

    let transition = tracker.update(target, result);

    if let Some(state) = tracker.state(&target.id) {
        if let Err(e) = status_store.save_state(state) {
            tracing::warn!("Failed to save target state: {e}");
        }
    }

    if let Some(transition) = transition {
        tracing::info!(
            target_id = %transition.target_id,
            "status change: {} -> {}",
            transition.from,
            transition.to
        );
        // Never block a state update on delivery; drop with a warning if
        // the dispatcher queue is saturated.
        if let Err(e) = transitions.try_send(transition) {
            tracing::warn!("Dispatcher queue full, dropping transition: {e}");
        }
    }
}
