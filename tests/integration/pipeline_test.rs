#![allow(clippy::expect_used)]

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::{mpsc, watch};

use remonitor::application::config::{DispatcherConfig, SchedulerConfig};
use remonitor::application::registry_handle::RegistryHandle;
use remonitor::application::services::{
    AlertDispatcher, DispatchPolicy, Scheduler, SchedulerOptions, StateTracker, run_tracker,
};
use remonitor::domain::entities::alert::AlertMessage;
use remonitor::domain::entities::check::CheckResult;
use remonitor::domain::entities::target::Target;
use remonitor::domain::ports::channel::{ChannelError, NotificationChannel};
use remonitor::domain::ports::prober::Prober;
use remonitor::domain::ports::store::{AlertStore, StatusStore};
use remonitor::domain::registry::TargetRegistry;
use remonitor::domain::value_objects::check_kind::CheckKind;
use remonitor::domain::value_objects::health_status::HealthStatus;
use remonitor::domain::value_objects::probe_error::ProbeErrorKind;
use remonitor::infrastructure::persistence::InMemoryStore;

// ---------------------------------------------------------------------------
// ScriptedProber
// ---------------------------------------------------------------------------

/// Replays a scripted sequence of outcomes per target; once the script is
/// exhausted the last outcome repeats.
struct ScriptedProber {
    scripts: Mutex<HashMap<String, VecDeque<bool>>>,
}

impl ScriptedProber {
    fn new(scripts: &[(&str, &[bool])]) -> Self {
        Self {
            scripts: Mutex::new(
                scripts
                    .iter()
                    .map(|(id, outcomes)| ((*id).to_string(), outcomes.iter().copied().collect()))
                    .collect(),
            ),
        }
    }
}

#[async_trait]
impl Prober for ScriptedProber {
    async fn probe(&self, target: &Target) -> CheckResult {
        let mut scripts = self.scripts.lock().expect("lock");
        let script = scripts.entry(target.id.clone()).or_default();
        let outcome = if script.len() > 1 {
            script.pop_front().unwrap_or(true)
        } else {
            script.front().copied().unwrap_or(true)
        };
        drop(scripts);

        if outcome {
            CheckResult::success(&target.id, Duration::from_millis(1))
        } else {
            CheckResult::failure(
                &target.id,
                Duration::from_millis(1),
                ProbeErrorKind::ConnectionRefused,
                "ECONNREFUSED",
            )
        }
    }
}

// ---------------------------------------------------------------------------
// TrackingChannel
// ---------------------------------------------------------------------------

struct TrackingChannel {
    messages: Mutex<Vec<AlertMessage>>,
}

impl TrackingChannel {
    const fn new() -> Self {
        Self {
            messages: Mutex::new(Vec::new()),
        }
    }

    fn collected(&self) -> Vec<AlertMessage> {
        self.messages.lock().expect("lock").clone()
    }
}

#[async_trait]
impl NotificationChannel for TrackingChannel {
    fn name(&self) -> &'static str {
        "tracking"
    }

    async fn send(&self, message: &AlertMessage) -> Result<(), ChannelError> {
        self.messages.lock().expect("lock").push(message.clone());
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Pipeline harness
// ---------------------------------------------------------------------------

fn fast_target(id: &str, failure_threshold: u32, recovery_threshold: u32) -> Target {
    Target {
        interval: Duration::from_millis(10),
        timeout: Duration::from_millis(50),
        failure_threshold,
        hard_failure_threshold: failure_threshold * 2,
        recovery_threshold,
        ..Target::new(
            id,
            CheckKind::Tcp {
                addr: "127.0.0.1:1".to_string(),
            },
        )
    }
}

/// Wires scheduler, tracker, and dispatcher the way the daemon does, lets
/// the pipeline run for `duration`, then shuts down and drains.
async fn run_pipeline(
    targets: Vec<Target>,
    prober: Arc<dyn Prober>,
    channel: Arc<TrackingChannel>,
    store: Arc<InMemoryStore>,
    duration: Duration,
) {
    let registry = RegistryHandle::new(TargetRegistry::load(targets).expect("valid registry"));
    let (results_tx, results_rx) = mpsc::channel(64);
    let (transitions_tx, transitions_rx) = mpsc::channel(64);
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let scheduler = Scheduler::new(
        registry.clone(),
        prober,
        results_tx,
        SchedulerOptions::from(&SchedulerConfig {
            max_concurrent_probes: 4,
            grace_period_secs: 1,
        }),
    );
    let dispatcher = AlertDispatcher::new(
        channel,
        Arc::clone(&store) as Arc<dyn AlertStore>,
        registry.clone(),
        DispatchPolicy::from(&DispatcherConfig {
            max_attempts: 3,
            base_delay_ms: 10,
            cooldown_secs: 0,
        }),
    );

    let scheduler_task = tokio::spawn(scheduler.run(shutdown_rx));
    let tracker_task = tokio::spawn(run_tracker(
        StateTracker::new(),
        registry.clone(),
        results_rx,
        transitions_tx,
        Arc::clone(&store) as Arc<dyn StatusStore>,
    ));
    let dispatcher_task = tokio::spawn(dispatcher.run(transitions_rx));

    tokio::time::sleep(duration).await;
    shutdown_tx.send(true).expect("signal shutdown");

    scheduler_task.await.expect("scheduler task");
    tracker_task.await.expect("tracker task");
    dispatcher_task.await.expect("dispatcher task");
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[tokio::test]
async fn failure_then_recovery_flows_through_the_pipeline() {
    let prober = Arc::new(ScriptedProber::new(&[("api", &[false, false, true])]));
    let channel = Arc::new(TrackingChannel::new());
    let store = Arc::new(InMemoryStore::new());

    run_pipeline(
        vec![fast_target("api", 2, 1)],
        prober,
        Arc::clone(&channel),
        Arc::clone(&store),
        Duration::from_millis(300),
    )
    .await;

    let messages = channel.collected();
    assert_eq!(
        messages.len(),
        2,
        "expected degrade then recover, got {messages:?}"
    );
    assert_eq!(messages[0].from, HealthStatus::Unknown);
    assert_eq!(messages[0].to, HealthStatus::Degraded);
    assert_eq!(messages[1].from, HealthStatus::Degraded);
    assert_eq!(messages[1].to, HealthStatus::Healthy);

    let state = store
        .get_state("api")
        .expect("read state")
        .expect("state present");
    assert_eq!(state.status, HealthStatus::Healthy);

    let alerts = store.recent_alerts(10).expect("read alerts");
    assert_eq!(alerts.len(), 2);
}

#[tokio::test]
async fn persistent_failure_reaches_down_and_stays_there() {
    let prober = Arc::new(ScriptedProber::new(&[("db", &[false])]));
    let channel = Arc::new(TrackingChannel::new());
    let store = Arc::new(InMemoryStore::new());

    run_pipeline(
        vec![fast_target("db", 1, 1)],
        prober,
        Arc::clone(&channel),
        Arc::clone(&store),
        Duration::from_millis(300),
    )
    .await;

    let messages = channel.collected();
    assert_eq!(
        messages.len(),
        2,
        "expected degrade then down, got {messages:?}"
    );
    assert_eq!(messages[0].to, HealthStatus::Degraded);
    assert_eq!(messages[1].to, HealthStatus::Down);

    let state = store
        .get_state("db")
        .expect("read state")
        .expect("state present");
    assert_eq!(state.status, HealthStatus::Down);
    assert!(state.consecutive_failures >= 2);
}

#[tokio::test]
async fn independent_targets_track_independently() {
    let prober = Arc::new(ScriptedProber::new(&[("up", &[true]), ("down", &[false])]));
    let channel = Arc::new(TrackingChannel::new());
    let store = Arc::new(InMemoryStore::new());

    run_pipeline(
        vec![fast_target("up", 1, 1), fast_target("down", 1, 1)],
        prober,
        Arc::clone(&channel),
        Arc::clone(&store),
        Duration::from_millis(300),
    )
    .await;

    let up = store
        .get_state("up")
        .expect("read state")
        .expect("state present");
    assert_eq!(up.status, HealthStatus::Healthy);

    let down = store
        .get_state("down")
        .expect("read state")
        .expect("state present");
    assert_eq!(down.status, HealthStatus::Down);

    // No message ever mentions the healthy target going bad
    assert!(
        channel
            .collected()
            .iter()
            .filter(|m| m.target_id == "up")
            .all(|m| m.to == HealthStatus::Healthy)
    );
}
