use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tokio::time::Instant;

use crate::application::config::DispatcherConfig;
use crate::application::registry_handle::RegistryHandle;
use crate::domain::entities::alert::{Alert, AlertMessage, Transition};
use crate::domain::ports::channel::NotificationChannel;
use crate::domain::ports::store::AlertStore;
use crate::domain::value_objects::delivery_status::DeliveryStatus;

/// Retry and suppression policy for alert delivery.
#[derive(Debug, Clone)]
pub struct DispatchPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub cooldown: Duration,
}

impl From<&DispatcherConfig> for DispatchPolicy {
    fn from(config: &DispatcherConfig) -> Self {
        Self {
            max_attempts: config.max_attempts.max(1),
            base_delay: Duration::from_millis(config.base_delay_ms),
            cooldown: Duration::from_secs(config.cooldown_secs),
        }
    }
}

/// A notification held back by the cooldown window, absorbing further
/// transitions for the same target until it flushes.
struct Held {
    message: AlertMessage,
    due: Instant,
}

/// Delivers notifications for state transitions.
///
/// Runs on its own task so a slow channel never stalls probing or state
/// updates. Each outbound notification is retried with exponential
/// backoff; exhausted alerts are marked failed and recorded, never
/// silently dropped.
///
/// Suppression: after a notification goes out for a target, further
/// transitions within the cooldown window are coalesced into a single
/// message describing the net change. A flap that returns to the original
/// status still flushes, so flapping that slips past the state tracker's
/// debounce stays visible.
pub struct AlertDispatcher {
    channel: Arc<dyn NotificationChannel>,
    store: Arc<dyn AlertStore>,
    registry: RegistryHandle,
    policy: DispatchPolicy,
}

impl AlertDispatcher {
    #[must_use]
    pub fn new(
        channel: Arc<dyn NotificationChannel>,
        store: Arc<dyn AlertStore>,
        registry: RegistryHandle,
        policy: DispatchPolicy,
    ) -> Self {
        Self {
            channel,
            store,
            registry,
            policy,
        }
    }

    /// Consume transitions until the channel closes, then flush held
    /// notifications and drain outstanding deliveries.
    ///
    /// A registry reload drops the cooldown bookkeeping (and any held
    /// notification) for targets that are no longer registered, so reload
    /// churn cannot grow the per-target maps without bound.
    pub async fn run(self, mut transitions: mpsc::Receiver<Transition>) {
        let mut held: HashMap<String, Held> = HashMap::new();
        let mut last_sent: HashMap<String, Instant> = HashMap::new();
        let mut deliveries = JoinSet::new();
        let mut reloads = self.registry.subscribe();

        loop {
            let next_due = held.values().map(|h| h.due).min();
            tokio::select! {
                maybe = transitions.recv() => {
                    let Some(transition) = maybe else { break };
                    self.accept(transition, &mut held, &mut last_sent, &mut deliveries);
                }
                () = sleep_until_due(next_due), if next_due.is_some() => {
                    self.flush_due(&mut held, &mut last_sent, &mut deliveries);
                }
                changed = reloads.changed() => {
                    if changed.is_err() {
                        continue;
                    }
                    let snapshot = self.registry.current();
                    held.retain(|id, _| snapshot.get(id).is_some());
                    last_sent.retain(|id, _| snapshot.get(id).is_some());
                }
                Some(joined) = deliveries.join_next(), if !deliveries.is_empty() => {
                    if joined.is_err() {
                        tracing::warn!("alert delivery task panicked");
                    }
                }
            }
        }

        // Shutdown drain: held notifications go out immediately
        for (_, entry) in held.drain() {
            self.spawn_delivery(entry.message, &mut deliveries);
        }
        while let Some(joined) = deliveries.join_next().await {
            if joined.is_err() {
                tracing::warn!("alert delivery task panicked");
            }
        }
        tracing::debug!("transition channel closed, dispatcher stopping");
    }

    fn accept(
        &self,
        transition: Transition,
        held: &mut HashMap<String, Held>,
        last_sent: &mut HashMap<String, Instant>,
        deliveries: &mut JoinSet<Alert>,
    ) {
        let id = transition.target_id.clone();

        if let Some(entry) = held.get_mut(&id) {
            entry.message.to = transition.to;
            entry.message.timestamp = transition.timestamp;
            entry.message.transitions += 1;
            tracing::debug!(target_id = %id, "transition coalesced into held notification");
            return;
        }

        let in_cooldown = last_sent
            .get(&id)
            .is_some_and(|sent| sent.elapsed() < self.policy.cooldown);

        if in_cooldown {
            let sent = last_sent[&id];
            held.insert(
                id.clone(),
                Held {
                    message: AlertMessage::from_transition(&transition),
                    due: sent + self.policy.cooldown,
                },
            );
            tracing::debug!(target_id = %id, "inside cooldown window, holding notification");
        } else {
            last_sent.insert(id, Instant::now());
            self.spawn_delivery(AlertMessage::from_transition(&transition), deliveries);
        }
    }

    fn flush_due(
        &self,
        held: &mut HashMap<String, Held>,
        last_sent: &mut HashMap<String, Instant>,
        deliveries: &mut JoinSet<Alert>,
    ) {
        let now = Instant::now();
        let due_ids: Vec<String> = held
            .iter()
            .filter(|(_, entry)| entry.due <= now)
            .map(|(id, _)| id.clone())
            .collect();

        for id in due_ids {
            if let Some(entry) = held.remove(&id) {
                last_sent.insert(id, now);
                self.spawn_delivery(entry.message, deliveries);
            }
        }
    }

    fn spawn_delivery(&self, message: AlertMessage, deliveries: &mut JoinSet<Alert>) {
        let channel = Arc::clone(&self.channel);
        let store = Arc::clone(&self.store);
        let policy = self.policy.clone();
        deliveries.spawn(async move { deliver_alert(&*channel, &*store, &policy, &message).await });
    }
}

async fn sleep_until_due(due: Option<Instant>) {
    match due {
        Some(instant) => tokio::time::sleep_until(instant).await,
        None => std::future::pending().await,
    }
}

/// Deliver one message with retry and exponential backoff, then record
/// the resulting alert. Returns the final alert for inspection.
pub async fn deliver_alert(
    channel: &dyn NotificationChannel,
    store: &dyn AlertStore,
    policy: &DispatchPolicy,
    message: &AlertMessage,
) -> Alert {
    let mut alert = Alert {
        target_id: message.target_id.clone(),
        from: message.from,
        to: message.to,
        timestamp: message.timestamp,
        attempts: 0,
        delivery: DeliveryStatus::Pending,
    };

    let max_attempts = policy.max_attempts.max(1);
    for attempt in 1..=max_attempts {
        alert.attempts = attempt;
        match channel.send(message).await {
            Ok(()) => {
                alert.delivery = DeliveryStatus::Delivered;
                tracing::info!(
                    target_id = %message.target_id,
                    channel = channel.name(),
                    "notification delivered (attempt {attempt})"
                );
                break;
            }
            Err(e) => {
                tracing::warn!(
                    target_id = %message.target_id,
                    channel = channel.name(),
                    "delivery attempt {attempt}/{max_attempts} failed: {e}"
                );
                if attempt < max_attempts {
                    tokio::time::sleep(backoff_delay(policy.base_delay, attempt)).await;
                }
            }
        }
    }

    if alert.delivery != DeliveryStatus::Delivered {
        alert.delivery = DeliveryStatus::Failed;
        tracing::error!(
            target_id = %message.target_id,
            "notification permanently failed after {} attempt(s)",
            alert.attempts
        );
    }

    if let Err(e) = store.record_alert(&alert) {
        tracing::warn!("Failed to record alert: {e}");
    }

    alert
}

/// `base * 2^(attempt-1)`, capped to avoid shifting past the clock.
fn backoff_delay(base: Duration, attempt: u32) -> Duration {
    let factor = 1u32 << (attempt - 1).min(16);
    base.saturating_mul(factor)
}

#[cfg(test)]
#[allow(clippy::expect_used)]
mod tests {
    use super::*;
    use crate::domain::entities::target::Target;
    use crate::domain::ports::channel::ChannelError;
    use crate::domain::ports::store::StoreError;
    use crate::domain::registry::TargetRegistry;
    use crate::domain::value_objects::check_kind::CheckKind;
    use crate::domain::value_objects::health_status::HealthStatus;
    use async_trait::async_trait;
    use chrono::{DateTime, Utc};
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn registry_of(ids: &[&str]) -> RegistryHandle {
        let targets = ids
            .iter()
            .map(|id| {
                Target::new(
                    *id,
                    CheckKind::Tcp {
                        addr: format!("{id}:80"),
                    },
                )
            })
            .collect();
        RegistryHandle::new(TargetRegistry::load(targets).expect("valid registry"))
    }

    fn make_transition(id: &str, from: HealthStatus, to: HealthStatus) -> Transition {
        Transition {
            target_id: id.to_string(),
            from,
            to,
            timestamp: Utc::now(),
        }
    }

    fn policy(max_attempts: u32, base_delay_ms: u64, cooldown_ms: u64) -> DispatchPolicy {
        DispatchPolicy {
            max_attempts,
            base_delay: Duration::from_millis(base_delay_ms),
            cooldown: Duration::from_millis(cooldown_ms),
        }
    }

    /// Fails the first `failures` sends, then succeeds.
    struct FlakyChannel {
        failures: u32,
        calls: AtomicU32,
        sent: Mutex<Vec<AlertMessage>>,
    }

    impl FlakyChannel {
        fn new(failures: u32) -> Self {
            Self {
                failures,
                calls: AtomicU32::new(0),
                sent: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl NotificationChannel for FlakyChannel {
        fn name(&self) -> &'static str {
            "flaky"
        }

        async fn send(&self, message: &AlertMessage) -> Result<(), ChannelError> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            if call < self.failures {
                return Err(ChannelError::SendFailed("simulated outage".to_string()));
            }
            self.sent
                .lock()
                .map_err(|_| ChannelError::SendFailed("lock poisoned".to_string()))?
                .push(message.clone());
            Ok(())
        }
    }

    #[derive(Default)]
    struct RecordingAlertStore {
        alerts: Mutex<Vec<Alert>>,
    }

    impl AlertStore for RecordingAlertStore {
        fn record_alert(&self, alert: &Alert) -> Result<(), StoreError> {
            self.alerts
                .lock()
                .map_err(|_| StoreError::WriteFailed("lock poisoned".into()))?
                .push(alert.clone());
            Ok(())
        }

        fn recent_alerts(&self, count: usize) -> Result<Vec<Alert>, StoreError> {
            let mut alerts = self
                .alerts
                .lock()
                .map_err(|_| StoreError::ReadFailed("lock poisoned".into()))?
                .clone();
            alerts.reverse();
            alerts.truncate(count);
            Ok(alerts)
        }

        fn alerts_since(&self, since: DateTime<Utc>) -> Result<Vec<Alert>, StoreError> {
            Ok(self
                .alerts
                .lock()
                .map_err(|_| StoreError::ReadFailed("lock poisoned".into()))?
                .iter()
                .filter(|a| a.timestamp >= since)
                .cloned()
                .collect())
        }
    }

    #[test]
    fn policy_from_config_clamps_attempts() {
        let config = DispatcherConfig {
            max_attempts: 0,
            base_delay_ms: 100,
            cooldown_secs: 1,
        };
        let policy = DispatchPolicy::from(&config);
        assert_eq!(policy.max_attempts, 1);
        assert_eq!(policy.base_delay, Duration::from_millis(100));
    }

    #[test]
    fn backoff_doubles_per_attempt() {
        let base = Duration::from_millis(100);
        assert_eq!(backoff_delay(base, 1), Duration::from_millis(100));
        assert_eq!(backoff_delay(base, 2), Duration::from_millis(200));
        assert_eq!(backoff_delay(base, 3), Duration::from_millis(400));
    }

    #[test]
    fn backoff_saturates_on_large_attempts() {
        let base = Duration::from_secs(1);
        // Never panics, stays monotonically capped
        assert!(backoff_delay(base, 40) >= backoff_delay(base, 17));
    }

    #[tokio::test]
    async fn delivery_succeeds_within_retry_cap() {
        // Channel fails 3 times then succeeds, cap 5 -> delivered
        let channel = FlakyChannel::new(3);
        let store = RecordingAlertStore::default();
        let message = AlertMessage::from_transition(&make_transition(
            "api",
            HealthStatus::Healthy,
            HealthStatus::Down,
        ));

        let alert = deliver_alert(&channel, &store, &policy(5, 1, 0), &message).await;
        assert_eq!(alert.delivery, DeliveryStatus::Delivered);
        assert_eq!(alert.attempts, 4);

        let recorded = store.alerts.lock().expect("mutex poisoned");
        assert_eq!(recorded.len(), 1);
        assert_eq!(recorded[0].delivery, DeliveryStatus::Delivered);
    }

    #[tokio::test]
    async fn delivery_exhaustion_marks_failed_and_records() {
        // Same channel behavior, cap 2 -> failed but recorded
        let channel = FlakyChannel::new(3);
        let store = RecordingAlertStore::default();
        let message = AlertMessage::from_transition(&make_transition(
            "api",
            HealthStatus::Healthy,
            HealthStatus::Down,
        ));

        let alert = deliver_alert(&channel, &store, &policy(2, 1, 0), &message).await;
        assert_eq!(alert.delivery, DeliveryStatus::Failed);
        assert_eq!(alert.attempts, 2);

        let recorded = store.alerts.lock().expect("mutex poisoned");
        assert_eq!(recorded.len(), 1);
        assert_eq!(recorded[0].delivery, DeliveryStatus::Failed);
    }

    #[tokio::test]
    async fn run_delivers_first_transition_immediately() {
        let channel = Arc::new(FlakyChannel::new(0));
        let store = Arc::new(RecordingAlertStore::default());
        let dispatcher = AlertDispatcher::new(
            Arc::clone(&channel) as _,
            Arc::clone(&store) as _,
            registry_of(&["api"]),
            policy(3, 1, 60_000),
        );
        let (tx, rx) = mpsc::channel(16);
        let task = tokio::spawn(dispatcher.run(rx));

        tx.send(make_transition(
            "api",
            HealthStatus::Unknown,
            HealthStatus::Healthy,
        ))
        .await
        .expect("send transition");
        drop(tx);
        task.await.expect("dispatcher task");

        let sent = channel.sent.lock().expect("mutex poisoned");
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].transitions, 1);
    }

    #[tokio::test]
    async fn rapid_transitions_coalesce_into_net_change() {
        let channel = Arc::new(FlakyChannel::new(0));
        let store = Arc::new(RecordingAlertStore::default());
        let dispatcher = AlertDispatcher::new(
            Arc::clone(&channel) as _,
            Arc::clone(&store) as _,
            registry_of(&["api"]),
            policy(3, 1, 100),
        );
        let (tx, rx) = mpsc::channel(16);
        let task = tokio::spawn(dispatcher.run(rx));

        // First transition goes straight out and opens the cooldown window
        tx.send(make_transition(
            "api",
            HealthStatus::Healthy,
            HealthStatus::Degraded,
        ))
        .await
        .expect("send");
        tokio::time::sleep(Duration::from_millis(20)).await;

        // Two more inside the window coalesce into one net message
        tx.send(make_transition(
            "api",
            HealthStatus::Degraded,
            HealthStatus::Down,
        ))
        .await
        .expect("send");
        tx.send(make_transition(
            "api",
            HealthStatus::Down,
            HealthStatus::Healthy,
        ))
        .await
        .expect("send");

        tokio::time::sleep(Duration::from_millis(150)).await;
        drop(tx);
        task.await.expect("dispatcher task");

        let sent = channel.sent.lock().expect("mutex poisoned");
        assert_eq!(sent.len(), 2, "expected initial send plus one coalesced");
        assert_eq!(sent[1].from, HealthStatus::Degraded);
        assert_eq!(sent[1].to, HealthStatus::Healthy);
        assert_eq!(sent[1].transitions, 2);
    }

    #[tokio::test]
    async fn held_notifications_flush_on_shutdown() {
        let channel = Arc::new(FlakyChannel::new(0));
        let store = Arc::new(RecordingAlertStore::default());
        let dispatcher = AlertDispatcher::new(
            Arc::clone(&channel) as _,
            Arc::clone(&store) as _,
            registry_of(&["api", "db"]),
            policy(3, 1, 60_000),
        );
        let (tx, rx) = mpsc::channel(16);
        let task = tokio::spawn(dispatcher.run(rx));

        tx.send(make_transition(
            "api",
            HealthStatus::Healthy,
            HealthStatus::Degraded,
        ))
        .await
        .expect("send");
        tokio::time::sleep(Duration::from_millis(20)).await;
        tx.send(make_transition(
            "api",
            HealthStatus::Degraded,
            HealthStatus::Down,
        ))
        .await
        .expect("send");

        // Closing the channel flushes the held notification without
        // waiting out the hour-long cooldown
        drop(tx);
        task.await.expect("dispatcher task");

        let sent = channel.sent.lock().expect("mutex poisoned");
        assert_eq!(sent.len(), 2);
        assert_eq!(sent[1].to, HealthStatus::Down);
    }

    #[tokio::test]
    async fn reload_drops_held_notifications_for_removed_targets() {
        let channel = Arc::new(FlakyChannel::new(0));
        let store = Arc::new(RecordingAlertStore::default());
        let registry = registry_of(&["api", "db"]);
        let dispatcher = AlertDispatcher::new(
            Arc::clone(&channel) as _,
            Arc::clone(&store) as _,
            registry.clone(),
            policy(3, 1, 60_000),
        );
        let (tx, rx) = mpsc::channel(16);
        let task = tokio::spawn(dispatcher.run(rx));

        // First transition opens the cooldown window, second gets held
        tx.send(make_transition(
            "api",
            HealthStatus::Healthy,
            HealthStatus::Degraded,
        ))
        .await
        .expect("send");
        tokio::time::sleep(Duration::from_millis(20)).await;
        tx.send(make_transition(
            "api",
            HealthStatus::Degraded,
            HealthStatus::Down,
        ))
        .await
        .expect("send");
        tokio::time::sleep(Duration::from_millis(20)).await;

        // Removing the target prunes its held notification; the shutdown
        // flush has nothing left to send for it
        registry.swap(
            TargetRegistry::load(vec![Target::new(
                "db",
                CheckKind::Tcp {
                    addr: "db:80".to_string(),
                },
            )])
            .expect("valid registry"),
        );
        tokio::time::sleep(Duration::from_millis(20)).await;

        drop(tx);
        task.await.expect("dispatcher task");

        let sent = channel.sent.lock().expect("mutex poisoned");
        assert_eq!(sent.len(), 1, "held notification should have been dropped");
        assert_eq!(sent[0].to, HealthStatus::Degraded);
    }

    #[tokio::test]
    async fn independent_targets_do_not_share_cooldown() {
        let channel = Arc::new(FlakyChannel::new(0));
        let store = Arc::new(RecordingAlertStore::default());
        let dispatcher = AlertDispatcher::new(
            Arc::clone(&channel) as _,
            Arc::clone(&store) as _,
            registry_of(&["api", "db"]),
            policy(3, 1, 60_000),
        );
        let (tx, rx) = mpsc::channel(16);
        let task = tokio::spawn(dispatcher.run(rx));

        tx.send(make_transition(
            "api",
            HealthStatus::Healthy,
            HealthStatus::Down,
        ))
        .await
        .expect("send");
        tx.send(make_transition(
            "db",
            HealthStatus::Healthy,
            HealthStatus::Down,
        ))
        .await
        .expect("send");
        drop(tx);
        task.await.expect("dispatcher task");

        let sent = channel.sent.lock().expect("mutex poisoned");
        assert_eq!(sent.len(), 2);
    }
}
