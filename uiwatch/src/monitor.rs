//! Poll loop tying resolution, extraction, transform and evaluation together

use crate::config::MonitorConfig;
use crate::evaluator::{evaluate, Operator};
use crate::extractor::extract_value;
use crate::locator::LocatorDescriptor;
use crate::platforms::AccessibilityEngine;
use crate::resolver::ElementResolver;
use crate::transform::{transform, ExtractionMode};
use crate::AutomationError;
use serde::{Deserialize, Serialize};
use std::any::Any;
use std::fmt;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, RwLock};
use std::thread;
use std::time::{Duration, Instant};
use tokio::sync::broadcast;
use tokio_stream::Stream;
use tracing::{debug, info, instrument, warn};

const STOP_CHECK_INTERVAL: Duration = Duration::from_millis(50);

fn default_enabled() -> bool {
    true
}

/// One watched element and the condition that raises an alert.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonitorItem {
    #[serde(default)]
    pub label: String,
    pub locator: LocatorDescriptor,
    pub operator: Operator,
    #[serde(default)]
    pub target_value: String,
    #[serde(default)]
    pub extraction_mode: ExtractionMode,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    /// Sound the alert collaborator should play; not interpreted by the monitor
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sound_file: Option<PathBuf>,
}

impl MonitorItem {
    pub fn new(
        locator: LocatorDescriptor,
        operator: Operator,
        target_value: impl Into<String>,
    ) -> Self {
        Self {
            label: String::new(),
            locator,
            operator,
            target_value: target_value.into(),
            extraction_mode: ExtractionMode::Raw,
            enabled: true,
            sound_file: None,
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    pub fn with_extraction_mode(mut self, mode: ExtractionMode) -> Self {
        self.extraction_mode = mode;
        self
    }

    pub fn with_sound_file(mut self, sound_file: impl Into<PathBuf>) -> Self {
        self.sound_file = Some(sound_file.into());
        self
    }

    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    /// Label for display: the explicit label, else the locator's name or automation id.
    pub fn display_label(&self) -> &str {
        if !self.label.is_empty() {
            &self.label
        } else if !self.locator.display_name().is_empty() {
            self.locator.display_name()
        } else {
            "Unnamed"
        }
    }
}

/// Result of polling one item once.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PollOutcome {
    /// The element was found and its derived value evaluated
    Value {
        current_value_display: String,
        triggered: bool,
    },
    /// No strategy found the element this cycle
    Unavailable,
    /// Polling the item failed unexpectedly
    Error { message: String },
}

impl PollOutcome {
    pub fn is_triggered(&self) -> bool {
        matches!(self, PollOutcome::Value { triggered: true, .. })
    }

    pub fn status(&self) -> ItemStatus {
        match self {
            PollOutcome::Value {
                triggered: true, ..
            } => ItemStatus::Triggered,
            PollOutcome::Value { .. } => ItemStatus::Monitoring,
            PollOutcome::Unavailable => ItemStatus::Unavailable,
            PollOutcome::Error { .. } => ItemStatus::Error,
        }
    }
}

/// User-facing state of an item after its latest poll.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemStatus {
    Monitoring,
    Triggered,
    Unavailable,
    Error,
}

impl fmt::Display for ItemStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ItemStatus::Monitoring => "Monitoring",
            ItemStatus::Triggered => "Triggered",
            ItemStatus::Unavailable => "Monitoring (value unavailable)",
            ItemStatus::Error => "Error",
        };
        f.write_str(label)
    }
}

/// Published once per enabled item per cycle.
#[derive(Debug, Clone, Serialize)]
pub struct MonitorEvent {
    pub cycle: u64,
    /// Position of the item in the watch list
    pub index: usize,
    pub label: String,
    pub outcome: PollOutcome,
    pub status: ItemStatus,
}

/// Alert collaborator. Owns its own "currently alerting" state.
pub trait AlertSink: Send + Sync {
    fn is_alerting(&self) -> bool;

    fn start_alert(&self, item: &MonitorItem);

    fn stop_alert(&self);
}

/// Alert sink that never alerts.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullAlert;

impl AlertSink for NullAlert {
    fn is_alerting(&self) -> bool {
        false
    }

    fn start_alert(&self, item: &MonitorItem) {
        debug!("Alert suppressed for {}", item.display_label());
    }

    fn stop_alert(&self) {}
}

/// Drives poll cycles over a shared watch list.
pub struct Monitor {
    engine: Arc<dyn AccessibilityEngine>,
    resolver: ElementResolver,
    items: Arc<RwLock<Vec<MonitorItem>>>,
    alert: Arc<dyn AlertSink>,
    config: MonitorConfig,
    event_tx: broadcast::Sender<MonitorEvent>,
    cycle: AtomicU64,
}

impl Monitor {
    pub fn new(
        engine: Arc<dyn AccessibilityEngine>,
        items: Arc<RwLock<Vec<MonitorItem>>>,
        alert: Arc<dyn AlertSink>,
        config: MonitorConfig,
    ) -> Self {
        let resolver =
            ElementResolver::new(engine.clone()).with_search_timeout(config.search_timeout());
        let (event_tx, _) = broadcast::channel(256);
        Self {
            engine,
            resolver,
            items,
            alert,
            config,
            event_tx,
            cycle: AtomicU64::new(0),
        }
    }

    /// The shared watch list. Edits are picked up at the start of the next cycle.
    pub fn items(&self) -> Arc<RwLock<Vec<MonitorItem>>> {
        self.items.clone()
    }

    pub fn config(&self) -> &MonitorConfig {
        &self.config
    }

    pub fn subscribe(&self) -> broadcast::Receiver<MonitorEvent> {
        self.event_tx.subscribe()
    }

    /// Stream of monitor events
    pub fn event_stream(&self) -> impl Stream<Item = MonitorEvent> {
        event_stream_from(self.event_tx.subscribe())
    }

    /// Poll a single item. Unexpected failures, including panics raised while
    /// talking to the platform, come back as [`PollOutcome::Error`].
    #[instrument(level = "debug", skip(self, item), fields(item = %item.display_label()))]
    pub fn poll_item(&self, item: &MonitorItem) -> PollOutcome {
        match catch_unwind(AssertUnwindSafe(|| self.evaluate_item(item))) {
            Ok(outcome) => outcome,
            Err(payload) => PollOutcome::Error {
                message: panic_message(payload.as_ref()),
            },
        }
    }

    fn evaluate_item(&self, item: &MonitorItem) -> PollOutcome {
        let Some(element) = self.resolver.resolve(&item.locator) else {
            return PollOutcome::Unavailable;
        };
        let raw = extract_value(&element);
        let derived = transform(Some(raw.as_str()), item.extraction_mode);
        let triggered = evaluate(&derived, item.operator, &item.target_value);
        debug!(raw = %raw, derived = %derived, triggered, "Evaluated");
        PollOutcome::Value {
            current_value_display: derived,
            triggered,
        }
    }

    /// Run one pass over the enabled items, in watch-list order.
    ///
    /// Returns each polled item's index and outcome. Every outcome is also
    /// published as a [`MonitorEvent`].
    pub fn run_cycle(&self) -> Vec<(usize, PollOutcome)> {
        let cycle = self.cycle.fetch_add(1, Ordering::Relaxed) + 1;
        let items = self
            .items
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone();

        let mut outcomes = Vec::new();
        for (index, item) in items.iter().enumerate() {
            if !item.enabled {
                continue;
            }

            let outcome = self.poll_item(item);
            match &outcome {
                PollOutcome::Value {
                    triggered: true,
                    current_value_display,
                } => {
                    if !self.alert.is_alerting() {
                        info!(
                            "{} triggered: {:?} {} {:?}",
                            item.display_label(),
                            current_value_display,
                            item.operator,
                            item.target_value
                        );
                        self.alert.start_alert(item);
                    }
                }
                PollOutcome::Error { message } => {
                    warn!("Polling {} failed: {}", item.display_label(), message);
                }
                _ => {}
            }

            let event = MonitorEvent {
                cycle,
                index,
                label: item.display_label().to_string(),
                status: outcome.status(),
                outcome: outcome.clone(),
            };
            // No subscribers is fine
            let _ = self.event_tx.send(event);
            outcomes.push((index, outcome));
        }
        outcomes
    }

    /// Run cycles on a dedicated thread until the returned handle is stopped or dropped.
    pub fn spawn(self) -> Result<MonitorHandle, AutomationError> {
        let should_stop = Arc::new(AtomicBool::new(false));
        let stop_flag = should_stop.clone();
        // The worker thread owns the only sender
        let events = self.event_tx.subscribe();

        let handle = thread::Builder::new()
            .name("uiwatch-monitor".to_string())
            .spawn(move || self.run_until(&stop_flag))
            .map_err(|e| {
                AutomationError::Internal(format!("Failed to spawn monitor thread: {e}"))
            })?;

        Ok(MonitorHandle {
            should_stop,
            handle: Some(handle),
            events,
        })
    }

    fn run_until(&self, should_stop: &AtomicBool) {
        if let Err(e) = self.engine.attach_thread() {
            warn!("Monitor thread could not attach to the platform: {}", e);
        }
        info!(
            interval_ms = self.config.poll_interval_ms,
            "Monitor started"
        );

        while !should_stop.load(Ordering::Relaxed) {
            self.run_cycle();

            let deadline = Instant::now() + self.config.poll_interval();
            while !should_stop.load(Ordering::Relaxed) {
                let now = Instant::now();
                if now >= deadline {
                    break;
                }
                thread::sleep(STOP_CHECK_INTERVAL.min(deadline - now));
            }
        }

        info!("Monitor stopped");
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}

fn event_stream_from(
    mut rx: broadcast::Receiver<MonitorEvent>,
) -> impl Stream<Item = MonitorEvent> {
    Box::pin(async_stream::stream! {
        loop {
            match rx.recv().await {
                Ok(event) => yield event,
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!("Monitor event stream lagged, skipped {} events", skipped);
                    continue;
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
    })
}

/// Handle to a running monitor thread. Dropping it stops and joins the thread.
pub struct MonitorHandle {
    should_stop: Arc<AtomicBool>,
    handle: Option<thread::JoinHandle<()>>,
    events: broadcast::Receiver<MonitorEvent>,
}

impl MonitorHandle {
    /// Receive events published after this call. Closed once the worker exits.
    pub fn subscribe(&self) -> broadcast::Receiver<MonitorEvent> {
        self.events.resubscribe()
    }

    /// Stream of events published after this call. Ends once the worker exits.
    pub fn event_stream(&self) -> impl Stream<Item = MonitorEvent> {
        event_stream_from(self.events.resubscribe())
    }

    pub fn is_running(&self) -> bool {
        self.handle.as_ref().is_some_and(|h| !h.is_finished())
    }

    /// Stop after the current cycle and wait for the thread to exit
    pub fn stop(mut self) {
        self.shutdown();
    }

    fn shutdown(&mut self) {
        self.should_stop.store(true, Ordering::Relaxed);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for MonitorHandle {
    fn drop(&mut self) {
        self.shutdown();
    }
}
