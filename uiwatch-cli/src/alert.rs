use std::io::Write;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};
use tracing::{info, warn};
use uiwatch::{AlertSink, MonitorItem};

const RING_INTERVAL: Duration = Duration::from_secs(1);
const STOP_CHECK_INTERVAL: Duration = Duration::from_millis(50);

struct Ringing {
    stop: Arc<AtomicBool>,
    started_at: Instant,
    handle: thread::JoinHandle<()>,
}

/// Rings the terminal bell once per second until stopped.
#[derive(Default)]
pub struct BellAlert {
    ringing: Mutex<Option<Ringing>>,
}

impl BellAlert {
    pub fn new() -> Self {
        Self::default()
    }

    /// How long the current alert has been ringing
    pub fn alerting_for(&self) -> Option<Duration> {
        self.ringing
            .lock()
            .ok()
            .and_then(|ringing| ringing.as_ref().map(|r| r.started_at.elapsed()))
    }

    fn ring_until_stopped(stop: &AtomicBool) {
        while !stop.load(Ordering::SeqCst) {
            let mut stderr = std::io::stderr();
            let _ = stderr.write_all(b"\x07");
            let _ = stderr.flush();

            let deadline = Instant::now() + RING_INTERVAL;
            while !stop.load(Ordering::SeqCst) && Instant::now() < deadline {
                thread::sleep(STOP_CHECK_INTERVAL);
            }
        }
    }
}

impl AlertSink for BellAlert {
    fn is_alerting(&self) -> bool {
        self.ringing
            .lock()
            .map(|ringing| ringing.is_some())
            .unwrap_or(false)
    }

    fn start_alert(&self, item: &MonitorItem) {
        let mut ringing = match self.ringing.lock() {
            Ok(ringing) => ringing,
            Err(e) => {
                warn!("Alert state poisoned: {}", e);
                return;
            }
        };
        if ringing.is_some() {
            return;
        }

        if let Some(sound) = item.sound_file.as_ref().filter(|s| !s.exists()) {
            warn!("Sound file {} not found, using the terminal bell", sound.display());
        }
        info!(
            item = item.display_label(),
            condition = %format!("{} {}", item.operator, item.target_value),
            "Condition met, alert started"
        );

        let stop = Arc::new(AtomicBool::new(false));
        let worker_stop = stop.clone();
        match thread::Builder::new()
            .name("uiwatch-alert".to_string())
            .spawn(move || Self::ring_until_stopped(&worker_stop))
        {
            Ok(handle) => {
                *ringing = Some(Ringing {
                    stop,
                    started_at: Instant::now(),
                    handle,
                })
            }
            Err(e) => warn!("Failed to start alert thread: {}", e),
        }
    }

    fn stop_alert(&self) {
        let ringing = match self.ringing.lock() {
            Ok(mut ringing) => ringing.take(),
            Err(_) => None,
        };
        if let Some(ringing) = ringing {
            ringing.stop.store(true, Ordering::SeqCst);
            let _ = ringing.handle.join();
            info!("Alert stopped");
        }
    }
}

impl Drop for BellAlert {
    fn drop(&mut self) {
        self.stop_alert();
    }
}
