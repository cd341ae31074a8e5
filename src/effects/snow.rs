use super::particles::{sample, Particle, ParticleLayer};
use crate::prefs::{load_flag, save_flag, PreferenceStore, SNOW_PREFERENCE};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time;
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Cadence of snowflake spawns while snow is on.
pub const SNOW_SPAWN_INTERVAL: Duration = Duration::from_millis(100);

struct SpawnTask {
    cancel: CancellationToken,
    handle: JoinHandle<()>,
}

/// Snow is either off or on; on means a periodic spawn task exists.
pub struct SnowController {
    layer: Arc<ParticleLayer>,
    prefs: Arc<dyn PreferenceStore>,
    task: Mutex<Option<SpawnTask>>,
}

impl SnowController {
    pub fn new(layer: Arc<ParticleLayer>, prefs: Arc<dyn PreferenceStore>) -> Self {
        Self {
            layer,
            prefs,
            task: Mutex::new(None),
        }
    }

    fn task(&self) -> MutexGuard<'_, Option<SpawnTask>> {
        self.task.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn layer(&self) -> &Arc<ParticleLayer> {
        &self.layer
    }

    /// Start snow if the saved preference says so. Returns the resulting state.
    pub fn restore(&self) -> bool {
        if load_flag(self.prefs.as_ref(), SNOW_PREFERENCE) {
            self.start();
        }
        self.is_running()
    }

    pub fn is_running(&self) -> bool {
        self.task().is_some()
    }

    /// Spawn tasks still scheduled (0 or 1).
    #[allow(dead_code)]
    pub fn pending_timers(&self) -> usize {
        self.task()
            .as_ref()
            .map_or(0, |t| usize::from(!t.handle.is_finished()))
    }

    /// Must be called inside a tokio runtime.
    pub fn start(&self) {
        let mut task = self.task();
        if task.is_some() {
            return;
        }
        let cancel = CancellationToken::new();
        let token = cancel.clone();
        let layer = self.layer.clone();
        let handle = tokio::spawn(async move {
            let mut ticker = time::interval(SNOW_SPAWN_INTERVAL);
            loop {
                tokio::select! {
                    _ = token.cancelled() => break,
                    _ = ticker.tick() => {
                        layer.spawn(snowflake());
                    }
                }
            }
        });
        *task = Some(SpawnTask { cancel, handle });
        drop(task);
        debug!("Snow started");
        save_flag(self.prefs.as_ref(), SNOW_PREFERENCE, true);
    }

    /// Cancel spawning and drop every live flake.
    pub fn stop(&self) {
        if let Some(task) = self.task().take() {
            task.cancel.cancel();
            task.handle.abort();
            debug!("Snow stopped");
        }
        self.layer.clear();
        save_flag(self.prefs.as_ref(), SNOW_PREFERENCE, false);
    }

    /// Returns the new state.
    pub fn toggle(&self) -> bool {
        if self.is_running() {
            self.stop();
        } else {
            self.start();
        }
        self.is_running()
    }
}

impl Drop for SnowController {
    fn drop(&mut self) {
        if let Some(task) = self.task().take() {
            task.cancel.cancel();
        }
    }
}

fn snowflake() -> Particle {
    Particle {
        id: 0,
        size_px: sample(3.0, 7.0),
        left_pct: sample(0.0, 100.0),
        duration_ms: sample(5000.0, 8000.0) as u64,
        opacity: sample(0.3, 0.8),
        color: None,
    }
}
