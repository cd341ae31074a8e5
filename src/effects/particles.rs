use serde::Serialize;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;
use tokio::time::Instant;

/// One animated particle, described the way the page styles it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Particle {
    pub id: u64,
    pub size_px: f64,
    pub left_pct: f64,
    pub duration_ms: u64,
    pub opacity: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<&'static str>,
}

#[derive(Default)]
struct LayerInner {
    next_id: u64,
    live: Vec<(Particle, Instant)>,
}

/// Container of live particles. A particle removes itself once its animation
/// duration has elapsed.
#[derive(Default)]
pub struct ParticleLayer {
    inner: Mutex<LayerInner>,
}

impl ParticleLayer {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, LayerInner> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Add a particle; the `id` field of `particle` is assigned here.
    pub fn spawn(&self, mut particle: Particle) -> u64 {
        let mut inner = self.lock();
        prune(&mut inner);
        inner.next_id += 1;
        particle.id = inner.next_id;
        let expires_at = Instant::now() + Duration::from_millis(particle.duration_ms);
        inner.live.push((particle, expires_at));
        inner.next_id
    }

    /// Live particles, oldest first.
    pub fn live(&self) -> Vec<Particle> {
        let mut inner = self.lock();
        prune(&mut inner);
        inner.live.iter().map(|(p, _)| p.clone()).collect()
    }

    #[allow(dead_code)]
    pub fn len(&self) -> usize {
        let mut inner = self.lock();
        prune(&mut inner);
        inner.live.len()
    }

    #[allow(dead_code)]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        self.lock().live.clear();
    }
}

fn prune(inner: &mut LayerInner) {
    let now = Instant::now();
    inner.live.retain(|(_, expires_at)| *expires_at > now);
}

/// Uniform sample in `[min, max)`.
pub(super) fn sample(min: f64, max: f64) -> f64 {
    rand::random::<f64>() * (max - min) + min
}
