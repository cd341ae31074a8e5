use super::particles::{sample, Particle, ParticleLayer};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;

pub const CONFETTI_COUNT: usize = 60;
/// Delay between consecutive pieces of one burst.
pub const CONFETTI_STAGGER: Duration = Duration::from_millis(20);

const PALETTE: &[&str] = &[
    "#2481cc", "#64b5f6", "#4caf50", "#ff6b6b", "#ffd700", "#ffffff",
];

/// Fire-and-forget bursts; no state survives between them.
pub struct ConfettiBurst {
    layer: Arc<ParticleLayer>,
}

impl ConfettiBurst {
    pub fn new(layer: Arc<ParticleLayer>) -> Self {
        Self { layer }
    }

    pub fn layer(&self) -> &Arc<ParticleLayer> {
        &self.layer
    }

    /// Spawn [`CONFETTI_COUNT`] pieces [`CONFETTI_STAGGER`] apart. The handle
    /// is only for tests; callers normally drop it.
    pub fn fire(&self) -> JoinHandle<()> {
        let layer = self.layer.clone();
        tokio::spawn(async move {
            for i in 0..CONFETTI_COUNT {
                if i > 0 {
                    tokio::time::sleep(CONFETTI_STAGGER).await;
                }
                layer.spawn(confetti_piece());
            }
        })
    }

    /// Remove every piece currently on screen.
    pub fn clear(&self) {
        self.layer.clear();
    }
}

fn confetti_piece() -> Particle {
    let color_index = ((sample(0.0, 1.0) * PALETTE.len() as f64) as usize).min(PALETTE.len() - 1);
    Particle {
        id: 0,
        size_px: sample(4.0, 10.0),
        left_pct: sample(0.0, 100.0),
        duration_ms: sample(1000.0, 2000.0) as u64,
        opacity: 1.0,
        color: Some(PALETTE[color_index]),
    }
}
