use crate::events::UiEvent;
use crate::host::{HostAdapter, ImpactStyle};
use serde::Serialize;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::sync::broadcast;

/// Length of the close animation.
pub const MODAL_CLOSE_DELAY: Duration = Duration::from_millis(300);

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "phase", rename_all = "snake_case")]
pub enum ModalPhase {
    Closed,
    Open { card_id: String },
    Closing { card_id: String },
}

struct ModalInner {
    phase: ModalPhase,
    /// Bumped on every open and close; a close timer only finishes the close
    /// it was scheduled for.
    generation: u64,
}

#[derive(Clone)]
pub struct Modal {
    inner: Arc<Mutex<ModalInner>>,
    host: Arc<dyn HostAdapter>,
    events_tx: broadcast::Sender<UiEvent>,
}

impl Modal {
    pub fn new(host: Arc<dyn HostAdapter>, events_tx: broadcast::Sender<UiEvent>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(ModalInner {
                phase: ModalPhase::Closed,
                generation: 0,
            })),
            host,
            events_tx,
        }
    }

    fn lock(&self) -> MutexGuard<'_, ModalInner> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn phase(&self) -> ModalPhase {
        self.lock().phase.clone()
    }

    pub fn open(&self, card_id: &str, title: &str) {
        {
            let mut inner = self.lock();
            inner.generation += 1;
            inner.phase = ModalPhase::Open {
                card_id: card_id.to_string(),
            };
        }
        let _ = self.events_tx.send(UiEvent::ModalOpened {
            card_id: card_id.to_string(),
            title: title.to_string(),
        });
    }

    /// Start the close animation. Returns `false` when the modal is already
    /// closed or closing, in which case nothing is scheduled.
    pub fn close(&self) -> bool {
        let generation = {
            let mut inner = self.lock();
            let card_id = match &inner.phase {
                ModalPhase::Open { card_id } => card_id.clone(),
                ModalPhase::Closing { .. } | ModalPhase::Closed => return false,
            };
            inner.generation += 1;
            inner.phase = ModalPhase::Closing { card_id };
            inner.generation
        };
        let _ = self.events_tx.send(UiEvent::ModalClosing);

        let modal = self.clone();
        tokio::spawn(async move {
            tokio::time::sleep(MODAL_CLOSE_DELAY).await;
            modal.finish_close(generation);
        });
        true
    }

    fn finish_close(&self, generation: u64) {
        {
            let mut inner = self.lock();
            if inner.generation != generation {
                return;
            }
            inner.phase = ModalPhase::Closed;
        }
        let _ = self.events_tx.send(UiEvent::ModalClosed);
        self.host.haptic_impact(ImpactStyle::Light);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::NoHost;

    fn modal() -> (Modal, broadcast::Receiver<UiEvent>) {
        let (tx, rx) = broadcast::channel(64);
        (Modal::new(Arc::new(NoHost), tx), rx)
    }

    fn drain(rx: &mut broadcast::Receiver<UiEvent>) -> Vec<UiEvent> {
        let mut events = Vec::new();
        while let Ok(event) = rx.try_recv() {
            events.push(event);
        }
        events
    }

    #[tokio::test(start_paused = true)]
    async fn test_close_twice_single_closed_state() {
        let (modal, mut rx) = modal();
        modal.open("vpn", "Setup");
        assert!(modal.close());
        assert!(!modal.close());
        tokio::time::sleep(Duration::from_secs(1)).await;

        assert_eq!(modal.phase(), ModalPhase::Closed);
        let closed = drain(&mut rx)
            .into_iter()
            .filter(|e| *e == UiEvent::ModalClosed)
            .count();
        assert_eq!(closed, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_close_when_closed_is_noop() {
        let (modal, mut rx) = modal();
        assert!(!modal.close());
        tokio::time::sleep(Duration::from_secs(1)).await;
        assert_eq!(modal.phase(), ModalPhase::Closed);
        assert!(drain(&mut rx).is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_reopen_mid_close_ignores_stale_timer() {
        let (modal, _rx) = modal();
        modal.open("a", "A");
        modal.close();
        tokio::time::sleep(Duration::from_millis(100)).await;
        modal.open("b", "B");
        tokio::time::sleep(Duration::from_secs(1)).await;
        assert_eq!(
            modal.phase(),
            ModalPhase::Open {
                card_id: "b".into()
            }
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_closing_phase_until_animation_ends() {
        let (modal, _rx) = modal();
        modal.open("a", "A");
        modal.close();
        assert!(matches!(modal.phase(), ModalPhase::Closing { .. }));
        tokio::time::sleep(MODAL_CLOSE_DELAY + Duration::from_millis(1)).await;
        assert_eq!(modal.phase(), ModalPhase::Closed);
    }
}
