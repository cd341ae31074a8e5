use crate::events::UiEvent;
use serde::Serialize;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::sync::broadcast;

pub const TOAST_VISIBLE_FOR: Duration = Duration::from_millis(2000);
/// Fade-out before the toast is removed.
pub const TOAST_REMOVE_DELAY: Duration = Duration::from_millis(300);

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ToastState {
    pub message: String,
    pub visible: bool,
}

#[derive(Default)]
struct ToastInner {
    current: Option<ToastState>,
    generation: u64,
}

/// At most one toast exists; showing a new one replaces the old.
#[derive(Clone)]
pub struct Toast {
    inner: Arc<Mutex<ToastInner>>,
    events_tx: broadcast::Sender<UiEvent>,
}

impl Toast {
    pub fn new(events_tx: broadcast::Sender<UiEvent>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(ToastInner::default())),
            events_tx,
        }
    }

    fn lock(&self) -> MutexGuard<'_, ToastInner> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    #[allow(dead_code)]
    pub fn current(&self) -> Option<ToastState> {
        self.lock().current.clone()
    }

    pub fn show(&self, message: &str) {
        let generation = {
            let mut inner = self.lock();
            inner.generation += 1;
            inner.current = Some(ToastState {
                message: message.to_string(),
                visible: true,
            });
            inner.generation
        };
        let _ = self.events_tx.send(UiEvent::ToastShown {
            message: message.to_string(),
        });

        let toast = self.clone();
        tokio::spawn(async move {
            tokio::time::sleep(TOAST_VISIBLE_FOR).await;
            if !toast.hide(generation) {
                return;
            }
            tokio::time::sleep(TOAST_REMOVE_DELAY).await;
            toast.remove(generation);
        });
    }

    fn hide(&self, generation: u64) -> bool {
        {
            let mut inner = self.lock();
            if inner.generation != generation {
                return false;
            }
            if let Some(state) = inner.current.as_mut() {
                state.visible = false;
            }
        }
        let _ = self.events_tx.send(UiEvent::ToastHidden);
        true
    }

    fn remove(&self, generation: u64) {
        let mut inner = self.lock();
        if inner.generation == generation {
            inner.current = None;
        }
    }
}
