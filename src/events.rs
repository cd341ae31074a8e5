use crate::host::{ImpactStyle, NotificationKind};
use serde::Serialize;

/// Everything the page needs to mirror, pushed over `/api/events`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum UiEvent {
    DeckReloaded {
        cards: usize,
        ok: bool,
    },
    ModalOpened {
        card_id: String,
        title: String,
    },
    /// Close animation started; `ModalClosed` follows unless the modal is reopened.
    ModalClosing,
    ModalClosed,
    ToastShown {
        message: String,
    },
    ToastHidden,
    SnowChanged {
        enabled: bool,
    },
    ConfettiFired {
        count: usize,
    },
    ConfettiCleared,
    Host(HostCall),
}

/// Host platform calls, forwarded to the page's platform bridge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "call", rename_all = "snake_case")]
pub enum HostCall {
    Expand,
    SetHeaderColor { color: String },
    SendData { data: String },
    HapticImpact { style: ImpactStyle },
    HapticNotification { kind: NotificationKind },
}
