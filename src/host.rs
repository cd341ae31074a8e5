//! Host platform capabilities (viewport, chrome colour, data hand-off, haptics).
//!
//! Every method defaults to a no-op, so call sites never check whether a
//! capability exists.

use crate::events::{HostCall, UiEvent};
use serde::Serialize;
use tokio::sync::broadcast;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
#[allow(dead_code)]
pub enum ImpactStyle {
    Light,
    Medium,
    Heavy,
    Rigid,
    Soft,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
#[allow(dead_code)]
pub enum NotificationKind {
    Success,
    Warning,
    Error,
}

pub trait HostAdapter: Send + Sync {
    fn expand(&self) {}

    fn set_header_color(&self, _color: &str) {}

    /// Returns `false` when there is no host to receive the data.
    fn send_data(&self, _data: &str) -> bool {
        false
    }

    fn haptic_impact(&self, _style: ImpactStyle) {}

    fn haptic_notification(&self, _kind: NotificationKind) {}
}

/// No host platform at all.
#[cfg(test)]
pub struct NoHost;

#[cfg(test)]
impl HostAdapter for NoHost {}

/// Forwards host calls to connected pages as [`UiEvent::Host`].
pub struct EventHost {
    events_tx: broadcast::Sender<UiEvent>,
}

impl EventHost {
    pub fn new(events_tx: broadcast::Sender<UiEvent>) -> Self {
        Self { events_tx }
    }

    fn forward(&self, call: HostCall) -> bool {
        self.events_tx.send(UiEvent::Host(call)).is_ok()
    }
}

impl HostAdapter for EventHost {
    fn expand(&self) {
        self.forward(HostCall::Expand);
    }

    fn set_header_color(&self, color: &str) {
        self.forward(HostCall::SetHeaderColor {
            color: color.to_string(),
        });
    }

    fn send_data(&self, data: &str) -> bool {
        // Only delivered when some page is listening.
        self.forward(HostCall::SendData {
            data: data.to_string(),
        })
    }

    fn haptic_impact(&self, style: ImpactStyle) {
        self.forward(HostCall::HapticImpact { style });
    }

    fn haptic_notification(&self, kind: NotificationKind) {
        self.forward(HostCall::HapticNotification { kind });
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_host_is_silent() {
        let host = NoHost;
        host.expand();
        host.set_header_color("#000");
        host.haptic_impact(ImpactStyle::Light);
        host.haptic_notification(NotificationKind::Success);
        assert!(!host.send_data("payload"));
    }

    #[test]
    fn test_event_host_forwards() {
        let (tx, mut rx) = broadcast::channel(8);
        let host = EventHost::new(tx);
        host.haptic_impact(ImpactStyle::Light);
        assert!(host.send_data("order:42"));
        assert_eq!(
            rx.try_recv().unwrap(),
            UiEvent::Host(HostCall::HapticImpact { style: ImpactStyle::Light })
        );
        assert_eq!(
            rx.try_recv().unwrap(),
            UiEvent::Host(HostCall::SendData { data: "order:42".into() })
        );
    }

    #[test]
    fn test_event_host_without_listeners() {
        let (tx, rx) = broadcast::channel(8);
        drop(rx);
        let host = EventHost::new(tx);
        assert!(!host.send_data("lost"));
    }

    #[test]
    fn test_host_call_wire_format() {
        let json = serde_json::to_value(UiEvent::Host(HostCall::HapticNotification {
            kind: NotificationKind::Success,
        }))
        .unwrap();
        assert_eq!(
            json,
            serde_json::json!({"type": "host", "call": "haptic_notification", "kind": "success"})
        );
    }
}
