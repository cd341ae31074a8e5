//! One running page: the loaded deck plus every piece of UI state the
//! handlers act on.

use crate::clipboard::{ClipboardChain, CopyOutcome};
use crate::config::Strings;
use crate::deck::{render_deck, DeckState, LoadFailure};
use crate::effects::{ConfettiBurst, Particle, ParticleLayer, SnowController, CONFETTI_COUNT};
use crate::events::{HostCall, UiEvent};
use crate::host::{HostAdapter, ImpactStyle, NotificationKind};
use crate::instruction::{compile_instruction, decode_copy_payload, CompiledInstruction};
use crate::prefs::PreferenceStore;
use crate::source::{DataSource, DocumentFetcher};
use crate::surface::{Modal, ModalPhase, Toast};
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, RwLock};
use tracing::{error, info, warn};

/// Delay between the finish celebration and the modal closing.
pub const FINISH_CLOSE_DELAY: Duration = Duration::from_millis(500);

/// How the user asked to close the modal. Only the explicit close control
/// gives haptic feedback up front.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CloseTrigger {
    #[default]
    Button,
    Outside,
    Escape,
}

pub struct SessionOptions {
    pub source: DataSource,
    pub fetcher: DocumentFetcher,
    pub strings: Strings,
    pub header_color: String,
    pub host: Arc<dyn HostAdapter>,
    pub prefs: Arc<dyn PreferenceStore>,
    pub clipboard: Arc<ClipboardChain>,
    pub events_tx: broadcast::Sender<UiEvent>,
}

#[derive(Debug, Clone, Serialize)]
pub struct EffectsSnapshot {
    pub snow_enabled: bool,
    pub snow: Vec<Particle>,
    pub confetti: Vec<Particle>,
}

#[derive(Debug, Clone, Serialize)]
pub struct DeckSummary {
    pub ok: bool,
    pub cards: usize,
    pub instructions: usize,
    pub skipped: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure: Option<LoadFailure>,
}

pub struct Session {
    source: DataSource,
    fetcher: DocumentFetcher,
    strings: Strings,
    header_color: String,
    deck: RwLock<DeckState>,
    host: Arc<dyn HostAdapter>,
    modal: Modal,
    toast: Toast,
    snow: SnowController,
    confetti: ConfettiBurst,
    clipboard: Arc<ClipboardChain>,
    events_tx: broadcast::Sender<UiEvent>,
}

impl Session {
    pub fn new(options: SessionOptions) -> Self {
        let modal = Modal::new(options.host.clone(), options.events_tx.clone());
        let toast = Toast::new(options.events_tx.clone());
        Self {
            source: options.source,
            fetcher: options.fetcher,
            strings: options.strings,
            header_color: options.header_color,
            // Nothing rendered until the first load resolves.
            deck: RwLock::new(Ok(Default::default())),
            host: options.host,
            modal,
            toast,
            snow: SnowController::new(Arc::new(ParticleLayer::new()), options.prefs),
            confetti: ConfettiBurst::new(Arc::new(ParticleLayer::new())),
            clipboard: options.clipboard,
            events_tx: options.events_tx,
        }
    }

    pub fn source(&self) -> &DataSource {
        &self.source
    }

    pub fn subscribe(&self) -> broadcast::Receiver<UiEvent> {
        self.events_tx.subscribe()
    }

    fn emit(&self, event: UiEvent) {
        let _ = self.events_tx.send(event);
    }

    /// Page start-up: host chrome, saved snow state, first load.
    pub async fn initialize(&self) -> DeckSummary {
        self.host.expand();
        self.host.set_header_color(&self.header_color);
        if self.snow.restore() {
            info!("Snow restored from preferences");
        }
        self.reload().await
    }

    /// Host chrome calls replayed to every page that connects after start-up.
    pub fn greeting(&self) -> Vec<UiEvent> {
        vec![
            UiEvent::Host(HostCall::Expand),
            UiEvent::Host(HostCall::SetHeaderColor {
                color: self.header_color.clone(),
            }),
            UiEvent::SnowChanged {
                enabled: self.snow.is_running(),
            },
        ]
    }

    /// Re-fetch and replace the deck (and its instruction index) wholesale.
    pub async fn reload(&self) -> DeckSummary {
        let state = self.fetcher.load_deck(&self.source).await;
        let summary = summarize(&state);
        *self.deck.write().await = state;
        self.emit(UiEvent::DeckReloaded {
            cards: summary.cards,
            ok: summary.ok,
        });
        summary
    }

    pub async fn summary(&self) -> DeckSummary {
        summarize(&*self.deck.read().await)
    }

    pub async fn cards_html(&self) -> String {
        render_deck(&*self.deck.read().await, &self.strings)
    }

    /// Compile without touching the modal.
    pub async fn compile(&self, card_id: &str) -> Option<CompiledInstruction> {
        let deck = self.deck.read().await;
        let doc = deck.as_ref().ok().and_then(|d| d.index.get(card_id));
        compile_instruction(card_id, doc, &self.strings)
    }

    /// `None` when the card has no instruction; the modal stays as it was.
    /// The press itself is felt either way, and a successful open again.
    pub async fn open_instruction(&self, card_id: &str) -> Option<CompiledInstruction> {
        self.host.haptic_impact(ImpactStyle::Light);
        let Some(compiled) = self.compile(card_id).await else {
            warn!("Instruction not found for card '{}'", card_id);
            return None;
        };
        self.modal.open(card_id, &compiled.title);
        self.host.haptic_impact(ImpactStyle::Light);
        Some(compiled)
    }

    /// Celebrate, then close the modal shortly after.
    pub fn finish_instruction(&self) {
        self.host.haptic_impact(ImpactStyle::Light);
        self.confetti.fire();
        self.emit(UiEvent::ConfettiFired {
            count: CONFETTI_COUNT,
        });
        self.host.haptic_notification(NotificationKind::Success);

        let modal = self.modal.clone();
        let confetti_layer = self.confetti.layer().clone();
        let events_tx = self.events_tx.clone();
        tokio::spawn(async move {
            tokio::time::sleep(FINISH_CLOSE_DELAY).await;
            if modal.close() {
                confetti_layer.clear();
                let _ = events_tx.send(UiEvent::ConfettiCleared);
            }
        });
    }

    /// Returns whether a close actually started.
    pub fn close_instruction(&self, trigger: CloseTrigger) -> bool {
        if trigger == CloseTrigger::Button {
            self.host.haptic_impact(ImpactStyle::Light);
        }
        if !self.modal.close() {
            return false;
        }
        self.confetti.clear();
        self.emit(UiEvent::ConfettiCleared);
        true
    }

    pub fn modal_phase(&self) -> ModalPhase {
        self.modal.phase()
    }

    /// Copy literal text. Never fails; a total failure is only logged.
    pub async fn copy(&self, text: String) -> CopyOutcome {
        self.host.haptic_impact(ImpactStyle::Light);
        let clipboard = self.clipboard.clone();
        let outcome = match tokio::task::spawn_blocking(move || clipboard.copy(&text)).await {
            Ok(outcome) => outcome,
            Err(e) => {
                error!("Clipboard task panicked: {}", e);
                CopyOutcome::Failed
            }
        };

        match outcome {
            CopyOutcome::Primary | CopyOutcome::Fallback => {
                self.toast.show(&self.strings.copied);
                self.host.haptic_notification(NotificationKind::Success);
            }
            CopyOutcome::Failed => error!("Failed to copy text: no clipboard accepted it"),
            CopyOutcome::Empty => {}
        }
        outcome
    }

    /// Copy a `data-copy` payload as attached to a copy control.
    pub async fn copy_encoded(&self, encoded: &str) -> Result<CopyOutcome> {
        let text = decode_copy_payload(encoded)?;
        Ok(self.copy(text).await)
    }

    /// Press feedback for controls that need no other handling here:
    /// platform links and website buttons.
    pub fn tap(&self) {
        self.host.haptic_impact(ImpactStyle::Light);
    }

    /// Returns the new snow state.
    pub fn toggle_snow(&self) -> bool {
        self.host.haptic_impact(ImpactStyle::Light);
        let enabled = self.snow.toggle();
        self.emit(UiEvent::SnowChanged { enabled });
        enabled
    }

    /// Hand data to the host. Without one, the data is only logged.
    pub fn submit_data(&self, data: &str) -> bool {
        if self.host.send_data(data) {
            self.host.haptic_notification(NotificationKind::Success);
            true
        } else {
            info!("Data to send: {}", data);
            false
        }
    }

    pub fn effects_snapshot(&self) -> EffectsSnapshot {
        EffectsSnapshot {
            snow_enabled: self.snow.is_running(),
            snow: self.snow.layer().live(),
            confetti: self.confetti.layer().live(),
        }
    }
}

fn summarize(state: &DeckState) -> DeckSummary {
    match state {
        Ok(deck) => DeckSummary {
            ok: true,
            cards: deck.cards.len(),
            instructions: deck.index.len(),
            skipped: deck.skipped,
            failure: None,
        },
        Err(failure) => DeckSummary {
            ok: false,
            cards: 0,
            instructions: 0,
            skipped: 0,
            failure: Some(failure.clone()),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clipboard::testing::FakeClipboard;
    use crate::host::testing::RecordingHost;
    use crate::host::NoHost;
    use crate::prefs::{MemoryPreferences, SNOW_PREFERENCE};
    use crate::surface::MODAL_CLOSE_DELAY;

    const DOC: &str = r#"{"cards": [
        {"id": "plain", "title": "Plain"},
        {"id": "vpn", "title": "NEW! VPN", "instruction": {
            "title": "Setup",
            "steps": [{"type": "copy", "title": "Key", "items": [{"text": "a<b>&c"}]}],
            "footer": {"text": "Done?", "buttonText": "Finish"}
        }}
    ]}"#;

    struct Fixture {
        session: Arc<Session>,
        host: Arc<RecordingHost>,
        prefs: Arc<MemoryPreferences>,
        _dir: tempfile::TempDir,
        data_path: std::path::PathBuf,
    }

    fn fixture_with(doc: &str, clipboard: ClipboardChain) -> Fixture {
        let dir = tempfile::tempdir().unwrap();
        let data_path = dir.path().join("data.json");
        std::fs::write(&data_path, doc).unwrap();
        let host = Arc::new(RecordingHost::default());
        let prefs = Arc::new(MemoryPreferences::default());
        let (events_tx, _) = broadcast::channel(256);
        let session = Session::new(SessionOptions {
            source: DataSource::File(data_path.clone()),
            fetcher: DocumentFetcher::new(Duration::from_secs(5)).unwrap(),
            strings: Strings::default(),
            header_color: "#0f0f0f".into(),
            host: host.clone(),
            prefs: prefs.clone(),
            clipboard: Arc::new(clipboard),
            events_tx,
        });
        Fixture {
            session: Arc::new(session),
            host,
            prefs,
            _dir: dir,
            data_path,
        }
    }

    fn light_impact() -> HostCall {
        HostCall::HapticImpact {
            style: ImpactStyle::Light,
        }
    }

    fn fixture() -> Fixture {
        fixture_with(
            DOC,
            ClipboardChain::new(
                Box::new(FakeClipboard::working()),
                Box::new(FakeClipboard::working()),
            ),
        )
    }

    #[tokio::test]
    async fn test_initialize_calls_host_and_loads() {
        let f = fixture();
        let summary = f.session.initialize().await;
        assert!(summary.ok);
        assert_eq!(summary.cards, 2);
        assert_eq!(summary.instructions, 1);
        let calls = f.host.calls();
        assert_eq!(calls[0], HostCall::Expand);
        assert_eq!(
            calls[1],
            HostCall::SetHeaderColor {
                color: "#0f0f0f".into()
            }
        );
        assert!(f.session.cards_html().await.starts_with(r#"<div class="card">"#));
    }

    #[tokio::test]
    async fn test_greeting_carries_header_color() {
        let f = fixture();
        let greeting = f.session.greeting();
        assert_eq!(greeting[0], UiEvent::Host(HostCall::Expand));
        assert!(greeting.contains(&UiEvent::SnowChanged { enabled: false }));
    }

    #[tokio::test]
    async fn test_reload_replaces_index() {
        let f = fixture();
        f.session.reload().await;
        assert!(f.session.compile("vpn").await.is_some());

        std::fs::write(&f.data_path, r#"{"cards": [{"id": "other"}]}"#).unwrap();
        let summary = f.session.reload().await;
        assert_eq!(summary.cards, 1);
        assert!(f.session.compile("vpn").await.is_none());
    }

    #[tokio::test]
    async fn test_reload_failure_renders_placeholder() {
        let f = fixture();
        std::fs::write(&f.data_path, "{}").unwrap();
        let summary = f.session.reload().await;
        assert!(!summary.ok);
        let html = f.session.cards_html().await;
        assert!(html.contains("Error: invalid data format"));
    }

    #[tokio::test]
    async fn test_open_unknown_card_leaves_modal_closed() {
        let f = fixture();
        f.session.reload().await;
        assert!(f.session.open_instruction("plain").await.is_none());
        assert_eq!(f.session.modal_phase(), ModalPhase::Closed);
        assert_eq!(f.host.calls(), vec![light_impact()]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_open_then_close() {
        let f = fixture();
        f.session.reload().await;
        let compiled = f.session.open_instruction("vpn").await.unwrap();
        assert_eq!(compiled.title, "Setup");
        assert_eq!(f.host.calls(), vec![light_impact(), light_impact()]);
        assert!(compiled.body_html().contains("data-copy=\"a%3Cb%3E%26c\""));

        assert!(f.session.close_instruction(CloseTrigger::Escape));
        assert!(!f.session.close_instruction(CloseTrigger::Escape));
        tokio::time::sleep(MODAL_CLOSE_DELAY * 2).await;
        assert_eq!(f.session.modal_phase(), ModalPhase::Closed);
    }

    #[tokio::test(start_paused = true)]
    async fn test_finish_fires_confetti_then_closes() {
        let f = fixture();
        f.session.reload().await;
        f.session.open_instruction("vpn").await.unwrap();
        f.host.clear();
        f.session.finish_instruction();
        assert_eq!(
            f.host.calls(),
            vec![
                light_impact(),
                HostCall::HapticNotification {
                    kind: NotificationKind::Success
                }
            ]
        );

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert!(!f.session.effects_snapshot().confetti.is_empty());
        assert!(f
            .host
            .calls()
            .contains(&HostCall::HapticNotification {
                kind: NotificationKind::Success
            }));

        tokio::time::sleep(FINISH_CLOSE_DELAY + MODAL_CLOSE_DELAY).await;
        assert_eq!(f.session.modal_phase(), ModalPhase::Closed);
    }

    #[tokio::test]
    async fn test_copy_encoded_round_trips() {
        let primary = FakeClipboard::working();
        let written = primary.written.clone();
        let f = fixture_with(
            DOC,
            ClipboardChain::new(Box::new(primary), Box::new(FakeClipboard::missing())),
        );
        let outcome = f.session.copy_encoded("a%3Cb%3E%26c").await.unwrap();
        assert_eq!(outcome, CopyOutcome::Primary);
        assert_eq!(*written.lock().unwrap(), vec!["a<b>&c".to_string()]);
        assert_eq!(
            f.host.calls(),
            vec![
                light_impact(),
                HostCall::HapticNotification {
                    kind: NotificationKind::Success
                }
            ]
        );
    }

    #[tokio::test]
    async fn test_copy_failure_is_not_an_error() {
        let f = fixture_with(
            DOC,
            ClipboardChain::new(
                Box::new(FakeClipboard::broken()),
                Box::new(FakeClipboard::broken()),
            ),
        );
        assert_eq!(f.session.copy("x".into()).await, CopyOutcome::Failed);
        assert_eq!(f.host.calls(), vec![light_impact()]);
    }

    #[tokio::test]
    async fn test_empty_copy_and_tap_only_give_press_feedback() {
        let f = fixture();
        assert_eq!(f.session.copy(String::new()).await, CopyOutcome::Empty);
        f.session.tap();
        assert_eq!(f.host.calls(), vec![light_impact(), light_impact()]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_toggle_snow_persists() {
        let f = fixture();
        assert!(f.session.toggle_snow());
        assert_eq!(f.prefs.get_bool(SNOW_PREFERENCE).unwrap(), Some(true));
        tokio::time::sleep(Duration::from_millis(350)).await;
        assert!(!f.session.effects_snapshot().snow.is_empty());

        assert!(!f.session.toggle_snow());
        let snapshot = f.session.effects_snapshot();
        assert!(!snapshot.snow_enabled);
        assert!(snapshot.snow.is_empty());
        assert_eq!(f.prefs.get_bool(SNOW_PREFERENCE).unwrap(), Some(false));
    }

    #[tokio::test]
    async fn test_submit_data_without_host_logs_only() {
        let (events_tx, _) = broadcast::channel(8);
        let session = Session::new(SessionOptions {
            source: DataSource::parse("data.json"),
            fetcher: DocumentFetcher::new(Duration::from_secs(1)).unwrap(),
            strings: Strings::default(),
            header_color: "#000".into(),
            host: Arc::new(NoHost),
            prefs: Arc::new(MemoryPreferences::default()),
            clipboard: Arc::new(ClipboardChain::new(
                Box::new(FakeClipboard::missing()),
                Box::new(FakeClipboard::missing()),
            )),
            events_tx,
        });
        assert!(!session.submit_data("payload"));
    }

    #[tokio::test]
    async fn test_submit_data_with_host() {
        let f = fixture();
        assert!(f.session.submit_data("payload"));
        assert_eq!(
            f.host.calls(),
            vec![
                HostCall::SendData {
                    data: "payload".into()
                },
                HostCall::HapticNotification {
                    kind: NotificationKind::Success
                }
            ]
        );
    }
}
