use crate::clipboard::CopyOutcome;
use crate::instruction::CompiledInstruction;
use crate::server::ServerState;
use crate::session::CloseTrigger;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;

pub(crate) async fn get_cards(State(state): State<Arc<ServerState>>) -> impl IntoResponse {
    let session = &state.session;
    Json(json!({
        "html": session.cards_html().await,
        "deck": session.summary().await,
    }))
}

pub(crate) async fn reload_cards(State(state): State<Arc<ServerState>>) -> impl IntoResponse {
    let session = &state.session;
    let summary = session.reload().await;
    Json(json!({
        "html": session.cards_html().await,
        "deck": summary,
    }))
}

/// Compiled instruction without opening the modal.
pub(crate) async fn preview_instruction(
    State(state): State<Arc<ServerState>>,
    Path(card_id): Path<String>,
) -> Response {
    let compiled = state.session.compile(&card_id).await;
    instruction_response(&card_id, compiled)
}

pub(crate) async fn open_instruction(
    State(state): State<Arc<ServerState>>,
    Path(card_id): Path<String>,
) -> Response {
    let compiled = state.session.open_instruction(&card_id).await;
    instruction_response(&card_id, compiled)
}

fn instruction_response(card_id: &str, compiled: Option<CompiledInstruction>) -> Response {
    match compiled {
        Some(compiled) => Json(json!({
            "card_id": compiled.card_id,
            "title": compiled.title,
            "html": compiled.body_html(),
            "instruction": compiled,
        }))
        .into_response(),
        None => (
            StatusCode::NOT_FOUND,
            Json(json!({ "error": format!("no instruction for card '{}'", card_id) })),
        )
            .into_response(),
    }
}

pub(crate) async fn finish_instruction(State(state): State<Arc<ServerState>>) -> impl IntoResponse {
    state.session.finish_instruction();
    Json(json!({ "status": "ok" }))
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct CloseQuery {
    #[serde(default)]
    via: CloseTrigger,
}

pub(crate) async fn close_instruction(
    State(state): State<Arc<ServerState>>,
    Query(query): Query<CloseQuery>,
) -> impl IntoResponse {
    let closing = state.session.close_instruction(query.via);
    Json(json!({ "closing": closing }))
}

/// Either the literal text or the `data-copy` payload of a copy control.
#[derive(Debug, Deserialize)]
pub(crate) struct CopyRequest {
    text: Option<String>,
    encoded: Option<String>,
}

pub(crate) async fn copy_text(
    State(state): State<Arc<ServerState>>,
    Json(req): Json<CopyRequest>,
) -> impl IntoResponse {
    let outcome = match (req.text, req.encoded) {
        (Some(text), _) => state.session.copy(text).await,
        (None, Some(encoded)) => match state.session.copy_encoded(&encoded).await {
            Ok(outcome) => outcome,
            Err(e) => return (StatusCode::BAD_REQUEST, e.to_string()).into_response(),
        },
        (None, None) => CopyOutcome::Empty,
    };
    Json(json!({ "outcome": outcome, "copied": outcome.succeeded() })).into_response()
}

pub(crate) async fn tap(State(state): State<Arc<ServerState>>) -> impl IntoResponse {
    state.session.tap();
    StatusCode::NO_CONTENT
}

pub(crate) async fn toggle_snow(State(state): State<Arc<ServerState>>) -> impl IntoResponse {
    Json(json!({ "enabled": state.session.toggle_snow() }))
}

pub(crate) async fn effects(State(state): State<Arc<ServerState>>) -> impl IntoResponse {
    Json(state.session.effects_snapshot())
}

#[derive(Debug, Deserialize)]
pub(crate) struct SendDataRequest {
    data: String,
}

pub(crate) async fn send_data(
    State(state): State<Arc<ServerState>>,
    Json(req): Json<SendDataRequest>,
) -> impl IntoResponse {
    Json(json!({ "delivered": state.session.submit_data(&req.data) }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clipboard::testing::FakeClipboard;
    use crate::clipboard::ClipboardChain;
    use crate::config::Strings;
    use crate::host::NoHost;
    use crate::prefs::MemoryPreferences;
    use crate::session::{Session, SessionOptions};
    use crate::surface::ModalPhase;
    use crate::source::{DataSource, DocumentFetcher};
    use serde_json::Value;
    use std::time::Duration;
    use tokio::sync::broadcast;

    async fn state_with(doc: &str) -> (Arc<ServerState>, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data.json");
        std::fs::write(&path, doc).unwrap();
        let (events_tx, _) = broadcast::channel(64);
        let session = Session::new(SessionOptions {
            source: DataSource::File(path),
            fetcher: DocumentFetcher::new(Duration::from_secs(5)).unwrap(),
            strings: Strings::default(),
            header_color: "#0f0f0f".into(),
            host: Arc::new(NoHost),
            prefs: Arc::new(MemoryPreferences::default()),
            clipboard: Arc::new(ClipboardChain::new(
                Box::new(FakeClipboard::working()),
                Box::new(FakeClipboard::missing()),
            )),
            events_tx,
        });
        session.reload().await;
        (Arc::new(ServerState::new(Arc::new(session))), dir)
    }

    async fn body_json(response: Response) -> Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    async fn get_json(client: &reqwest::Client, url: &str) -> Value {
        client
            .get(url)
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap()
    }

    const DOC: &str = r#"{"cards": [{"id": "vpn", "title": "VPN", "instruction": {
        "title": "Setup", "steps": [{"type": "text", "title": "Go", "text": "**now**"}]
    }}]}"#;

    #[tokio::test]
    async fn test_open_instruction_returns_html() {
        let (state, _dir) = state_with(DOC).await;
        let response = open_instruction(State(state), Path("vpn".to_string())).await;
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["title"], "Setup");
        assert!(body["html"].as_str().unwrap().contains("<b>now</b>"));
    }

    #[tokio::test]
    async fn test_preview_leaves_modal_closed() {
        let (state, _dir) = state_with(DOC).await;
        let response = preview_instruction(State(state.clone()), Path("vpn".to_string())).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await["title"], "Setup");
        assert_eq!(state.session.modal_phase(), ModalPhase::Closed);

        open_instruction(State(state.clone()), Path("vpn".to_string())).await;
        assert_eq!(
            state.session.modal_phase(),
            ModalPhase::Open {
                card_id: "vpn".into()
            }
        );
    }

    #[tokio::test]
    async fn test_open_unknown_instruction_is_404() {
        let (state, _dir) = state_with(DOC).await;
        let response = open_instruction(State(state), Path("missing".to_string())).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_cards_fragment() {
        let (state, _dir) = state_with(DOC).await;
        let body = body_json(get_cards(State(state)).await.into_response()).await;
        assert_eq!(body["deck"]["ok"], true);
        assert_eq!(body["deck"]["cards"], 1);
        assert!(body["html"].as_str().unwrap().contains("<h3>VPN</h3>"));
    }

    #[tokio::test]
    async fn test_copy_bad_payload_is_400() {
        let (state, _dir) = state_with(DOC).await;
        let response = copy_text(
            State(state),
            Json(CopyRequest {
                text: None,
                encoded: Some("%FF%FE".into()),
            }),
        )
        .await
        .into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_copy_encoded() {
        let (state, _dir) = state_with(DOC).await;
        let response = copy_text(
            State(state),
            Json(CopyRequest {
                text: None,
                encoded: Some("a%3Cb%3E%26c".into()),
            }),
        )
        .await
        .into_response();
        let body = body_json(response).await;
        assert_eq!(body["outcome"], "primary");
        assert_eq!(body["copied"], true);
    }

    #[tokio::test]
    async fn test_routes_over_http() {
        let (state, _dir) = state_with(DOC).await;
        let handle = crate::server::prepare_server(state.session.clone(), 0)
            .await
            .unwrap();
        let base = format!("http://127.0.0.1:{}", handle.port);
        let client = reqwest::Client::builder().no_proxy().build().unwrap();
        let health_url = format!("{}/api/health", base);

        let page = client.get(&base).send().await.unwrap().text().await.unwrap();
        assert!(page.contains("telegram-web-app.js"));
        assert!(page.contains(r#"<h3>VPN</h3>"#));

        let preview = client
            .get(format!("{}/api/instructions/vpn", base))
            .send()
            .await
            .unwrap();
        assert_eq!(preview.status(), reqwest::StatusCode::OK);
        assert_eq!(
            get_json(&client, &health_url).await["modal"],
            json!({"phase": "closed"})
        );

        let opened = client
            .post(format!("{}/api/instructions/vpn", base))
            .send()
            .await
            .unwrap();
        assert_eq!(opened.status(), reqwest::StatusCode::OK);
        assert_eq!(
            get_json(&client, &health_url).await["modal"],
            json!({"phase": "open", "card_id": "vpn"})
        );

        let tapped = client
            .post(format!("{}/api/host/tap", base))
            .send()
            .await
            .unwrap();
        assert_eq!(tapped.status(), reqwest::StatusCode::NO_CONTENT);

        handle.task.abort();
    }

    #[tokio::test]
    async fn test_close_without_open_modal() {
        let (state, _dir) = state_with(DOC).await;
        let response = close_instruction(State(state), Query(CloseQuery::default()))
            .await
            .into_response();
        assert_eq!(body_json(response).await["closing"], false);
    }
}
