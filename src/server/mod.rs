mod api;

use crate::events::UiEvent;
use crate::session::Session;
use axum::{
    extract::State,
    http::Uri,
    response::{
        sse::{Event, KeepAlive, Sse},
        IntoResponse, Response,
    },
    routing::{get, post},
    Router,
};
use rust_embed::RustEmbed;
use serde_json::json;
use std::convert::Infallible;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio_stream::wrappers::errors::BroadcastStreamRecvError;
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::StreamExt;
use tracing::info;

use api::{
    close_instruction, copy_text, effects, finish_instruction, get_cards, open_instruction,
    preview_instruction, reload_cards, send_data, tap, toggle_snow,
};

/// Marker in `index.html` replaced by the rendered card list.
const CARDS_PLACEHOLDER: &str = "<!--cards-->";

#[derive(RustEmbed)]
#[folder = "ui/"]
struct Assets;

pub struct ServerState {
    pub session: Arc<Session>,
    event_seq: AtomicU64,
}

impl ServerState {
    pub fn new(session: Arc<Session>) -> Self {
        Self {
            session,
            event_seq: AtomicU64::new(1),
        }
    }
}

pub struct ServerHandle {
    pub task: tokio::task::JoinHandle<anyhow::Result<()>>,
    pub port: u16,
}

pub fn router(state: Arc<ServerState>) -> Router {
    Router::new()
        .route("/", get(index_handler))
        .route("/index.html", get(index_handler))
        .route("/api/cards", get(get_cards))
        .route("/api/reload", post(reload_cards))
        .route("/api/instructions/finish", post(finish_instruction))
        .route("/api/instructions/close", post(close_instruction))
        .route(
            "/api/instructions/{card_id}",
            get(preview_instruction).post(open_instruction),
        )
        .route("/api/copy", post(copy_text))
        .route("/api/snow", post(toggle_snow))
        .route("/api/effects", get(effects))
        .route("/api/host/send-data", post(send_data))
        .route("/api/host/tap", post(tap))
        .route("/api/events", get(events_handler))
        .route("/api/health", get(health_handler))
        .fallback(static_handler)
        .with_state(state)
}

pub async fn prepare_server(session: Arc<Session>, port: u16) -> anyhow::Result<ServerHandle> {
    info!("cardview server starting on port {}...", port);

    let state = Arc::new(ServerState::new(session));
    let app = router(state);

    let listener = tokio::net::TcpListener::bind(format!("127.0.0.1:{}", port)).await?;
    let actual_port = listener.local_addr()?.port();
    info!("Server running on http://localhost:{}", actual_port);

    let task = tokio::spawn(async move {
        axum::serve(listener, app).await?;
        Ok(())
    });

    Ok(ServerHandle {
        task,
        port: actual_port,
    })
}

fn build_response(builder: axum::http::response::Builder, body: axum::body::Body) -> Response {
    builder
        .body(body)
        .unwrap_or_else(|_| Response::new(axum::body::Body::from("internal server error")))
}

/// Page shell with the current card list inlined, so the first paint needs
/// no extra request.
async fn index_handler(State(state): State<Arc<ServerState>>) -> Response {
    let Some(index) = Assets::get("index.html") else {
        return build_response(
            Response::builder().status(404),
            axum::body::Body::from("Not found"),
        );
    };
    let shell = String::from_utf8_lossy(&index.data);
    let page = shell.replacen(CARDS_PLACEHOLDER, &state.session.cards_html().await, 1);
    build_response(
        Response::builder().header("Content-Type", "text/html; charset=utf-8"),
        axum::body::Body::from(page),
    )
}

async fn static_handler(uri: Uri) -> Response {
    let path = uri.path().trim_start_matches('/');

    match Assets::get(path) {
        Some(content) => {
            let mime = mime_guess::from_path(path).first_or_octet_stream();
            build_response(
                Response::builder().header("Content-Type", mime.as_ref()),
                axum::body::Body::from(content.data),
            )
        }
        None => build_response(
            Response::builder().status(404),
            axum::body::Body::from("Not found"),
        ),
    }
}

async fn events_handler(
    State(state): State<Arc<ServerState>>,
) -> Sse<impl tokio_stream::Stream<Item = Result<Event, Infallible>>> {
    let rx = state.session.subscribe();
    let greeting = tokio_stream::iter(state.session.greeting().into_iter().map(Ok::<_, BroadcastStreamRecvError>));
    let stream = greeting.chain(BroadcastStream::new(rx)).map(move |msg| {
        let seq = state.event_seq.fetch_add(1, Ordering::Relaxed);
        let event = match msg {
            Ok(event) => sse_event(&event),
            // Lagged receiver: tell the page to refetch what it mirrors.
            Err(_) => Event::default().event("resync").data("{}"),
        };
        Ok(event.id(seq.to_string()))
    });

    Sse::new(stream).keep_alive(KeepAlive::default())
}

fn sse_event(event: &UiEvent) -> Event {
    let data = serde_json::to_string(event).unwrap_or_default();
    Event::default().event("ui").data(data)
}

async fn health_handler(State(state): State<Arc<ServerState>>) -> impl IntoResponse {
    let summary = state.session.summary().await;
    axum::Json(json!({
        "ok": true,
        "source": state.session.source().to_string(),
        "deck": summary,
        "modal": state.session.modal_phase(),
    }))
}
