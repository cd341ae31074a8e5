use crate::deck::{build_deck, DeckState, LoadFailure};
use anyhow::{Context, Result};
use reqwest::header::{ACCEPT, CACHE_CONTROL};
use reqwest::Client;
use serde_json::Value;
use std::path::PathBuf;
use std::time::Duration;
use tracing::{error, info};

/// Where the card document comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DataSource {
    Url(String),
    File(PathBuf),
}

impl DataSource {
    pub fn parse(raw: &str) -> Self {
        let raw = raw.trim();
        if raw.starts_with("http://") || raw.starts_with("https://") {
            Self::Url(raw.to_string())
        } else {
            Self::File(PathBuf::from(raw))
        }
    }
}

impl std::fmt::Display for DataSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Url(url) => f.write_str(url),
            Self::File(path) => write!(f, "{}", path.display()),
        }
    }
}

#[derive(Clone)]
pub struct DocumentFetcher {
    http: Client,
}

impl DocumentFetcher {
    pub fn new(timeout: Duration) -> Result<Self> {
        let http = Client::builder()
            .timeout(timeout)
            .connect_timeout(Duration::from_secs(10))
            .build()
            .context("failed to build HTTP client")?;
        Ok(Self { http })
    }

    /// Fetch and parse the raw JSON document, bypassing caches.
    pub async fn fetch_document(&self, source: &DataSource) -> Result<Value> {
        let body = match source {
            DataSource::Url(url) => {
                let resp = self
                    .http
                    .get(url)
                    .header(CACHE_CONTROL, "no-cache")
                    .header(ACCEPT, "application/json")
                    .send()
                    .await
                    .with_context(|| format!("request to {} failed", url))?;
                let status = resp.status();
                if !status.is_success() {
                    anyhow::bail!("HTTP error! status: {}", status);
                }
                resp.text().await.context("failed to read response body")?
            }
            DataSource::File(path) => tokio::fs::read_to_string(path)
                .await
                .with_context(|| format!("failed to read {}", path.display()))?,
        };
        let document = serde_json::from_str(&body).context("document is not valid JSON")?;
        Ok(document)
    }

    /// Fetch and build. Never fails; problems become a [`LoadFailure`].
    pub async fn load_deck(&self, source: &DataSource) -> DeckState {
        let document = match self.fetch_document(source).await {
            Ok(document) => document,
            Err(e) => {
                error!("Error loading data from {}: {:#}", source, e);
                return Err(LoadFailure::Transport(format!("{:#}", e)));
            }
        };
        let state = build_deck(&document);
        if let Ok(deck) = &state {
            info!(
                "Loaded {} cards ({} with instructions) from {}",
                deck.cards.len(),
                deck.index.len(),
                source
            );
        }
        state
    }
}
