mod builder;
mod index;
pub mod model;

pub use builder::{build_deck, CardDeck, CardView};

use crate::config::Strings;
use crate::markup::escape_html;
use serde::Serialize;

/// Why a load produced no cards. Both variants render the same way (a single
/// localized placeholder); the detail is for logs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum LoadFailure {
    /// Fetch rejected, non-OK status, or unparsable JSON.
    Transport(String),
    /// Parsed JSON without a `cards` array.
    Format(String),
}

impl LoadFailure {
    pub fn detail(&self) -> &str {
        match self {
            Self::Transport(d) | Self::Format(d) => d,
        }
    }

    pub fn user_message<'a>(&self, strings: &'a Strings) -> &'a str {
        match self {
            Self::Transport(_) => &strings.load_error,
            Self::Format(_) => &strings.format_error,
        }
    }
}

pub type DeckState = Result<CardDeck, LoadFailure>;

/// HTML for the card container: every card, or exactly one placeholder.
pub fn render_deck(state: &DeckState, strings: &Strings) -> String {
    match state {
        Ok(deck) => deck.cards.iter().map(CardView::to_html).collect(),
        Err(failure) => placeholder_html(failure.user_message(strings)),
    }
}

pub fn placeholder_html(message: &str) -> String {
    format!(
        r#"<p class="load-error" style="color: var(--text-secondary);">{}</p>"#,
        escape_html(message)
    )
}
