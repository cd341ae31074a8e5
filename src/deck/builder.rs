use super::index::InstructionIndex;
use super::model::{CardRecord, NEW_MARKER};
use super::LoadFailure;
use crate::markup::{escape_html, escape_opt, render_markdown_opt};
use serde::Serialize;
use serde_json::Value;
use tracing::warn;

/// Render-ready card. Every `*_html` field is already escaped or rendered.
#[derive(Debug, Clone, Serialize)]
pub struct CardView {
    pub id: String,
    pub is_new: bool,
    pub title_html: String,
    pub country: Option<String>,
    pub description_html: String,
    pub primary: Option<PrimaryButton>,
    pub website: Option<WebsiteLink>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PrimaryButton {
    pub label: String,
    pub action: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct WebsiteLink {
    pub url: String,
    pub label_html: String,
}

#[derive(Debug, Clone, Default)]
pub struct CardDeck {
    pub cards: Vec<CardView>,
    pub index: InstructionIndex,
    /// Records dropped because they were not JSON objects.
    pub skipped: usize,
}

/// Build the deck from a parsed data document.
pub fn build_deck(document: &Value) -> Result<CardDeck, LoadFailure> {
    let Some(raw_cards) = document.get("cards").and_then(Value::as_array) else {
        warn!("Card document has no `cards` array");
        return Err(LoadFailure::Format(
            "missing or non-array `cards` field".to_string(),
        ));
    };

    let mut records = Vec::with_capacity(raw_cards.len());
    let mut skipped = 0usize;
    for (position, raw) in raw_cards.iter().enumerate() {
        match serde_json::from_value::<CardRecord>(raw.clone()) {
            Ok(record) => records.push(record),
            Err(e) => {
                skipped += 1;
                warn!("Skipping card #{}: {}", position, e);
            }
        }
    }

    let mut deck = CardDeck::from_records(records);
    deck.skipped = skipped;
    Ok(deck)
}

impl CardDeck {
    pub fn from_records(mut records: Vec<CardRecord>) -> Self {
        // Stable: new cards first, original order within each group.
        records.sort_by_key(|r| !r.is_new());

        let mut index = InstructionIndex::default();
        let mut cards = Vec::with_capacity(records.len());
        for mut record in records {
            if let Some(doc) = record.instruction.take() {
                if record.id.is_empty() {
                    warn!("Card without id carries an instruction; it cannot be opened");
                } else {
                    index.insert(record.id.clone(), doc);
                }
            }
            cards.push(CardView::from_record(&record));
        }

        Self {
            cards,
            index,
            skipped: 0,
        }
    }
}

impl CardView {
    pub fn from_record(record: &CardRecord) -> Self {
        let is_new = record.is_new();
        let title_html = match record.title.as_deref() {
            Some(title) if is_new => format!(
                r#"<span class="new-badge">{}</span> {}"#,
                NEW_MARKER,
                escape_html(&strip_new_marker(title))
            ),
            title => escape_opt(title),
        };

        let primary = match (non_empty(&record.button_text), non_empty(&record.button_action)) {
            (Some(label), Some(action)) => Some(PrimaryButton {
                label: label.to_string(),
                action: action.to_string(),
            }),
            _ => None,
        };

        let website = match (non_empty(&record.website_url), non_empty(&record.website_text)) {
            (Some(url), Some(label)) => Some(WebsiteLink {
                url: url.to_string(),
                label_html: render_markdown_opt(Some(label)),
            }),
            _ => None,
        };

        Self {
            id: record.id.clone(),
            is_new,
            title_html,
            country: non_empty(&record.country).map(str::to_string),
            description_html: render_markdown_opt(record.description.as_deref()),
            primary,
            website,
        }
    }

    pub fn to_html(&self) -> String {
        let mut actions = String::new();
        if let Some(primary) = &self.primary {
            actions.push_str(&format!(
                r#"<button class="btn btn-primary" data-action="{}" data-card-id="{}">{}</button>"#,
                escape_html(&primary.action),
                escape_html(&self.id),
                escape_html(&primary.label)
            ));
        }
        if let Some(website) = &self.website {
            actions.push_str(&format!(
                r#"<a href="{}" target="_blank" rel="noopener noreferrer" class="btn btn-secondary">{}</a>"#,
                escape_html(&website.url),
                website.label_html
            ));
        }

        let country = self
            .country
            .as_deref()
            .map(country_badge)
            .unwrap_or_default();

        format!(
            r#"<div class="card">
    <div class="card-header">
        <h3>{title}</h3>{country}
    </div>
    <p>{description}</p>
    <div class="card-actions">{actions}</div>
</div>
"#,
            title = self.title_html,
            country = country,
            description = self.description_html,
            actions = actions,
        )
    }
}

/// Drop the first marker occurrence (with its trailing space when present).
fn strip_new_marker(title: &str) -> String {
    let with_space = format!("{} ", NEW_MARKER);
    let stripped = if title.contains(&with_space) {
        title.replacen(&with_space, "", 1)
    } else {
        title.replacen(NEW_MARKER, "", 1)
    };
    stripped.trim().to_string()
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}

/// Two-letter ISO code as a flag emoji; anything else is shown as escaped text.
fn country_badge(code: &str) -> String {
    let upper = code.trim().to_ascii_uppercase();
    let flag = (upper.len() == 2 && upper.bytes().all(|b| b.is_ascii_uppercase()))
        .then(|| {
            upper
                .chars()
                .filter_map(|c| char::from_u32(0x1F1E6 + (c as u32 - 'A' as u32)))
                .collect::<String>()
        });
    format!(
        r#"<span class="card-country" title="{}">{}</span>"#,
        escape_html(&upper),
        flag.unwrap_or_else(|| escape_html(&upper))
    )
}
