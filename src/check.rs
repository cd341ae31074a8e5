//! `cardview check`: load the document and report shape problems.

use crate::deck::model::{CardRecord, StepRecord};
use crate::deck::{build_deck, LoadFailure};
use crate::source::{DataSource, DocumentFetcher};
use anyhow::Result;
use serde_json::Value;
use std::path::Path;

const GREEN: &str = "\x1b[32m";
const RED: &str = "\x1b[31m";
const YELLOW: &str = "\x1b[33m";
const CYAN: &str = "\x1b[36m";
const RESET: &str = "\x1b[0m";

fn ok(label: &str, detail: &str) {
    println!("  {GREEN}[OK]{RESET}   {label}: {detail}");
}

fn fail(label: &str, detail: &str) {
    println!("  {RED}[FAIL]{RESET} {label}: {detail}");
}

fn warn(label: &str, detail: &str) {
    println!("  {YELLOW}[WARN]{RESET} {label}: {detail}");
}

fn info(label: &str, detail: &str) {
    println!("  {CYAN}[INFO]{RESET} {label}: {detail}");
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Finding {
    /// Entry of `cards` that is not a card object.
    SkippedRecord { position: usize },
    /// Card with an action button but nothing to open.
    MissingInstruction { card_id: String },
    /// Instruction whose `steps` is absent or not an array.
    MissingSteps { card_id: String },
    /// Step that renders nothing.
    UnknownStep {
        card_id: String,
        step: usize,
        kind: Option<String>,
    },
    DuplicateId { card_id: String },
}

impl std::fmt::Display for Finding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::SkippedRecord { position } => write!(f, "cards[{}] is not an object", position),
            Self::MissingInstruction { card_id } => {
                write!(f, "card '{}' has a button but no instruction", card_id)
            }
            Self::MissingSteps { card_id } => {
                write!(f, "instruction of '{}' has no steps array", card_id)
            }
            Self::UnknownStep { card_id, step, kind } => write!(
                f,
                "step #{} of '{}' renders nothing (type: {})",
                step,
                card_id,
                kind.as_deref().unwrap_or("none")
            ),
            Self::DuplicateId { card_id } => {
                write!(f, "id '{}' is used more than once; the last one wins", card_id)
            }
        }
    }
}

/// Findings for a parsed document, or the load failure that stops rendering.
pub fn inspect(document: &Value) -> Result<Vec<Finding>, LoadFailure> {
    // Same acceptance rule as rendering.
    build_deck(document)?;

    let raw_cards = document
        .get("cards")
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or_default();

    let mut findings = Vec::new();
    let mut seen = std::collections::HashSet::new();
    for (position, raw) in raw_cards.iter().enumerate() {
        let Ok(card) = serde_json::from_value::<CardRecord>(raw.clone()) else {
            findings.push(Finding::SkippedRecord { position });
            continue;
        };
        if !card.id.is_empty() && !seen.insert(card.id.clone()) {
            findings.push(Finding::DuplicateId {
                card_id: card.id.clone(),
            });
        }
        inspect_card(&card, &mut findings);
    }
    Ok(findings)
}

fn inspect_card(card: &CardRecord, findings: &mut Vec<Finding>) {
    let has_button = card.button_text.as_deref().is_some_and(|t| !t.is_empty())
        && card.button_action.as_deref().is_some_and(|a| !a.is_empty());

    let Some(instruction) = &card.instruction else {
        if has_button {
            findings.push(Finding::MissingInstruction {
                card_id: card.id.clone(),
            });
        }
        return;
    };

    let Some(steps) = &instruction.steps else {
        findings.push(Finding::MissingSteps {
            card_id: card.id.clone(),
        });
        return;
    };

    for (step, record) in steps.iter().enumerate() {
        if record.classify().is_none() {
            findings.push(unknown_step(&card.id, step, record));
        }
    }
}

fn unknown_step(card_id: &str, step: usize, record: &StepRecord) -> Finding {
    Finding::UnknownStep {
        card_id: card_id.to_string(),
        step,
        kind: record.kind().map(str::to_string),
    }
}

/// Print the report. Returns `false` when the document cannot be rendered.
pub async fn run(
    fetcher: &DocumentFetcher,
    source: &DataSource,
    config_path: Option<&Path>,
) -> Result<bool> {
    println!("cardview check\n");

    match config_path {
        Some(p) => ok("Config", &p.display().to_string()),
        None => info("Config", "(default)"),
    }

    let document = match fetcher.fetch_document(source).await {
        Ok(document) => {
            ok("Source", &source.to_string());
            document
        }
        Err(e) => {
            fail("Source", &format!("{}: {:#}", source, e));
            return Ok(false);
        }
    };

    let findings = match inspect(&document) {
        Ok(findings) => findings,
        Err(failure) => {
            fail("Format", failure.detail());
            return Ok(false);
        }
    };

    // Already validated by `inspect`.
    if let Ok(deck) = build_deck(&document) {
        ok(
            "Cards",
            &format!(
                "{} cards, {} with instructions",
                deck.cards.len(),
                deck.index.len()
            ),
        );
        if deck.index.is_empty() {
            info("Instructions", "no card carries an instruction");
        }
    }

    if findings.is_empty() {
        ok("Shape", "no problems found");
    }
    for finding in &findings {
        warn("Shape", &finding.to_string());
    }
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_clean_document() {
        let findings = inspect(&json!({"cards": [
            {"id": "a", "buttonText": "Go", "buttonAction": "openInstruction",
             "instruction": {"steps": [{"type": "text", "text": "hi"}]}},
            {"id": "b"},
        ]}))
        .unwrap();
        assert!(findings.is_empty());
    }

    #[test]
    fn test_reports_every_kind() {
        let findings = inspect(&json!({"cards": [
            42,
            {"id": "a", "buttonText": "Go", "buttonAction": "openInstruction"},
            {"id": "b", "instruction": {"title": "No steps"}},
            {"id": "c", "instruction": {"steps": [{"type": "video"}, {"type": "text"}]}},
            {"id": "c"},
        ]}))
        .unwrap();
        assert_eq!(
            findings,
            vec![
                Finding::SkippedRecord { position: 0 },
                Finding::MissingInstruction { card_id: "a".into() },
                Finding::MissingSteps { card_id: "b".into() },
                Finding::UnknownStep {
                    card_id: "c".into(),
                    step: 0,
                    kind: Some("video".into())
                },
                Finding::DuplicateId { card_id: "c".into() },
            ]
        );
    }

    #[test]
    fn test_format_failure() {
        assert!(matches!(inspect(&json!({})), Err(LoadFailure::Format(_))));
    }
}
