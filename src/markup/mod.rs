//! Text-to-markup helpers shared by the card list and the instruction modal.
//!
//! Two entry points, with different trust assumptions:
//! - [`escape_html`] for literal fields (titles, names, URLs, labels).
//! - [`render_markdown`] for free text. It does not escape its input.

mod escape;
mod markdown;

pub use escape::{escape_html, escape_opt};
pub use markdown::{render_markdown, render_markdown_opt};
