//! HTML for the instruction modal body.

use super::compiler::{
    CompiledInstruction, CopyButton, FooterBlock, InstructionBody, LinkButton, LinkDisposition,
    ListSegment, StepBlock, StepContent,
};
use super::payload::encode_copy_payload;
use crate::markup::escape_html;

/// Action name the page binds to the footer "finish" control.
pub const FINISH_ACTION: &str = "finishInstruction";

impl CompiledInstruction {
    /// Modal body: steps (or the placeholder) followed by the footer.
    pub fn body_html(&self) -> String {
        let mut out = match &self.body {
            InstructionBody::Steps(steps) => steps.iter().map(StepBlock::to_html).collect(),
            InstructionBody::Unavailable(message) => {
                format!("<p>{}</p>\n", escape_html(message))
            }
        };
        if let Some(footer) = &self.footer {
            out.push_str(&footer.to_html());
        }
        out
    }
}

impl StepBlock {
    pub fn to_html(&self) -> String {
        let mut out = String::new();
        if !self.title.is_empty() {
            out.push_str(&format!("<h4>{}</h4>\n", escape_html(&self.title)));
        }
        match &self.content {
            StepContent::Links { intro_html, links } => {
                push_intro(&mut out, intro_html.as_deref());
                let buttons: String = links.iter().map(LinkButton::to_html).collect();
                out.push_str(&grid(&buttons));
            }
            StepContent::Copy { intro_html, buttons } => {
                push_intro(&mut out, intro_html.as_deref());
                let buttons: String = buttons.iter().map(CopyButton::to_html).collect();
                out.push_str(&grid(&buttons));
            }
            StepContent::List { segments } => {
                for segment in segments {
                    out.push_str(&segment.to_html());
                }
                out.push('\n');
            }
            StepContent::Text { html } => {
                out.push_str(&format!("<p>{}</p>\n", html));
            }
        }
        out
    }
}

fn push_intro(out: &mut String, intro_html: Option<&str>) {
    if let Some(intro) = intro_html {
        out.push_str(&format!(r#"<p class="platform-text">{}</p>"#, intro));
        out.push('\n');
    }
}

fn grid(inner: &str) -> String {
    format!("<div class=\"platforms-grid\">{}</div>\n", inner)
}

impl ListSegment {
    pub fn to_html(&self) -> String {
        match self {
            Self::Heading(text) => format!("<h5>{}</h5>", escape_html(text)),
            Self::Items(items) => {
                let lis: String = items.iter().map(|i| format!("<li>{}</li>", i)).collect();
                format!("<ol>{}</ol>", lis)
            }
        }
    }
}

impl LinkButton {
    pub fn to_html(&self) -> String {
        let attrs = match &self.disposition {
            LinkDisposition::Download { filename } => {
                format!(r#" download="{}""#, escape_html(filename))
            }
            LinkDisposition::NewTab => r#" target="_blank" rel="noopener noreferrer""#.to_string(),
        };
        format!(
            r#"<a href="{}"{} class="platform-btn">{}</a>"#,
            escape_html(&self.url),
            attrs,
            escape_html(&self.name)
        )
    }
}

impl CopyButton {
    pub fn to_html(&self) -> String {
        format!(
            r#"<button class="copy-btn" data-copy="{}"><span class="icon">📋</span>{}</button>"#,
            encode_copy_payload(&self.text),
            escape_html(&self.label)
        )
    }
}

impl FooterBlock {
    pub fn to_html(&self) -> String {
        let mut out = format!(
            "<p class=\"instruction-footer-text\">{}</p>\n",
            self.text_html
        );
        if let Some(label) = &self.finish_label {
            out.push_str(&format!(
                "<button class=\"btn btn-footer\" data-action=\"{}\">{}</button>\n",
                FINISH_ACTION,
                escape_html(label)
            ));
        }
        out
    }
}
