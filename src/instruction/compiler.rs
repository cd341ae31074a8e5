use crate::config::Strings;
use crate::deck::model::{
    CopyRecord, DownloadRequest, Footer, InstructionDocument, LinkRecord, StepKind, StepRecord,
};
use crate::markup::render_markdown;
use serde::Serialize;
use serde_json::Value;

const RAW_CONTENT_HOST: &str = "raw.githubusercontent.com";
const RELEASE_DOWNLOAD_SEGMENT: &str = "/releases/download/";
const SUBTITLE_PREFIX: &str = "### ";

/// Display-ready instruction, produced fresh on every open.
#[derive(Debug, Clone, Serialize)]
pub struct CompiledInstruction {
    pub card_id: String,
    pub title: String,
    pub body: InstructionBody,
    pub footer: Option<FooterBlock>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum InstructionBody {
    Steps(Vec<StepBlock>),
    /// Steps absent or not an array.
    Unavailable(String),
}

#[derive(Debug, Clone, Serialize)]
pub struct StepBlock {
    /// Literal title, escaped at render time.
    pub title: String,
    pub content: StepContent,
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StepContent {
    Links {
        intro_html: Option<String>,
        links: Vec<LinkButton>,
    },
    Copy {
        intro_html: Option<String>,
        buttons: Vec<CopyButton>,
    },
    List {
        segments: Vec<ListSegment>,
    },
    Text {
        html: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum ListSegment {
    /// Literal subtitle text, escaped at render time.
    Heading(String),
    /// Rendered item HTML, in declaration order.
    Items(Vec<String>),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LinkButton {
    pub name: String,
    pub url: String,
    pub disposition: LinkDisposition,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum LinkDisposition {
    /// Forced download; `filename` may be empty.
    Download { filename: String },
    /// Opens in a new tab without referrer/opener.
    NewTab,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CopyButton {
    pub label: String,
    /// Exact text for the clipboard.
    pub text: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct FooterBlock {
    pub text_html: String,
    /// Label of the "finish" control, when the footer asks for one.
    pub finish_label: Option<String>,
}

/// Compile one instruction document. `None` means there is nothing to show.
pub fn compile_instruction(
    card_id: &str,
    doc: Option<&InstructionDocument>,
    strings: &Strings,
) -> Option<CompiledInstruction> {
    let doc = doc?;
    let title = doc
        .title
        .as_deref()
        .filter(|t| !t.is_empty())
        .unwrap_or(strings.instruction_title.as_str())
        .to_string();

    let body = match &doc.steps {
        Some(steps) => InstructionBody::Steps(
            steps
                .iter()
                .filter_map(|step| compile_step(step, doc.forces_download(), strings))
                .collect(),
        ),
        None => {
            tracing::warn!("Instruction for card '{}' has no steps array", card_id);
            InstructionBody::Unavailable(strings.instructions_unavailable.clone())
        }
    };

    Some(CompiledInstruction {
        card_id: card_id.to_string(),
        title,
        body,
        footer: doc.footer.as_ref().and_then(compile_footer),
    })
}

fn compile_step(step: &StepRecord, force_download: bool, strings: &Strings) -> Option<StepBlock> {
    let content = match step.classify()? {
        StepKind::Links(links) => StepContent::Links {
            intro_html: intro_html(step),
            links: links
                .iter()
                .filter_map(|link| compile_link(link, force_download))
                .collect(),
        },
        StepKind::Copy(items) => StepContent::Copy {
            intro_html: intro_html(step),
            buttons: items
                .iter()
                .filter_map(|item| compile_copy_item(item, strings))
                .collect(),
        },
        StepKind::List(items) => StepContent::List {
            segments: segment_list(items),
        },
        StepKind::Text => StepContent::Text {
            html: render_markdown(step.text.as_deref().unwrap_or_default()),
        },
    };
    Some(StepBlock {
        title: step.title.clone().unwrap_or_default(),
        content,
    })
}

fn intro_html(step: &StepRecord) -> Option<String> {
    step.text
        .as_deref()
        .filter(|t| !t.is_empty())
        .map(render_markdown)
}

fn compile_link(link: &LinkRecord, force_download: bool) -> Option<LinkButton> {
    let url = link.url.as_deref().filter(|u| !u.is_empty())?;
    let request = link.download_request();
    let disposition = if force_download || request.is_some() || is_direct_artifact(url) {
        LinkDisposition::Download {
            filename: match request {
                Some(DownloadRequest::Filename(name)) => name,
                _ => String::new(),
            },
        }
    } else {
        LinkDisposition::NewTab
    };
    Some(LinkButton {
        name: link.name.clone().unwrap_or_default(),
        url: url.to_string(),
        disposition,
    })
}

/// Raw file hosts and release assets download instead of navigating.
pub fn is_direct_artifact(url: &str) -> bool {
    match url::Url::parse(url) {
        Ok(parsed) => {
            parsed.host_str() == Some(RAW_CONTENT_HOST)
                || parsed.path().contains(RELEASE_DOWNLOAD_SEGMENT)
        }
        // Relative or malformed URLs: plain substring match.
        Err(_) => url.contains(RAW_CONTENT_HOST) || url.contains(RELEASE_DOWNLOAD_SEGMENT),
    }
}

fn compile_copy_item(item: &Value, strings: &Strings) -> Option<CopyButton> {
    let record: CopyRecord = serde_json::from_value(item.clone()).ok()?;
    let text = record.text.filter(|t| !t.is_empty())?;
    let label = record
        .label
        .filter(|l| !l.is_empty())
        .unwrap_or_else(|| strings.copy_label.clone());
    Some(CopyButton { label, text })
}

/// Split list items into subtitle headings and ordered sub-lists, keeping
/// declaration order. Non-string and empty items are skipped.
pub fn segment_list(items: &[Value]) -> Vec<ListSegment> {
    let mut segments = Vec::new();
    let mut current: Vec<String> = Vec::new();

    for item in items.iter().filter_map(Value::as_str) {
        if item.is_empty() {
            continue;
        }
        match subtitle_of(item) {
            Some(subtitle) => {
                if !current.is_empty() {
                    segments.push(ListSegment::Items(std::mem::take(&mut current)));
                }
                segments.push(ListSegment::Heading(subtitle.to_string()));
            }
            None => current.push(render_markdown(item)),
        }
    }

    if !current.is_empty() {
        segments.push(ListSegment::Items(current));
    }
    segments
}

fn subtitle_of(item: &str) -> Option<&str> {
    item.strip_prefix(SUBTITLE_PREFIX)
        .filter(|rest| !rest.is_empty() && !rest.contains('\n'))
}

fn compile_footer(footer: &Footer) -> Option<FooterBlock> {
    match footer {
        Footer::Text(text) if text.is_empty() => None,
        Footer::Text(text) => Some(FooterBlock {
            text_html: render_markdown(text),
            finish_label: None,
        }),
        Footer::Object { text, button_text } => Some(FooterBlock {
            text_html: render_markdown(text.as_deref().unwrap_or_default()),
            finish_label: button_text.clone().filter(|b| !b.is_empty()),
        }),
    }
}
