//! System clipboard access with a fallback path.
//!
//! The primary backend pipes text into the platform's clipboard tool; the
//! fallback emits an OSC 52 sequence so a terminal attached to the process
//! can take the text instead.

use anyhow::{bail, Context, Result};
use base64::Engine as _;
use serde::Serialize;
use std::env;
use std::io::Write;
use std::path::Path;
use std::process::{Command, Stdio};
use tracing::{debug, warn};

pub trait ClipboardBackend: Send + Sync {
    fn name(&self) -> &'static str;

    fn is_available(&self) -> bool;

    fn write_text(&self, text: &str) -> Result<()>;
}

/// Which path a copy took.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CopyOutcome {
    Primary,
    Fallback,
    Failed,
    /// Nothing to copy; no backend was touched.
    Empty,
}

impl CopyOutcome {
    pub fn succeeded(self) -> bool {
        matches!(self, Self::Primary | Self::Fallback)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Tool {
    MacOS,
    Windows,
    Wayland,
    X11,
}

/// Clipboard through `pbcopy`, `clip`, `wl-copy`, `xclip` or `xsel`.
pub struct CommandClipboard {
    tool: Option<Tool>,
}

impl CommandClipboard {
    pub fn detect() -> Self {
        let tool = if cfg!(target_os = "macos") && command_exists("pbcopy") {
            Some(Tool::MacOS)
        } else if cfg!(target_os = "windows") && command_exists("clip") {
            Some(Tool::Windows)
        } else if env::var_os("WAYLAND_DISPLAY").is_some() && command_exists("wl-copy") {
            Some(Tool::Wayland)
        } else if env::var_os("DISPLAY").is_some()
            && (command_exists("xclip") || command_exists("xsel"))
        {
            Some(Tool::X11)
        } else {
            None
        };
        debug!("Clipboard tool: {:?}", tool);
        Self { tool }
    }
}

impl ClipboardBackend for CommandClipboard {
    fn name(&self) -> &'static str {
        match self.tool {
            Some(Tool::MacOS) => "pbcopy",
            Some(Tool::Windows) => "clip",
            Some(Tool::Wayland) => "wl-copy",
            Some(Tool::X11) => "xclip",
            None => "none",
        }
    }

    fn is_available(&self) -> bool {
        self.tool.is_some()
    }

    fn write_text(&self, text: &str) -> Result<()> {
        match self.tool {
            Some(Tool::MacOS) => run_with_input("pbcopy", &[], text),
            Some(Tool::Windows) => run_with_input("clip", &[], text),
            Some(Tool::Wayland) => run_with_input("wl-copy", &[], text),
            Some(Tool::X11) => run_with_input("xclip", &["-selection", "clipboard"], text)
                .or_else(|_| run_with_input("xsel", &["--clipboard", "--input"], text)),
            None => bail!("no clipboard tool found on PATH"),
        }
    }
}

/// OSC 52 "set clipboard" written to stderr.
pub struct Osc52Clipboard;

impl Osc52Clipboard {
    /// Common terminal limit on the base64 payload of one OSC 52 sequence.
    pub const MAX_PAYLOAD: usize = 74_994;

    pub fn sequence(text: &str) -> Result<String> {
        let encoded = base64::engine::general_purpose::STANDARD.encode(text.as_bytes());
        if encoded.len() > Self::MAX_PAYLOAD {
            bail!(
                "OSC 52 payload too large ({} bytes, max {})",
                encoded.len(),
                Self::MAX_PAYLOAD
            );
        }
        Ok(format!("\x1b]52;c;{}\x07", encoded))
    }
}

impl ClipboardBackend for Osc52Clipboard {
    fn name(&self) -> &'static str {
        "osc52"
    }

    fn is_available(&self) -> bool {
        std::io::IsTerminal::is_terminal(&std::io::stderr())
    }

    fn write_text(&self, text: &str) -> Result<()> {
        let sequence = Self::sequence(text)?;
        let mut stderr = std::io::stderr().lock();
        stderr
            .write_all(sequence.as_bytes())
            .context("failed to write OSC 52 sequence")?;
        stderr.flush()?;
        Ok(())
    }
}

pub struct ClipboardChain {
    primary: Box<dyn ClipboardBackend>,
    fallback: Box<dyn ClipboardBackend>,
}

impl ClipboardChain {
    pub fn new(primary: Box<dyn ClipboardBackend>, fallback: Box<dyn ClipboardBackend>) -> Self {
        Self { primary, fallback }
    }

    pub fn system() -> Self {
        Self::new(Box::new(CommandClipboard::detect()), Box::new(Osc52Clipboard))
    }

    /// Blocking; call from `spawn_blocking` inside async code.
    pub fn copy(&self, text: &str) -> CopyOutcome {
        if text.is_empty() {
            return CopyOutcome::Empty;
        }

        if self.primary.is_available() {
            match self.primary.write_text(text) {
                Ok(()) => return CopyOutcome::Primary,
                Err(e) => warn!("Clipboard '{}' failed: {:#}", self.primary.name(), e),
            }
        }

        if self.fallback.is_available() {
            match self.fallback.write_text(text) {
                Ok(()) => return CopyOutcome::Fallback,
                Err(e) => warn!("Clipboard '{}' failed: {:#}", self.fallback.name(), e),
            }
        }

        CopyOutcome::Failed
    }
}

fn command_exists(command: &str) -> bool {
    if command.contains(std::path::MAIN_SEPARATOR) {
        return Path::new(command).is_file();
    }
    let Some(path_var) = env::var_os("PATH") else {
        return false;
    };
    env::split_paths(&path_var).any(|dir| {
        dir.join(command).is_file()
            || (cfg!(target_os = "windows") && dir.join(format!("{command}.exe")).is_file())
    })
}

fn run_with_input(cmd: &str, args: &[&str], content: &str) -> Result<()> {
    let mut child = Command::new(cmd)
        .args(args)
        .stdin(Stdio::piped())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
        .with_context(|| format!("failed to spawn {cmd}"))?;

    if let Some(mut stdin) = child.stdin.take() {
        stdin
            .write_all(content.as_bytes())
            .with_context(|| format!("failed to write to {cmd}"))?;
    }

    let status = child.wait()?;
    if !status.success() {
        bail!("clipboard command failed: {cmd} ({status})");
    }
    Ok(())
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use std::sync::{Arc, Mutex};

    /// In-memory backend; `written` is shared so tests can inspect it after
    /// the backend is boxed into a chain.
    pub struct FakeClipboard {
        pub available: bool,
        pub fails: bool,
        pub written: Arc<Mutex<Vec<String>>>,
    }

    impl FakeClipboard {
        pub fn working() -> Self {
            Self {
                available: true,
                fails: false,
                written: Arc::default(),
            }
        }

        pub fn broken() -> Self {
            Self {
                available: true,
                fails: true,
                written: Arc::default(),
            }
        }

        pub fn missing() -> Self {
            Self {
                available: false,
                fails: false,
                written: Arc::default(),
            }
        }
    }

    impl ClipboardBackend for FakeClipboard {
        fn name(&self) -> &'static str {
            "fake"
        }

        fn is_available(&self) -> bool {
            self.available
        }

        fn write_text(&self, text: &str) -> Result<()> {
            if self.fails {
                bail!("permission denied");
            }
            self.written.lock().unwrap().push(text.to_string());
            Ok(())
        }
    }
}
