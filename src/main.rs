mod check;
mod clipboard;
mod config;
mod deck;
mod effects;
mod events;
mod host;
mod instruction;
mod logging;
mod markup;
mod paths;
mod prefs;
mod server;
mod session;
mod source;
mod surface;

use crate::config::Config;
use crate::instruction::compile_instruction;
use crate::source::{DataSource, DocumentFetcher};
use anyhow::Result;
use clap::{Parser, Subcommand};
use std::sync::Arc;
use std::time::Duration;

#[derive(Parser, Debug)]
#[command(name = "cardview", version)]
#[command(about = "Cardview: card deck and step-by-step instruction pages", long_about = None)]
struct Cli {
    /// Card document: an http(s) URL or a local path. Overrides `[data] source`.
    #[arg(long, global = true)]
    source: Option<String>,

    /// Port for the server
    #[arg(long, global = true)]
    port: Option<u16>,

    /// Keep preferences in memory only
    #[arg(long, default_value_t = false)]
    no_persist: bool,

    #[command(subcommand)]
    cmd: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Serve the page (default)
    Serve {
        /// Open the page in the default browser once listening
        #[arg(long, default_value_t = false)]
        open: bool,
    },
    /// Print the card list HTML
    Render,
    /// Print one card's compiled instruction
    Show {
        card_id: String,

        /// Print the compiled blocks as JSON instead of HTML
        #[arg(long, default_value_t = false)]
        json: bool,
    },
    /// Load the document and report shape problems
    Check,
}

#[tokio::main]
async fn main() -> Result<()> {
    let (mut config, config_path) = Config::load_with_path().unwrap_or_else(|e| {
        eprintln!("Warning: failed to load config, using defaults: {e}");
        (Config::default(), None)
    });

    let cli = Cli::parse();
    if let Some(source) = cli.source {
        config.data.source = source;
    }
    if let Some(port) = cli.port {
        config.server.port = port;
    }
    config.validate()?;

    // `render` and `show` print their product on stdout.
    let quiet = matches!(cli.cmd, Some(Command::Render | Command::Show { .. }));
    let log_dir = match logging::setup_tracing_with_settings(logging::LoggingSettings {
        level: config.logging.level.as_deref(),
        directory: config.logging.directory.as_deref(),
        retention_days: config.logging.retention_days,
        suppress_stdout: quiet,
    }) {
        Ok(path) => Some(path),
        Err(err) => {
            eprintln!("Failed to initialize logging: {err}");
            None
        }
    };

    let source = DataSource::parse(&config.data.source);
    let fetcher = DocumentFetcher::new(Duration::from_secs(config.data.timeout_secs))?;

    match cli.cmd {
        Some(Command::Render) => {
            let state = fetcher.load_deck(&source).await;
            println!("{}", deck::render_deck(&state, &config.strings));
        }
        Some(Command::Show { card_id, json }) => {
            let state = fetcher.load_deck(&source).await;
            let doc = state.as_ref().ok().and_then(|d| d.index.get(&card_id));
            let Some(compiled) = compile_instruction(&card_id, doc, &config.strings) else {
                anyhow::bail!("no instruction for card '{}'", card_id);
            };
            if json {
                println!("{}", serde_json::to_string_pretty(&compiled)?);
            } else {
                println!("<h2>{}</h2>", markup::escape_html(&compiled.title));
                print!("{}", compiled.body_html());
            }
        }
        Some(Command::Check) => {
            let passed = check::run(&fetcher, &source, config_path.as_deref()).await?;
            if !passed {
                std::process::exit(1);
            }
        }
        Some(Command::Serve { open }) => {
            serve(config, config_path, log_dir, source, fetcher, cli.no_persist, open).await?;
        }
        None => {
            serve(config, config_path, log_dir, source, fetcher, cli.no_persist, false).await?;
        }
    }

    Ok(())
}

async fn serve(
    config: Config,
    config_path: Option<std::path::PathBuf>,
    log_dir: Option<std::path::PathBuf>,
    source: DataSource,
    fetcher: DocumentFetcher,
    no_persist: bool,
    open_browser: bool,
) -> Result<()> {
    tracing::info!("--- Cardview Startup ---");
    match config_path.as_ref() {
        Some(path) => tracing::info!("Config File: {}", path.display()),
        None => tracing::info!("Config File: (default)"),
    }
    tracing::info!("Data Source: {}", source);
    tracing::info!("Server Port: {}", config.server.port);
    if let Some(dir) = log_dir.as_ref() {
        tracing::info!("Log Directory: {}", dir.display());
    }

    let prefs: Arc<dyn prefs::PreferenceStore> = if no_persist {
        Arc::new(prefs::MemoryPreferences::default())
    } else {
        let store = prefs::FilePreferences::new(paths::preferences_file());
        tracing::info!("Preferences: {}", store.path().display());
        Arc::new(store)
    };
    tracing::info!("------------------------");

    // Bursty during confetti; a lagging page gets a resync event.
    let (events_tx, _) = tokio::sync::broadcast::channel(1024);
    let session = Arc::new(session::Session::new(session::SessionOptions {
        source,
        fetcher,
        strings: config.strings,
        header_color: config.host.header_color,
        host: Arc::new(host::EventHost::new(events_tx.clone())),
        prefs,
        clipboard: Arc::new(clipboard::ClipboardChain::system()),
        events_tx,
    }));
    session.initialize().await;

    let handle = server::prepare_server(session, config.server.port).await?;
    if open_browser {
        let url = format!("http://localhost:{}", handle.port);
        if let Err(e) = open::that(&url) {
            tracing::warn!("Failed to open {}: {}", url, e);
        }
    }
    handle.task.await??;
    Ok(())
}
