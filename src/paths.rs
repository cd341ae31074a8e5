use std::path::PathBuf;
use std::sync::OnceLock;

static CARDVIEW_HOME: OnceLock<PathBuf> = OnceLock::new();

/// Returns the cardview home directory (`~/.cardview/`).
/// Supports `$CARDVIEW_HOME` env override. Cached via `OnceLock`.
pub fn cardview_home() -> &'static PathBuf {
    CARDVIEW_HOME.get_or_init(|| {
        if let Ok(val) = std::env::var("CARDVIEW_HOME") {
            let p = PathBuf::from(val);
            if !p.as_os_str().is_empty() {
                return p;
            }
        }
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".cardview")
    })
}

/// `~/.cardview/logs/`
pub fn logs_dir() -> PathBuf {
    cardview_home().join("logs")
}

/// `~/.cardview/preferences.json`
pub fn preferences_file() -> PathBuf {
    cardview_home().join("preferences.json")
}
