use directories::BaseDirs;
use serde::Deserialize;
use std::{fs, path::PathBuf};
use tracing::warn;

use crate::paging::DEFAULT_PAGE_SIZE;

const APP_DIR: &str = "mathmex";

/// How long the search history outlives the process.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum HistoryScope {
    /// Kept in memory for the running session only.
    Session,
    /// Written to the data directory and restored on the next start.
    #[default]
    Durable,
}

impl HistoryScope {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "session" => Some(HistoryScope::Session),
            "durable" | "local" => Some(HistoryScope::Durable),
            _ => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            HistoryScope::Session => "session",
            HistoryScope::Durable => "durable",
        }
    }
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct FileSettings {
    pub page_size: Option<usize>,
    pub history_scope: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Settings {
    pub page_size: usize,
    pub history_scope: HistoryScope,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
            history_scope: HistoryScope::default(),
        }
    }
}

impl Settings {
    /// Reads the shared `config.toml`; a missing or broken file yields defaults.
    pub fn load() -> Self {
        let Some(path) = config_path() else {
            return Self::default();
        };
        match fs::read_to_string(&path) {
            Ok(s) => Self::from_toml_str(&s),
            Err(_) => Self::default(),
        }
    }

    pub fn from_toml_str(s: &str) -> Self {
        let mut out = Self::default();
        let file: FileSettings = match toml::from_str(s) {
            Ok(f) => f,
            Err(e) => {
                warn!(target: "core::settings", "ignoring unreadable config: {}", e);
                return out;
            }
        };
        if let Some(n) = file.page_size {
            out.page_size = n.max(1);
        }
        if let Some(scope) = file.history_scope {
            match HistoryScope::parse(&scope) {
                Some(h) => out.history_scope = h,
                None => warn!(target: "core::settings", "unknown history_scope '{}'", scope),
            }
        }
        out
    }
}

pub fn config_path() -> Option<PathBuf> {
    let base = BaseDirs::new()?;
    let p = if cfg!(target_os = "windows") {
        base.home_dir().join(".mathmex").join("config.toml")
    } else {
        base.config_dir().join(APP_DIR).join("config.toml")
    };
    Some(p)
}

pub fn data_dir() -> Option<PathBuf> {
    let base = BaseDirs::new()?;
    Some(base.data_dir().join(APP_DIR))
}

pub fn state_path() -> Option<PathBuf> {
    let base = BaseDirs::new()?;
    Some(base.config_dir().join(APP_DIR).join("ui_state.json"))
}
