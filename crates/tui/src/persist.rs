use std::{fs, io::Write, path::Path};

use anyhow::{Context, Result};
use mathmex_core::search::SearchFilters;
use serde::{Deserialize, Serialize};

use crate::app::{App, InputMode};

/// UI preferences restored on the next start. History lives in the journal's
/// own store, not here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SavedState {
    pub show_history: bool,
    pub dark_mode: bool,
    pub seen_intro: bool,
    pub mode: InputMode,
    pub filters: SearchFilters,
    pub page_size: Option<usize>,
}

impl Default for SavedState {
    fn default() -> Self {
        Self {
            show_history: true,
            dark_mode: true,
            seen_intro: false,
            mode: InputMode::Text,
            filters: SearchFilters::default(),
            page_size: None,
        }
    }
}

impl From<&App> for SavedState {
    fn from(a: &App) -> Self {
        SavedState {
            show_history: a.show_history,
            dark_mode: a.dark_mode,
            seen_intro: a.seen_intro,
            mode: a.mode,
            filters: a.filters.clone(),
            page_size: Some(a.pager.page_size()),
        }
    }
}

pub fn load_state_from(path: &Path) -> Result<Option<SavedState>> {
    if !path.exists() {
        return Ok(None);
    }
    let data = fs::read(path).with_context(|| format!("read state file: {}", path.display()))?;
    let s: SavedState = serde_json::from_slice(&data).with_context(|| "parse state json")?;
    Ok(Some(s))
}

pub fn save_state_to(path: &Path, s: &SavedState) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).ok();
    }
    let data = serde_json::to_vec_pretty(s)?;
    let mut tmp = path.to_path_buf();
    tmp.set_extension("json.tmp");
    {
        let mut f =
            fs::File::create(&tmp).with_context(|| format!("create tmp: {}", tmp.display()))?;
        f.write_all(&data)?;
        f.flush()?;
    }
    fs::rename(&tmp, path).with_context(|| format!("persist state to {}", path.display()))?;
    Ok(())
}

pub fn save_state(app: &App) -> Result<()> {
    let Some(path) = app.state_path.as_deref() else {
        return Ok(());
    };
    save_state_to(path, &SavedState::from(app))
}
