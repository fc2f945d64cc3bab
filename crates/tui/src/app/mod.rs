use std::collections::BTreeSet;
use std::path::PathBuf;
use std::sync::mpsc::{self, Receiver, Sender, TryRecvError};

use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use mathmex_core::history::{HistoryJournal, ReplayTarget};
use mathmex_core::paging::Pager;
use mathmex_core::search::{SearchFilters, SearchResult};
use mathmex_core::settings::{data_dir, state_path, HistoryScope, Settings};
use mathmex_core::store::{FileStore, MemoryStore, StoragePort};
use providers::mathmex::MathMexConfig;
use ratatui::layout::Rect;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use unicode_segmentation::UnicodeSegmentation;

use crate::persist::SavedState;

pub mod filters;
pub mod history;
pub mod input;
pub mod results;
pub mod search;
pub mod summary;

pub use filters::FilterModalState;
pub use results::{LineKind, WrappedResult};
pub use summary::SummaryState;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum InputMode {
    #[default]
    Text,
    Math,
}

impl InputMode {
    pub fn toggle(self) -> Self {
        match self {
            InputMode::Text => InputMode::Math,
            InputMode::Math => InputMode::Text,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            InputMode::Text => "Text",
            InputMode::Math => "Math",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Focus {
    Input,
    History,
    Results,
    Settings,
}

#[derive(Clone)]
pub struct ConfirmState {
    pub action: ConfirmAction,
}

#[derive(Clone)]
pub enum ConfirmAction {
    ClearHistory,
}

/// Replies from background network threads, drained on every tick.
#[derive(Debug)]
pub enum NetEvent {
    Results { seq: u64, results: Vec<SearchResult> },
    Summary { seq: u64, text: String },
    Latex(Result<String, String>),
}

pub struct App {
    pub input: String,
    pub input_cursor: usize,
    pub mode: InputMode,
    pub journal: HistoryJournal<Box<dyn StoragePort>>,
    pub show_history: bool,
    pub history_selected: usize,
    pub history_scroll: u16,
    pub history_area: Option<Rect>,
    pub results: Vec<SearchResult>,
    pub results_cache: Vec<WrappedResult>,
    pub results_wrap_width: u16,
    pub results_area: Option<Rect>,
    pub results_scroll: u16,
    pub results_viewport: u16,
    pub result_selected: usize,
    pub marked: BTreeSet<usize>,
    pub pager: Pager,
    pub loading: bool,
    pub searched: bool,
    pub last_query: Option<String>,
    search_seq: u64,
    summary_seq: u64,
    pub filters: SearchFilters,
    pub filter_modal: Option<FilterModalState>,
    pub summary: Option<SummaryState>,
    pub show_settings: bool,
    pub settings_selected: usize,
    pub dark_mode: bool,
    pub show_help: bool,
    pub seen_intro: bool,
    pub focus: Focus,
    pub confirm: Option<ConfirmState>,
    pub palette: Option<PaletteState>,
    pub notice: Option<String>,
    pub should_quit: bool,
    pub dirty: bool,
    tick: u64,
    pub history_scope: HistoryScope,
    backend: Option<MathMexConfig>,
    pub backend_label: String,
    pub state_path: Option<PathBuf>,
    net_tx: Sender<NetEvent>,
    net_rx: Receiver<NetEvent>,
}

impl App {
    // Returns true if a supported slash command was handled
    fn try_handle_slash_command(&mut self, text: &str) -> bool {
        let s = text.trim();
        if !s.starts_with('/') {
            return false;
        }
        let rest = &s[1..];
        let mut parts = rest.splitn(2, char::is_whitespace);
        let cmd = parts.next().unwrap_or("").to_lowercase();
        let arg = parts.next().unwrap_or("").trim();
        match cmd.as_str() {
            "latex" => {
                if arg.is_empty() {
                    self.notice = Some(crate::strings::NOTICE_LATEX_USAGE.to_string());
                } else {
                    self.request_latex(arg.to_string());
                }
                true
            }
            "clear" => {
                self.clear_history();
                true
            }
            "filters" => {
                self.open_filters();
                true
            }
            _ => {
                self.notice = Some(format!("unknown command '/{}'", cmd));
                true
            }
        }
    }

    pub fn new() -> Self {
        let settings = Settings::load();
        let store: Box<dyn StoragePort> = match (settings.history_scope, data_dir()) {
            (HistoryScope::Durable, Some(dir)) => Box::new(FileStore::new(dir)),
            _ => Box::new(MemoryStore::new()),
        };
        let backend = match MathMexConfig::from_env_and_file() {
            Ok(c) => Some(c),
            Err(e) => {
                warn!(target: "tui", "backend config unusable, searches will return nothing: {}", e);
                None
            }
        };
        let state_path = state_path();
        let saved = match state_path.as_deref().map(crate::persist::load_state_from) {
            Some(Ok(s)) => s,
            Some(Err(e)) => {
                warn!(target: "tui", "ignoring saved ui state: {:#}", e);
                None
            }
            None => None,
        };
        Self::with_parts(store, settings, backend, saved, state_path)
    }

    pub fn with_parts(
        store: Box<dyn StoragePort>,
        settings: Settings,
        backend: Option<MathMexConfig>,
        saved: Option<SavedState>,
        state_path: Option<PathBuf>,
    ) -> Self {
        let (net_tx, net_rx) = mpsc::channel();
        let backend_label = backend
            .as_ref()
            .map(|c| c.base_url.clone())
            .unwrap_or_else(|| String::from("offline"));
        let mut s = Self {
            input: String::new(),
            input_cursor: 0,
            mode: InputMode::Text,
            journal: HistoryJournal::open(store),
            show_history: true,
            history_selected: 0,
            history_scroll: 0,
            history_area: None,
            results: Vec::new(),
            results_cache: Vec::new(),
            results_wrap_width: 0,
            results_area: None,
            results_scroll: 0,
            results_viewport: 0,
            result_selected: 0,
            marked: BTreeSet::new(),
            pager: Pager::new(settings.page_size),
            loading: false,
            searched: false,
            last_query: None,
            search_seq: 0,
            summary_seq: 0,
            filters: SearchFilters::default(),
            filter_modal: None,
            summary: None,
            show_settings: false,
            settings_selected: 0,
            dark_mode: true,
            show_help: false,
            seen_intro: false,
            focus: Focus::Input,
            confirm: None,
            palette: None,
            notice: None,
            should_quit: false,
            dirty: true,
            tick: 0,
            history_scope: settings.history_scope,
            backend,
            backend_label,
            state_path,
            net_tx,
            net_rx,
        };
        if let Some(p) = saved {
            s.show_history = p.show_history;
            s.dark_mode = p.dark_mode;
            s.seen_intro = p.seen_intro;
            s.mode = p.mode;
            s.filters = p.filters;
            s.filters.retain_known();
            if let Some(n) = p.page_size {
                s.pager.set_page_size(n);
            }
        }
        s.show_help = !s.seen_intro;
        info!(target: "tui", "start: history={} scope={} backend={}", s.journal.len(), s.history_scope.label(), s.backend_label);
        s
    }

    pub fn submit(&mut self) {
        let text = self.input.trim().to_string();
        if text.is_empty() {
            return;
        }

        // Slash commands (e.g., /latex <spoken math>, /clear)
        if self.try_handle_slash_command(&text) {
            self.input.clear();
            self.input_cursor = 0;
            self.dirty = true;
            return;
        }

        self.notice = None;
        self.start_search(text);
    }

    pub fn spinner(&self) -> &'static str {
        const FRAMES: [&str; 4] = ["|", "/", "-", "\\"];
        FRAMES[(self.tick / 2 % 4) as usize]
    }

    pub fn toggle_mode(&mut self) {
        self.mode = self.mode.toggle();
        let _ = crate::persist::save_state(self);
    }

    pub fn toggle_history(&mut self) {
        self.show_history = !self.show_history;
        if !self.show_history && self.focus == Focus::History {
            self.focus = Focus::Input;
        }
        let _ = crate::persist::save_state(self);
    }

    pub fn toggle_settings(&mut self) {
        self.show_settings = !self.show_settings;
        self.focus = if self.show_settings {
            Focus::Settings
        } else {
            Focus::Input
        };
    }

    pub fn toggle_theme(&mut self) {
        self.dark_mode = !self.dark_mode;
        let _ = crate::persist::save_state(self);
    }

    pub fn cycle_page_size(&mut self) {
        self.pager.cycle_page_size();
        self.result_selected = 0;
        self.results_scroll = 0;
        self.results_cache.clear();
        let _ = crate::persist::save_state(self);
    }

    pub fn open_help(&mut self) {
        self.show_help = true;
    }

    pub fn close_help(&mut self) {
        self.show_help = false;
        if !self.seen_intro {
            self.seen_intro = true;
            let _ = crate::persist::save_state(self);
        }
    }

    pub fn cycle_focus(&mut self) {
        self.focus = match self.focus {
            Focus::Input if self.show_history => Focus::History,
            Focus::Input | Focus::History => Focus::Results,
            Focus::Results if self.show_settings => Focus::Settings,
            Focus::Results | Focus::Settings => Focus::Input,
        };
    }

    pub fn on_key(&mut self, key: KeyEvent) {
        if key.kind != KeyEventKind::Press {
            return;
        }
        self.dirty = true;

        if let Some(confirm) = self.confirm.clone() {
            match key.code {
                KeyCode::Char('y') | KeyCode::Char('Y') | KeyCode::Enter => {
                    match confirm.action {
                        ConfirmAction::ClearHistory => self.clear_history(),
                    }
                    self.confirm = None;
                }
                KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => {
                    self.confirm = None;
                }
                _ => {}
            }
            return;
        }

        if self.palette.is_some() {
            self.on_palette_key(key);
            return;
        }

        if self.show_help {
            if matches!(key.code, KeyCode::Esc | KeyCode::F(1) | KeyCode::Enter | KeyCode::Char('?') | KeyCode::Char('q')) {
                self.close_help();
            }
            return;
        }

        if self.summary.is_some() {
            self.on_summary_key(key);
            return;
        }

        if self.filter_modal.is_some() {
            self.on_filter_key(key);
            return;
        }

        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        match key.code {
            KeyCode::Char('c') | KeyCode::Char('q') if ctrl => {
                self.should_quit = true;
                return;
            }
            KeyCode::Char('p') if ctrl => {
                self.open_palette();
                return;
            }
            KeyCode::Char('t') if ctrl => {
                self.toggle_mode();
                return;
            }
            KeyCode::Char('g') if ctrl => {
                self.generate_answer();
                return;
            }
            KeyCode::F(1) => {
                self.open_help();
                return;
            }
            KeyCode::F(2) => {
                self.toggle_history();
                return;
            }
            KeyCode::F(3) => {
                self.open_filters();
                return;
            }
            KeyCode::F(4) => {
                self.toggle_settings();
                return;
            }
            KeyCode::F(5) => {
                self.generate_answer();
                return;
            }
            KeyCode::Tab => {
                self.cycle_focus();
                return;
            }
            KeyCode::PageDown => {
                self.next_page();
                return;
            }
            KeyCode::PageUp => {
                self.prev_page();
                return;
            }
            _ => {}
        }

        match self.focus {
            Focus::Input => self.on_input_key(key),
            Focus::History => self.on_history_key(key),
            Focus::Results => self.on_results_key(key),
            Focus::Settings => self.on_settings_key(key),
        }
    }

    fn on_input_key(&mut self, key: KeyEvent) {
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        match key.code {
            KeyCode::Esc => {
                if self.input.is_empty() {
                    self.should_quit = true;
                } else {
                    self.input.clear();
                    self.input_cursor = 0;
                }
            }
            KeyCode::Enter => {
                info!(target: "tui", "on_key: Enter => submit");
                self.submit();
            }
            KeyCode::Backspace => self.delete_left_grapheme(),
            KeyCode::Delete => self.delete_right_grapheme(),
            KeyCode::Left if ctrl => self.move_cursor_word_left(),
            KeyCode::Right if ctrl => self.move_cursor_word_right(),
            KeyCode::Left => {
                self.input_cursor = self.input_cursor.saturating_sub(1);
            }
            KeyCode::Right => {
                let len = self.input.graphemes(true).count();
                self.input_cursor = (self.input_cursor + 1).min(len);
            }
            KeyCode::Home => self.input_cursor = 0,
            KeyCode::End => self.input_cursor = self.input.graphemes(true).count(),
            KeyCode::Down => {
                if !self.results.is_empty() {
                    self.focus = Focus::Results;
                }
            }
            KeyCode::Char('a') if ctrl => self.input_cursor = 0,
            KeyCode::Char('e') if ctrl => self.input_cursor = self.input.graphemes(true).count(),
            KeyCode::Char('w') if ctrl => self.delete_prev_word(),
            KeyCode::Char('u') if ctrl => self.kill_to_start(),
            KeyCode::Char('k') if ctrl => self.kill_to_end(),
            KeyCode::Char(ch) if !ctrl => {
                let mut buf = [0u8; 4];
                self.insert_text(ch.encode_utf8(&mut buf));
            }
            _ => {}
        }
    }

    fn on_history_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Up => self.history_select_up(),
            KeyCode::Down => self.history_select_down(),
            KeyCode::Enter => self.replay_selected_history(),
            KeyCode::Char('c') | KeyCode::Delete => self.request_clear_history(),
            KeyCode::Char('?') => self.open_help(),
            KeyCode::Esc => self.focus = Focus::Input,
            _ => {}
        }
    }

    fn on_results_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Up => {
                if self.result_selected == 0 {
                    self.focus = Focus::Input;
                } else {
                    self.select_result_up();
                }
            }
            KeyCode::Down => self.select_result_down(),
            KeyCode::Left => self.prev_page(),
            KeyCode::Right => self.next_page(),
            KeyCode::Char(' ') => self.toggle_mark_selected(),
            KeyCode::Char('a') => self.generate_answer(),
            KeyCode::Char('?') => self.open_help(),
            KeyCode::Esc => self.focus = Focus::Input,
            _ => {}
        }
    }

    fn on_settings_key(&mut self, key: KeyEvent) {
        const ROWS: usize = 3;
        match key.code {
            KeyCode::Up => self.settings_selected = self.settings_selected.saturating_sub(1),
            KeyCode::Down => self.settings_selected = (self.settings_selected + 1).min(ROWS - 1),
            KeyCode::Enter | KeyCode::Char(' ') => match self.settings_selected {
                0 => self.toggle_theme(),
                1 => self.cycle_page_size(),
                _ => self.toggle_settings(),
            },
            KeyCode::Esc => self.toggle_settings(),
            _ => {}
        }
    }

    fn on_palette_key(&mut self, key: KeyEvent) {
        let Some(p) = &mut self.palette else {
            return;
        };
        match key.code {
            KeyCode::Esc => {
                self.palette = None;
            }
            KeyCode::Enter => {
                if let Some(act) = p.filtered.get(p.selected).cloned() {
                    self.palette = None;
                    self.execute_palette_action(&act);
                }
            }
            KeyCode::Up => {
                if p.selected > 0 {
                    p.selected -= 1;
                }
            }
            KeyCode::Down => {
                if p.selected + 1 < p.filtered.len() {
                    p.selected += 1;
                }
            }
            KeyCode::Backspace => {
                if p.cursor > 0 {
                    let mut parts: Vec<&str> = p.buffer.graphemes(true).collect();
                    let c = p.cursor.min(parts.len());
                    parts.remove(c - 1);
                    p.buffer = parts.concat();
                    p.cursor -= 1;
                    palette_filter(p);
                }
            }
            KeyCode::Char(ch) => {
                if !key.modifiers.contains(KeyModifiers::CONTROL) {
                    let mut parts: Vec<&str> = p.buffer.graphemes(true).collect();
                    let c = p.cursor.min(parts.len());
                    let mut buf = [0u8; 4];
                    parts.insert(c, ch.encode_utf8(&mut buf));
                    p.buffer = parts.concat();
                    p.cursor += 1;
                    palette_filter(p);
                }
            }
            _ => {}
        }
    }

    pub fn on_tick(&mut self) {
        self.tick = self.tick.wrapping_add(1);
        if self.loading || self.summary.as_ref().is_some_and(|s| s.loading) {
            self.dirty = true;
        }
        for _ in 0..64 {
            match self.net_rx.try_recv() {
                Ok(ev) => {
                    self.on_net_event(ev);
                    self.dirty = true;
                }
                Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => break,
            }
        }
    }

    fn on_net_event(&mut self, ev: NetEvent) {
        match ev {
            NetEvent::Results { seq, results } => self.on_results(seq, results),
            NetEvent::Summary { seq, text } => self.on_summary(seq, text),
            NetEvent::Latex(Ok(latex)) => {
                self.notice = None;
                self.focus = Focus::Input;
                self.insert_text(&latex);
            }
            NetEvent::Latex(Err(e)) => {
                warn!(target: "tui", "speech-to-latex failed: {}", e);
                self.notice = Some(format!("speech-to-latex failed: {}", e));
            }
        }
    }
}

impl ReplayTarget for App {
    // Replayed entries are issued exactly as stored: no trimming and no
    // slash-command parsing, so the journal bumps the existing row.
    fn commit_query(&mut self, query: &str) {
        self.input = query.to_string();
        self.input_cursor = self.input.graphemes(true).count();
        self.dirty = true;
    }

    fn run_search(&mut self) {
        if self.input.is_empty() {
            return;
        }
        self.notice = None;
        self.start_search(self.input.clone());
    }
}

#[derive(Clone)]
pub struct PaletteState {
    pub buffer: String,
    pub cursor: usize,
    pub filtered: Vec<PaletteAction>,
    pub selected: usize,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PaletteAction {
    ToggleHistory,
    OpenFilters,
    GenerateAnswer,
    ToggleSettings,
    ToggleMode,
    ToggleTheme,
    ClearHistory,
    ShowHelp,
    Quit,
}

const PALETTE_ACTIONS: [PaletteAction; 9] = [
    PaletteAction::ToggleHistory,
    PaletteAction::OpenFilters,
    PaletteAction::GenerateAnswer,
    PaletteAction::ToggleSettings,
    PaletteAction::ToggleMode,
    PaletteAction::ToggleTheme,
    PaletteAction::ClearHistory,
    PaletteAction::ShowHelp,
    PaletteAction::Quit,
];

impl PaletteAction {
    pub fn label(&self) -> &'static str {
        match self {
            PaletteAction::ToggleHistory => "Toggle history",
            PaletteAction::OpenFilters => "Search filters",
            PaletteAction::GenerateAnswer => "Generate answer",
            PaletteAction::ToggleSettings => "Settings",
            PaletteAction::ToggleMode => "Switch text/math mode",
            PaletteAction::ToggleTheme => "Toggle dark mode",
            PaletteAction::ClearHistory => "Clear history",
            PaletteAction::ShowHelp => "Help",
            PaletteAction::Quit => "Quit",
        }
    }
}

impl App {
    pub fn open_palette(&mut self) {
        let mut st = PaletteState {
            buffer: String::new(),
            cursor: 0,
            filtered: Vec::new(),
            selected: 0,
        };
        palette_filter(&mut st);
        self.palette = Some(st);
    }

    fn execute_palette_action(&mut self, act: &PaletteAction) {
        match act {
            PaletteAction::ToggleHistory => self.toggle_history(),
            PaletteAction::OpenFilters => self.open_filters(),
            PaletteAction::GenerateAnswer => self.generate_answer(),
            PaletteAction::ToggleSettings => self.toggle_settings(),
            PaletteAction::ToggleMode => self.toggle_mode(),
            PaletteAction::ToggleTheme => self.toggle_theme(),
            PaletteAction::ClearHistory => self.request_clear_history(),
            PaletteAction::ShowHelp => self.open_help(),
            PaletteAction::Quit => self.should_quit = true,
        }
        self.dirty = true;
    }
}

fn palette_filter(st: &mut PaletteState) {
    let q = st.buffer.to_lowercase();
    st.filtered = PALETTE_ACTIONS
        .iter()
        .filter(|a| q.is_empty() || a.label().to_lowercase().contains(&q))
        .cloned()
        .collect();
    st.selected = st.selected.min(st.filtered.len().saturating_sub(1));
}
