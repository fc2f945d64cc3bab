use crossterm::event::{KeyCode, KeyEvent};
use mathmex_core::search::{strip_html, summarize_or_fallback, SearchResult, SUMMARY_UNREACHABLE};
use tracing::info;

use super::search::spawn_backend;
use super::{App, NetEvent};

/// The generated-answer modal.
#[derive(Clone, Debug)]
pub struct SummaryState {
    pub query: String,
    pub text: String,
    pub loading: bool,
    pub scroll: u16,
    pub(crate) seq: u64,
}

impl App {
    /// Asks the backend for an answer to the current query, using the marked
    /// results (or the visible page when nothing is marked) as context.
    pub fn generate_answer(&mut self) {
        let typed = self.input.trim();
        let query = if typed.is_empty() {
            self.last_query.clone().unwrap_or_default()
        } else {
            typed.to_string()
        };
        if query.is_empty() {
            self.notice = Some(crate::strings::NOTICE_NEED_QUERY.to_string());
            return;
        }

        self.summary_seq += 1;
        let seq = self.summary_seq;
        let context = self.summary_context();
        info!(target: "tui", "summarize seq={} context={}", seq, context.len());
        self.summary = Some(SummaryState {
            query: query.clone(),
            text: String::new(),
            loading: true,
            scroll: 0,
            seq,
        });
        spawn_backend(
            self.backend.clone(),
            self.net_tx.clone(),
            NetEvent::Summary {
                seq,
                text: SUMMARY_UNREACHABLE.to_string(),
            },
            move |client, tx| async move {
                let text = summarize_or_fallback(&client, &query, context).await;
                let _ = tx.send(NetEvent::Summary { seq, text });
            },
        );
    }

    pub fn summary_context(&self) -> Vec<SearchResult> {
        if self.marked.is_empty() {
            return self.page_results().to_vec();
        }
        self.marked
            .iter()
            .filter_map(|&i| self.results.get(i).cloned())
            .collect()
    }

    pub fn on_summary(&mut self, seq: u64, text: String) {
        let Some(s) = &mut self.summary else {
            return;
        };
        if s.seq != seq {
            return;
        }
        s.text = strip_html(&text);
        s.loading = false;
    }

    pub fn close_summary(&mut self) {
        self.summary = None;
    }

    pub(crate) fn on_summary_key(&mut self, key: KeyEvent) {
        let Some(s) = &mut self.summary else {
            return;
        };
        match key.code {
            KeyCode::Esc | KeyCode::F(5) | KeyCode::Char('q') => self.close_summary(),
            KeyCode::Up => s.scroll = s.scroll.saturating_sub(1),
            KeyCode::Down => s.scroll = s.scroll.saturating_add(1),
            KeyCode::PageUp => s.scroll = s.scroll.saturating_sub(10),
            KeyCode::PageDown => s.scroll = s.scroll.saturating_add(10),
            KeyCode::Home => s.scroll = 0,
            _ => {}
        }
    }
}
