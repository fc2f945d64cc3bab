use mathmex_core::history::{replay, HistoryEntry};
use tracing::info;

use super::{App, ConfirmAction, ConfirmState, Focus};

// History panel: rows are the journal's display order, newest first.
impl App {
    pub fn history_inner_height(&self) -> u16 {
        self.history_area
            .map(|a| a.height.saturating_sub(2))
            .unwrap_or(0)
    }

    pub fn history_max_scroll(&self) -> u16 {
        let h = self.history_inner_height() as usize;
        if h == 0 {
            0
        } else {
            self.journal.len().saturating_sub(h) as u16
        }
    }

    pub fn history_select_up(&mut self) {
        if self.history_selected > 0 {
            self.history_selected -= 1;
        }
        self.ensure_history_visible();
    }

    pub fn history_select_down(&mut self) {
        if self.history_selected + 1 < self.journal.len() {
            self.history_selected += 1;
        }
        self.ensure_history_visible();
    }

    pub fn ensure_history_visible(&mut self) {
        let start = self.history_scroll as usize;
        let h = self.history_inner_height() as usize;
        if h == 0 {
            return;
        }
        let end = start + h.saturating_sub(1);
        if self.history_selected < start {
            self.history_scroll = self.history_selected as u16;
        } else if self.history_selected > end {
            self.history_scroll = (self.history_selected + 1 - h) as u16;
        }
        self.history_scroll = self.history_scroll.min(self.history_max_scroll());
    }

    pub fn history_entry_at(&self, display_index: usize) -> Option<HistoryEntry> {
        self.journal.display().into_iter().nth(display_index)
    }

    pub fn replay_history(&mut self, display_index: usize) {
        let Some(entry) = self.history_entry_at(display_index) else {
            return;
        };
        info!(target: "tui", "replay history entry {}", display_index);
        self.focus = Focus::Input;
        replay(self, &entry);
        // The replayed query is now the newest entry.
        self.history_selected = 0;
        self.history_scroll = 0;
    }

    pub fn replay_selected_history(&mut self) {
        self.replay_history(self.history_selected);
    }

    pub fn request_clear_history(&mut self) {
        if self.journal.is_empty() {
            return;
        }
        self.confirm = Some(ConfirmState {
            action: ConfirmAction::ClearHistory,
        });
    }

    pub fn clear_history(&mut self) {
        self.journal.clear();
        self.history_selected = 0;
        self.history_scroll = 0;
        if self.focus == Focus::History {
            self.focus = Focus::Input;
        }
        info!(target: "tui", "history cleared");
    }
}

#[cfg(test)]
mod tests {
    use crate::app::tests::{press, test_app};
    use crate::app::Focus;
    use crossterm::event::KeyCode;
    use ratatui::layout::Rect;

    #[test]
    fn selection_follows_display_order() {
        let mut app = test_app();
        for (i, q) in ["a", "b", "c"].iter().enumerate() {
            app.journal.record_at(q, i as i64);
        }
        assert_eq!(app.history_entry_at(0).unwrap().query, "c");
        app.history_select_down();
        app.history_select_down();
        app.history_select_down();
        assert_eq!(app.history_selected, 2);
        assert_eq!(app.history_entry_at(app.history_selected).unwrap().query, "a");
    }

    #[test]
    fn replay_moves_entry_to_front_and_searches() {
        let mut app = test_app();
        for (i, q) in ["x^2", "y^2", "z^2"].iter().enumerate() {
            app.journal.record_at(q, i as i64);
        }
        app.focus = Focus::History;
        press(&mut app, KeyCode::Down);
        press(&mut app, KeyCode::Down);
        press(&mut app, KeyCode::Enter);
        assert_eq!(app.input, "x^2");
        assert!(app.loading);
        assert_eq!(app.focus, Focus::Input);
        let queries: Vec<_> = app.journal.display().into_iter().map(|e| e.query).collect();
        assert_eq!(queries, vec!["x^2", "z^2", "y^2"]);
        assert_eq!(app.history_selected, 0);
    }

    #[test]
    fn clear_requires_confirmation() {
        let mut app = test_app();
        app.journal.record_at("x^2", 1);
        app.focus = Focus::History;
        press(&mut app, KeyCode::Char('c'));
        assert!(app.confirm.is_some());
        press(&mut app, KeyCode::Char('n'));
        assert_eq!(app.journal.len(), 1);
        press(&mut app, KeyCode::Char('c'));
        press(&mut app, KeyCode::Char('y'));
        assert!(app.journal.is_empty());
        assert!(app.confirm.is_none());
    }

    #[test]
    fn clear_on_empty_history_does_not_prompt() {
        let mut app = test_app();
        app.request_clear_history();
        assert!(app.confirm.is_none());
    }

    #[test]
    fn scroll_keeps_selection_visible() {
        let mut app = test_app();
        for i in 0..15 {
            app.journal.record_at(&format!("q{}", i), i);
        }
        app.history_area = Some(Rect::new(0, 0, 20, 7));
        for _ in 0..10 {
            app.history_select_down();
        }
        assert_eq!(app.history_selected, 10);
        assert_eq!(app.history_scroll, 6);
        for _ in 0..8 {
            app.history_select_up();
        }
        assert_eq!(app.history_scroll, 2);
    }

    #[test]
    fn replay_reissues_the_stored_query_verbatim() {
        let mut app = test_app();
        app.journal.record_at(" x^2", 1);
        app.journal.record_at("y", 2);
        app.replay_history(1);
        assert_eq!(app.input, " x^2");
        assert_eq!(app.last_query.as_deref(), Some(" x^2"));
        let queries: Vec<_> = app.journal.entries().iter().map(|e| e.query.clone()).collect();
        assert_eq!(queries, vec!["y", " x^2"]);
    }

    #[test]
    fn replayed_slash_text_is_searched_not_executed() {
        let mut app = test_app();
        app.journal.record_at("/clear", 1);
        app.journal.record_at("y", 2);
        app.replay_history(1);
        assert!(app.loading);
        assert_eq!(app.journal.len(), 2);
        assert_eq!(app.journal.entries().last().unwrap().query, "/clear");
    }
}
