use crossterm::event::{KeyCode, KeyEvent};
use mathmex_core::filters::FilterGroup;

use super::App;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FilterModalState {
    pub group: FilterGroup,
    pub cursor: usize,
}

impl App {
    pub fn open_filters(&mut self) {
        self.filter_modal = Some(FilterModalState {
            group: FilterGroup::Sources,
            cursor: 0,
        });
    }

    pub fn close_filters(&mut self) {
        self.filter_modal = None;
        let _ = crate::persist::save_state(self);
    }

    pub(crate) fn on_filter_key(&mut self, key: KeyEvent) {
        let Some(st) = &mut self.filter_modal else {
            return;
        };
        let options = st.group.options();
        match key.code {
            KeyCode::Esc | KeyCode::F(3) | KeyCode::Enter => {
                self.close_filters();
            }
            KeyCode::Up => st.cursor = st.cursor.saturating_sub(1),
            KeyCode::Down => {
                if st.cursor + 1 < options.len() {
                    st.cursor += 1;
                }
            }
            KeyCode::Tab | KeyCode::BackTab | KeyCode::Left | KeyCode::Right => {
                st.group = st.group.other();
                st.cursor = st.cursor.min(st.group.options().len().saturating_sub(1));
            }
            KeyCode::Char(' ') => {
                if let Some(opt) = options.get(st.cursor) {
                    self.filters.toggle(st.group, opt.id);
                }
            }
            KeyCode::Char('a') => self.filters.select_all(st.group),
            KeyCode::Char('n') => self.filters.clear_group(st.group),
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::app::tests::{press, test_app};
    use crossterm::event::KeyCode;

    #[test]
    fn toggles_apply_to_the_focused_group() {
        let mut app = test_app();
        press(&mut app, KeyCode::F(3));
        press(&mut app, KeyCode::Down);
        press(&mut app, KeyCode::Char(' '));
        assert_eq!(app.filters.sources, vec!["math-overflow"]);
        press(&mut app, KeyCode::Tab);
        press(&mut app, KeyCode::Char(' '));
        assert_eq!(app.filters.media_types.len(), 1);
        press(&mut app, KeyCode::Char('n'));
        assert!(app.filters.media_types.is_empty());
        press(&mut app, KeyCode::Char('a'));
        assert_eq!(app.filters.media_types.len(), 3);
        press(&mut app, KeyCode::Esc);
        assert!(app.filter_modal.is_none());
        assert_eq!(app.filters.active_count(), 4);
    }

    #[test]
    fn cursor_clamps_when_switching_to_shorter_group() {
        let mut app = test_app();
        app.open_filters();
        for _ in 0..10 {
            press(&mut app, KeyCode::Down);
        }
        assert_eq!(app.filter_modal.unwrap().cursor, 6);
        press(&mut app, KeyCode::Tab);
        assert_eq!(app.filter_modal.unwrap().cursor, 2);
    }
}
