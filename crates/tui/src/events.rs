use std::time::{Duration, Instant};

use crossterm::event::{self, Event, MouseButton, MouseEvent, MouseEventKind};
use ratatui::{backend::Backend, layout::Rect, Terminal};

use crate::{
    app::{App, Focus},
    ui,
};

pub fn run<B: Backend>(terminal: &mut Terminal<B>, app: &mut App) -> anyhow::Result<()> {
    let mut last_draw = Instant::now();
    let heartbeat = Duration::from_millis(500);
    loop {
        if app.dirty || last_draw.elapsed() >= heartbeat {
            terminal.draw(|f| ui::draw(f, app))?;
            app.dirty = false;
            last_draw = Instant::now();
        }
        if matches!(app.focus, Focus::Input) && !has_overlay(app) {
            let _ = terminal.show_cursor();
        } else {
            let _ = terminal.hide_cursor();
        }

        if event::poll(Duration::from_millis(120))? {
            match event::read()? {
                Event::Key(key) => {
                    app.on_key(key);
                }
                Event::Paste(s) => {
                    if app.focus == Focus::Input && !has_overlay(app) {
                        app.insert_text(&s);
                        app.dirty = true;
                    }
                }
                Event::Resize(_, _) => {
                    app.dirty = true;
                }
                Event::Mouse(me) => {
                    if !has_overlay(app) {
                        on_mouse(app, me);
                    }
                }
                _ => {}
            }
        }

        app.on_tick();

        if app.should_quit {
            let _ = crate::persist::save_state(app);
            break;
        }
    }
    Ok(())
}

fn has_overlay(app: &App) -> bool {
    app.show_help
        || app.confirm.is_some()
        || app.palette.is_some()
        || app.summary.is_some()
        || app.filter_modal.is_some()
}

fn inside(area: Rect, x: u16, y: u16) -> bool {
    x >= area.x && x < area.x + area.width && y >= area.y && y < area.y + area.height
}

pub(crate) fn on_mouse(app: &mut App, me: MouseEvent) {
    let (x, y) = (me.column, me.row);

    if let Some(area) = app.results_area.filter(|a| inside(*a, x, y)) {
        match me.kind {
            MouseEventKind::ScrollUp => {
                app.results_scroll = app.results_scroll.saturating_sub(3);
                app.dirty = true;
            }
            MouseEventKind::ScrollDown => {
                app.results_scroll = (app.results_scroll + 3).min(app.results_max_scroll());
                app.dirty = true;
            }
            MouseEventKind::Down(MouseButton::Left) => {
                if y > area.y && y < area.y + area.height - 1 {
                    let line = app.results_scroll as usize + (y - (area.y + 1)) as usize;
                    if let Some(i) = app.result_at_line(line) {
                        app.focus = Focus::Results;
                        app.result_selected = i;
                        app.dirty = true;
                    }
                }
            }
            _ => {}
        }
        return;
    }

    if !app.show_history {
        return;
    }
    if let Some(area) = app.history_area.filter(|a| inside(*a, x, y)) {
        match me.kind {
            MouseEventKind::ScrollUp => {
                app.history_scroll = app.history_scroll.saturating_sub(1);
                app.dirty = true;
            }
            MouseEventKind::ScrollDown => {
                let max = app.history_max_scroll();
                app.history_scroll = (app.history_scroll + 1).min(max);
                app.dirty = true;
            }
            MouseEventKind::Down(MouseButton::Left) => {
                if y > area.y && y < area.y + area.height - 1 {
                    let idx = app.history_scroll as usize + (y - (area.y + 1)) as usize;
                    if idx < app.journal.len() {
                        app.history_selected = idx;
                        app.replay_history(idx);
                        app.dirty = true;
                    }
                }
            }
            _ => {}
        }
    }
}
