use mathmex_core::filters::FilterGroup;
use mathmex_core::history::now_millis;
use mathmex_core::timefmt::format_age;
use ratatui::{
    layout::{Constraint, Direction, Layout, Position, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{
        Block, Borders, Clear, Paragraph, Scrollbar, ScrollbarOrientation, ScrollbarState, Wrap,
    },
    Frame,
};
use unicode_segmentation::UnicodeSegmentation;
use unicode_width::UnicodeWidthStr;

use crate::app::{App, ConfirmAction, ConfirmState, Focus, InputMode, LineKind, PaletteState};
use crate::strings::{
    build_status_line, confirm_clear_history_message, help_lines_ascii, title_input,
    title_results, ANSWER_LOADING, FILTERS_FOOTER, HISTORY_EMPTY, INPUT_HINT_MATH,
    INPUT_HINT_TEXT, RESULTS_IDLE, RESULTS_LOADING, RESULTS_NONE, TITLE_ANSWER, TITLE_CONFIRM,
    TITLE_FILTERS, TITLE_HELP, TITLE_HISTORY, TITLE_PALETTE, TITLE_SETTINGS,
};
use crate::theme::{theme, Theme};

pub fn draw(f: &mut Frame, app: &mut App) {
    let t = theme(app.dark_mode);
    f.render_widget(
        Block::default().style(Style::default().fg(t.fg).bg(t.bg)),
        f.area(),
    );

    // Layout: optional left history (30), main, optional right settings (32)
    let mut constraints: Vec<Constraint> = Vec::new();
    if app.show_history {
        constraints.push(Constraint::Length(30));
    }
    constraints.push(Constraint::Min(20));
    if app.show_settings {
        constraints.push(Constraint::Length(32));
    }
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints(constraints)
        .split(f.area());
    let mut idx = 0usize;
    if app.show_history {
        app.history_area = Some(chunks[idx]);
        app.ensure_history_visible();
        draw_history(f, chunks[idx], app, t);
        idx += 1;
    } else {
        app.history_area = None;
    }
    let main_area = chunks[idx];
    idx += 1;
    draw_main(f, main_area, app, t);
    if app.show_settings {
        draw_settings(f, chunks[idx], app, t);
    }

    let app: &App = app;
    if app.filter_modal.is_some() {
        draw_filters(f, f.area(), app, t);
    }
    if app.summary.is_some() {
        draw_summary(f, f.area(), app, t);
    }
    if let Some(state) = &app.palette {
        draw_palette(f, f.area(), state, t);
    }
    if let Some(confirm) = &app.confirm {
        draw_confirm(f, f.area(), confirm, app, t);
    }
    if app.show_help {
        draw_help(f, f.area(), t);
    }
}

fn border_style(focused: bool, t: &Theme) -> Style {
    if focused {
        Style::default().fg(t.border_focus)
    } else {
        Style::default().fg(t.border_inactive)
    }
}

fn popup_title(s: &str, t: &Theme) -> Span<'static> {
    Span::styled(
        s.to_string(),
        Style::default().fg(t.accent).add_modifier(Modifier::BOLD),
    )
}

fn selected_style(t: &Theme) -> Style {
    Style::default()
        .fg(t.selected_fg)
        .bg(t.selected_bg)
        .add_modifier(Modifier::BOLD)
}

fn draw_history(f: &mut Frame, area: Rect, app: &App, t: &Theme) {
    let focused = app.focus == Focus::History;
    let block = Block::default()
        .title(popup_title(TITLE_HISTORY, t))
        .borders(Borders::ALL)
        .border_style(border_style(focused, t));
    let inner_w = area.width.saturating_sub(2) as usize;
    let inner_h = area.height.saturating_sub(2) as usize;
    let start = app.history_scroll as usize;
    let now = now_millis();

    let entries = app.journal.display();
    let mut lines: Vec<Line> = Vec::new();
    if entries.is_empty() {
        lines.push(Line::from(Span::styled(
            HISTORY_EMPTY,
            Style::default().fg(t.muted),
        )));
    }
    for (i, e) in entries.iter().enumerate().skip(start).take(inner_h) {
        let age = format_age(now, e.timestamp);
        let room = inner_w.saturating_sub(UnicodeWidthStr::width(age.as_str()) + 1);
        let query = truncate_to_width(&e.query, room);
        let pad = room.saturating_sub(UnicodeWidthStr::width(query.as_str()));
        let style = if i == app.history_selected && focused {
            selected_style(t)
        } else {
            Style::default().fg(t.fg)
        };
        lines.push(Line::from(vec![
            Span::styled(format!("{}{} ", query, " ".repeat(pad)), style),
            Span::styled(age, Style::default().fg(t.muted)),
        ]));
    }
    f.render_widget(Paragraph::new(lines).block(block), area);

    let inner = inner_rect(area);
    if entries.len() > inner.height as usize {
        let mut sb_state = ScrollbarState::new(entries.len()).position(start);
        let sb = Scrollbar::default().orientation(ScrollbarOrientation::VerticalRight);
        f.render_stateful_widget(sb, inner, &mut sb_state);
    }
}

fn draw_main(f: &mut Frame, area: Rect, app: &mut App, t: &Theme) {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(3),
            Constraint::Length(1),
        ])
        .split(area);
    draw_input(f, rows[0], app, t);
    draw_results(f, rows[1], app, t);
    draw_status(f, rows[2], app, t);
}

fn draw_input(f: &mut Frame, area: Rect, app: &App, t: &Theme) {
    let focused = app.focus == Focus::Input;
    let block = Block::default()
        .title(popup_title(&title_input(app.mode.label()), t))
        .borders(Borders::ALL)
        .border_style(border_style(focused, t));
    let inner_w = area.width.saturating_sub(2);
    let before: String = app
        .input
        .graphemes(true)
        .take(app.input_cursor)
        .collect();
    let cursor_col = UnicodeWidthStr::width(before.as_str()) as u16;
    let offset_x = cursor_col.saturating_sub(inner_w.saturating_sub(1));

    let para = if app.input.is_empty() {
        let hint = match app.mode {
            InputMode::Text => INPUT_HINT_TEXT,
            InputMode::Math => INPUT_HINT_MATH,
        };
        Paragraph::new(Line::from(Span::styled(hint, Style::default().fg(t.muted)))).block(block)
    } else {
        Paragraph::new(app.input.as_str())
            .style(Style::default().fg(t.title))
            .block(block)
            .scroll((0, offset_x))
    };
    f.render_widget(para, area);

    if focused {
        f.set_cursor_position(Position::new(
            area.x + 1 + cursor_col - offset_x,
            area.y + 1,
        ));
    }
}

fn draw_results(f: &mut Frame, area: Rect, app: &mut App, t: &Theme) {
    app.results_area = Some(area);
    let inner = inner_rect(area);
    app.results_viewport = inner.height;
    app.ensure_results_wrapped(inner.width.saturating_sub(1));
    app.results_scroll = app.results_scroll.min(app.results_max_scroll());
    let app: &App = app;

    let focused = app.focus == Focus::Results;
    let title = title_results(&app.pager.label(app.results.len()), app.marked.len());
    let block = Block::default()
        .title(popup_title(&title, t))
        .borders(Borders::ALL)
        .border_style(border_style(focused, t));

    let placeholder = if app.loading {
        Some(format!("{} {}", app.spinner(), RESULTS_LOADING))
    } else if !app.searched {
        Some(RESULTS_IDLE.to_string())
    } else if app.results.is_empty() {
        Some(RESULTS_NONE.to_string())
    } else {
        None
    };
    if let Some(text) = placeholder {
        let para = Paragraph::new(Line::from(Span::styled(text, Style::default().fg(t.muted))))
            .block(block);
        f.render_widget(para, area);
        return;
    }

    let mut lines: Vec<Line> = Vec::new();
    for (i, w) in app.results_cache.iter().enumerate() {
        let selected = focused && i == app.result_selected;
        let marked = app.marked.contains(&w.index);
        for (kind, text) in &w.lines {
            let style = match kind {
                LineKind::Title if selected => selected_style(t),
                LineKind::Title if marked => Style::default()
                    .fg(t.marked)
                    .add_modifier(Modifier::BOLD),
                LineKind::Title => Style::default().fg(t.title).add_modifier(Modifier::BOLD),
                LineKind::Meta => Style::default().fg(t.link),
                LineKind::Video => Style::default().fg(t.accent),
                LineKind::Body | LineKind::Spacer => Style::default().fg(t.fg),
            };
            lines.push(Line::from(Span::styled(text.clone(), style)));
        }
    }
    let para = Paragraph::new(lines)
        .block(block)
        .scroll((app.results_scroll, 0));
    f.render_widget(para, area);

    let total = app.results_total_lines();
    if total > inner.height as usize {
        let mut sb_state = ScrollbarState::new(total).position(app.results_scroll as usize);
        let sb = Scrollbar::default().orientation(ScrollbarOrientation::VerticalRight);
        f.render_stateful_widget(sb, inner, &mut sb_state);
    }
}

fn draw_status(f: &mut Frame, area: Rect, app: &App, t: &Theme) {
    let focus = match app.focus {
        Focus::Input => "Input",
        Focus::History => "History",
        Focus::Results => "Results",
        Focus::Settings => "Settings",
    };
    let busy = (app.loading || app.summary.as_ref().is_some_and(|s| s.loading))
        .then(|| app.spinner());
    let tips = build_status_line(
        &app.backend_label,
        focus,
        app.journal.len(),
        app.filters.active_count(),
        busy,
        app.notice.as_deref(),
        area.width,
    );
    let color = if app.notice.is_some() { t.error } else { t.muted };
    f.render_widget(
        Paragraph::new(Line::from(Span::styled(tips, Style::default().fg(color)))),
        area,
    );
}

fn draw_settings(f: &mut Frame, area: Rect, app: &App, t: &Theme) {
    let focused = app.focus == Focus::Settings;
    let block = Block::default()
        .title(popup_title(TITLE_SETTINGS, t))
        .borders(Borders::ALL)
        .border_style(border_style(focused, t));
    let rows = [
        format!("Theme: {}", if app.dark_mode { "Dark" } else { "Light" }),
        format!("Page size: {}", app.pager.page_size()),
        String::from("Close"),
    ];
    let mut lines: Vec<Line> = Vec::new();
    for (i, r) in rows.iter().enumerate() {
        let style = if focused && i == app.settings_selected {
            selected_style(t)
        } else {
            Style::default().fg(t.fg)
        };
        lines.push(Line::from(Span::styled(r.clone(), style)));
    }
    lines.push(Line::from(""));
    let muted = Style::default().fg(t.muted);
    lines.push(Line::from(Span::styled(
        format!("History: {} ({}/{})", app.history_scope.label(), app.journal.len(), mathmex_core::history::MAX_ENTRIES),
        muted,
    )));
    lines.push(Line::from(Span::styled(
        format!("Backend: {}", app.backend_label),
        muted,
    )));
    lines.push(Line::from(Span::styled(
        format!("Filters: {} active", app.filters.active_count()),
        muted,
    )));
    let para = Paragraph::new(lines)
        .block(block)
        .wrap(Wrap { trim: false });
    f.render_widget(para, area);
}

fn draw_filters(f: &mut Frame, area: Rect, app: &App, t: &Theme) {
    let Some(st) = app.filter_modal else {
        return;
    };
    let popup_area = centered_rect(70, 70, area);
    let block = Block::default()
        .title(popup_title(TITLE_FILTERS, t))
        .borders(Borders::ALL);
    let mut lines: Vec<Line> = Vec::new();
    for group in [FilterGroup::Sources, FilterGroup::MediaTypes] {
        let active = group == st.group;
        let head = Style::default()
            .fg(if active { t.accent } else { t.muted })
            .add_modifier(Modifier::BOLD);
        lines.push(Line::from(Span::styled(group.title().to_string(), head)));
        for (i, opt) in group.options().iter().enumerate() {
            let check = if app.filters.contains(group, opt.id) {
                "[x]"
            } else {
                "[ ]"
            };
            let style = if active && i == st.cursor {
                selected_style(t)
            } else {
                Style::default().fg(t.fg)
            };
            lines.push(Line::from(vec![
                Span::styled(format!(" {} {}", check, opt.name), style),
                Span::styled(format!("  {}", opt.description), Style::default().fg(t.muted)),
            ]));
        }
        lines.push(Line::from(""));
    }
    lines.push(Line::from(Span::styled(
        FILTERS_FOOTER,
        Style::default().fg(t.muted),
    )));
    let para = Paragraph::new(lines)
        .block(block)
        .wrap(Wrap { trim: false });
    f.render_widget(Clear, popup_area);
    f.render_widget(para, popup_area);
}

fn draw_summary(f: &mut Frame, area: Rect, app: &App, t: &Theme) {
    let Some(s) = &app.summary else {
        return;
    };
    let popup_area = centered_rect(80, 80, area);
    let block = Block::default()
        .title(popup_title(TITLE_ANSWER, t))
        .borders(Borders::ALL);
    let mut lines: Vec<Line> = vec![
        Line::from(Span::styled(
            format!("Q: {}", s.query),
            Style::default().fg(t.title).add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
    ];
    if s.loading {
        lines.push(Line::from(Span::styled(
            format!("{} {}", app.spinner(), ANSWER_LOADING),
            Style::default().fg(t.muted),
        )));
    } else {
        lines.extend(s.text.lines().map(|l| Line::from(l.to_string())));
    }
    let para = Paragraph::new(lines)
        .block(block)
        .wrap(Wrap { trim: false })
        .scroll((s.scroll, 0));
    f.render_widget(Clear, popup_area);
    f.render_widget(para, popup_area);
}

fn draw_help(f: &mut Frame, area: Rect, t: &Theme) {
    let popup_area = centered_rect(70, 70, area);
    let block = Block::default()
        .title(popup_title(TITLE_HELP, t))
        .borders(Borders::ALL);
    let lines = help_lines_ascii()
        .iter()
        .map(|s| Line::from(*s))
        .collect::<Vec<Line>>();
    let para = Paragraph::new(lines)
        .block(block)
        .wrap(Wrap { trim: false });
    f.render_widget(Clear, popup_area);
    f.render_widget(para, popup_area);
}

fn draw_palette(f: &mut Frame, area: Rect, state: &PaletteState, t: &Theme) {
    let popup_area = centered_rect(60, 60, area);
    let block = Block::default()
        .title(popup_title(TITLE_PALETTE, t))
        .borders(Borders::ALL);

    let mut lines: Vec<Line> = Vec::new();
    lines.push(Line::from(format!(">> {}", state.buffer)));
    let max_list = popup_area.height.saturating_sub(4) as usize;
    for (i, act) in state.filtered.iter().take(max_list).enumerate() {
        let style = if i == state.selected {
            selected_style(t)
        } else {
            Style::default()
        };
        lines.push(Line::from(Span::styled(act.label().to_string(), style)));
    }
    let para = Paragraph::new(lines)
        .block(block)
        .wrap(Wrap { trim: false });
    f.render_widget(Clear, popup_area);
    f.render_widget(para, popup_area);
    // place cursor after prompt
    let typed: String = state.buffer.graphemes(true).take(state.cursor).collect();
    let cursor_x = popup_area.x + 4 + UnicodeWidthStr::width(typed.as_str()) as u16;
    f.set_cursor_position(Position::new(cursor_x, popup_area.y + 1));
}

fn draw_confirm(f: &mut Frame, area: Rect, confirm: &ConfirmState, app: &App, t: &Theme) {
    let popup_area = centered_rect(60, 30, area);
    let block = Block::default()
        .title(popup_title(TITLE_CONFIRM, t))
        .borders(Borders::ALL);
    let mut lines = Vec::new();
    match confirm.action {
        ConfirmAction::ClearHistory => {
            lines.push(Line::from(confirm_clear_history_message(app.journal.len())));
        }
    }
    let para = Paragraph::new(lines)
        .block(block)
        .wrap(Wrap { trim: false });
    f.render_widget(Clear, popup_area);
    f.render_widget(para, popup_area);
}

fn inner_rect(area: Rect) -> Rect {
    Rect {
        x: area.x.saturating_add(1),
        y: area.y.saturating_add(1),
        width: area.width.saturating_sub(2),
        height: area.height.saturating_sub(2),
    }
}

fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let vert = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(r);
    let horiz = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(vert[1]);
    horiz[1]
}

fn truncate_to_width(s: &str, max: usize) -> String {
    if UnicodeWidthStr::width(s) <= max {
        return s.to_string();
    }
    let mut out = String::new();
    let mut used = 0usize;
    for g in s.graphemes(true) {
        let w = UnicodeWidthStr::width(g);
        if used + w + 1 > max {
            break;
        }
        out.push_str(g);
        used += w;
    }
    if max > 0 {
        out.push('~');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::tests::test_app;
    use mathmex_core::search::SearchResult;
    use ratatui::{backend::TestBackend, Terminal};

    fn render(app: &mut App, w: u16, h: u16) -> String {
        let mut terminal = Terminal::new(TestBackend::new(w, h)).unwrap();
        terminal.draw(|f| draw(f, app)).unwrap();
        let buf = terminal.backend().buffer().clone();
        let mut out = String::new();
        for y in 0..h {
            for x in 0..w {
                out.push_str(buf[(x, y)].symbol());
            }
            out.push('\n');
        }
        out
    }

    #[test]
    fn truncation_marks_cut_text() {
        assert_eq!(truncate_to_width("abc", 5), "abc");
        assert_eq!(truncate_to_width("abcdef", 4), "abc~");
    }

    #[test]
    fn draws_history_and_results() {
        let mut app = test_app();
        app.journal.record_at("x^2", now_millis());
        app.start_search("a^2+b^2=c^2".into());
        app.on_tick();
        let seq_results = vec![SearchResult {
            title: "Pythagorean theorem".into(),
            body_text: "In a right triangle".into(),
            link: "https://en.wikipedia.org/wiki/Pythagorean_theorem".into(),
            score: 0.9,
            media_type: "article".into(),
        }];
        app.results = seq_results;
        let screen = render(&mut app, 120, 30);
        assert!(screen.contains("History"));
        assert!(screen.contains("a^2+b^2=c^2"));
        assert!(screen.contains("Just now"));
        assert!(screen.contains("1. Pythagorean theorem"));
        assert!(screen.contains("Page 1 of 1"));
        assert!(app.results_area.is_some());
    }

    #[test]
    fn overlays_render_without_panicking_on_small_screens() {
        let mut app = test_app();
        app.show_settings = true;
        app.open_filters();
        app.open_palette();
        app.show_help = true;
        let screen = render(&mut app, 40, 12);
        assert!(!screen.is_empty());
    }
}
