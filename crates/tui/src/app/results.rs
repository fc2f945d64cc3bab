use mathmex_core::search::{youtube_id, SearchResult};
use textwrap::{wrap, Options};
use unicode_width::UnicodeWidthStr;

use super::App;

pub const BODY_PREVIEW_LINES: usize = 4;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LineKind {
    Title,
    Meta,
    Body,
    Video,
    Spacer,
}

/// One result of the current page, pre-wrapped to the panel width.
#[derive(Clone, Debug)]
pub struct WrappedResult {
    /// Position in the full result list.
    pub index: usize,
    pub lines: Vec<(LineKind, String)>,
}

impl App {
    pub fn ensure_results_wrapped(&mut self, width: u16) {
        let width = width.max(1);
        let range = self.pager.range(self.results.len());
        let first = self.results_cache.first().map(|w| w.index);
        let fresh = self.results_wrap_width == width
            && self.results_cache.len() == range.len()
            && (range.is_empty() || first == Some(range.start));
        if fresh {
            return;
        }
        let start = range.start;
        self.results_cache = self.results[range]
            .iter()
            .enumerate()
            .map(|(i, r)| wrap_result(start + i, r, width))
            .collect();
        self.results_wrap_width = width;
    }

    pub fn results_total_lines(&self) -> usize {
        self.results_cache.iter().map(|w| w.lines.len()).sum()
    }

    /// First line and line count of the page-relative result `idx`.
    pub fn result_line_span(&self, idx: usize) -> (usize, usize) {
        let start = self
            .results_cache
            .iter()
            .take(idx)
            .map(|w| w.lines.len())
            .sum();
        let len = self.results_cache.get(idx).map(|w| w.lines.len()).unwrap_or(0);
        (start, len)
    }

    pub fn result_at_line(&self, line: usize) -> Option<usize> {
        let mut acc = 0usize;
        for (i, w) in self.results_cache.iter().enumerate() {
            acc += w.lines.len();
            if line < acc {
                return Some(i);
            }
        }
        None
    }

    pub fn results_max_scroll(&self) -> u16 {
        self.results_total_lines()
            .saturating_sub(self.results_viewport.max(1) as usize) as u16
    }

    pub fn ensure_result_visible(&mut self) {
        let viewport = self.results_viewport as usize;
        if viewport == 0 {
            return;
        }
        let (start, len) = self.result_line_span(self.result_selected);
        let top = self.results_scroll as usize;
        if start < top {
            self.results_scroll = start as u16;
        } else if start + len > top + viewport {
            // Show the whole card when it fits, else its head.
            let want = (start + len).saturating_sub(viewport).min(start);
            self.results_scroll = want as u16;
        }
        self.results_scroll = self.results_scroll.min(self.results_max_scroll());
    }
}

fn wrap_result(index: usize, r: &SearchResult, width: u16) -> WrappedResult {
    let width = width as usize;
    let mut lines = Vec::new();

    let title = if r.title.trim().is_empty() {
        "(untitled)"
    } else {
        r.title.trim()
    };
    let prefix = format!("{}. ", index + 1);
    let indent = " ".repeat(UnicodeWidthStr::width(prefix.as_str()));
    let head = format!("{}{}", prefix, title);
    let opts = Options::new(width).subsequent_indent(&indent);
    for l in wrap(&head, opts) {
        lines.push((LineKind::Title, l.into_owned()));
    }

    let mut meta = Vec::new();
    if !r.media_type.is_empty() {
        meta.push(r.media_type.clone());
    }
    meta.push(format!("score {:.2}", r.score));
    if !r.link.is_empty() {
        meta.push(r.link.clone());
    }
    let meta = meta.join(" | ");
    for l in wrap(&meta, Options::new(width).initial_indent(&indent).subsequent_indent(&indent)) {
        lines.push((LineKind::Meta, l.into_owned()));
    }

    match youtube_id(&r.link).filter(|_| r.is_video()) {
        Some(id) => lines.push((LineKind::Video, format!("{}[video {}]", indent, id))),
        None => {
            let body = r.body_text.split_whitespace().collect::<Vec<_>>().join(" ");
            if !body.is_empty() {
                let opts = Options::new(width).initial_indent(&indent).subsequent_indent(&indent);
                let wrapped = wrap(&body, opts);
                let truncated = wrapped.len() > BODY_PREVIEW_LINES;
                for (i, l) in wrapped.into_iter().take(BODY_PREVIEW_LINES).enumerate() {
                    let mut s = l.into_owned();
                    if truncated && i + 1 == BODY_PREVIEW_LINES {
                        s.push_str(" ...");
                    }
                    lines.push((LineKind::Body, s));
                }
            }
        }
    }

    lines.push((LineKind::Spacer, String::new()));
    WrappedResult { index, lines }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::tests::test_app;

    fn result(title: &str, body: &str) -> SearchResult {
        SearchResult {
            title: title.into(),
            body_text: body.into(),
            link: "https://en.wikipedia.org/wiki/X".into(),
            score: 0.5,
            media_type: "article".into(),
        }
    }

    #[test]
    fn cards_carry_title_meta_body_and_spacer() {
        let w = wrap_result(2, &result("Euler", "e to the i pi"), 80);
        assert_eq!(w.lines[0], (LineKind::Title, "3. Euler".to_string()));
        assert_eq!(w.lines[1].0, LineKind::Meta);
        assert!(w.lines[1].1.contains("score 0.50"));
        assert_eq!(w.lines[2], (LineKind::Body, "   e to the i pi".to_string()));
        assert_eq!(w.lines.last().unwrap().0, LineKind::Spacer);
    }

    #[test]
    fn long_bodies_are_cut_to_preview() {
        let body = "word ".repeat(200);
        let w = wrap_result(0, &result("T", &body), 30);
        let body_lines: Vec<_> = w.lines.iter().filter(|l| l.0 == LineKind::Body).collect();
        assert_eq!(body_lines.len(), BODY_PREVIEW_LINES);
        assert!(body_lines[BODY_PREVIEW_LINES - 1].1.ends_with("..."));
    }

    #[test]
    fn youtube_videos_show_id_instead_of_body() {
        let mut r = result("Lecture", "transcript");
        r.media_type = "video".into();
        r.link = "https://www.youtube.com/watch?v=abc123&t=4".into();
        let w = wrap_result(0, &r, 80);
        assert!(w.lines.iter().any(|l| l.0 == LineKind::Video && l.1.contains("abc123")));
        assert!(!w.lines.iter().any(|l| l.0 == LineKind::Body));
    }

    #[test]
    fn cache_tracks_current_page_and_selection_scrolls() {
        let mut app = test_app();
        app.results = (0..12).map(|i| result(&format!("r{}", i), "b")).collect();
        app.ensure_results_wrapped(80);
        assert_eq!(app.results_cache.len(), 10);
        // Each card: title, meta, body, spacer.
        assert_eq!(app.result_line_span(3), (12, 4));
        assert_eq!(app.result_at_line(13), Some(3));

        app.results_viewport = 8;
        app.result_selected = 5;
        app.ensure_result_visible();
        assert_eq!(app.results_scroll, 16);

        app.pager.next(app.results.len());
        app.ensure_results_wrapped(80);
        assert_eq!(app.results_cache.len(), 2);
        assert_eq!(app.results_cache[0].index, 10);
    }
}
