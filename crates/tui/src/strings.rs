// Centralized UI strings and labels. ASCII-friendly by default.

use unicode_width::UnicodeWidthStr;

pub const INPUT_HINT_TEXT: &str = "Search for a concept in words, e.g. pythagorean theorem";
pub const INPUT_HINT_MATH: &str = "Type LaTeX, e.g. a^2+b^2=c^2  (Ctrl+T: text mode)";

// UI block titles (keep surrounding spaces for visual padding)
pub const TITLE_HISTORY: &str = " History ";
pub const TITLE_SETTINGS: &str = " Settings ";
pub const TITLE_HELP: &str = " Help / Shortcuts ";
pub const TITLE_FILTERS: &str = " Search Filters ";
pub const TITLE_ANSWER: &str = " Generated Answer ";
pub const TITLE_CONFIRM: &str = " Confirm ";
pub const TITLE_PALETTE: &str = " Commands ";

pub const HISTORY_EMPTY: &str = "No searches yet";
pub const RESULTS_IDLE: &str = "Enter a query and press Enter to search.";
pub const RESULTS_LOADING: &str = "Searching...";
pub const RESULTS_NONE: &str = "No results found.";
pub const ANSWER_LOADING: &str = "Thinking...";
pub const FILTERS_FOOTER: &str = "Space: toggle  a: all  n: none  Tab: switch group  Esc: done";

pub const NOTICE_NEED_QUERY: &str = "Please enter a query first.";
pub const NOTICE_CONVERTING: &str = "Converting to LaTeX...";
pub const NOTICE_LATEX_USAGE: &str = "usage: /latex <spoken math>";

pub fn confirm_clear_history_message(n: usize) -> String {
    format!(
        "Clear all {} history entries? Press Y to confirm, N/Esc to cancel.",
        n
    )
}

pub fn title_input(mode: &str) -> String {
    format!(" Search [{}] ", mode)
}

pub fn title_results(label: &str, marked: usize) -> String {
    if marked > 0 {
        format!(" Results - {} - {} marked ", label, marked)
    } else {
        format!(" Results - {} ", label)
    }
}

// Build the status bar line with width-aware compaction.
// - backend: base URL or "offline"
// - focus: e.g., "Input" or "History"
// - busy: spinner frame while a request is in flight
// - max_width: available width for the status text
pub fn build_status_line(
    backend: &str,
    focus: &str,
    history_len: usize,
    filters_active: usize,
    busy: Option<&str>,
    notice: Option<&str>,
    max_width: u16,
) -> String {
    let mut segments: Vec<String> = Vec::new();
    if let Some(n) = notice {
        segments.push(n.to_string());
    }
    if let Some(s) = busy {
        segments.push(format!("{} working", s));
    }
    segments.push(format!("[{}][{}]", backend, focus));
    segments.push(format!("Hist:{}", history_len));
    segments.push(if filters_active > 0 {
        format!("Filters:{}", filters_active)
    } else {
        String::from("Filters:all")
    });
    // Hints ordered by importance; will be appended if space allows.
    let hints: [&str; 6] = [
        "Enter: search",
        "Tab: focus",
        "PgUp/PgDn: page",
        "F3: filters",
        "F5: answer",
        "F1: help",
    ];
    for h in hints {
        segments.push(h.to_string());
    }

    let sep = "  |  ";
    let mut out = String::new();
    let mut used = 0usize;
    for (i, seg) in segments.iter().enumerate() {
        let segw = UnicodeWidthStr::width(seg.as_str());
        let addw = segw
            + if i == 0 {
                0
            } else {
                UnicodeWidthStr::width(sep)
            };
        if used + addw > max_width as usize {
            break;
        }
        if i > 0 {
            out.push_str(sep);
            used += UnicodeWidthStr::width(sep);
        }
        out.push_str(seg);
        used += segw;
    }
    out
}

// ASCII help lines content; UI maps to styled lines.
pub fn help_lines_ascii() -> &'static [&'static str] {
    &[
        "Searching",
        "  Type a query, Enter: Search    Ctrl+T: Text/Math mode    Esc: Clear, then quit",
        "  /latex <spoken math>: Convert words to LaTeX    /clear: Clear history",
        "Input Editing",
        "  Arrow: Move cursor    Backspace/Delete: Delete prev/next char",
        "  Home/End or Ctrl+A/E: Start/end    Ctrl+Arrow: Word move",
        "  Ctrl+W: Delete prev word    Ctrl+U/K: Kill to start/end",
        "Results",
        "  Tab: Cycle focus    Up/Down: Select    PgUp/PgDn or Left/Right: Page",
        "  Space: Mark as answer context    F5/Ctrl+G: Generate answer",
        "History",
        "  F2: Show/hide    Up/Down: Select    Enter or click: Search again",
        "  C/Delete: Clear all (asks first)",
        "Panels",
        "  F3: Filters    F4: Settings    Ctrl+P: Command palette",
        "Help",
        "  F1: Open/close this panel    Ctrl+C/Ctrl+Q: Quit",
    ]
}
