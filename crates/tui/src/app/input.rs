use unicode_segmentation::UnicodeSegmentation;

use super::App;

// Search bar editing. The bar is a single line, so pasted newlines become spaces.
impl App {
    pub fn set_query(&mut self, query: &str) {
        self.input = query.replace(['\r', '\n'], " ");
        self.input_cursor = self.input.graphemes(true).count();
        self.dirty = true;
    }

    pub fn insert_text(&mut self, s: &str) {
        let s = s.replace(['\r', '\n'], " ");
        let parts: Vec<&str> = self.input.graphemes(true).collect();
        let idx = self.input_cursor.min(parts.len());
        let mut new_input = String::with_capacity(self.input.len() + s.len());
        for g in &parts[..idx] {
            new_input.push_str(g);
        }
        new_input.push_str(&s);
        for g in &parts[idx..] {
            new_input.push_str(g);
        }
        self.input = new_input;
        let added = s.graphemes(true).count();
        self.input_cursor = (idx + added).min(self.input.graphemes(true).count());
    }

    pub fn delete_left_grapheme(&mut self) {
        if self.input_cursor == 0 {
            return;
        }
        let mut parts: Vec<&str> = self.input.graphemes(true).collect();
        let idx = self.input_cursor.min(parts.len());
        if idx == 0 {
            return;
        }
        parts.remove(idx - 1);
        self.input = parts.concat();
        self.input_cursor = idx - 1;
    }

    pub fn delete_right_grapheme(&mut self) {
        let mut parts: Vec<&str> = self.input.graphemes(true).collect();
        let idx = self.input_cursor.min(parts.len());
        if idx < parts.len() {
            parts.remove(idx);
            self.input = parts.concat();
        }
    }

    pub fn delete_prev_word(&mut self) {
        let parts: Vec<&str> = self.input.graphemes(true).collect();
        let cur = self.input_cursor.min(parts.len());
        let i = word_start_before(&parts, cur);
        let mut newp = parts.clone();
        newp.drain(i..cur);
        self.input = newp.concat();
        self.input_cursor = i;
    }

    pub fn kill_to_start(&mut self) {
        let parts: Vec<&str> = self.input.graphemes(true).collect();
        let cur = self.input_cursor.min(parts.len());
        self.input = parts[cur..].concat();
        self.input_cursor = 0;
    }

    pub fn kill_to_end(&mut self) {
        let parts: Vec<&str> = self.input.graphemes(true).collect();
        let cur = self.input_cursor.min(parts.len());
        self.input = parts[..cur].concat();
    }

    pub fn move_cursor_word_left(&mut self) {
        let parts: Vec<&str> = self.input.graphemes(true).collect();
        self.input_cursor = word_start_before(&parts, self.input_cursor.min(parts.len()));
    }

    pub fn move_cursor_word_right(&mut self) {
        let parts: Vec<&str> = self.input.graphemes(true).collect();
        let mut i = self.input_cursor.min(parts.len());
        while i < parts.len() && is_break(parts[i]) {
            i += 1;
        }
        while i < parts.len() && !is_break(parts[i]) {
            i += 1;
        }
        self.input_cursor = i;
    }
}

// LaTeX commands count as word boundaries so `\frac{a}{b}` can be walked piecewise.
fn is_break(g: &str) -> bool {
    g.trim().is_empty() || g == "\\"
}

fn word_start_before(parts: &[&str], cur: usize) -> usize {
    let mut i = cur;
    while i > 0 && parts[i - 1].trim().is_empty() {
        i -= 1;
    }
    if i > 0 && parts[i - 1] == "\\" {
        return i - 1;
    }
    while i > 0 && !is_break(parts[i - 1]) {
        i -= 1;
    }
    if i > 0 && parts[i - 1] == "\\" {
        i -= 1;
    }
    i
}
