use ratatui::style::Color;

pub struct Theme {
    pub fg: Color,
    pub bg: Color,
    pub muted: Color,
    pub accent: Color,
    pub border_focus: Color,
    pub border_inactive: Color,
    pub selected_fg: Color,
    pub selected_bg: Color,
    pub title: Color,
    pub link: Color,
    pub marked: Color,
    pub error: Color,
}

pub const DARK: Theme = Theme {
    fg: Color::Gray,
    bg: Color::Reset,
    muted: Color::DarkGray,
    accent: Color::Cyan,
    border_focus: Color::Cyan,
    border_inactive: Color::DarkGray,
    selected_fg: Color::Black,
    selected_bg: Color::Cyan,
    title: Color::White,
    link: Color::LightBlue,
    marked: Color::Yellow,
    error: Color::LightRed,
};

pub const LIGHT: Theme = Theme {
    fg: Color::Black,
    bg: Color::White,
    muted: Color::Gray,
    accent: Color::Blue,
    border_focus: Color::Blue,
    border_inactive: Color::Gray,
    selected_fg: Color::White,
    selected_bg: Color::Blue,
    title: Color::Black,
    link: Color::Blue,
    marked: Color::Magenta,
    error: Color::Red,
};

pub fn theme(dark: bool) -> &'static Theme {
    if dark {
        &DARK
    } else {
        &LIGHT
    }
}
