use ratatui::style::{Color, Modifier, Style};

pub(crate) const BASE_STYLE: Style = Style::new().fg(Color::White).bg(Color::Black);

pub(crate) const SELECTION_COLOR: Color = Color::LightGreen;

/// First and last day of a selected range
pub(crate) const RANGE_EDGE_STYLE: Style = Style::new()
    .fg(Color::Black)
    .bg(SELECTION_COLOR)
    .add_modifier(Modifier::BOLD);

/// Days strictly inside a selected range
pub(crate) const RANGE_INTERIOR_STYLE: Style = Style::new().fg(SELECTION_COLOR).bg(Color::Black);

/// Days that cannot be picked
pub(crate) const UNAVAILABLE_STYLE: Style = BASE_STYLE.fg(Color::DarkGray);

pub(crate) const YEAR_STYLE: Style = BASE_STYLE.add_modifier(Modifier::BOLD);

pub(crate) const MONTH_STYLE: Style = BASE_STYLE.add_modifier(Modifier::BOLD);

pub(crate) const WEEKDAY_STYLE: Style = BASE_STYLE.add_modifier(Modifier::BOLD);

pub(crate) const STATUS_STYLE: Style = Style::new().fg(Color::Black).bg(Color::White);

pub(crate) mod jumpto {
    use super::*;

    pub(crate) const UNFILLED_CELL_STYLE: Style = BASE_STYLE.fg(Color::DarkGray);

    pub(crate) const READY_ENTER_STYLE: Style = BASE_STYLE.add_modifier(Modifier::UNDERLINED);
}
