use crate::calendar::{Calendar, WeekWindow};
use crate::help::Help;
use crate::jumpto::{JumpTo, JumpToInput, JumpToOutput, JumpToState};
use crate::range::{DatePoint, DateRange};
use crate::styler::SelectionStyler;
use crate::theme::{BASE_STYLE, STATUS_STYLE};
use crossterm::event::{read, KeyCode, KeyEvent, KeyModifiers};
use ratatui::{
    backend::Backend,
    buffer::Buffer,
    layout::{Constraint, Layout, Rect},
    text::Line,
    widgets::{StatefulWidget, Widget},
    Terminal,
};
use std::io::{self, Write};
use time::{Date, Duration};
use tracing::debug;

/// Interactive calendar on which the user picks the two ends of a date range
#[derive(Clone, Debug, Eq, PartialEq)]
pub(crate) struct DatePicker {
    title: String,
    weeks: WeekWindow,
    cursor: Date,
    // Dates before this cannot be picked
    min_date: Date,
    range: DateRange,
    styler: SelectionStyler,
    state: AppState,
}

impl DatePicker {
    pub(crate) fn new<S: Into<String>>(title: S, today: Date) -> DatePicker {
        DatePicker {
            title: title.into(),
            weeks: WeekWindow::new(today),
            cursor: today,
            min_date: today,
            range: DateRange::Empty,
            styler: SelectionStyler::new(&DateRange::Empty, today),
            state: AppState::Calendar,
        }
    }

    /// Start with the cursor on `date` instead of today
    pub(crate) fn start_date(mut self, date: Date) -> Self {
        self.cursor = date;
        self.weeks = WeekWindow::new(date);
        self
    }

    /// Start with an existing selection
    pub(crate) fn selection(mut self, range: DateRange) -> Self {
        self.range = range;
        self.styler.update(&range);
        self
    }

    /// Run the picker until the user confirms or cancels.  Returns `None` if
    /// the user cancelled.
    pub(crate) fn run<B: Backend>(
        mut self,
        terminal: &mut Terminal<B>,
    ) -> io::Result<Option<DateRange>> {
        while !self.finished() {
            self.draw(terminal)?;
            self.handle_input()?;
        }
        Ok(self.outcome())
    }

    fn draw<B: Backend>(&mut self, terminal: &mut Terminal<B>) -> io::Result<()> {
        terminal.draw(|frame| frame.render_widget(self, frame.area()))?;
        Ok(())
    }

    fn handle_input(&mut self) -> io::Result<()> {
        let normal_modifiers = KeyModifiers::NONE | KeyModifiers::SHIFT;
        if let Some(KeyEvent {
            code, modifiers, ..
        }) = read()?.as_key_press_event()
        {
            if modifiers == KeyModifiers::CONTROL && code == KeyCode::Char('c') {
                self.state = AppState::Cancelled;
            } else if !normal_modifiers.contains(modifiers) || !self.handle_key(code) {
                self.beep()?;
            }
        }
        // else: Redraw on resize, and we might as well redraw on other stuff
        // too
        Ok(())
    }

    // Returns `false` if the user pressed an invalid key
    fn handle_key(&mut self, key: KeyCode) -> bool {
        match &mut self.state {
            AppState::Calendar => match key {
                KeyCode::Char('h') | KeyCode::Left => self.move_cursor(-1),
                KeyCode::Char('l') | KeyCode::Right => self.move_cursor(1),
                KeyCode::Char('k') | KeyCode::Up => self.move_cursor(-7),
                KeyCode::Char('j') | KeyCode::Down => self.move_cursor(7),
                KeyCode::Char('w') | KeyCode::PageUp => self.move_cursor(-self.page_days()),
                KeyCode::Char('z') | KeyCode::PageDown => self.move_cursor(self.page_days()),
                KeyCode::Char('0') | KeyCode::Home => {
                    self.set_cursor(self.min_date);
                    true
                }
                KeyCode::Char('g') => {
                    self.state = AppState::Jumping(JumpToState::new());
                    true
                }
                KeyCode::Char(' ') => self.pick(),
                KeyCode::Char('c') | KeyCode::Backspace | KeyCode::Delete => {
                    self.set_range(DateRange::Empty);
                    true
                }
                KeyCode::Enter => {
                    self.state = AppState::Confirmed;
                    true
                }
                KeyCode::Char('q') | KeyCode::Esc => {
                    self.state = AppState::Cancelled;
                    true
                }
                KeyCode::Char('?') => {
                    self.state = AppState::Helping;
                    true
                }
                _ => false,
            },
            AppState::Helping => {
                self.state = AppState::Calendar;
                true
            }
            AppState::Jumping(state) => {
                if matches!(key, KeyCode::Char('q' | 'g') | KeyCode::Esc) {
                    self.state = AppState::Calendar;
                    true
                } else {
                    let output = match key {
                        KeyCode::Char('-') => state.handle_input(JumpToInput::Negative),
                        KeyCode::Char('+') => state.handle_input(JumpToInput::Positive),
                        KeyCode::Char('0') => state.handle_input(JumpToInput::Digit(0)),
                        KeyCode::Char('1') => state.handle_input(JumpToInput::Digit(1)),
                        KeyCode::Char('2') => state.handle_input(JumpToInput::Digit(2)),
                        KeyCode::Char('3') => state.handle_input(JumpToInput::Digit(3)),
                        KeyCode::Char('4') => state.handle_input(JumpToInput::Digit(4)),
                        KeyCode::Char('5') => state.handle_input(JumpToInput::Digit(5)),
                        KeyCode::Char('6') => state.handle_input(JumpToInput::Digit(6)),
                        KeyCode::Char('7') => state.handle_input(JumpToInput::Digit(7)),
                        KeyCode::Char('8') => state.handle_input(JumpToInput::Digit(8)),
                        KeyCode::Char('9') => state.handle_input(JumpToInput::Digit(9)),
                        KeyCode::Backspace | KeyCode::Delete => {
                            state.handle_input(JumpToInput::Backspace)
                        }
                        KeyCode::Enter => state.handle_input(JumpToInput::Enter),
                        _ => JumpToOutput::Invalid,
                    };
                    match output {
                        JumpToOutput::Ok => true,
                        JumpToOutput::Invalid => false,
                        JumpToOutput::Jump(date) => {
                            self.state = AppState::Calendar;
                            self.set_cursor(date);
                            true
                        }
                    }
                }
            }
            AppState::Confirmed | AppState::Cancelled => false,
        }
    }

    fn beep(&self) -> io::Result<()> {
        io::stdout().write_all(b"\x07")
    }

    fn finished(&self) -> bool {
        matches!(self.state, AppState::Confirmed | AppState::Cancelled)
    }

    fn outcome(&self) -> Option<DateRange> {
        (self.state == AppState::Confirmed).then_some(self.range)
    }

    fn page_days(&self) -> i64 {
        self.weeks
            .week_count()
            .and_then(|n| i64::try_from(n).ok())
            .unwrap_or(1)
            .saturating_mul(7)
    }

    fn move_cursor(&mut self, days: i64) -> bool {
        match self.cursor.checked_add(Duration::days(days)) {
            Some(date) => {
                self.set_cursor(date);
                true
            }
            None => false,
        }
    }

    fn set_cursor(&mut self, date: Date) {
        self.cursor = date;
        self.weeks.reveal(date);
    }

    fn set_range(&mut self, range: DateRange) {
        self.range = range;
        self.styler.update(&range);
    }

    fn pick(&mut self) -> bool {
        if self.cursor < self.min_date {
            return false;
        }
        let range = self.range.pick(DatePoint::new(self.cursor));
        debug!(picked = %DatePoint::new(self.cursor), selection = ?range, "Picked date");
        self.set_range(range);
        true
    }

    fn status_text(&self) -> String {
        let selection = match self.range {
            DateRange::Empty => String::from("no dates selected"),
            r => r.display_text(),
        };
        format!(
            " {}: {selection}    SPACE pick · ENTER confirm · ? help",
            self.title
        )
    }
}

impl Widget for &mut DatePicker {
    fn render(self, area: Rect, buf: &mut Buffer) {
        buf.set_style(area, BASE_STYLE);
        let [cal_area, status_area] =
            Layout::vertical([Constraint::Min(0), Constraint::Length(1)]).areas(area);
        Calendar::new(&self.styler, self.cursor).render(cal_area, buf, &mut self.weeks);
        Line::styled(self.status_text(), STATUS_STYLE).render(status_area, buf);
        if self.state == AppState::Helping {
            Help(BASE_STYLE).render(area, buf);
        } else if let AppState::Jumping(ref mut state) = self.state {
            JumpTo.render(area, buf, state);
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum AppState {
    Calendar,
    Helping,
    Jumping(JumpToState),
    Confirmed,
    Cancelled,
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::date;

    fn press(picker: &mut DatePicker, keys: &str) {
        for c in keys.chars() {
            let key = match c {
                '\n' => KeyCode::Enter,
                '<' => KeyCode::Backspace,
                c => KeyCode::Char(c),
            };
            assert!(picker.handle_key(key), "key {c:?} was rejected");
        }
    }

    fn buffer_text(buf: &Buffer) -> Vec<String> {
        (0..buf.area.height)
            .map(|y| {
                (0..buf.area.width)
                    .map(|x| buf[(x, y)].symbol())
                    .collect::<String>()
            })
            .collect()
    }

    #[test]
    fn test_pick_range_and_confirm() {
        let mut picker = DatePicker::new("Trip dates", date!(2025 - 01 - 22));
        press(&mut picker, " lll ");
        assert_eq!(
            picker.range,
            DateRange::Range(
                DatePoint::new(date!(2025 - 01 - 22)),
                DatePoint::new(date!(2025 - 01 - 25))
            )
        );
        assert!(!picker.finished());
        press(&mut picker, "\n");
        assert!(picker.finished());
        assert_eq!(picker.outcome(), Some(picker.range));
    }

    #[test]
    fn test_pick_backwards_swaps() {
        let mut picker = DatePicker::new("Trip dates", date!(2025 - 01 - 22));
        press(&mut picker, "jj kk ");
        assert_eq!(
            picker.range,
            DateRange::Range(
                DatePoint::new(date!(2025 - 01 - 22)),
                DatePoint::new(date!(2025 - 02 - 05))
            )
        );
    }

    #[test]
    fn test_third_pick_restarts() {
        let mut picker = DatePicker::new("Trip dates", date!(2025 - 01 - 22));
        press(&mut picker, " l ll ");
        assert_eq!(
            picker.range,
            DateRange::Single(DatePoint::new(date!(2025 - 01 - 25)))
        );
    }

    #[test]
    fn test_cannot_pick_past() {
        let mut picker = DatePicker::new("Trip dates", date!(2025 - 01 - 22));
        press(&mut picker, "h");
        assert!(!picker.handle_key(KeyCode::Char(' ')));
        assert_eq!(picker.range, DateRange::Empty);
        press(&mut picker, "0 ");
        assert_eq!(
            picker.range,
            DateRange::Single(DatePoint::new(date!(2025 - 01 - 22)))
        );
    }

    #[test]
    fn test_clear_and_cancel() {
        let mut picker = DatePicker::new("Trip dates", date!(2025 - 01 - 22)).selection(
            DateRange::between(
                DatePoint::new(date!(2025 - 02 - 01)),
                DatePoint::new(date!(2025 - 02 - 03)),
            ),
        );
        press(&mut picker, "c");
        assert_eq!(picker.range, DateRange::Empty);
        press(&mut picker, " q");
        assert!(picker.finished());
        assert_eq!(picker.outcome(), None);
    }

    #[test]
    fn test_jump_to_date() {
        let mut picker = DatePicker::new("Trip dates", date!(2025 - 01 - 22));
        press(&mut picker, "g20250704\n");
        assert_eq!(picker.state, AppState::Calendar);
        assert_eq!(picker.cursor, date!(2025 - 07 - 04));
        press(&mut picker, " ");
        assert_eq!(
            picker.range,
            DateRange::Single(DatePoint::new(date!(2025 - 07 - 04)))
        );
    }

    #[test]
    fn test_invalid_keys() {
        let mut picker = DatePicker::new("Trip dates", date!(2025 - 01 - 22));
        assert!(!picker.handle_key(KeyCode::Char('x')));
        press(&mut picker, "g");
        assert!(!picker.handle_key(KeyCode::Enter));
        assert!(!picker.handle_key(KeyCode::Char('x')));
        press(&mut picker, "q");
        assert_eq!(picker.state, AppState::Calendar);
        press(&mut picker, "?");
        assert_eq!(picker.state, AppState::Helping);
        assert!(picker.handle_key(KeyCode::Char('x')));
        assert_eq!(picker.state, AppState::Calendar);
    }

    #[test]
    fn test_render() {
        let mut picker = DatePicker::new("Trip dates", date!(2025 - 01 - 22));
        press(&mut picker, " lll ");
        let area = Rect::new(0, 0, 80, 24);
        let mut buffer = Buffer::empty(area);
        picker.render(area, &mut buffer);
        let lines = buffer_text(&buffer);
        assert!(lines[0].contains("Su     Mo     Tu     We     Th     Fr     Sa"));
        assert!(lines.iter().any(|ln| ln.contains("[25]")));
        assert!(lines.iter().any(|ln| ln.contains("January")));
        assert!(lines[23].starts_with(" Trip dates: 22 Jan – 25 Jan"));
    }

    #[test]
    fn test_paging_follows_window() {
        let mut picker = DatePicker::new("Trip dates", date!(2025 - 01 - 22));
        let area = Rect::new(0, 0, 80, 24);
        let mut buffer = Buffer::empty(area);
        picker.render(area, &mut buffer);
        let weeks = picker.weeks.week_count().unwrap();
        press(&mut picker, "z");
        let expected = date!(2025 - 01 - 22) + Duration::weeks(i64::try_from(weeks).unwrap());
        assert_eq!(picker.cursor, expected);
        assert!(picker.weeks.shows(expected));
    }
}
